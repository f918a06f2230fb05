//! Turns queued BlueZ property changes into one coherent playback state.


use tracing::instrument;

use crate::{
    commands::{self, Command, CommandError, Outcome},
    dbus::{Bus, Interface, Properties},
    playback::{
        status_is_playing, transport_state_is_active, PlayStateSource, PlaybackState, TrackMeta,
        DEFAULT_VOLUME_STEP,
    },
    queue::{ChangeNotification, EventReceiver},
    resolver::{PlayerBinding, ResolveError, Resolver},
    surface::Surface,
    utils::{extract_bool, extract_u16},
};

#[derive(Debug, Clone, Copy)]
pub struct ReconcilerOptions {
    pub play_state_source: PlayStateSource,
    pub volume_step: u16,
}
impl Default for ReconcilerOptions {
    fn default() -> Self {
        Self {
            play_state_source: PlayStateSource::default(),
            volume_step: DEFAULT_VOLUME_STEP,
        }
    }
}

/// Owns the player binding, the playback state and the display surface.
///
/// [`Reconciler::tick`] must be called periodically; calls are never concurrent
/// since it takes `&mut self`.
pub struct Reconciler<B, S> {
    bus: B,
    surface: S,
    resolver: Resolver,
    queue: EventReceiver,
    options: ReconcilerOptions,
    binding: Option<PlayerBinding>,
    state: PlaybackState,
}

impl<B: Bus, S: Surface> Reconciler<B, S> {
    pub fn new(
        bus: B,
        mut surface: S,
        resolver: Resolver,
        queue: EventReceiver,
        options: ReconcilerOptions,
    ) -> Self {
        surface.loading();
        Self {
            bus,
            surface,
            resolver,
            queue,
            options,
            binding: None,
            state: PlaybackState::default(),
        }
    }

    #[cfg(test)]
    pub const fn binding(&self) -> Option<&PlayerBinding> {
        self.binding.as_ref()
    }

    pub const fn state(&self) -> &PlaybackState {
        &self.state
    }

    #[cfg(test)]
    pub const fn surface(&self) -> &S {
        &self.surface
    }

    #[cfg(test)]
    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    /// One reconciliation step: bind a player if there is none, otherwise
    /// apply everything queued since the previous tick.
    #[instrument(skip_all)]
    pub async fn tick(&mut self) {
        if self.binding.is_none() {
            self.try_bind().await;
        } else {
            self.ensure_transport().await;
            self.drain_queue();
        }
    }

    async fn try_bind(&mut self) {
        let binding = match self.resolver.bind(&self.bus).await {
            Ok(b) => b,
            Err(ResolveError::NotFound(_)) => {
                tracing::debug!("No media player available yet");
                return;
            }
            Err(e @ ResolveError::Ambiguous { .. }) => {
                tracing::warn!(%e, "Cannot pick a media player");
                return;
            }
            Err(e) => {
                tracing::warn!(?e, "Failed to look up media players");
                return;
            }
        };

        let snapshot = match self
            .bus
            .get_all_properties(&binding.player, Interface::Player)
            .await
        {
            Ok(props) => props,
            Err(e) if e.is_stale() => {
                tracing::info!(%e, "Media player vanished while binding");
                return;
            }
            Err(e) => {
                tracing::warn!(?e, "Failed to read media player properties");
                Properties::default()
            }
        };

        let transport_snapshot = match &binding.transport {
            Some(transport) => self
                .bus
                .get_all_properties(transport, Interface::Transport)
                .await
                .inspect_err(|e| tracing::warn!(?e, "Failed to read media transport properties"))
                .unwrap_or_default(),
            None => Properties::default(),
        };

        tracing::info!(player = binding.player.path(), "Media player bound");
        self.binding = Some(binding);
        self.state = PlaybackState::default();
        // Player status goes last so it wins over the transport state
        self.apply_transport(&transport_snapshot);
        self.apply_player(&snapshot);
        self.surface.ready();
    }

    /// A player can appear before its transport; look again while it's missing.
    async fn ensure_transport(&mut self) {
        let Some(binding) = self.binding.as_mut() else {
            return;
        };
        if binding.transport.is_none() {
            binding.transport = self
                .resolver
                .resolve_transport(&self.bus, &binding.player)
                .await;
        }
    }

    fn drain_queue(&mut self) {
        let pending = self.queue.len();
        for _ in 0..pending {
            let Some(notification) = self.queue.pop() else {
                break;
            };
            self.apply(&notification);
            if self.binding.is_none() {
                // Whatever is left belongs to the next binding
                break;
            }
        }
    }

    fn apply(&mut self, notification: &ChangeNotification) {
        tracing::trace!(path = %notification.path, interface = %notification.interface_name, "Applying property change");
        match notification.interface {
            Interface::Player => self.apply_player(&notification.fields),
            Interface::Transport => self.apply_transport(&notification.fields),
            Interface::Device => self.apply_device(&notification.fields),
            Interface::Control => {
                tracing::debug!(path = %notification.path, "Media control properties changed");
            }
            Interface::Unknown => {
                tracing::warn!(
                    path = %notification.path,
                    interface = %notification.interface_name,
                    "Ignoring property change from unexpected interface"
                );
            }
        }
    }

    fn set_playing(&mut self, playing: bool) {
        self.state.playing = playing;
        self.surface.play_pause_changed(playing);
    }

    fn apply_player(&mut self, fields: &Properties) {
        if let Some(track) = fields.get("Track") {
            match TrackMeta::from_value(track) {
                Some(track) => {
                    tracing::info!(%track, "Updating track");
                    self.surface.track_changed(&track);
                    self.state.track = Some(track);
                }
                None => tracing::warn!(?track, "Track is not a dictionary"),
            }
        }
        if let Some(status) = fields.get("Status") {
            tracing::debug!(?status, "Media player status");
            match status_is_playing(status) {
                Some(playing) if self.options.play_state_source.accepts_player() => {
                    self.set_playing(playing);
                }
                Some(_) => {}
                None => tracing::warn!(?status, "Status is not a string"),
            }
        }
    }

    fn apply_transport(&mut self, fields: &Properties) {
        if let Some(state) = fields.get("State") {
            tracing::debug!(?state, "Media transport state");
            if let Some(active) = transport_state_is_active(state) {
                self.state.transport_active = Some(active);
                if self.options.play_state_source.accepts_transport() {
                    self.set_playing(active);
                }
            }
        }
        if let Some(volume) = fields.get("Volume") {
            tracing::debug!(?volume, "Media transport volume");
            match extract_u16(volume) {
                Some(volume) => self.state.volume = Some(volume),
                None => tracing::warn!(?volume, "Volume is not an unsigned integer"),
            }
        }
    }

    fn apply_device(&mut self, fields: &Properties) {
        match fields.get("Connected").and_then(|c| extract_bool(c)) {
            Some(true) => {
                tracing::info!("The remote device connected");
                self.surface.show();
            }
            Some(false) => {
                tracing::info!("The remote device disconnected");
                self.unbind();
            }
            None => {}
        }
    }

    fn unbind(&mut self) {
        self.binding = None;
        self.surface.hide();
    }

    /// Send a user command to the bound player.
    ///
    /// # Errors
    ///
    /// [`CommandError::Unbound`] if no player is bound; otherwise see
    /// [`commands::execute`]. A player that stopped answering is unbound and
    /// the surface goes back to loading.
    #[instrument(skip(self))]
    pub async fn execute(&mut self, command: Command) -> Result<(), CommandError> {
        let binding = self.binding.as_mut().ok_or(CommandError::Unbound)?;
        if matches!(command, Command::VolumeUp | Command::VolumeDown) && binding.transport.is_none() {
            binding.transport = self
                .resolver
                .resolve_transport(&self.bus, &binding.player)
                .await;
        }
        match commands::execute(&self.bus, binding, command, self.options.volume_step).await {
            Ok(Outcome::Volume(volume)) => {
                self.state.volume = Some(volume);
                Ok(())
            }
            Ok(Outcome::Sent) => Ok(()),
            Err(e) if e.is_stale() => {
                tracing::info!(%e, "Bound media player is gone");
                // The device is still connected; wait for its next player
                self.binding = None;
                self.surface.loading();
                Err(e)
            }
            Err(e) => Err(e),
        }
    }
}
