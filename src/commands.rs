//! User commands sent to the bound player and transport.

use clap::ValueEnum;
use zbus::zvariant::Value;

use crate::{
    dbus::{Bus, BusError, Interface},
    playback::{step_volume, VolumeDirection},
    resolver::PlayerBinding,
    utils::{extract_str, extract_u16},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Command {
    /// Pause if playing, play otherwise
    PlayPause,
    Play,
    Pause,
    Stop,
    Next,
    Previous,
    VolumeUp,
    VolumeDown,
}

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("no media player is bound")]
    Unbound,
    #[error("no media transport is available")]
    NoTransport,
    #[error("{0} has an unexpected value")]
    UnexpectedValue(&'static str),
    #[error(transparent)]
    Bus(#[from] BusError),
}
impl CommandError {
    #[must_use]
    pub const fn is_stale(&self) -> bool {
        matches!(self, Self::Bus(e) if e.is_stale())
    }
}

/// What a successful command changed locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Sent,
    Volume(u16),
}

async fn toggle<B: Bus>(bus: &B, binding: &PlayerBinding) -> Result<&'static str, CommandError> {
    let status = bus
        .get_property(&binding.player, Interface::Player, "Status")
        .await?;
    let status = extract_str(&status).ok_or(CommandError::UnexpectedValue("Status"))?;
    Ok(if status.as_str() == "playing" {
        "Pause"
    } else {
        "Play"
    })
}

async fn change_volume<B: Bus>(
    bus: &B,
    binding: &PlayerBinding,
    direction: VolumeDirection,
    step: u16,
) -> Result<u16, CommandError> {
    let transport = binding.transport.as_ref().ok_or(CommandError::NoTransport)?;
    let current = bus
        .get_property(transport, Interface::Transport, "Volume")
        .await?;
    let current = extract_u16(&current).ok_or(CommandError::UnexpectedValue("Volume"))?;
    let volume = step_volume(current, direction, step);
    tracing::debug!(current, volume, "Setting transport volume");
    bus.set_property(transport, Interface::Transport, "Volume", Value::from(volume))
        .await?;
    Ok(volume)
}

/// Send `command` to the objects of `binding`.
///
/// # Errors
///
/// Returns an error if the bus call fails, if a volume command is issued
/// without a transport, or if BlueZ reports a property of the wrong type.
pub async fn execute<B: Bus>(
    bus: &B,
    binding: &PlayerBinding,
    command: Command,
    volume_step: u16,
) -> Result<Outcome, CommandError> {
    let method = match command {
        Command::PlayPause => toggle(bus, binding).await?,
        Command::Play => "Play",
        Command::Pause => "Pause",
        Command::Stop => "Stop",
        Command::Next => "Next",
        Command::Previous => "Previous",
        Command::VolumeUp => {
            return change_volume(bus, binding, VolumeDirection::Up, volume_step)
                .await
                .map(Outcome::Volume)
        }
        Command::VolumeDown => {
            return change_volume(bus, binding, VolumeDirection::Down, volume_step)
                .await
                .map(Outcome::Volume)
        }
    };
    tracing::debug!(player = binding.player.path(), method, "Invoking media player method");
    bus.invoke_method(&binding.player, Interface::Player, method)
        .await?;
    Ok(Outcome::Sent)
}
