//! The display side of the reconciler.

use std::io::{self, Write};

use crate::{output::WaybarCustomModule, playback::TrackMeta};

const LOADING_TEXT: &str = "Waiting for devices to connect";

/// Receives playback changes from the reconciler.
pub trait Surface {
    /// A player is bound and controls can be used
    fn ready(&mut self);
    /// No player is bound yet
    fn loading(&mut self);
    fn show(&mut self);
    fn hide(&mut self);
    fn track_changed(&mut self, track: &TrackMeta);
    fn play_pause_changed(&mut self, playing: bool);
}

/// Renders the playback state as a Waybar custom module, one JSON line per change.
pub struct WaybarSurface<W: Write> {
    writer: W,
    visible: bool,
    ready: bool,
    playing: bool,
    track: Option<TrackMeta>,
    last_printed: Option<WaybarCustomModule>,
}

impl WaybarSurface<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> WaybarSurface<W> {
    pub const fn new(writer: W) -> Self {
        Self {
            writer,
            visible: true,
            ready: false,
            playing: false,
            track: None,
            last_printed: None,
        }
    }

    fn module(&self) -> WaybarCustomModule {
        if !self.visible {
            return WaybarCustomModule::empty();
        }
        if !self.ready {
            return WaybarCustomModule::empty()
                .text(LOADING_TEXT)
                .alt("loading")
                .class("loading");
        }
        let state = if self.playing { "playing" } else { "paused" };
        let mut module = WaybarCustomModule::empty().alt(state).class(state);
        match &self.track {
            Some(track) => {
                module = module.text(&track.display_line());
                let tooltip = [
                    ("Title", &track.title),
                    ("Artist", &track.artist),
                    ("Album", &track.album),
                ]
                .into_iter()
                .filter_map(|(k, v)| v.as_ref().map(|v| format!("{k}: {v}")))
                .collect::<Vec<_>>()
                .join("\n");
                if !tooltip.is_empty() {
                    module = module.tooltip(&tooltip);
                }
            }
            None => module = module.text(""),
        }
        module
    }

    fn render(&mut self) {
        let module = self.module();
        if self.last_printed.as_ref() == Some(&module) {
            return;
        }
        if let Err(e) = module.format(&mut self.writer) {
            tracing::warn!(?e, "Failed to write Waybar module");
            return;
        }
        self.last_printed = Some(module);
    }

    #[cfg(test)]
    pub fn into_writer(self) -> W {
        self.writer
    }

    #[cfg(test)]
    pub const fn writer(&self) -> &W {
        &self.writer
    }
}

impl<W: Write> Surface for WaybarSurface<W> {
    fn ready(&mut self) {
        self.ready = true;
        self.visible = true;
        self.render();
    }
    fn loading(&mut self) {
        self.ready = false;
        self.render();
    }
    fn show(&mut self) {
        self.visible = true;
        self.render();
    }
    fn hide(&mut self) {
        self.visible = false;
        self.render();
    }
    fn track_changed(&mut self, track: &TrackMeta) {
        self.track = Some(track.clone());
        self.render();
    }
    fn play_pause_changed(&mut self, playing: bool) {
        self.playing = playing;
        self.render();
    }
}
