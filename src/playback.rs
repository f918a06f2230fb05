//! What is playing on the bound device, as learned from BlueZ.

use std::fmt;

use clap::ValueEnum;
use zbus::zvariant::Value;

use crate::utils::{dict_str, extract_str};

/// AVRCP absolute volume range used by `MediaTransport1.Volume`.
pub const MAX_VOLUME: u16 = 127;
pub const DEFAULT_VOLUME_STEP: u16 = 4;

/// Track metadata as reported by `MediaPlayer1.Track`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackMeta {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
}
impl TrackMeta {
    /// Read a `Track` dictionary, or return [`None`] if the value is not one.
    #[must_use]
    pub fn from_value(v: &Value<'_>) -> Option<Self> {
        if !matches!(crate::utils::peel(v), Value::Dict(_)) {
            return None;
        }
        let field = |key: &str| dict_str(v, key).map(ToOwned::to_owned);
        Some(Self {
            title: field("Title"),
            artist: field("Artist"),
            album: field("Album"),
        })
    }
    /// `artist title album`, skipping missing parts.
    #[must_use]
    pub fn display_line(&self) -> String {
        [&self.artist, &self.title, &self.album]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}
impl fmt::Display for TrackMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_line())
    }
}

/// Which signal drives the play/pause indicator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum PlayStateSource {
    /// `MediaPlayer1.Status` and `MediaTransport1.State`, last one wins
    #[default]
    Both,
    /// Only `MediaPlayer1.Status`
    Player,
    /// Only `MediaTransport1.State`
    Transport,
}
impl PlayStateSource {
    #[must_use]
    pub const fn accepts_player(self) -> bool {
        matches!(self, Self::Both | Self::Player)
    }
    #[must_use]
    pub const fn accepts_transport(self) -> bool {
        matches!(self, Self::Both | Self::Transport)
    }
}

/// `MediaPlayer1.Status`: anything but `playing` counts as not playing.
#[must_use]
pub fn status_is_playing(v: &Value<'_>) -> Option<bool> {
    extract_str(v).map(|s| s.as_str() == "playing")
}

/// `MediaTransport1.State`: `active` or `idle`; `pending` carries no verdict.
#[must_use]
pub fn transport_state_is_active(v: &Value<'_>) -> Option<bool> {
    match extract_str(v)?.as_str() {
        "active" => Some(true),
        "idle" => Some(false),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumeDirection {
    Up,
    Down,
}

/// Move `current` one `step` towards `direction`, saturating at 0 and [`MAX_VOLUME`].
#[must_use]
pub fn step_volume(current: u16, direction: VolumeDirection, step: u16) -> u16 {
    match direction {
        VolumeDirection::Up => current.saturating_add(step).min(MAX_VOLUME),
        VolumeDirection::Down => current.min(MAX_VOLUME).saturating_sub(step),
    }
}

/// Playback state of the bound player. Fields keep their last observed value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaybackState {
    pub track: Option<TrackMeta>,
    pub playing: bool,
    pub transport_active: Option<bool>,
    pub volume: Option<u16>,
}
