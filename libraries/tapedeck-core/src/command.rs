//! Symbolic playback commands
//!
//! The six commands are the only way anything outside the controller can
//! influence playback. Producers (network, HTTP, touch pads) turn their raw
//! input into a `Command` at their own boundary; anything that does not map
//! onto one of these variants is rejected there.

use crate::error::DeckError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A playback command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Command {
    /// Toggle between playing and paused
    ToggleAudio,

    /// Skip to the next track (wraps around)
    Next,

    /// Go back to the previous track (wraps around)
    Previous,

    /// Abandon the track and rewind the list to the first track
    Stop,

    /// Raise the output volume by one step
    VolumeUp,

    /// Lower the output volume by one step
    VolumeDown,
}

impl Command {
    /// All commands in wire-code order
    pub const ALL: [Command; 6] = [
        Command::ToggleAudio,
        Command::Next,
        Command::Previous,
        Command::Stop,
        Command::VolumeUp,
        Command::VolumeDown,
    ];

    /// Name used in the journal export
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ToggleAudio => "PLAY/PAUSE",
            Self::Next => "NEXT",
            Self::Previous => "PREVIOUS",
            Self::Stop => "STOP",
            Self::VolumeUp => "VOLUME_UP",
            Self::VolumeDown => "VOLUME_DOWN",
        }
    }

    /// Numeric wire code (0..=5)
    pub fn code(&self) -> u8 {
        match self {
            Self::ToggleAudio => 0,
            Self::Next => 1,
            Self::Previous => 2,
            Self::Stop => 3,
            Self::VolumeUp => 4,
            Self::VolumeDown => 5,
        }
    }

    /// Look up a command by its numeric wire code
    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.get(usize::from(code)).copied()
    }

    /// Whether the command only touches the volume collaborator
    pub fn is_volume(&self) -> bool {
        matches!(self, Self::VolumeUp | Self::VolumeDown)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Command {
    type Err = DeckError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let word = s.trim();
        let command = match word.to_ascii_lowercase().as_str() {
            "toggle" | "toggle_audio" | "play" | "pause" | "play/pause" => Self::ToggleAudio,
            "next" => Self::Next,
            "prev" | "previous" => Self::Previous,
            "stop" => Self::Stop,
            "vol+" | "volume_up" | "volumeup" => Self::VolumeUp,
            "vol-" | "volume_down" | "volumedown" => Self::VolumeDown,
            _ => return Err(DeckError::invalid_command(word)),
        };
        Ok(command)
    }
}
