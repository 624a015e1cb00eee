//! Playback state register values

use crate::command::Command;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Playback state
///
/// Written by the controller, read by the decode loop at every frame
/// boundary. `AdvanceNext`, `AdvancePrevious` and `HardStopped` are requests
/// the decode loop acts on; `Stopped` and `Playing` are steady states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackState {
    /// Paused (or never started); the decode loop idles
    #[default]
    Stopped,

    /// Streaming the current track
    Playing,

    /// Abandon the current track and start the (already advanced) next one
    AdvanceNext,

    /// Abandon the current track and start the (already rewound) previous one
    AdvancePrevious,

    /// Abandon the current track, index rewound to 0, idle until told otherwise
    HardStopped,
}

impl PlaybackState {
    /// Compact code used when the state is packed into an atomic cell
    pub fn code(self) -> u8 {
        match self {
            Self::Stopped => 0,
            Self::Playing => 1,
            Self::AdvanceNext => 2,
            Self::AdvancePrevious => 3,
            Self::HardStopped => 4,
        }
    }

    /// Inverse of [`PlaybackState::code`]
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Stopped),
            1 => Some(Self::Playing),
            2 => Some(Self::AdvanceNext),
            3 => Some(Self::AdvancePrevious),
            4 => Some(Self::HardStopped),
            _ => None,
        }
    }

    /// Result of a `ToggleAudio` command
    ///
    /// Only a playing deck pauses. Anything idle (paused or hard stopped)
    /// resumes; a pending advance is parked as `Stopped`.
    ///
    /// Toggling twice restores `Stopped` and `Playing` only. `HardStopped`
    /// comes back as `Stopped` and a pending advance as `Playing`.
    pub fn toggled(self) -> Self {
        match self {
            Self::Stopped | Self::HardStopped => Self::Playing,
            Self::Playing | Self::AdvanceNext | Self::AdvancePrevious => Self::Stopped,
        }
    }

    /// Deterministic state transition for a command
    pub fn after(self, command: Command) -> Self {
        match command {
            Command::ToggleAudio => self.toggled(),
            Command::Next => Self::AdvanceNext,
            Command::Previous => Self::AdvancePrevious,
            Command::Stop => Self::HardStopped,
            Command::VolumeUp | Command::VolumeDown => self,
        }
    }

    /// Whether the decode loop should sit idle in this state
    pub fn is_idle(self) -> bool {
        matches!(self, Self::Stopped | Self::HardStopped)
    }

    /// Lowercase name for logs
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Stopped => "stopped",
            Self::Playing => "playing",
            Self::AdvanceNext => "advance_next",
            Self::AdvancePrevious => "advance_previous",
            Self::HardStopped => "hard_stopped",
        }
    }
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [PlaybackState; 5] = [
        PlaybackState::Stopped,
        PlaybackState::Playing,
        PlaybackState::AdvanceNext,
        PlaybackState::AdvancePrevious,
        PlaybackState::HardStopped,
    ];

    #[test]
    fn codes_round_trip() {
        for state in ALL {
            assert_eq!(PlaybackState::from_code(state.code()), Some(state));
        }
        assert_eq!(PlaybackState::from_code(9), None);
    }

    #[test]
    fn toggling_twice_restores_steady_states() {
        for state in [PlaybackState::Stopped, PlaybackState::Playing] {
            assert_eq!(state.toggled().toggled(), state);
        }
    }

    #[test]
    fn toggling_twice_lands_transient_states_in_steady_ones() {
        assert_eq!(
            PlaybackState::HardStopped.toggled().toggled(),
            PlaybackState::Stopped
        );
        for state in [PlaybackState::AdvanceNext, PlaybackState::AdvancePrevious] {
            assert_eq!(state.toggled().toggled(), PlaybackState::Playing);
        }
    }

    #[test]
    fn toggle_resumes_after_hard_stop() {
        assert_eq!(
            PlaybackState::HardStopped.after(Command::ToggleAudio),
            PlaybackState::Playing
        );
    }

    #[test]
    fn navigation_overrides_any_state() {
        for state in ALL {
            assert_eq!(state.after(Command::Next), PlaybackState::AdvanceNext);
            assert_eq!(state.after(Command::Previous), PlaybackState::AdvancePrevious);
            assert_eq!(state.after(Command::Stop), PlaybackState::HardStopped);
        }
    }

    #[test]
    fn volume_leaves_state_alone() {
        for state in ALL {
            assert_eq!(state.after(Command::VolumeUp), state);
            assert_eq!(state.after(Command::VolumeDown), state);
        }
    }
}
