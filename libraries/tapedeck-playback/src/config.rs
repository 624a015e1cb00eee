/// Tuning for the controller and the decode loop
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// What the decode loop does when a track ends or cannot be decoded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndOfTrack {
    /// Move to the next track, wrapping to the first after the last
    #[default]
    Advance,
    /// Play the same track again
    Repeat,
    /// Stop at the same index
    Stop,
}

/// Controller settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerConfig {
    /// Level applied to the volume collaborator at start
    pub initial_volume: u8,
    /// Change per volume command
    pub volume_step: u8,
    /// Upper clamp for the level
    pub max_volume: u8,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            initial_volume: 50,
            volume_step: 5,
            max_volume: 100,
        }
    }
}

/// Decode loop settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeLoopConfig {
    /// Longest a PCM block may wait for the sink
    pub write_timeout: Duration,
    /// How often an idle deck re-silences the sink
    pub idle_poll: Duration,
    /// End-of-track policy
    pub end_of_track: EndOfTrack,
}

impl Default for DecodeLoopConfig {
    fn default() -> Self {
        Self {
            write_timeout: Duration::from_millis(100),
            idle_poll: Duration::from_millis(100),
            end_of_track: EndOfTrack::default(),
        }
    }
}
