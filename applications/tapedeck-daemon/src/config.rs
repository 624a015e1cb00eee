/// Daemon configuration
use crate::error::{DaemonError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tapedeck_core::TrackList;
use tapedeck_playback::{ControllerConfig, DecodeLoopConfig, EndOfTrack, DEFAULT_QUEUE_CAPACITY};

/// Config file read when `--config` is not given
pub const DEFAULT_CONFIG_FILE: &str = "tapedeck.toml";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DaemonConfig {
    #[serde(default = "default_playback")]
    pub playback: PlaybackSettings,

    #[serde(default = "default_volume")]
    pub volume: VolumeSettings,

    #[serde(default = "default_journal")]
    pub journal: JournalSettings,

    #[serde(default = "default_health")]
    pub health: HealthSettings,

    #[serde(default = "default_output")]
    pub output: OutputSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlaybackSettings {
    #[serde(default)]
    pub tracks: Vec<PathBuf>,

    /// Start in `Playing` instead of `Stopped`
    #[serde(default)]
    pub autoplay: bool,

    #[serde(default)]
    pub end_of_track: EndOfTrack,

    #[serde(default = "default_write_timeout_ms")]
    pub write_timeout_ms: u64,

    #[serde(default = "default_idle_poll_ms")]
    pub idle_poll_ms: u64,

    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VolumeSettings {
    #[serde(default = "default_initial_volume")]
    pub initial: u8,

    #[serde(default = "default_volume_step")]
    pub step: u8,

    #[serde(default = "default_max_volume")]
    pub max: u8,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JournalSettings {
    #[serde(default = "default_journal_path")]
    pub path: PathBuf,

    #[serde(default = "default_journal_capacity")]
    pub capacity: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HealthSettings {
    /// Seconds between health lines, 0 disables
    #[serde(default = "default_health_interval")]
    pub interval_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputSettings {
    #[serde(default)]
    pub backend: OutputBackend,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputBackend {
    /// Discard PCM
    #[default]
    Null,
    /// Default output device (feature `desktop`)
    Cpal,
}

impl DaemonConfig {
    /// Load configuration from file and environment
    ///
    /// An explicit `path` must exist; the default file is optional.
    /// Environment variables use the `TAPEDECK` prefix and `__` between
    /// sections, e.g. `TAPEDECK__VOLUME__INITIAL=30`. `TAPEDECK__PLAYBACK__TRACKS`
    /// takes a comma-separated list.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) => {
                settings = settings.add_source(config::File::from(path).required(true));
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    settings = settings.add_source(config::File::from(default_path));
                }
            }
        }

        settings = settings.add_source(
            config::Environment::with_prefix("TAPEDECK")
                .prefix_separator("__")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("playback.tracks")
                .try_parsing(true),
        );

        let config = settings.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Parse a TOML document, ignoring the environment
    pub fn from_toml(toml: &str) -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.playback.tracks.is_empty() {
            return Err(DaemonError::Config(
                "At least one track is required (set playback.tracks)".to_string(),
            ));
        }

        if self.playback.queue_capacity == 0 {
            return Err(DaemonError::Config(
                "playback.queue_capacity must be at least 1".to_string(),
            ));
        }

        if self.journal.capacity == 0 {
            return Err(DaemonError::Config(
                "journal.capacity must be at least 1".to_string(),
            ));
        }

        if self.volume.step == 0 {
            return Err(DaemonError::Config(
                "volume.step must be at least 1".to_string(),
            ));
        }

        if self.volume.initial > self.volume.max {
            return Err(DaemonError::Config(format!(
                "volume.initial ({}) is above volume.max ({})",
                self.volume.initial, self.volume.max
            )));
        }

        Ok(())
    }

    /// Build the track list (rejects more than 65536 entries)
    pub fn track_list(&self) -> Result<TrackList> {
        Ok(TrackList::new(self.playback.tracks.clone())?)
    }

    pub fn controller_config(&self) -> ControllerConfig {
        ControllerConfig {
            initial_volume: self.volume.initial,
            volume_step: self.volume.step,
            max_volume: self.volume.max,
        }
    }

    pub fn decode_loop_config(&self) -> DecodeLoopConfig {
        DecodeLoopConfig {
            write_timeout: Duration::from_millis(self.playback.write_timeout_ms),
            idle_poll: Duration::from_millis(self.playback.idle_poll_ms),
            end_of_track: self.playback.end_of_track,
        }
    }

    /// Health interval, `None` when disabled
    pub fn health_interval(&self) -> Option<Duration> {
        (self.health.interval_secs > 0).then(|| Duration::from_secs(self.health.interval_secs))
    }
}

// Default values
fn default_playback() -> PlaybackSettings {
    PlaybackSettings {
        tracks: Vec::new(),
        autoplay: false,
        end_of_track: EndOfTrack::default(),
        write_timeout_ms: default_write_timeout_ms(),
        idle_poll_ms: default_idle_poll_ms(),
        queue_capacity: default_queue_capacity(),
    }
}

fn default_write_timeout_ms() -> u64 {
    100
}

fn default_idle_poll_ms() -> u64 {
    100
}

fn default_queue_capacity() -> usize {
    DEFAULT_QUEUE_CAPACITY
}

fn default_volume() -> VolumeSettings {
    VolumeSettings {
        initial: default_initial_volume(),
        step: default_volume_step(),
        max: default_max_volume(),
    }
}

fn default_initial_volume() -> u8 {
    50
}

fn default_volume_step() -> u8 {
    5
}

fn default_max_volume() -> u8 {
    100
}

fn default_journal() -> JournalSettings {
    JournalSettings {
        path: default_journal_path(),
        capacity: default_journal_capacity(),
    }
}

fn default_journal_path() -> PathBuf {
    PathBuf::from("./data/journal.redb")
}

fn default_journal_capacity() -> usize {
    tapedeck_journal::DEFAULT_CAPACITY
}

fn default_health() -> HealthSettings {
    HealthSettings {
        interval_secs: default_health_interval(),
    }
}

fn default_health_interval() -> u64 {
    5
}

fn default_output() -> OutputSettings {
    OutputSettings {
        backend: OutputBackend::default(),
    }
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            playback: default_playback(),
            volume: default_volume(),
            journal: default_journal(),
            health: default_health(),
            output: default_output(),
        }
    }
}
