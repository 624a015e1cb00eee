/// Core error types for tapedeck
use thiserror::Error;

/// Result type alias using `DeckError`
pub type Result<T> = std::result::Result<T, DeckError>;

/// Core error type for tapedeck
#[derive(Error, Debug)]
pub enum DeckError {
    /// Journal / durable store errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Audio decoding/output errors
    #[error("Audio error: {0}")]
    Audio(String),

    /// Playback control errors
    #[error("Playback error: {0}")]
    Playback(String),

    /// A producer submitted something that is not one of the six commands
    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    /// Track list problems (empty, too long, index out of range)
    #[error("Invalid track list: {0}")]
    InvalidTrackList(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

impl DeckError {
    /// Create a storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Create an audio error
    pub fn audio(msg: impl Into<String>) -> Self {
        Self::Audio(msg.into())
    }

    /// Create a playback error
    pub fn playback(msg: impl Into<String>) -> Self {
        Self::Playback(msg.into())
    }

    /// Create an invalid command error
    pub fn invalid_command(msg: impl Into<String>) -> Self {
        Self::InvalidCommand(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
