/// Audio-specific errors
use thiserror::Error;

/// Result type alias using `AudioError`
pub type Result<T> = std::result::Result<T, AudioError>;

/// Audio error types
#[derive(Error, Debug)]
pub enum AudioError {
    /// Track file not found
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// Decoder instance could not be created
    #[error("Decoder init failed: {0}")]
    DecoderInit(String),

    /// No output device available
    #[error("No output device found")]
    DeviceNotFound,

    /// Output stream could not be built or started
    #[error("Output stream error: {0}")]
    Stream(String),

    /// I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Per-frame decode failure
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Buffer does not start with a usable frame header
    #[error("No frame header at buffer start")]
    NoSync,

    /// Header announced more bytes than the buffer holds
    #[error("Truncated frame: need {needed} bytes, have {available}")]
    Truncated {
        /// Full frame length
        needed: usize,
        /// Bytes available
        available: usize,
    },

    /// Valid header for a stream this decoder cannot handle
    #[error("Unsupported stream: {0}")]
    Unsupported(String),

    /// Frame body could not be decoded
    #[error("Malformed frame: {0}")]
    Malformed(String),
}

/// Output sink failure
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SinkError {
    /// The sink did not accept the block within the timeout
    #[error("Sink write timed out")]
    Timeout,

    /// Requested format is not supported by the device
    #[error("Unsupported sink format: {0}")]
    UnsupportedFormat(String),

    /// The device or its worker thread is gone
    #[error("Sink disconnected")]
    Disconnected,

    /// Device-level failure
    #[error("Sink device error: {0}")]
    Device(String),
}

impl From<AudioError> for tapedeck_core::DeckError {
    fn from(err: AudioError) -> Self {
        tapedeck_core::DeckError::audio(err.to_string())
    }
}

impl From<SinkError> for tapedeck_core::DeckError {
    fn from(err: SinkError) -> Self {
        tapedeck_core::DeckError::audio(err.to_string())
    }
}
