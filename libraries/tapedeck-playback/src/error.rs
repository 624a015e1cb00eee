/// Playback-specific errors
use tapedeck_audio::AudioError;
use tapedeck_core::TrackId;
use thiserror::Error;

/// Result type alias using `PlaybackError`
pub type Result<T> = std::result::Result<T, PlaybackError>;

/// Playback error types
#[derive(Error, Debug)]
pub enum PlaybackError {
    /// The command consumer has gone away
    #[error("Command channel closed")]
    ChannelClosed,

    /// Nothing arrived in time
    #[error("Timed out waiting for a command")]
    Timeout,

    /// Track index has no entry in the track list
    #[error("No track at index {0}")]
    NoSuchTrack(TrackId),

    /// Track could not be opened or prepared
    #[error(transparent)]
    Audio(#[from] AudioError),
}

impl From<PlaybackError> for tapedeck_core::DeckError {
    fn from(err: PlaybackError) -> Self {
        tapedeck_core::DeckError::playback(err.to_string())
    }
}
