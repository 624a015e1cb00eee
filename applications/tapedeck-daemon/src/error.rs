/// Daemon error types
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DaemonError>;

#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Journal error: {0}")]
    Journal(#[from] tapedeck_journal::JournalError),

    #[error("Audio error: {0}")]
    Audio(#[from] tapedeck_audio::AudioError),

    #[error(transparent)]
    Deck(#[from] tapedeck_core::DeckError),

    #[error("Worker thread panicked: {0}")]
    Thread(&'static str),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<config::ConfigError> for DaemonError {
    fn from(err: config::ConfigError) -> Self {
        DaemonError::Config(err.to_string())
    }
}
