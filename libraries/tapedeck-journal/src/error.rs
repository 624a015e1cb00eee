/// Journal-specific errors
use thiserror::Error;

/// Result type alias using `JournalError`
pub type Result<T> = std::result::Result<T, JournalError>;

/// Journal error types
#[derive(Error, Debug)]
pub enum JournalError {
    /// The durable store could not be opened, read or written
    #[error("Store error: {0}")]
    Store(String),

    /// The in-memory ring changed but the durable commit failed
    #[error("Persistence failed, change kept in memory only: {0}")]
    Persistence(String),

    /// A persisted blob could not be decoded
    #[error("Corrupt journal blob: {0}")]
    Corrupt(String),

    /// Capacity must be at least one slot
    #[error("Invalid journal capacity: {0}")]
    InvalidCapacity(usize),

    /// Serialization error
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

impl JournalError {
    /// Create a store error
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }
}

impl From<redb::Error> for JournalError {
    fn from(err: redb::Error) -> Self {
        Self::Store(err.to_string())
    }
}

impl From<JournalError> for tapedeck_core::DeckError {
    fn from(err: JournalError) -> Self {
        tapedeck_core::DeckError::storage(err.to_string())
    }
}
