use thiserror::Error;
use tidings_shared::{ChatError, ChatId, ValidationError};

/// Errors produced by the store layer.
#[derive(Error, Debug)]
pub enum StoreError {
    /// SQLite error.
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Failed to determine a platform data directory.
    #[error("Could not determine application data directory")]
    NoDataDir,

    /// Generic I/O error (e.g. creating the database directory).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A query expected exactly one row but found none.
    #[error("Record not found")]
    NotFound,

    /// Migration failure.
    #[error("Migration error: {0}")]
    Migration(String),

    /// A direct chat between the same two users already exists.
    #[error("Direct chat already exists: {0}")]
    DirectChatExists(ChatId),

    /// The connection mutex was poisoned by a panicking writer.
    #[error("Connection lock poisoned")]
    LockPoisoned,

    /// UUID parsing error.
    #[error("UUID error: {0}")]
    Uuid(#[from] uuid::Error),
}

impl From<StoreError> for ChatError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound => Self::NotFound("record not found".to_string()),
            StoreError::DirectChatExists(_) => Self::Validation(ValidationError::DuplicateChat),
            other => Self::Transport(other.to_string()),
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StoreError>;
