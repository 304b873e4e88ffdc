use pairbot_core::PairbotError;
use thiserror::Error;

/// Errors that can occur within the persistence layer.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying SQLite / rusqlite error.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A stored value could not be decoded.
    #[error("corrupt row: {0}")]
    Corrupt(String),
}

impl From<StoreError> for PairbotError {
    fn from(e: StoreError) -> Self {
        PairbotError::Database(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
