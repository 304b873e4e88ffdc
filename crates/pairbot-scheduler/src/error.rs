use thiserror::Error;

/// Errors that can occur within the trigger.
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Store error: {0}")]
    Store(#[from] pairbot_store::StoreError),

    /// The persisted watermark is not a valid date.
    #[error("Corrupt watermark: {0}")]
    CorruptWatermark(String),
}

pub type Result<T> = std::result::Result<T, SchedulerError>;
