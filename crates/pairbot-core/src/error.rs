use thiserror::Error;

/// Errors surfaced by Pairbot operations.
///
/// Variants that describe an anticipated situation (already subscribed, no
/// skip to remove, channel inactive, ...) carry the complete message shown to
/// the user. The remaining variants are unexpected and are rendered as a
/// generic apology by the command middleware.
#[derive(Debug, Error)]
pub enum PairbotError {
    /// A referenced entity is absent (inactive channel, missing skip, ...).
    #[error("{0}")]
    NotFound(String),

    /// A unique key already holds the requested state.
    #[error("{0}")]
    Duplicate(String),

    /// A past date, or text that does not parse as a date.
    #[error("{0}")]
    InvalidDate(String),

    /// The operation needs a base subscription the user does not have.
    #[error("{0}")]
    NoSubscription(String),

    /// The caller lacks the permission the command requires.
    #[error("{0}")]
    PermissionDenied(String),

    /// Arguments that are well-formed but make no sense (pairing with yourself).
    #[error("{0}")]
    InvalidInput(String),

    /// The chat platform or another external collaborator failed.
    #[error("Collaborator error: {0}")]
    Collaborator(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl PairbotError {
    /// True when the message is safe and useful to show the invoking user.
    pub fn is_user_facing(&self) -> bool {
        !matches!(
            self,
            PairbotError::Collaborator(_) | PairbotError::Database(_) | PairbotError::Config(_)
        )
    }

    /// Short error code used in structured logs.
    pub fn code(&self) -> &'static str {
        match self {
            PairbotError::NotFound(_) => "NOT_FOUND",
            PairbotError::Duplicate(_) => "DUPLICATE",
            PairbotError::InvalidDate(_) => "INVALID_DATE",
            PairbotError::NoSubscription(_) => "NO_SUBSCRIPTION",
            PairbotError::PermissionDenied(_) => "PERMISSION_DENIED",
            PairbotError::InvalidInput(_) => "INVALID_INPUT",
            PairbotError::Collaborator(_) => "COLLABORATOR_ERROR",
            PairbotError::Database(_) => "DATABASE_ERROR",
            PairbotError::Config(_) => "CONFIG_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, PairbotError>;
