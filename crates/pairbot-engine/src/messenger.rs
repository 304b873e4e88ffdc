//! The chat-platform seam.

use async_trait::async_trait;
use pairbot_core::{ChannelId, ConversationId, GuildId, PairbotError, UserId};

/// Errors raised by a [`Messenger`] implementation.
#[derive(Debug, thiserror::Error)]
pub enum MessengerError {
    /// The platform rejected or failed the request.
    #[error("platform error: {0}")]
    Platform(String),

    /// The bot is not allowed to perform the action (missing permission,
    /// user has direct messages disabled, ...).
    #[error("forbidden: {0}")]
    Forbidden(String),
}

impl From<MessengerError> for PairbotError {
    fn from(e: MessengerError) -> Self {
        PairbotError::Collaborator(e.to_string())
    }
}

/// A guild member as seen by the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub id: UserId,
    pub display_name: String,
}

/// A conversation (thread or channel) that still exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation {
    pub id: ConversationId,
    pub name: String,
}

/// Everything the engine needs from the chat platform.
///
/// "Not found" answers are `Ok(None)`; `Err` is reserved for failures the
/// caller should log.
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Look up a member of `guild`. `None` when the user has left.
    async fn resolve_member(
        &self,
        guild: GuildId,
        user: UserId,
    ) -> Result<Option<Member>, MessengerError>;

    /// Look up a conversation. `None` when it was deleted.
    async fn resolve_conversation(
        &self,
        id: ConversationId,
    ) -> Result<Option<Conversation>, MessengerError>;

    /// Create a private conversation under `parent` that `members` can join.
    async fn create_group_conversation(
        &self,
        parent: ChannelId,
        title: &str,
        members: &[UserId],
    ) -> Result<ConversationId, MessengerError>;

    async fn post_message(&self, to: ConversationId, text: &str) -> Result<(), MessengerError>;

    /// Send a direct message to one user.
    async fn send_direct(&self, to: UserId, text: &str) -> Result<(), MessengerError>;
}
