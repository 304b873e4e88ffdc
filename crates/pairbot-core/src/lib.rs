//! `pairbot-core`: types shared by every Pairbot crate.
//!
//! Holds the configuration loader, the user-facing error taxonomy, the
//! platform-neutral identifier newtypes and the [`timeblock::Timeblock`]
//! model that availability and matching are keyed on.

pub mod config;
pub mod error;
pub mod timeblock;
pub mod types;

pub use error::{PairbotError, Result};
pub use timeblock::{Availability, Timeblock, TimeblockSelection};
pub use types::{ChannelId, ConversationId, GuildId, UserId};
