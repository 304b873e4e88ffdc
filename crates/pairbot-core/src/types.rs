use serde::{Deserialize, Serialize};
use std::fmt;

/// Declares a transparent `u64` snowflake newtype.
///
/// The chat platform hands out 64-bit identifiers for guilds, channels,
/// users and threads; keeping them as distinct types stops a channel ID from
/// being passed where a user ID is expected.
macro_rules! snowflake {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            pub const fn new(id: u64) -> Self {
                Self(id)
            }

            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }
    };
}

snowflake!(
    /// A guild (server) that Pairbot has been invited to.
    GuildId
);
snowflake!(
    /// A text channel in which pairing can be activated.
    ChannelId
);
snowflake!(
    /// A community member.
    UserId
);
snowflake!(
    /// A conversation created for a group (a private thread on Discord).
    ConversationId
);

impl UserId {
    /// Mention markup that makes the platform notify this user.
    pub fn mention(self) -> String {
        format!("<@{}>", self.0)
    }
}

impl From<ChannelId> for ConversationId {
    /// A channel is itself a conversation the bot can post into.
    fn from(id: ChannelId) -> Self {
        Self(id.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mention_markup() {
        assert_eq!(UserId::new(42).mention(), "<@42>");
    }

    #[test]
    fn ids_order_numerically() {
        let mut ids = vec![UserId(30), UserId(4), UserId(200)];
        ids.sort();
        assert_eq!(ids, vec![UserId(4), UserId(30), UserId(200)]);
    }

    #[test]
    fn serializes_as_bare_number() {
        let json = serde_json::to_string(&ChannelId::new(7)).unwrap();
        assert_eq!(json, "7");
    }
}
