use chrono::NaiveDate;
use pairbot_core::{Availability, ChannelId, ConversationId, GuildId, Timeblock, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Result, StoreError};

/// A channel in which pairing has been activated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelRecord {
    pub guild_id: GuildId,
    pub channel_id: ChannelId,
    /// RFC 3339 timestamp of activation.
    pub created_at: String,
}

/// Result of a subscribe/unsubscribe write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AvailabilityChange {
    pub before: Availability,
    pub after: Availability,
}

impl AvailabilityChange {
    pub fn changed(&self) -> bool {
        self.before != self.after
    }
}

/// A date-scoped availability override.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleException {
    pub channel_id: ChannelId,
    pub user_id: UserId,
    pub date: NaiveDate,
    /// `false` = skip, `true` = force-available.
    pub available: bool,
}

/// Why a group was formed; part of the pairing idempotency key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PairingKind {
    /// Produced by the daily run for a timeblock.
    Scheduled(Timeblock),
    /// Requested with `/pairwith`.
    AdHoc,
}

impl PairingKind {
    /// Stable string stored in the `kind` column.
    pub fn as_key(self) -> &'static str {
        match self {
            PairingKind::Scheduled(t) => t.name(),
            PairingKind::AdHoc => "adhoc",
        }
    }

    pub fn from_key(s: &str) -> Result<Self> {
        if s == "adhoc" {
            return Ok(PairingKind::AdHoc);
        }
        Timeblock::ALL
            .into_iter()
            .find(|t| t.name() == s)
            .map(PairingKind::Scheduled)
            .ok_or_else(|| StoreError::Corrupt(format!("unknown pairing kind: {s}")))
    }
}

impl fmt::Display for PairingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_key())
    }
}

/// Canonical participant set: sorted ascending, without duplicates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantKey(Vec<UserId>);

impl ParticipantKey {
    pub fn new(members: impl IntoIterator<Item = UserId>) -> Self {
        let mut ids: Vec<UserId> = members.into_iter().collect();
        ids.sort();
        ids.dedup();
        Self(ids)
    }

    pub fn members(&self) -> &[UserId] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// JSON array stored in the `members` column, e.g. `[3,17]`.
    pub fn encode(&self) -> String {
        // Serialising a Vec<u64> cannot fail.
        serde_json::to_string(&self.0).unwrap_or_default()
    }

    pub fn decode(s: &str) -> Result<Self> {
        let ids: Vec<UserId> = serde_json::from_str(s)
            .map_err(|e| StoreError::Corrupt(format!("bad members column {s:?}: {e}")))?;
        Ok(Self::new(ids))
    }
}

/// A persisted group → conversation mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairingRecord {
    pub id: i64,
    pub channel_id: ChannelId,
    pub kind: PairingKind,
    pub members: ParticipantKey,
    pub thread_id: ConversationId,
    pub created_at: String,
}

// ── column helpers ───────────────────────────────────────────────────────────

/// Snowflakes are below 2^63, so they fit SQLite's signed INTEGER.
pub(crate) fn sql_id(id: u64) -> i64 {
    id as i64
}

pub(crate) fn from_sql_id(v: i64) -> u64 {
    v as u64
}

pub(crate) fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub(crate) fn parse_date_key(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| StoreError::Corrupt(format!("bad date {s:?}: {e}")))
}
