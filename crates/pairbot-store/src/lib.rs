//! `pairbot-store`: SQLite persistence for availability, schedule
//! exceptions, pairing records and channel activation.
//!
//! Every write runs in its own transaction. Reads never fail on a missing
//! row: an absent schedule is an empty [`Availability`](pairbot_core::Availability).

pub mod availability;
pub mod channels;
pub mod db;
pub mod error;
pub mod exceptions;
pub mod pairings;
pub mod store;
pub mod types;

pub use error::{Result, StoreError};
pub use store::Store;
pub use types::{
    AvailabilityChange, ChannelRecord, PairingKind, PairingRecord, ParticipantKey,
    ScheduleException,
};
