//! `pairbot-scheduler`: the daily pairing trigger.
//!
//! [`trigger::PairingTrigger`] wakes on a fixed interval and fires at most
//! once per UTC calendar day, at or after the configured hour. The last day
//! it fired is persisted in `trigger_state`, so a restart after the trigger
//! hour neither skips the day nor matches twice.

pub mod db;
pub mod error;
pub mod trigger;

pub use error::{Result, SchedulerError};
pub use trigger::{should_fire, PairingTrigger};
