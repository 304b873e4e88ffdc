//! Date-scoped availability overrides (skip / unskip).

use std::sync::Arc;

use chrono::{Days, NaiveDate};
use pairbot_core::{ChannelId, PairbotError, Result, UserId};
use pairbot_store::Store;
use tracing::info;

use crate::dates::DateParser;

/// How far ahead the next scheduled day is searched, in days (today included).
const LOOKAHEAD_DAYS: u64 = 7;

/// Long date form used in replies, e.g. `Monday October 19, 2026`.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%A %B %d, %Y").to_string()
}

/// What [`ExceptionManager::unskip`] changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unskipped {
    SkipRemoved,
    /// The date was off-schedule; the user now joins that day's run.
    ForcedAvailable,
}

/// Skips, unskips and effective availability for a single date.
pub struct ExceptionManager {
    store: Arc<Store>,
    dates: Arc<dyn DateParser>,
}

impl ExceptionManager {
    pub fn new(store: Arc<Store>, dates: Arc<dyn DateParser>) -> Self {
        Self { store, dates }
    }

    /// Mark `user` unavailable on `date`.
    ///
    /// A force-available override on the same date is flipped to a skip.
    pub fn skip(&self, channel: ChannelId, user: UserId, date: NaiveDate, today: NaiveDate) -> Result<()> {
        if date < today {
            return Err(PairbotError::InvalidDate(format!(
                "Cannot skip a date in the past: {}.",
                format_date(date)
            )));
        }
        let base = self.store.availability(channel, user)?;
        if !base.covers(date) {
            return Err(PairbotError::NoSubscription(format!(
                "You are not subscribed to pair programming on {}.",
                format_date(date)
            )));
        }
        if self.store.exception(channel, user, date)? == Some(false) {
            return Err(PairbotError::Duplicate(format!(
                "You already skipped pairing on {}.",
                format_date(date)
            )));
        }
        self.store.set_exception(channel, user, date, false)?;
        info!(%channel, %user, %date, "skip recorded");
        Ok(())
    }

    /// Undo a skip on `date`, or opt in to a date the schedule does not cover.
    ///
    /// A recorded skip is removed. With no skip and no covering subscription
    /// the user is forced available for that date instead.
    pub fn unskip(
        &self,
        channel: ChannelId,
        user: UserId,
        date: NaiveDate,
        today: NaiveDate,
    ) -> Result<Unskipped> {
        if date < today {
            return Err(PairbotError::InvalidDate(format!(
                "Cannot unskip a date in the past: {}.",
                format_date(date)
            )));
        }
        match self.store.exception(channel, user, date)? {
            Some(false) => {
                self.store.remove_exception(channel, user, date)?;
                info!(%channel, %user, %date, "skip removed");
                Ok(Unskipped::SkipRemoved)
            }
            Some(true) => Err(PairbotError::Duplicate(format!(
                "You are already available for pairing on {}.",
                format_date(date)
            ))),
            None if self.store.availability(channel, user)?.covers(date) => {
                Err(PairbotError::NotFound(format!(
                    "You did not skip pair programming on {}.",
                    format_date(date)
                )))
            }
            None => {
                self.store.set_exception(channel, user, date, true)?;
                info!(%channel, %user, %date, "forced available");
                Ok(Unskipped::ForcedAvailable)
            }
        }
    }

    /// [`Self::resolve_effective_date`] for `/unskip`: having no scheduled
    /// day to fall back on means there is nothing to unskip.
    pub fn resolve_unskip_date(
        &self,
        channel: ChannelId,
        user: UserId,
        text: Option<&str>,
        today: NaiveDate,
    ) -> Result<NaiveDate> {
        self.resolve_effective_date(channel, user, text, today)
            .map_err(|e| match e {
                PairbotError::NoSubscription(msg) => PairbotError::NotFound(msg),
                other => other,
            })
    }

    /// The date a `/skip` or `/unskip` applies to.
    ///
    /// With `text`, the date parser decides. Without it, the first day from
    /// `today` onwards that the user's schedule covers.
    pub fn resolve_effective_date(
        &self,
        channel: ChannelId,
        user: UserId,
        text: Option<&str>,
        today: NaiveDate,
    ) -> Result<NaiveDate> {
        if let Some(text) = text.map(str::trim).filter(|t| !t.is_empty()) {
            return self
                .dates
                .parse(text, today)
                .ok_or_else(|| PairbotError::InvalidDate(format!("Could not parse date \"{text}\".")));
        }

        let base = self.store.availability(channel, user)?;
        (0..LOOKAHEAD_DAYS)
            .filter_map(|offset| today.checked_add_days(Days::new(offset)))
            .find(|date| base.covers(*date))
            .ok_or_else(|| {
                PairbotError::NoSubscription(
                    "You are not subscribed to pair programming in this channel.".to_string(),
                )
            })
    }

    /// Base coverage for `date`, replaced by an override for that date.
    pub fn is_available(&self, channel: ChannelId, user: UserId, date: NaiveDate) -> Result<bool> {
        if let Some(available) = self.store.exception(channel, user, date)? {
            return Ok(available);
        }
        Ok(self.store.availability(channel, user)?.covers(date))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dates::HumanDateParser;
    use pairbot_core::Timeblock;

    const C: ChannelId = ChannelId::new(1);
    const U: UserId = UserId::new(10);

    // Sunday.
    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
    }

    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    fn manager() -> (Arc<Store>, ExceptionManager) {
        let store = Arc::new(Store::open_in_memory().unwrap());
        let mgr = ExceptionManager::new(Arc::clone(&store), Arc::new(HumanDateParser));
        (store, mgr)
    }

    #[test]
    fn skip_then_unskip_restores_availability() {
        let (store, mgr) = manager();
        store.subscribe(C, U, &[Timeblock::Monday]).unwrap();
        assert!(mgr.is_available(C, U, monday()).unwrap());

        mgr.skip(C, U, monday(), today()).unwrap();
        assert!(!mgr.is_available(C, U, monday()).unwrap());

        assert_eq!(mgr.unskip(C, U, monday(), today()).unwrap(), Unskipped::SkipRemoved);
        assert!(mgr.is_available(C, U, monday()).unwrap());
    }

    #[test]
    fn skip_in_the_past_is_rejected_without_a_record() {
        let (store, mgr) = manager();
        store.subscribe(C, U, &Timeblock::DAYS).unwrap();
        let yesterday = NaiveDate::from_ymd_opt(2026, 10, 17).unwrap();

        let err = mgr.skip(C, U, yesterday, today()).unwrap_err();
        assert!(matches!(err, PairbotError::InvalidDate(_)));
        assert_eq!(store.exception(C, U, yesterday).unwrap(), None);
    }

    #[test]
    fn skip_requires_a_covering_subscription() {
        let (store, mgr) = manager();
        store.subscribe(C, U, &[Timeblock::Tuesday]).unwrap();
        let err = mgr.skip(C, U, monday(), today()).unwrap_err();
        assert!(matches!(err, PairbotError::NoSubscription(_)));

        // WEEK covers Mondays.
        store.subscribe(C, U, &[Timeblock::Week]).unwrap();
        mgr.skip(C, U, monday(), today()).unwrap();
    }

    #[test]
    fn double_skip_is_a_duplicate() {
        let (store, mgr) = manager();
        store.subscribe(C, U, &[Timeblock::Monday]).unwrap();
        mgr.skip(C, U, monday(), today()).unwrap();
        let err = mgr.skip(C, U, monday(), today()).unwrap_err();
        assert_eq!(err.to_string(), "You already skipped pairing on Monday October 19, 2026.");
    }

    #[test]
    fn skip_flips_a_force_available_override() {
        let (store, mgr) = manager();
        store.set_exception(C, U, monday(), true).unwrap();
        store.subscribe(C, U, &[Timeblock::Monday]).unwrap();
        mgr.skip(C, U, monday(), today()).unwrap();
        assert_eq!(store.exception(C, U, monday()).unwrap(), Some(false));
    }

    #[test]
    fn unskip_without_skip_is_not_found() {
        let (store, mgr) = manager();
        store.subscribe(C, U, &[Timeblock::Monday]).unwrap();
        let err = mgr.unskip(C, U, monday(), today()).unwrap_err();
        assert!(matches!(err, PairbotError::NotFound(_)));
    }

    #[test]
    fn unskip_off_schedule_forces_availability() {
        let (store, mgr) = manager();
        store.subscribe(C, U, &[Timeblock::Tuesday]).unwrap();
        assert!(!mgr.is_available(C, U, monday()).unwrap());

        assert_eq!(mgr.unskip(C, U, monday(), today()).unwrap(), Unskipped::ForcedAvailable);
        assert!(mgr.is_available(C, U, monday()).unwrap());
        assert_eq!(store.exception(C, U, monday()).unwrap(), Some(true));

        let err = mgr.unskip(C, U, monday(), today()).unwrap_err();
        assert!(matches!(err, PairbotError::Duplicate(_)));
    }

    #[test]
    fn unskip_date_without_schedule_is_not_found() {
        let (_store, mgr) = manager();
        let err = mgr.resolve_unskip_date(C, U, None, today()).unwrap_err();
        assert!(matches!(err, PairbotError::NotFound(_)));
        assert_eq!(
            err.to_string(),
            "You are not subscribed to pair programming in this channel."
        );
    }

    #[test]
    fn effective_date_scans_forward_from_today() {
        let (store, mgr) = manager();
        store.subscribe(C, U, &[Timeblock::Wednesday]).unwrap();
        let wednesday = NaiveDate::from_ymd_opt(2026, 10, 21).unwrap();
        assert_eq!(mgr.resolve_effective_date(C, U, None, today()).unwrap(), wednesday);

        // Today is included.
        store.subscribe(C, U, &[Timeblock::Sunday]).unwrap();
        assert_eq!(mgr.resolve_effective_date(C, U, None, today()).unwrap(), today());
    }

    #[test]
    fn effective_date_without_schedule_fails() {
        let (_store, mgr) = manager();
        let err = mgr.resolve_effective_date(C, U, None, today()).unwrap_err();
        assert!(matches!(err, PairbotError::NoSubscription(_)));
    }

    #[test]
    fn effective_date_from_text() {
        let (_store, mgr) = manager();
        assert_eq!(
            mgr.resolve_effective_date(C, U, Some("tomorrow"), today()).unwrap(),
            monday()
        );
        let err = mgr
            .resolve_effective_date(C, U, Some("someday"), today())
            .unwrap_err();
        assert_eq!(err.to_string(), "Could not parse date \"someday\".");
    }
}
