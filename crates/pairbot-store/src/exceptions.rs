use chrono::{NaiveDate, Utc};
use pairbot_core::{ChannelId, UserId};
use rusqlite::OptionalExtension;
use tracing::debug;

use crate::error::Result;
use crate::store::Store;
use crate::types::{date_key, from_sql_id, parse_date_key, sql_id, ScheduleException};

impl Store {
    /// The override for one user on one date, if any.
    pub fn exception(&self, channel: ChannelId, user: UserId, date: NaiveDate) -> Result<Option<bool>> {
        let conn = self.conn();
        let available = conn
            .query_row(
                "SELECT available FROM schedule_exceptions
                 WHERE channel_id = ?1 AND user_id = ?2 AND date = ?3",
                rusqlite::params![sql_id(channel.get()), sql_id(user.get()), date_key(date)],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;
        Ok(available.map(|v| v != 0))
    }

    /// Insert or overwrite an override. Returns the previous value, if any.
    pub fn set_exception(
        &self,
        channel: ChannelId,
        user: UserId,
        date: NaiveDate,
        available: bool,
    ) -> Result<Option<bool>> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        let previous = tx
            .query_row(
                "SELECT available FROM schedule_exceptions
                 WHERE channel_id = ?1 AND user_id = ?2 AND date = ?3",
                rusqlite::params![sql_id(channel.get()), sql_id(user.get()), date_key(date)],
                |row| row.get::<_, i64>(0),
            )
            .optional()?
            .map(|v| v != 0);
        tx.execute(
            "INSERT INTO schedule_exceptions (channel_id, user_id, date, available, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT (channel_id, user_id, date)
             DO UPDATE SET available = excluded.available",
            rusqlite::params![
                sql_id(channel.get()),
                sql_id(user.get()),
                date_key(date),
                available as i64,
                Utc::now().to_rfc3339()
            ],
        )?;
        tx.commit()?;
        debug!(%channel, %user, %date, available, "schedule exception set");
        Ok(previous)
    }

    /// Delete an override. Returns `false` when none existed.
    pub fn remove_exception(&self, channel: ChannelId, user: UserId, date: NaiveDate) -> Result<bool> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        let n = tx.execute(
            "DELETE FROM schedule_exceptions
             WHERE channel_id = ?1 AND user_id = ?2 AND date = ?3",
            rusqlite::params![sql_id(channel.get()), sql_id(user.get()), date_key(date)],
        )?;
        tx.commit()?;
        Ok(n > 0)
    }

    /// Every override in `channel` for one date, ascending by user.
    pub fn exceptions_on(&self, channel: ChannelId, date: NaiveDate) -> Result<Vec<ScheduleException>> {
        let conn = self.conn();
        let mut stmt = conn.prepare_cached(
            "SELECT channel_id, user_id, date, available FROM schedule_exceptions
             WHERE channel_id = ?1 AND date = ?2
             ORDER BY user_id",
        )?;
        let rows = stmt
            .query_map(rusqlite::params![sql_id(channel.get()), date_key(date)], raw_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows.into_iter().map(decode).collect()
    }

    /// A user's overrides on or after `from`, across channels, by date.
    pub fn upcoming_exceptions(&self, user: UserId, from: NaiveDate) -> Result<Vec<ScheduleException>> {
        let conn = self.conn();
        let mut stmt = conn.prepare_cached(
            "SELECT channel_id, user_id, date, available FROM schedule_exceptions
             WHERE user_id = ?1 AND date >= ?2
             ORDER BY date, channel_id",
        )?;
        let rows = stmt
            .query_map(rusqlite::params![sql_id(user.get()), date_key(from)], raw_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows.into_iter().map(decode).collect()
    }
}

type RawException = (i64, i64, String, i64);

fn raw_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawException> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
}

fn decode((channel, user, date, available): RawException) -> Result<ScheduleException> {
    Ok(ScheduleException {
        channel_id: ChannelId(from_sql_id(channel)),
        user_id: UserId(from_sql_id(user)),
        date: parse_date_key(&date)?,
        available: available != 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const C: ChannelId = ChannelId::new(5);

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, day).unwrap()
    }

    #[test]
    fn set_overwrites_and_reports_previous() {
        let store = Store::open_in_memory().unwrap();
        let u = UserId(1);
        assert_eq!(store.set_exception(C, u, d(19), false).unwrap(), None);
        assert_eq!(store.exception(C, u, d(19)).unwrap(), Some(false));
        assert_eq!(store.set_exception(C, u, d(19), true).unwrap(), Some(false));
        assert_eq!(store.exception(C, u, d(19)).unwrap(), Some(true));
        assert_eq!(store.exception(C, u, d(20)).unwrap(), None);
    }

    #[test]
    fn remove_reports_absence() {
        let store = Store::open_in_memory().unwrap();
        let u = UserId(1);
        assert!(!store.remove_exception(C, u, d(19)).unwrap());
        store.set_exception(C, u, d(19), false).unwrap();
        assert!(store.remove_exception(C, u, d(19)).unwrap());
        assert_eq!(store.exception(C, u, d(19)).unwrap(), None);
    }

    #[test]
    fn upcoming_excludes_past_dates() {
        let store = Store::open_in_memory().unwrap();
        let u = UserId(1);
        store.set_exception(C, u, d(10), false).unwrap();
        store.set_exception(C, u, d(21), false).unwrap();
        store.set_exception(ChannelId(6), u, d(19), false).unwrap();

        let upcoming = store.upcoming_exceptions(u, d(18)).unwrap();
        let dates: Vec<_> = upcoming.iter().map(|e| e.date).collect();
        assert_eq!(dates, vec![d(19), d(21)]);
    }

    #[test]
    fn exceptions_on_is_scoped_to_channel_and_date() {
        let store = Store::open_in_memory().unwrap();
        store.set_exception(C, UserId(2), d(19), false).unwrap();
        store.set_exception(C, UserId(1), d(19), true).unwrap();
        store.set_exception(C, UserId(3), d(20), false).unwrap();
        store.set_exception(ChannelId(6), UserId(4), d(19), false).unwrap();

        let on = store.exceptions_on(C, d(19)).unwrap();
        assert_eq!(on.len(), 2);
        assert_eq!(on[0].user_id, UserId(1));
        assert!(on[0].available);
        assert!(!on[1].available);
    }
}
