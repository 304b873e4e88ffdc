use chrono::Utc;
use pairbot_core::{Availability, ChannelId, GuildId, Timeblock, UserId};
use rusqlite::{OptionalExtension, Transaction};
use tracing::debug;

use crate::error::Result;
use crate::store::Store;
use crate::types::{from_sql_id, sql_id, AvailabilityChange};

fn mask_of(blocks: &[Timeblock]) -> u8 {
    let mut a = Availability::none();
    for b in blocks {
        a.set(*b, true);
    }
    a.to_mask()
}

fn read_mask(conn: &rusqlite::Connection, channel: ChannelId, user: UserId) -> Result<u8> {
    let mask = conn
        .query_row(
            "SELECT timeblocks FROM schedules WHERE channel_id = ?1 AND user_id = ?2",
            rusqlite::params![sql_id(channel.get()), sql_id(user.get())],
            |row| row.get::<_, i64>(0),
        )
        .optional()?
        .unwrap_or(0);
    Ok(mask as u8)
}

/// Persist `mask`, deleting the row when it would be all-false.
fn write_mask(tx: &Transaction<'_>, channel: ChannelId, user: UserId, mask: u8) -> Result<()> {
    if mask == 0 {
        tx.execute(
            "DELETE FROM schedules WHERE channel_id = ?1 AND user_id = ?2",
            rusqlite::params![sql_id(channel.get()), sql_id(user.get())],
        )?;
    } else {
        tx.execute(
            "INSERT INTO schedules (channel_id, user_id, timeblocks, updated_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (channel_id, user_id)
             DO UPDATE SET timeblocks = excluded.timeblocks, updated_at = excluded.updated_at",
            rusqlite::params![
                sql_id(channel.get()),
                sql_id(user.get()),
                mask as i64,
                Utc::now().to_rfc3339()
            ],
        )?;
    }
    Ok(())
}

impl Store {
    /// A user's availability in a channel; empty when no row exists.
    pub fn availability(&self, channel: ChannelId, user: UserId) -> Result<Availability> {
        let conn = self.conn();
        Ok(Availability::from_mask(read_mask(&conn, channel, user)?))
    }

    /// Set the bits for `blocks`. Nothing is written when all were already set.
    pub fn subscribe(
        &self,
        channel: ChannelId,
        user: UserId,
        blocks: &[Timeblock],
    ) -> Result<AvailabilityChange> {
        self.update_mask(channel, user, |mask| mask | mask_of(blocks))
    }

    /// Clear the bits for `blocks`. Clearing the last bit removes the row.
    pub fn unsubscribe(
        &self,
        channel: ChannelId,
        user: UserId,
        blocks: &[Timeblock],
    ) -> Result<AvailabilityChange> {
        self.update_mask(channel, user, |mask| mask & !mask_of(blocks))
    }

    fn update_mask(
        &self,
        channel: ChannelId,
        user: UserId,
        f: impl FnOnce(u8) -> u8,
    ) -> Result<AvailabilityChange> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        let before = read_mask(&tx, channel, user)?;
        let after = f(before);
        if after != before {
            write_mask(&tx, channel, user, after)?;
        }
        tx.commit()?;
        debug!(%channel, %user, before, after, "availability updated");
        Ok(AvailabilityChange {
            before: Availability::from_mask(before),
            after: Availability::from_mask(after),
        })
    }

    /// Users in `channel` subscribed to `block`, ascending by ID.
    pub fn list_by_timeblock(&self, channel: ChannelId, block: Timeblock) -> Result<Vec<UserId>> {
        let conn = self.conn();
        let mut stmt = conn.prepare_cached(
            "SELECT user_id FROM schedules
             WHERE channel_id = ?1 AND (timeblocks & ?2) != 0
             ORDER BY user_id",
        )?;
        let bit = 1i64 << block.bit();
        let users = stmt
            .query_map(rusqlite::params![sql_id(channel.get()), bit], |row| {
                row.get::<_, i64>(0)
            })?
            .map(|r| r.map(|id| UserId(from_sql_id(id))))
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(users)
    }

    /// A user's schedules across the active channels of one guild.
    pub fn schedules_for_user(
        &self,
        guild: GuildId,
        user: UserId,
    ) -> Result<Vec<(ChannelId, Availability)>> {
        let conn = self.conn();
        let mut stmt = conn.prepare_cached(
            "SELECT s.channel_id, s.timeblocks FROM schedules s
             JOIN pairing_channels c ON c.channel_id = s.channel_id
             WHERE c.guild_id = ?1 AND s.user_id = ?2
             ORDER BY s.channel_id",
        )?;
        let rows = stmt
            .query_map(rusqlite::params![sql_id(guild.get()), sql_id(user.get())], |row| {
                Ok((
                    ChannelId(from_sql_id(row.get(0)?)),
                    Availability::from_mask(row.get::<_, i64>(1)? as u8),
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }
}
