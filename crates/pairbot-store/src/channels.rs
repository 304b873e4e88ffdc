use chrono::Utc;
use pairbot_core::{ChannelId, GuildId};
use tracing::info;

use crate::error::Result;
use crate::store::Store;
use crate::types::{from_sql_id, sql_id, ChannelRecord};

fn row_to_channel(row: &rusqlite::Row<'_>) -> rusqlite::Result<ChannelRecord> {
    Ok(ChannelRecord {
        guild_id: GuildId(from_sql_id(row.get(0)?)),
        channel_id: ChannelId(from_sql_id(row.get(1)?)),
        created_at: row.get(2)?,
    })
}

impl Store {
    /// Activate pairing in a channel. Returns `false` if it was already active.
    pub fn activate_channel(&self, guild: GuildId, channel: ChannelId) -> Result<bool> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        let n = tx.execute(
            "INSERT OR IGNORE INTO pairing_channels (guild_id, channel_id, created_at)
             VALUES (?1, ?2, ?3)",
            rusqlite::params![sql_id(guild.get()), sql_id(channel.get()), Utc::now().to_rfc3339()],
        )?;
        tx.commit()?;
        if n > 0 {
            info!(%guild, %channel, "channel activated");
        }
        Ok(n > 0)
    }

    /// Deactivate pairing in a channel. Returns `false` if it was not active.
    ///
    /// Schedules and pairing records are kept so re-activation restores them.
    pub fn deactivate_channel(&self, channel: ChannelId) -> Result<bool> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        let n = tx.execute(
            "DELETE FROM pairing_channels WHERE channel_id = ?1",
            [sql_id(channel.get())],
        )?;
        tx.commit()?;
        if n > 0 {
            info!(%channel, "channel deactivated");
        }
        Ok(n > 0)
    }

    /// The activation record for a channel, if any.
    pub fn channel(&self, channel: ChannelId) -> Result<Option<ChannelRecord>> {
        let conn = self.conn();
        let mut stmt = conn.prepare_cached(
            "SELECT guild_id, channel_id, created_at FROM pairing_channels
             WHERE channel_id = ?1",
        )?;
        let mut rows = stmt.query_map([sql_id(channel.get())], row_to_channel)?;
        Ok(rows.next().transpose()?)
    }

    /// Every activated channel, ordered by guild then channel.
    pub fn active_channels(&self) -> Result<Vec<ChannelRecord>> {
        let conn = self.conn();
        let mut stmt = conn.prepare_cached(
            "SELECT guild_id, channel_id, created_at FROM pairing_channels
             ORDER BY guild_id, channel_id",
        )?;
        let channels = stmt
            .query_map([], row_to_channel)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(channels)
    }
}
