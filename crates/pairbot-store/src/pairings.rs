use chrono::Utc;
use pairbot_core::{ChannelId, ConversationId};
use rusqlite::OptionalExtension;
use tracing::debug;

use crate::error::Result;
use crate::store::Store;
use crate::types::{from_sql_id, sql_id, PairingKind, PairingRecord, ParticipantKey};

type RawPairing = (i64, i64, String, String, i64, String);

fn raw_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawPairing> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
    ))
}

fn decode((id, channel, kind, members, thread, created_at): RawPairing) -> Result<PairingRecord> {
    Ok(PairingRecord {
        id,
        channel_id: ChannelId(from_sql_id(channel)),
        kind: PairingKind::from_key(&kind)?,
        members: ParticipantKey::decode(&members)?,
        thread_id: ConversationId(from_sql_id(thread)),
        created_at,
    })
}

impl Store {
    /// Look up the record for a group by its idempotency key.
    pub fn find_pairing(
        &self,
        channel: ChannelId,
        kind: PairingKind,
        members: &ParticipantKey,
    ) -> Result<Option<PairingRecord>> {
        let conn = self.conn();
        let raw = conn
            .query_row(
                "SELECT id, channel_id, kind, members, thread_id, created_at FROM pairings
                 WHERE channel_id = ?1 AND kind = ?2 AND members = ?3",
                rusqlite::params![sql_id(channel.get()), kind.as_key(), members.encode()],
                raw_row,
            )
            .optional()?;
        raw.map(decode).transpose()
    }

    /// Record the conversation created for a group.
    ///
    /// When a record with the same key exists its thread is replaced, so a
    /// recreated conversation never produces a second row.
    pub fn insert_pairing(
        &self,
        channel: ChannelId,
        kind: PairingKind,
        members: &ParticipantKey,
        thread: ConversationId,
    ) -> Result<PairingRecord> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO pairings (channel_id, kind, members, thread_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT (channel_id, kind, members)
             DO UPDATE SET thread_id = excluded.thread_id, created_at = excluded.created_at",
            rusqlite::params![
                sql_id(channel.get()),
                kind.as_key(),
                members.encode(),
                sql_id(thread.get()),
                Utc::now().to_rfc3339()
            ],
        )?;
        let raw = tx.query_row(
            "SELECT id, channel_id, kind, members, thread_id, created_at FROM pairings
             WHERE channel_id = ?1 AND kind = ?2 AND members = ?3",
            rusqlite::params![sql_id(channel.get()), kind.as_key(), members.encode()],
            raw_row,
        )?;
        tx.commit()?;
        let record = decode(raw)?;
        debug!(%channel, %kind, id = record.id, thread = %thread, "pairing recorded");
        Ok(record)
    }

    /// Delete a record, e.g. after its conversation disappeared.
    pub fn delete_pairing(&self, id: i64) -> Result<bool> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        let n = tx.execute("DELETE FROM pairings WHERE id = ?1", [id])?;
        tx.commit()?;
        Ok(n > 0)
    }

    /// All records for a channel, oldest first.
    pub fn pairings_for_channel(&self, channel: ChannelId) -> Result<Vec<PairingRecord>> {
        let conn = self.conn();
        let mut stmt = conn.prepare_cached(
            "SELECT id, channel_id, kind, members, thread_id, created_at FROM pairings
             WHERE channel_id = ?1
             ORDER BY id",
        )?;
        let rows = stmt
            .query_map([sql_id(channel.get())], raw_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows.into_iter().map(decode).collect()
    }
}
