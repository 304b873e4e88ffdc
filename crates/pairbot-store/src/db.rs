use rusqlite::{Connection, Result};

/// Initialise all Pairbot tables. Safe to call on every startup (idempotent).
pub fn init_db(conn: &Connection) -> Result<()> {
    create_channels_table(conn)?;
    create_schedules_table(conn)?;
    create_exceptions_table(conn)?;
    create_pairings_table(conn)?;
    Ok(())
}

/// A row here means the bot may run and post in the channel.
fn create_channels_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS pairing_channels (
            guild_id    INTEGER NOT NULL,
            channel_id  INTEGER NOT NULL,
            created_at  TEXT    NOT NULL,
            PRIMARY KEY (guild_id, channel_id)
        );
        CREATE INDEX IF NOT EXISTS idx_pairing_channels_channel
            ON pairing_channels (channel_id);",
    )
}

/// One row per (channel, user). `timeblocks` is the availability bitmask
/// (bit 0 = Monday … bit 6 = Sunday, bit 7 = WEEK); rows never hold 0.
fn create_schedules_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schedules (
            channel_id  INTEGER NOT NULL,
            user_id     INTEGER NOT NULL,
            timeblocks  INTEGER NOT NULL CHECK (timeblocks > 0),
            updated_at  TEXT    NOT NULL,
            PRIMARY KEY (channel_id, user_id)
        );
        CREATE INDEX IF NOT EXISTS idx_schedules_user
            ON schedules (user_id);",
    )
}

/// Date-scoped overrides. `date` is `YYYY-MM-DD`; `available` 0 = skip.
fn create_exceptions_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schedule_exceptions (
            channel_id  INTEGER NOT NULL,
            user_id     INTEGER NOT NULL,
            date        TEXT    NOT NULL,
            available   INTEGER NOT NULL,
            created_at  TEXT    NOT NULL,
            PRIMARY KEY (channel_id, user_id, date)
        );
        CREATE INDEX IF NOT EXISTS idx_exceptions_channel_date
            ON schedule_exceptions (channel_id, date);",
    )
}

/// `members` is a JSON array of sorted user IDs; together with `kind` it is
/// the idempotency key for thread creation.
fn create_pairings_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS pairings (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            channel_id  INTEGER NOT NULL,
            kind        TEXT    NOT NULL,
            members     TEXT    NOT NULL,
            thread_id   INTEGER NOT NULL,
            created_at  TEXT    NOT NULL,
            UNIQUE (channel_id, kind, members)
        );",
    )
}
