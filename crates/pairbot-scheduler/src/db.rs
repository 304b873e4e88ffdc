use rusqlite::Connection;

use crate::error::Result;

/// Initialise the trigger schema in `conn`.
///
/// `trigger_state` holds at most one row (`id = 1`): the last UTC date on
/// which the daily run completed.
pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS trigger_state (
            id          INTEGER NOT NULL PRIMARY KEY CHECK (id = 1),
            last_fired  TEXT    NOT NULL,   -- YYYY-MM-DD
            updated_at  TEXT    NOT NULL
        ) STRICT;
        ",
    )?;
    Ok(())
}
