use std::sync::{Mutex, MutexGuard, PoisonError};

use rusqlite::Connection;

use crate::db::init_db;
use crate::error::Result;

/// Thread-safe handle to the Pairbot tables.
///
/// Wraps a single SQLite connection in a `Mutex`. Repository methods live in
/// `availability`, `exceptions`, `pairings` and `channels`; each write opens
/// one transaction and commits before the lock is released.
pub struct Store {
    db: Mutex<Connection>,
}

impl Store {
    /// Wrap an open connection, creating the schema if needed.
    pub fn new(conn: Connection) -> Result<Self> {
        init_db(&conn)?;
        Ok(Self {
            db: Mutex::new(conn),
        })
    }

    /// Fresh private database, used by tests across the workspace.
    pub fn open_in_memory() -> Result<Self> {
        Self::new(Connection::open_in_memory()?)
    }

    /// Lock the connection. A panic while holding the lock cannot leave a
    /// transaction half-applied (it rolls back on drop), so poisoning is ignored.
    pub(crate) fn conn(&self) -> MutexGuard<'_, Connection> {
        self.db.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
