//! Opening SQLite stores with runtime parameters.
//!
//! [`crate::ensure_table`] and [`crate::write_batch`] only borrow a connection;
//! these helpers are for callers (and the CLI) that need to open one.

use crate::config::StoreConfig;
use crate::{Error, Result};
use rusqlite::Connection;
use std::path::Path;
use std::time::Duration;

/// Open (or create) the database file at `path` and apply `cfg`.
pub fn open_store(path: &Path, cfg: &StoreConfig) -> Result<Connection> {
    let conn = Connection::open(path).map_err(Error::ConnectionFailure)?;
    conn.busy_timeout(Duration::from_millis(cfg.busy_timeout_ms))?;

    let mode: String = conn.pragma_update_and_check(None, "journal_mode", cfg.journal_mode.pragma_value(), |row| {
        row.get(0)
    })?;
    conn.pragma_update(None, "synchronous", cfg.synchronous.pragma_value())?;

    tracing::debug!("Opened store {} (journal_mode={})", path.display(), mode);
    Ok(conn)
}

/// Open a private in-memory store.
pub fn open_in_memory() -> Result<Connection> {
    Connection::open_in_memory().map_err(Error::ConnectionFailure)
}
