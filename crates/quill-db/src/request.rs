//! Request-scoped connection acquisition and release.

use rusqlite::{Connection, OpenFlags};
use thiserror::Error;

/// Busy timeout for SQLite connections, in milliseconds.
const BUSY_TIMEOUT_MS: u64 = 5_000;

/// Errors surfaced by the connection provider.
#[derive(Debug, Error)]
pub enum DbError {
    /// The configured database could not be opened or prepared for use.
    #[error("database connection unavailable: {source}")]
    ConnectionUnavailable {
        /// The underlying SQLite error.
        #[source]
        source: rusqlite::Error,
    },
}

/// A lazily opened, memoized database connection for one unit of work.
///
/// Constructed per request from the configured connection string. The first
/// [`acquire`](RequestDb::acquire) opens the connection; subsequent calls
/// return the same handle. [`release`](RequestDb::release) is idempotent and
/// also runs on drop, so the connection is closed on every exit path.
#[derive(Debug)]
pub struct RequestDb {
    database: String,
    conn: Option<Connection>,
}

impl RequestDb {
    /// Creates a provider bound to the given connection string.
    ///
    /// No connection is opened until [`acquire`](RequestDb::acquire) is
    /// called.
    pub fn new(database: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            conn: None,
        }
    }

    /// Returns the live connection for this unit of work, opening it on
    /// first use.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::ConnectionUnavailable`] if the database cannot be
    /// opened. The raw driver error is carried as the source, never exposed
    /// directly.
    pub fn acquire(&mut self) -> Result<&Connection, DbError> {
        let conn = match self.conn.take() {
            Some(conn) => conn,
            None => open_connection(&self.database)?,
        };
        Ok(self.conn.insert(conn))
    }

    /// Whether a connection is currently held.
    pub fn is_open(&self) -> bool {
        self.conn.is_some()
    }

    /// Closes the memoized connection if one exists.
    ///
    /// Safe to call any number of times; calls after the first are no-ops.
    /// A failed close is logged, not propagated — the unit of work is
    /// already over at this point.
    pub fn release(&mut self) {
        if let Some(conn) = self.conn.take() {
            if let Err((_conn, e)) = conn.close() {
                tracing::warn!(error = %e, "failed to close database connection");
            }
        }
    }
}

impl Drop for RequestDb {
    fn drop(&mut self) {
        self.release();
    }
}

fn open_connection(database: &str) -> Result<Connection, DbError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE;

    let conn = Connection::open_with_flags(database, flags)
        .map_err(|source| DbError::ConnectionUnavailable { source })?;

    conn.execute_batch(&format!(
        "PRAGMA foreign_keys = ON;
         PRAGMA busy_timeout = {BUSY_TIMEOUT_MS};",
    ))
    .map_err(|source| DbError::ConnectionUnavailable { source })?;

    Ok(conn)
}
