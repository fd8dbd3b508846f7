//! Destructive schema bootstrapper.
//!
//! Executes the embedded DDL script: drops the `posts` and `users` tables if
//! they exist and recreates them empty. This is intentionally NOT idempotent
//! in effect — re-running it against a populated database wipes all data.
//! It is an operator action for fresh setup, never part of normal startup.

use crate::request::{DbError, RequestDb};
use rusqlite::Connection;
use thiserror::Error;

/// The fixed DDL script, compiled into the binary.
const SCHEMA_SQL: &str = include_str!("schema.sql");

/// Errors that can occur while bootstrapping the schema.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// No connection could be obtained to run the script against.
    #[error(transparent)]
    Connection(#[from] DbError),

    /// The DDL script itself failed to execute.
    #[error("schema script failed: {0}")]
    Script(#[source] rusqlite::Error),
}

/// Runs the schema script on an already-open connection.
///
/// The script runs inside a single transaction: either the whole schema is
/// (re)created or nothing changes.
///
/// # Errors
///
/// Returns [`SchemaError::Script`] if any DDL statement fails.
pub fn init_schema(conn: &Connection) -> Result<(), SchemaError> {
    let tx = conn.unchecked_transaction().map_err(SchemaError::Script)?;
    tx.execute_batch(SCHEMA_SQL).map_err(SchemaError::Script)?;
    tx.commit().map_err(SchemaError::Script)?;

    tracing::info!("database schema initialized");
    Ok(())
}

/// Acquires a connection from the provider and runs the schema script.
///
/// # Errors
///
/// Returns [`SchemaError::Connection`] if the database cannot be opened,
/// distinguishing it from a malformed or failing script
/// ([`SchemaError::Script`]).
pub fn init_db(db: &mut RequestDb) -> Result<(), SchemaError> {
    let conn = db.acquire()?;
    init_schema(conn)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    fn table_exists(conn: &Connection, name: &str) -> bool {
        conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1)",
            [name],
            |row| row.get(0),
        )
        .expect("should query sqlite_master")
    }

    #[test]
    fn init_schema_creates_tables() {
        let conn = Connection::open_in_memory().expect("should open in-memory db");
        init_schema(&conn).expect("schema should initialize");

        assert!(table_exists(&conn, "users"), "users table should exist");
        assert!(table_exists(&conn, "posts"), "posts table should exist");
    }

    #[test]
    fn init_schema_reinitialization_is_destructive() {
        let conn = Connection::open_in_memory().expect("should open in-memory db");
        init_schema(&conn).expect("schema should initialize");

        conn.execute(
            "INSERT INTO users (username, password) VALUES ('test', 'hash')",
            [],
        )
        .expect("should insert user");

        init_schema(&conn).expect("re-initialization should succeed");

        let count: i32 = conn
            .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
            .expect("should count users");
        assert_eq!(count, 0, "re-initialization drops existing data");
    }

    #[test]
    fn init_db_surfaces_connection_failure() {
        let mut db = RequestDb::new("/nonexistent-quill-dir/quill.db");

        let err = init_db(&mut db).expect_err("init against unopenable db should fail");
        assert!(matches!(err, SchemaError::Connection(_)));
    }

    #[test]
    fn init_db_runs_through_the_provider() {
        let dir = tempfile::tempdir().expect("should create temp dir");
        let path = dir.path().join("quill.db");
        let mut db = RequestDb::new(path.to_string_lossy());

        init_db(&mut db).expect("init should succeed");
        assert!(db.is_open(), "provider memoizes the bootstrap connection");

        let conn = db.acquire().expect("acquire should reuse the connection");
        assert!(table_exists(conn, "posts"));
    }
}
