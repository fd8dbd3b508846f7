//! Identity and authorization gate for the Quill blog service.
//!
//! Implements registration, credential verification, session-identity
//! resolution, and the owner check used by every mutating post operation.
//!
//! Login failures are reported with distinct "Incorrect username." and
//! "Incorrect password." messages, matching the behavior of the original
//! application this service replaces. The owner check is deliberately
//! separate from existence: callers resolve the resource first (missing →
//! not found) and only then ask whether the acting identity owns it.

mod password;

pub use password::{hash_password, verify_password};

use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during authentication and authorization.
///
/// The `Display` text of the user-facing variants is shown verbatim in form
/// error notices, so the wording is part of the contract.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Username is required.")]
    UsernameRequired,

    #[error("Password is required.")]
    PasswordRequired,

    #[error("User {0} is already registered.")]
    AlreadyRegistered(String),

    #[error("Incorrect username.")]
    IncorrectUsername,

    #[error("Incorrect password.")]
    IncorrectPassword,

    /// The acting identity does not own the resource it tried to mutate.
    #[error("forbidden: not the resource owner")]
    Forbidden,

    /// Password hashing or hash parsing failed.
    #[error("password hashing failed: {0}")]
    Hash(argon2::password_hash::Error),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// An authenticated (or registered) user.
///
/// The password hash never leaves this crate; only id and username travel
/// with the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
}

/// Registers a new user with a hashed password.
///
/// Returns the new user's id.
///
/// # Errors
///
/// - [`AuthError::UsernameRequired`] / [`AuthError::PasswordRequired`] when
///   a field is empty.
/// - [`AuthError::AlreadyRegistered`] when the username is taken (mapped
///   from the unique-constraint violation).
pub fn register(conn: &Connection, username: &str, password: &str) -> Result<i64, AuthError> {
    if username.is_empty() {
        return Err(AuthError::UsernameRequired);
    }
    if password.is_empty() {
        return Err(AuthError::PasswordRequired);
    }

    let hash = password::hash_password(password).map_err(AuthError::Hash)?;

    conn.execute(
        "INSERT INTO users (username, password) VALUES (?1, ?2)",
        params![username, hash],
    )
    .map_err(|e| {
        if let rusqlite::Error::SqliteFailure(error_code, _) = e {
            if error_code.code == rusqlite::ffi::ErrorCode::ConstraintViolation {
                return AuthError::AlreadyRegistered(username.to_string());
            }
        }
        AuthError::Database(e)
    })?;

    let id = conn.last_insert_rowid();
    tracing::info!(user_id = id, username, "registered new user");
    Ok(id)
}

/// Verifies a username/password pair and returns the matching user.
///
/// # Errors
///
/// - [`AuthError::IncorrectUsername`] when no such user exists.
/// - [`AuthError::IncorrectPassword`] when the password does not match.
pub fn authenticate(
    conn: &Connection,
    username: &str,
    password: &str,
) -> Result<User, AuthError> {
    let row: Option<(i64, String, String)> = conn
        .query_row(
            "SELECT id, username, password FROM users WHERE username = ?1",
            [username],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .optional()?;

    let Some((id, username, hash)) = row else {
        return Err(AuthError::IncorrectUsername);
    };

    if !password::verify_password(password, &hash).map_err(AuthError::Hash)? {
        return Err(AuthError::IncorrectPassword);
    }

    Ok(User { id, username })
}

/// Resolves a session-held user id to a user row.
///
/// Returns `None` when the id no longer matches a user (a stale session),
/// in which case the caller treats the request as anonymous.
pub fn get_user(conn: &Connection, id: i64) -> Result<Option<User>, AuthError> {
    let user = conn
        .query_row(
            "SELECT id, username FROM users WHERE id = ?1",
            [id],
            |row| {
                Ok(User {
                    id: row.get(0)?,
                    username: row.get(1)?,
                })
            },
        )
        .optional()?;
    Ok(user)
}

/// The owner check: refuses unless the acting user owns the resource.
///
/// Callers must resolve the resource before calling this, so a missing
/// resource surfaces as "not found" rather than "forbidden".
pub fn require_ownership(owner_id: i64, user_id: i64) -> Result<(), AuthError> {
    if owner_id == user_id {
        Ok(())
    } else {
        Err(AuthError::Forbidden)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().expect("should open in-memory db");
        quill_db::init_schema(&conn).expect("schema should initialize");
        conn
    }

    #[test]
    fn register_and_authenticate() {
        let conn = test_conn();

        let id = register(&conn, "test", "test").expect("registration should succeed");
        assert_eq!(id, 1);

        let user = authenticate(&conn, "test", "test").expect("login should succeed");
        assert_eq!(user, User { id: 1, username: "test".to_string() });
    }

    #[test]
    fn register_rejects_empty_fields() {
        let conn = test_conn();

        let err = register(&conn, "", "pw").expect_err("empty username should fail");
        assert_eq!(err.to_string(), "Username is required.");

        let err = register(&conn, "a", "").expect_err("empty password should fail");
        assert_eq!(err.to_string(), "Password is required.");
    }

    #[test]
    fn register_rejects_duplicate_username() {
        let conn = test_conn();
        register(&conn, "test", "test").expect("first registration should succeed");

        let err = register(&conn, "test", "other").expect_err("duplicate should fail");
        assert!(matches!(err, AuthError::AlreadyRegistered(ref u) if u == "test"));
        assert_eq!(err.to_string(), "User test is already registered.");
    }

    #[test]
    fn authenticate_distinguishes_unknown_user_from_bad_password() {
        let conn = test_conn();
        register(&conn, "test", "test").expect("registration should succeed");

        let err = authenticate(&conn, "a", "test").expect_err("unknown user should fail");
        assert_eq!(err.to_string(), "Incorrect username.");

        let err = authenticate(&conn, "test", "a").expect_err("wrong password should fail");
        assert_eq!(err.to_string(), "Incorrect password.");
    }

    #[test]
    fn password_is_stored_hashed() {
        let conn = test_conn();
        register(&conn, "test", "secret").expect("registration should succeed");

        let stored: String = conn
            .query_row("SELECT password FROM users WHERE username = 'test'", [], |row| {
                row.get(0)
            })
            .expect("should read stored password");
        assert_ne!(stored, "secret");
        assert!(stored.starts_with("$argon2"));
    }

    #[test]
    fn get_user_handles_stale_ids() {
        let conn = test_conn();
        let id = register(&conn, "test", "test").expect("registration should succeed");

        let user = get_user(&conn, id).expect("lookup should succeed");
        assert_eq!(user.map(|u| u.username), Some("test".to_string()));

        let missing = get_user(&conn, 999).expect("lookup should succeed");
        assert!(missing.is_none());
    }

    #[test]
    fn ownership_check() {
        assert!(require_ownership(1, 1).is_ok());
        assert!(matches!(
            require_ownership(1, 2),
            Err(AuthError::Forbidden)
        ));
    }
}
