//! Database layer for the Quill blog service.
//!
//! Provides the request-scoped SQLite connection handle ([`RequestDb`]) and
//! the destructive schema bootstrapper ([`init_db`]). Quill deliberately does
//! not pool connections: each unit of work opens at most one connection,
//! lazily, and releases it when the unit of work ends.
//!
//! # Design decisions
//!
//! - **SQLite**: the whole application is a single-server blog; no external
//!   database process is required, and SQLite's own locking covers the
//!   concurrent-writer story.
//! - **One connection per unit of work**: a request that never touches the
//!   database never opens a connection. `RequestDb` memoizes the handle for
//!   the duration of the request and closes it on drop, so release happens
//!   on every exit path, error or not.
//! - **Embedded schema script**: the DDL is compiled into the binary via
//!   `include_str!`, so the bootstrap script cannot drift from the code that
//!   depends on it.

mod request;
mod schema;

pub use request::{DbError, RequestDb};
pub use schema::{init_db, init_schema, SchemaError};
