//! Post repository for the Quill blog service.
//!
//! CRUD over the `posts` table. Reads join the author's username; the feed
//! query degrades to an empty result with a flag when the database is
//! unreachable, so a broken database never takes the whole page down.
//!
//! Mutations here are intentionally ignorant of authorization: callers run
//! the owner check (`quill-auth`) before invoking `update` or `delete`. The
//! SQL still scopes by `author_id` so a missed check cannot touch another
//! user's rows. Each statement commits individually; nothing in this layer
//! spans a multi-statement transaction.

use chrono::NaiveDateTime;
use quill_db::RequestDb;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during post operations.
#[derive(Debug, Error)]
pub enum PostError {
    /// A post must have a non-empty title.
    #[error("Title is required.")]
    TitleRequired,

    /// No post with the given id (within the acting user's reach).
    #[error("post not found: {0}")]
    NotFound(i64),

    /// The database could not be opened.
    #[error(transparent)]
    Connection(#[from] quill_db::DbError),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// A single post, as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub author_id: i64,
    /// Creation timestamp as recorded by the database (`YYYY-MM-DD HH:MM:SS`).
    pub created: String,
    pub title: String,
    pub body: String,
}

/// A post joined with its author's username, for the feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostListing {
    pub id: i64,
    pub author_id: i64,
    pub created: String,
    pub title: String,
    pub body: String,
    pub username: String,
}

impl PostListing {
    /// The creation date (`YYYY-MM-DD`) for display.
    pub fn created_date(&self) -> String {
        format_created_date(&self.created)
    }
}

/// The post feed: listings in reverse creation order, plus a degraded-load
/// flag for the presentation layer's error notice.
#[derive(Debug, Default)]
pub struct PostFeed {
    pub posts: Vec<PostListing>,
    pub load_failed: bool,
}

fn format_created_date(created: &str) -> String {
    NaiveDateTime::parse_from_str(created, "%Y-%m-%d %H:%M:%S")
        .map(|dt| dt.date().to_string())
        .unwrap_or_else(|_| created.to_string())
}

fn map_row_to_post(row: &Row<'_>) -> rusqlite::Result<Post> {
    Ok(Post {
        id: row.get(0)?,
        author_id: row.get(1)?,
        created: row.get(2)?,
        title: row.get(3)?,
        body: row.get(4)?,
    })
}

/// Loads the feed: all posts, newest first, each with its author's username.
///
/// Never fails. If the database cannot be opened or the query errors, the
/// feed comes back empty with `load_failed` set and the cause logged; the
/// caller renders a notice instead of an error page.
pub fn list(db: &mut RequestDb) -> PostFeed {
    match try_list(db) {
        Ok(posts) => PostFeed {
            posts,
            load_failed: false,
        },
        Err(e) => {
            tracing::warn!(error = %e, "failed to load post feed");
            PostFeed {
                posts: Vec::new(),
                load_failed: true,
            }
        }
    }
}

fn try_list(db: &mut RequestDb) -> Result<Vec<PostListing>, PostError> {
    let conn = db.acquire()?;

    let mut stmt = conn.prepare(
        "SELECT p.id, p.author_id, p.created, p.title, p.body, u.username
         FROM posts p JOIN users u ON p.author_id = u.id
         ORDER BY p.created DESC, p.id DESC",
    )?;

    let rows = stmt.query_map([], |row| {
        Ok(PostListing {
            id: row.get(0)?,
            author_id: row.get(1)?,
            created: row.get(2)?,
            title: row.get(3)?,
            body: row.get(4)?,
            username: row.get(5)?,
        })
    })?;

    let mut posts = Vec::new();
    for row in rows {
        posts.push(row?);
    }
    Ok(posts)
}

/// Retrieves a single post by id.
pub fn get(conn: &Connection, id: i64) -> Result<Post, PostError> {
    conn.query_row(
        "SELECT id, author_id, created, title, body FROM posts WHERE id = ?1",
        [id],
        map_row_to_post,
    )
    .optional()?
    .ok_or(PostError::NotFound(id))
}

/// Creates a post owned by `author_id`. Returns the new post's id.
///
/// # Errors
///
/// Returns [`PostError::TitleRequired`] when the title is empty.
pub fn create(
    conn: &Connection,
    author_id: i64,
    title: &str,
    body: &str,
) -> Result<i64, PostError> {
    if title.is_empty() {
        return Err(PostError::TitleRequired);
    }

    conn.execute(
        "INSERT INTO posts (author_id, title, body) VALUES (?1, ?2, ?3)",
        params![author_id, title, body],
    )?;

    Ok(conn.last_insert_rowid())
}

/// Updates the title and body of a post owned by `author_id`.
///
/// Callers run the owner check first; the `author_id` predicate here is a
/// backstop, not the check itself.
pub fn update(
    conn: &Connection,
    id: i64,
    author_id: i64,
    title: &str,
    body: &str,
) -> Result<(), PostError> {
    if title.is_empty() {
        return Err(PostError::TitleRequired);
    }

    let changed = conn.execute(
        "UPDATE posts SET title = ?1, body = ?2 WHERE id = ?3 AND author_id = ?4",
        params![title, body, id, author_id],
    )?;

    if changed == 0 {
        return Err(PostError::NotFound(id));
    }
    Ok(())
}

/// Deletes a post owned by `author_id`.
pub fn delete(conn: &Connection, id: i64, author_id: i64) -> Result<(), PostError> {
    let changed = conn.execute(
        "DELETE FROM posts WHERE id = ?1 AND author_id = ?2",
        params![id, author_id],
    )?;

    if changed == 0 {
        return Err(PostError::NotFound(id));
    }
    Ok(())
}
