//! Request context: the per-request database handle, session-identity
//! resolution, and the login guard.
//!
//! The original application kept the logged-in user and the open connection
//! in framework-globals; here both travel explicitly through the request
//! extensions. [`provide_db`] builds one [`DbHandle`] per request, the guard
//! resolves the session's user id through it and inserts a [`CurrentUser`],
//! and handlers reach the same memoized connection through the same handle.

use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
    Extension,
};
use quill_auth::User;
use quill_db::RequestDb;
use std::sync::{Arc, Mutex, PoisonError};
use tower_sessions::Session;

use crate::AppState;

/// Session key holding the logged-in user's id.
pub const USER_ID_KEY: &str = "user_id";

/// The authenticated user for this request, stored in request extensions.
#[derive(Clone, Debug)]
pub struct CurrentUser(pub User);

/// The unit-of-work database provider for the current request.
///
/// One handle is created per request; the login guard and the handler hold
/// clones of it, so whichever touches the database first opens the
/// connection and everything after reuses it. The connection closes when the
/// request's last clone drops.
#[derive(Clone)]
pub struct DbHandle(Arc<Mutex<RequestDb>>);

impl DbHandle {
    pub fn new(database: &str) -> Self {
        Self(Arc::new(Mutex::new(RequestDb::new(database))))
    }

    /// Runs `f` over the request's provider. Callers acquire the connection
    /// inside `f`; blocking context only.
    pub fn with_db<T>(&self, f: impl FnOnce(&mut RequestDb) -> T) -> T {
        // A poisoned lock only means a previous closure panicked; the
        // provider itself stays usable.
        let mut db = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut db)
    }
}

/// Builds the request's [`DbHandle`] before any other work runs.
pub async fn provide_db(
    Extension(state): Extension<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Response {
    req.extensions_mut().insert(DbHandle::new(&state.database));
    next.run(req).await
}

/// Guard for mutation routes: anonymous callers are redirected to the login
/// page; authenticated callers proceed with [`CurrentUser`] attached.
///
/// A session whose user id no longer resolves to a row (stale session) is
/// treated as anonymous. Identity resolution goes through the request's
/// [`DbHandle`], so the handler behind the guard inherits the connection
/// opened here.
pub async fn require_login(
    session: Session,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let user_id: Option<i64> = session.get(USER_ID_KEY).await.map_err(|e| {
        tracing::error!(error = %e, "failed to read session");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let Some(user_id) = user_id else {
        return Ok(Redirect::to("/auth/login").into_response());
    };

    let db = req
        .extensions()
        .get::<DbHandle>()
        .ok_or(StatusCode::INTERNAL_SERVER_ERROR)?
        .clone();

    // A mutation cannot proceed without the database, so a connection
    // failure aborts here rather than degrading.
    let user = tokio::task::spawn_blocking(move || {
        db.with_db(|db| {
            let conn = db.acquire().map_err(|e| {
                tracing::error!(error = %e, "failed to open database for login guard");
                StatusCode::INTERNAL_SERVER_ERROR
            })?;
            quill_auth::get_user(conn, user_id).map_err(|e| {
                tracing::error!(error = %e, "failed to load session user");
                StatusCode::INTERNAL_SERVER_ERROR
            })
        })
    })
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "login guard task join error");
        StatusCode::INTERNAL_SERVER_ERROR
    })??;

    match user {
        Some(user) => {
            req.extensions_mut().insert(CurrentUser(user));
            Ok(next.run(req).await)
        }
        None => Ok(Redirect::to("/auth/login").into_response()),
    }
}

/// Resolves the session identity without gating, for pages that render for
/// everyone. Any failure (no session, stale id, unreachable database) yields
/// anonymous.
pub async fn current_user(session: &Session, db: &DbHandle) -> Option<User> {
    let user_id: i64 = session.get(USER_ID_KEY).await.ok().flatten()?;
    let db = db.clone();

    tokio::task::spawn_blocking(move || {
        db.with_db(|db| {
            let conn = db.acquire().ok()?;
            quill_auth::get_user(conn, user_id).ok().flatten()
        })
    })
    .await
    .ok()
    .flatten()
}
