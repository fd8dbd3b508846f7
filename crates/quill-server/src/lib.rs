//! Quill server library logic.
//!
//! Wires the connection provider, auth gate, and post repository into an
//! axum router: the blog pages, the auth pages, session management, and the
//! login guard for mutation routes.

pub mod config;
pub mod middleware;
pub mod pages_auth;
pub mod pages_blog;
pub mod render;

use axum::{
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tower_sessions::{MemoryStore, SessionManagerLayer};

/// Application state shared across all request handlers.
///
/// Deliberately small: the connection string is the only process-wide
/// configuration, read once at startup and read-only afterwards. Each
/// request builds its own [`middleware::DbHandle`] from it.
#[derive(Clone)]
pub struct AppState {
    /// The database connection string (SQLite path).
    pub database: String,
}

/// Logs an error with context and converts it to a 500.
pub(crate) fn internal_error<E: std::fmt::Display>(
    context: &'static str,
) -> impl Fn(E) -> StatusCode {
    move |e| {
        tracing::error!(error = %e, context, "request failed");
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

/// Health check handler.
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Builds the application router with all routes.
///
/// Every request gets a [`middleware::DbHandle`] in its extensions, so the
/// login guard and the handler share one lazily opened connection. Sessions
/// ride in a cookie backed by the in-process memory store; they are
/// established on login, cleared on logout, and never persisted.
pub fn app(state: AppState) -> Router {
    let session_layer = SessionManagerLayer::new(MemoryStore::default()).with_secure(false);

    let protected_routes = Router::new()
        .route(
            "/create",
            get(pages_blog::create_form_handler).post(pages_blog::create_handler),
        )
        .route(
            "/{id}/update",
            get(pages_blog::update_form_handler).post(pages_blog::update_handler),
        )
        .route("/{id}/delete", post(pages_blog::delete_handler))
        .layer(axum::middleware::from_fn(middleware::require_login));

    Router::new()
        .route("/health", get(health))
        .route("/", get(pages_blog::index_handler))
        .route(
            "/auth/register",
            get(pages_auth::register_form_handler).post(pages_auth::register_handler),
        )
        .route(
            "/auth/login",
            get(pages_auth::login_form_handler).post(pages_auth::login_handler),
        )
        .route("/auth/logout", get(pages_auth::logout_handler))
        .merge(protected_routes)
        .layer(axum::middleware::from_fn(middleware::provide_db))
        .layer(TraceLayer::new_for_http())
        .layer(session_layer)
        .layer(Extension(Arc::new(state)))
}
