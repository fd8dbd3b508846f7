//! Shared harness for driving the router through `tower::ServiceExt`.
#![allow(dead_code)] // each test binary uses a subset of the harness

use axum::body::Body;
use axum::http::{header, Request, Response};
use quill_server::{app, AppState};
use tower::ServiceExt;

/// A router plus the cookie state a browser would carry between requests.
pub struct TestApp {
    router: axum::Router,
    pub database: String,
    cookie: Option<String>,
    _dir: Option<tempfile::TempDir>,
}

impl TestApp {
    /// An app over a seeded file-backed database: users `test`/`test` and
    /// `other`/`other`, and one post (id 1) by `test` dated 2018-01-01.
    pub fn seeded() -> Self {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let database = dir.path().join("quill.db").to_string_lossy().to_string();

        let conn = rusqlite::Connection::open(&database).expect("failed to open test db");
        quill_db::init_schema(&conn).expect("failed to initialize schema");
        quill_auth::register(&conn, "test", "test").expect("failed to seed user");
        quill_auth::register(&conn, "other", "other").expect("failed to seed user");
        conn.execute(
            "INSERT INTO posts (author_id, created, title, body)
             VALUES (1, '2018-01-01 00:00:00', 'test title', 'test body')",
            [],
        )
        .expect("failed to seed post");
        drop(conn);

        let router = app(AppState {
            database: database.clone(),
        });

        Self {
            router,
            database,
            cookie: None,
            _dir: Some(dir),
        }
    }

    /// An app whose configured database can never be opened.
    pub fn unreachable_database() -> Self {
        let database = "/nonexistent-quill-dir/quill.db".to_string();
        let router = app(AppState {
            database: database.clone(),
        });

        Self {
            router,
            database,
            cookie: None,
            _dir: None,
        }
    }

    /// Opens a fresh connection to the test database for direct assertions.
    pub fn conn(&self) -> rusqlite::Connection {
        rusqlite::Connection::open(&self.database).expect("failed to open test db")
    }

    pub async fn get(&mut self, uri: &str) -> Response<Body> {
        self.request("GET", uri, None).await
    }

    pub async fn post(&mut self, uri: &str, form: &str) -> Response<Body> {
        self.request("POST", uri, Some(form)).await
    }

    pub async fn login(&mut self) -> Response<Body> {
        self.login_as("test", "test").await
    }

    pub async fn login_as(&mut self, username: &str, password: &str) -> Response<Body> {
        self.post(
            "/auth/login",
            &format!("username={username}&password={password}"),
        )
        .await
    }

    pub async fn logout(&mut self) -> Response<Body> {
        self.get("/auth/logout").await
    }

    async fn request(&mut self, method: &str, uri: &str, form: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(cookie) = &self.cookie {
            builder = builder.header(header::COOKIE, cookie.clone());
        }

        let body = match form {
            Some(form) => {
                builder =
                    builder.header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
                Body::from(form.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).expect("failed to build request"))
            .await
            .expect("request should not error");

        // Carry the session cookie forward, like a browser would.
        if let Some(set_cookie) = response.headers().get(header::SET_COOKIE) {
            let raw = set_cookie.to_str().expect("cookie should be ascii");
            let pair = raw.split(';').next().unwrap_or(raw);
            self.cookie = Some(pair.to_string());
        }

        response
    }
}

/// Reads the full response body as a string.
pub async fn body_string(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read body");
    String::from_utf8(bytes.to_vec()).expect("body should be utf-8")
}

/// The `Location` header of a redirect response.
pub fn location(response: &Response<Body>) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .expect("response should be a redirect")
        .to_str()
        .expect("location should be ascii")
}
