mod common;

use axum::http::StatusCode;
use common::{body_string, location, TestApp};

#[tokio::test]
async fn index_lists_posts_for_everyone() {
    let mut app = TestApp::seeded();

    // Anonymous view: auth links, post visible, no edit link.
    let response = app.get("/").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await;
    assert!(body.contains("Log In"));
    assert!(body.contains("Register"));
    assert!(body.contains("test title"));
    assert!(body.contains("by test on 2018-01-01"));
    assert!(!body.contains("href=\"/1/update\""));

    // Author view: edit link appears.
    app.login().await;
    let body = body_string(app.get("/").await).await;
    assert!(body.contains("Log Out"));
    assert!(body.contains("href=\"/1/update\""));
}

#[tokio::test]
async fn index_degrades_when_database_is_unreachable() {
    let mut app = TestApp::unreachable_database();

    let response = app.get("/").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_string(response).await;
    assert!(body.contains("Failed to load posts"));
    // The rest of the page still renders.
    assert!(body.contains("Log In"));
    assert!(body.contains("Register"));
}

#[tokio::test]
async fn mutation_routes_require_login() {
    for path in ["/create", "/1/update", "/1/delete"] {
        let mut app = TestApp::seeded();
        let response = app.post(path, "title=x&body=").await;
        assert!(
            response.status().is_redirection(),
            "{path} should redirect anonymous callers"
        );
        assert_eq!(location(&response), "/auth/login");
    }
}

#[tokio::test]
async fn mutation_requires_ownership() {
    let mut app = TestApp::seeded();
    app.login_as("other", "other").await;

    // Post 1 belongs to "test"; "other" is refused regardless of payload.
    let response = app.post("/1/update", "title=hijack&body=").await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app.post("/1/delete", "").await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app.get("/1/update").await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // And the feed shows no edit link for someone else's post.
    let body = body_string(app.get("/").await).await;
    assert!(!body.contains("href=\"/1/update\""));
}

#[tokio::test]
async fn mutation_of_missing_post_is_not_found() {
    let mut app = TestApp::seeded();
    app.login().await;

    let response = app.post("/2/update", "title=x&body=").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app.post("/2/delete", "").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn create_inserts_a_post() {
    let mut app = TestApp::seeded();
    app.login().await;

    let response = app.get("/create").await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.post("/create", "title=created&body=").await;
    assert!(response.status().is_redirection());
    assert_eq!(location(&response), "/");

    let count: i64 = app
        .conn()
        .query_row("SELECT COUNT(id) FROM posts", [], |row| row.get(0))
        .expect("should count posts");
    assert_eq!(count, 2);
}

#[tokio::test]
async fn update_changes_a_post() {
    let mut app = TestApp::seeded();
    app.login().await;

    let response = app.get("/1/update").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_string(response).await.contains("test title"));

    let response = app.post("/1/update", "title=updated&body=").await;
    assert!(response.status().is_redirection());
    assert_eq!(location(&response), "/");

    let title: String = app
        .conn()
        .query_row("SELECT title FROM posts WHERE id = 1", [], |row| row.get(0))
        .expect("should read post");
    assert_eq!(title, "updated");
}

#[tokio::test]
async fn create_and_update_validate_title() {
    let mut app = TestApp::seeded();
    app.login().await;

    for path in ["/create", "/1/update"] {
        let response = app.post(path, "title=&body=").await;
        assert_eq!(response.status(), StatusCode::OK, "{path} re-renders the form");
        assert!(body_string(response).await.contains("Title is required."));
    }
}

#[tokio::test]
async fn delete_removes_a_post() {
    let mut app = TestApp::seeded();
    app.login().await;

    let response = app.post("/1/delete", "").await;
    assert!(response.status().is_redirection());
    assert_eq!(location(&response), "/");

    let count: i64 = app
        .conn()
        .query_row("SELECT COUNT(*) FROM posts WHERE id = 1", [], |row| {
            row.get(0)
        })
        .expect("should count posts");
    assert_eq!(count, 0);
}
