//! The post feed and the post mutation pages.
//!
//! Every handler reaches the database through the request's [`DbHandle`], so
//! a mutation reuses the connection the login guard already opened. Mutation
//! handlers run behind the guard and perform the owner check before any
//! mutating SQL: the post is fetched first (missing → 404), then ownership
//! is verified (mismatch → 403). The ordering matches the original
//! application — existence is checked before ownership, which reveals
//! whether a foreign post id exists. Known, preserved deliberately.

use crate::middleware::{current_user, CurrentUser, DbHandle};
use crate::{internal_error, render};
use axum::{
    extract::{Extension, Form, Path},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use quill_posts::{Post, PostError, PostFeed};
use serde::Deserialize;
use tower_sessions::Session;

/// The `title`/`body` form for creating and editing posts.
#[derive(Debug, Deserialize)]
pub struct PostForm {
    pub title: String,
    #[serde(default)]
    pub body: String,
}

/// Maps a [`PostError`] to the correct HTTP status, logging non-404 errors.
fn post_err_to_status(e: PostError) -> StatusCode {
    match e {
        PostError::NotFound(_) => StatusCode::NOT_FOUND,
        err => {
            tracing::error!(error = %err, "post operation failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// GET /
///
/// Renders the feed for everyone. A degraded feed (database unreachable)
/// still produces a full page, with the error notice in place of posts.
pub async fn index_handler(
    Extension(db): Extension<DbHandle>,
    session: Session,
) -> Html<String> {
    let feed_db = db.clone();
    let feed = tokio::task::spawn_blocking(move || feed_db.with_db(quill_posts::list))
        .await
        .unwrap_or_else(|e| {
            tracing::error!(error = %e, "feed task join error");
            PostFeed {
                posts: Vec::new(),
                load_failed: true,
            }
        });

    let user = current_user(&session, &db).await;
    Html(render::index_page(&feed, user.as_ref()))
}

/// GET /create
pub async fn create_form_handler(
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Html<String> {
    Html(render::create_page(&user, None, "", ""))
}

/// POST /create
pub async fn create_handler(
    Extension(db): Extension<DbHandle>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Form(form): Form<PostForm>,
) -> Result<Response, StatusCode> {
    let user_id = user.id;
    let title = form.title.clone();
    let body = form.body.clone();

    let outcome = tokio::task::spawn_blocking(
        move || -> Result<Result<i64, PostError>, StatusCode> {
            db.with_db(|db| {
                let conn = db
                    .acquire()
                    .map_err(internal_error("open database for post creation"))?;
                Ok(quill_posts::create(conn, user_id, &title, &body))
            })
        },
    )
    .await
    .map_err(internal_error("post creation task join"))??;

    match outcome {
        Ok(_) => Ok(Redirect::to("/").into_response()),
        Err(e @ PostError::TitleRequired) => Ok(Html(render::create_page(
            &user,
            Some(&e.to_string()),
            &form.title,
            &form.body,
        ))
        .into_response()),
        Err(e) => Err(post_err_to_status(e)),
    }
}

/// Fetches a post and runs the owner check, in that order.
///
/// Missing post → 404; someone else's post → 403. Runs before any mutation
/// SQL.
fn get_owned(
    conn: &rusqlite::Connection,
    id: i64,
    user_id: i64,
) -> Result<Post, StatusCode> {
    let post = quill_posts::get(conn, id).map_err(post_err_to_status)?;
    quill_auth::require_ownership(post.author_id, user_id).map_err(|_| StatusCode::FORBIDDEN)?;
    Ok(post)
}

/// GET /{id}/update
pub async fn update_form_handler(
    Extension(db): Extension<DbHandle>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<Html<String>, StatusCode> {
    let user_id = user.id;

    let post = tokio::task::spawn_blocking(move || -> Result<Post, StatusCode> {
        db.with_db(|db| {
            let conn = db
                .acquire()
                .map_err(internal_error("open database for edit page"))?;
            get_owned(conn, id, user_id)
        })
    })
    .await
    .map_err(internal_error("edit page task join"))??;

    Ok(Html(render::update_page(
        &user, post.id, &post.title, &post.body, None,
    )))
}

/// POST /{id}/update
pub async fn update_handler(
    Extension(db): Extension<DbHandle>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Form(form): Form<PostForm>,
) -> Result<Response, StatusCode> {
    let user_id = user.id;
    let title = form.title.clone();
    let body = form.body.clone();

    let outcome = tokio::task::spawn_blocking(
        move || -> Result<Result<(), PostError>, StatusCode> {
            db.with_db(|db| {
                let conn = db
                    .acquire()
                    .map_err(internal_error("open database for post update"))?;
                get_owned(conn, id, user_id)?;
                Ok(quill_posts::update(conn, id, user_id, &title, &body))
            })
        },
    )
    .await
    .map_err(internal_error("post update task join"))??;

    match outcome {
        Ok(()) => Ok(Redirect::to("/").into_response()),
        Err(e @ PostError::TitleRequired) => Ok(Html(render::update_page(
            &user,
            id,
            &form.title,
            &form.body,
            Some(&e.to_string()),
        ))
        .into_response()),
        Err(e) => Err(post_err_to_status(e)),
    }
}

/// POST /{id}/delete
pub async fn delete_handler(
    Extension(db): Extension<DbHandle>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<Response, StatusCode> {
    let user_id = user.id;

    tokio::task::spawn_blocking(move || -> Result<(), StatusCode> {
        db.with_db(|db| {
            let conn = db
                .acquire()
                .map_err(internal_error("open database for post deletion"))?;
            get_owned(conn, id, user_id)?;
            quill_posts::delete(conn, id, user_id).map_err(post_err_to_status)
        })
    })
    .await
    .map_err(internal_error("post deletion task join"))??;

    Ok(Redirect::to("/").into_response())
}
