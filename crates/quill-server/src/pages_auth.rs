//! Registration, login, and logout pages.

use crate::middleware::{current_user, DbHandle, USER_ID_KEY};
use crate::{internal_error, render};
use axum::{
    extract::{Extension, Form},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use quill_auth::AuthError;
use serde::Deserialize;
use tower_sessions::Session;

/// The `username`/`password` form shared by registration and login.
#[derive(Debug, Deserialize)]
pub struct CredentialsForm {
    pub username: String,
    pub password: String,
}

/// GET /auth/register
pub async fn register_form_handler(
    Extension(db): Extension<DbHandle>,
    session: Session,
) -> Html<String> {
    let user = current_user(&session, &db).await;
    Html(render::register_page(user.as_ref(), None))
}

/// POST /auth/register
///
/// Success redirects to the login page. Validation failures and duplicate
/// usernames re-render the form with the error notice; registration is a
/// write, so an unreachable database aborts with a server error.
pub async fn register_handler(
    Extension(db): Extension<DbHandle>,
    session: Session,
    Form(form): Form<CredentialsForm>,
) -> Result<Response, StatusCode> {
    let task_db = db.clone();
    let outcome = tokio::task::spawn_blocking(
        move || -> Result<Result<i64, AuthError>, StatusCode> {
            task_db.with_db(|db| {
                let conn = db
                    .acquire()
                    .map_err(internal_error("open database for registration"))?;
                Ok(quill_auth::register(conn, &form.username, &form.password))
            })
        },
    )
    .await
    .map_err(internal_error("registration task join"))??;

    match outcome {
        Ok(_) => Ok(Redirect::to("/auth/login").into_response()),
        Err(
            e @ (AuthError::UsernameRequired
            | AuthError::PasswordRequired
            | AuthError::AlreadyRegistered(_)),
        ) => {
            // The re-render keeps whatever identity the session carries.
            let user = current_user(&session, &db).await;
            Ok(Html(render::register_page(user.as_ref(), Some(&e.to_string()))).into_response())
        }
        Err(e) => {
            tracing::error!(error = %e, "registration failed");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// GET /auth/login
pub async fn login_form_handler(
    Extension(db): Extension<DbHandle>,
    session: Session,
) -> Html<String> {
    let user = current_user(&session, &db).await;
    Html(render::login_page(user.as_ref(), None))
}

/// POST /auth/login
///
/// Success stores the user id in a fresh session and redirects to the index.
/// "Incorrect username." and "Incorrect password." are reported as distinct
/// notices, matching the original application.
pub async fn login_handler(
    Extension(db): Extension<DbHandle>,
    session: Session,
    Form(form): Form<CredentialsForm>,
) -> Result<Response, StatusCode> {
    let task_db = db.clone();
    let outcome = tokio::task::spawn_blocking(
        move || -> Result<Result<quill_auth::User, AuthError>, StatusCode> {
            task_db.with_db(|db| {
                let conn = db
                    .acquire()
                    .map_err(internal_error("open database for login"))?;
                Ok(quill_auth::authenticate(conn, &form.username, &form.password))
            })
        },
    )
    .await
    .map_err(internal_error("login task join"))??;

    match outcome {
        Ok(user) => {
            // Drop any previous identity before storing the new one.
            session.clear().await;
            session
                .insert(USER_ID_KEY, user.id)
                .await
                .map_err(internal_error("store session identity"))?;
            Ok(Redirect::to("/").into_response())
        }
        Err(e @ (AuthError::IncorrectUsername | AuthError::IncorrectPassword)) => {
            // A failed attempt does not touch the session; the page renders
            // with the identity it already holds, if any.
            let user = current_user(&session, &db).await;
            Ok(Html(render::login_page(user.as_ref(), Some(&e.to_string()))).into_response())
        }
        Err(e) => {
            tracing::error!(error = %e, "login failed");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// GET /auth/logout
pub async fn logout_handler(session: Session) -> Result<Response, StatusCode> {
    session
        .flush()
        .await
        .map_err(internal_error("clear session"))?;
    Ok(Redirect::to("/").into_response())
}
