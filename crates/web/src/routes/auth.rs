//! Account routes (signup, login, logout).

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use tower_sessions::Session;
use tracing::info;

use crate::error::AppResult;
use crate::form::{UserLoginForm, UserSignupForm};
use crate::models::ModelError;
use crate::session::{SESSION_USER_ID, put_flash};
use crate::state::AppState;
use crate::validator::Validatable;

use super::helpers::{decode_post_form, new_template_data, render, render_invalid};
use super::pages;

/// Signup form handler.
///
/// GET /user/signup
async fn signup_form(State(state): State<AppState>, session: Session) -> AppResult<Response> {
    let data = new_template_data(&session)
        .await?
        .with_form(&UserSignupForm::default())?;
    render(&state, StatusCode::OK, pages::SIGNUP, &data)
}

/// Signup submission.
///
/// POST /user/signup
/// - A taken email is reported on the email field and takes the same 422
///   path as any other failed rule
async fn signup_submit(
    State(state): State<AppState>,
    session: Session,
    body: Bytes,
) -> AppResult<Response> {
    let mut form: UserSignupForm = decode_post_form(&body)?;

    form.validate();
    if !form.valid() {
        return render_invalid(&state, &session, pages::SIGNUP, &form).await;
    }

    match state
        .users()
        .insert(&form.name, &form.email, &form.password)
        .await
    {
        Ok(()) => {}
        Err(ModelError::DuplicateEmail) => {
            form.validator_mut()
                .add_field_error("email", "Email address is already in use");
            return render_invalid(&state, &session, pages::SIGNUP, &form).await;
        }
        Err(e) => return Err(e.into()),
    }

    put_flash(&session, "Your signup was successful. Please log in.").await?;

    info!("user signed up");
    Ok(Redirect::to("/user/login").into_response())
}

/// Login form handler.
///
/// GET /user/login
async fn login_form(State(state): State<AppState>, session: Session) -> AppResult<Response> {
    let data = new_template_data(&session)
        .await?
        .with_form(&UserLoginForm::default())?;
    render(&state, StatusCode::OK, pages::LOGIN, &data)
}

/// Login submission.
///
/// POST /user/login
/// - Renews the session id before storing the user id
async fn login_submit(
    State(state): State<AppState>,
    session: Session,
    body: Bytes,
) -> AppResult<Response> {
    let mut form: UserLoginForm = decode_post_form(&body)?;

    form.validate();
    if !form.valid() {
        return render_invalid(&state, &session, pages::LOGIN, &form).await;
    }

    let user_id = match state.users().authenticate(&form.email, &form.password).await {
        Ok(id) => id,
        Err(ModelError::InvalidCredentials) => {
            form.validator_mut()
                .add_non_field_error("Email or password is incorrect");
            return render_invalid(&state, &session, pages::LOGIN, &form).await;
        }
        Err(e) => return Err(e.into()),
    };

    session.cycle_id().await?;
    session.insert(SESSION_USER_ID, user_id).await?;

    info!(user_id, "user logged in");
    Ok(Redirect::to("/snippet/create").into_response())
}

/// Logout handler.
///
/// POST /user/logout
async fn logout(session: Session) -> AppResult<Response> {
    session.cycle_id().await?;
    session.remove::<i64>(SESSION_USER_ID).await?;

    put_flash(&session, "You've been logged out successfully!").await?;

    Ok(Redirect::to("/").into_response())
}

/// Create the account router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/user/signup", get(signup_form).post(signup_submit))
        .route("/user/login", get(login_form).post(login_submit))
        .route("/user/logout", post(logout))
}
