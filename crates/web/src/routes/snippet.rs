//! Snippet routes (view, create).

use axum::Router;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::get;
use tower_sessions::Session;
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::form::SnippetCreateForm;
use crate::session::put_flash;
use crate::state::AppState;
use crate::validator::Validatable;

use super::helpers::{decode_post_form, new_template_data, render, render_invalid};
use super::pages;

/// Show a single snippet.
///
/// GET /snippet/view/{id}
async fn view(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let id = match id.parse::<i64>() {
        Ok(id) if id >= 1 => id,
        _ => return Err(AppError::NotFound),
    };

    let snippet = state.snippets().get(id).await?;

    let data = new_template_data(&session).await?.with_snippet(snippet);
    render(&state, StatusCode::OK, pages::VIEW, &data)
}

/// Show the empty create form.
///
/// GET /snippet/create
async fn create_form(State(state): State<AppState>, session: Session) -> AppResult<Response> {
    let data = new_template_data(&session)
        .await?
        .with_form(&SnippetCreateForm::blank())?;
    render(&state, StatusCode::OK, pages::CREATE, &data)
}

/// Create a snippet.
///
/// POST /snippet/create
/// - 400 on a body that cannot be decoded
/// - 422 with the form re-rendered when a rule fails
/// - 303 to the new snippet on success, with a flash message
async fn create_submit(
    State(state): State<AppState>,
    session: Session,
    body: Bytes,
) -> AppResult<Response> {
    let mut form: SnippetCreateForm = decode_post_form(&body)?;

    form.validate();
    if !form.valid() {
        return render_invalid(&state, &session, pages::CREATE, &form).await;
    }

    let id = state
        .snippets()
        .insert(&form.title, &form.content, form.expires)
        .await?;

    put_flash(&session, "Snippet successfully created!").await?;

    info!(snippet_id = id, "snippet created");
    Ok(Redirect::to(&format!("/snippet/view/{id}")).into_response())
}

/// Create the snippet router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/snippet/view/{id}", get(view))
        .route("/snippet/create", get(create_form).post(create_submit))
}
