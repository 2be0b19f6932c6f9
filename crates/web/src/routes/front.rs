//! Front page.

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::get;
use tower_sessions::Session;

use crate::error::AppResult;
use crate::state::AppState;

use super::helpers::{new_template_data, render};
use super::pages;

/// Latest snippets.
///
/// GET /
async fn home(State(state): State<AppState>, session: Session) -> AppResult<Response> {
    let snippets = state.snippets().latest().await?;

    let data = new_template_data(&session).await?.with_snippets(snippets);
    render(&state, StatusCode::OK, pages::HOME, &data)
}

/// Create the front page router.
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(home))
}
