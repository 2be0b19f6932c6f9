//! HTTP route handlers and the application router.

pub mod auth;
pub mod front;
pub mod helpers;
pub mod snippet;
pub mod static_files;

use std::time::Duration;

use axum::Router;
use axum::http::StatusCode;
use axum::response::Response;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tower_sessions::{SessionManagerLayer, SessionStore};

use crate::error::status_text_response;
use crate::middleware::{handle_panic, secure_headers};
use crate::state::AppState;

/// Template names for each page.
pub mod pages {
    pub const HOME: &str = "pages/home.html";
    pub const VIEW: &str = "pages/view.html";
    pub const CREATE: &str = "pages/create.html";
    pub const SIGNUP: &str = "pages/signup.html";
    pub const LOGIN: &str = "pages/login.html";
}

async fn not_found() -> Response {
    status_text_response(StatusCode::NOT_FOUND)
}

/// Build the full application router.
///
/// Middleware order (last added = first executed in request flow):
/// TraceLayer → secure headers → panic recovery → timeout → session → routes
pub fn app<S>(state: AppState, session_layer: SessionManagerLayer<S>, timeout: Duration) -> Router
where
    S: SessionStore + Clone,
{
    Router::new()
        .merge(front::router())
        .merge(snippet::router())
        .merge(auth::router())
        .merge(static_files::router())
        .fallback(not_found)
        .layer(session_layer)
        .layer(TimeoutLayer::new(timeout))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(axum::middleware::from_fn(secure_headers))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
