//! Application error types.
//!
//! Every handler failure funnels through [`AppError`]'s `IntoResponse`, which
//! is the single place that logs server-side detail and picks the response.
//! Bodies only ever carry the canonical status text.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::models::ModelError;
use crate::theme::RenderError;

/// Application errors.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("internal server error")]
    Internal(#[from] anyhow::Error),

    #[error("not found")]
    NotFound,

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("database error")]
    Database(#[from] sqlx::Error),

    #[error("render error")]
    Render(#[from] RenderError),

    #[error("session error")]
    Session(#[from] tower_sessions::session::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(_)
            | AppError::Database(_)
            | AppError::Render(_)
            | AppError::Session(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ModelError> for AppError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::NoRecord => AppError::NotFound,
            ModelError::Database(e) => AppError::Database(e),
            other => AppError::Internal(anyhow::Error::new(other)),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal(anyhow::Error::new(err).context("failed to serialize template data"))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        match &self {
            AppError::Internal(e) => tracing::error!(error = ?e, "internal server error"),
            AppError::Database(e) => tracing::error!(error = %e, "database error"),
            AppError::Render(e) => tracing::error!(error = ?e, "render error"),
            AppError::Session(e) => tracing::error!(error = %e, "session error"),
            AppError::BadRequest(detail) => tracing::debug!(%detail, "bad request"),
            AppError::NotFound => {}
        }

        status_text_response(status)
    }
}

/// A plain-text response carrying only the status line's reason phrase.
pub fn status_text_response(status: StatusCode) -> Response {
    let text = status.canonical_reason().unwrap_or("Error");
    (status, text.to_string()).into_response()
}

/// Result type alias using AppError.
pub type AppResult<T> = Result<T, AppError>;
