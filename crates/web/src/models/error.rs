//! Domain store errors.

use thiserror::Error;

/// Errors returned by the snippet and user stores.
///
/// `NoRecord`, `DuplicateEmail` and `InvalidCredentials` are expected outcomes
/// that handlers branch on; the remaining variants are store failures.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("no matching record found")]
    NoRecord,

    #[error("duplicate email")]
    DuplicateEmail,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("database error")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Result type alias using ModelError.
pub type ModelResult<T> = Result<T, ModelError>;
