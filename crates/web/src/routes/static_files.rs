//! Static file serving.

use axum::{
    Router,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use tokio::fs;
use tracing::warn;

use crate::error::status_text_response;
use crate::state::AppState;

/// Create the static files router.
pub fn router() -> Router<AppState> {
    Router::new().route("/static/{*path}", get(serve_static))
}

/// Serve a file from the configured static directory.
async fn serve_static(State(state): State<AppState>, Path(path): Path<String>) -> Response {
    // Security: prevent path traversal
    let path = path.trim_start_matches('/');
    if path.is_empty() || path.contains("..") || path.contains('\0') {
        return status_text_response(StatusCode::NOT_FOUND);
    }

    let file_path = state.static_dir().join(path);

    let content = match fs::read(&file_path).await {
        Ok(content) => content,
        Err(e) => {
            if !matches!(
                e.kind(),
                std::io::ErrorKind::NotFound | std::io::ErrorKind::IsADirectory
            ) {
                warn!(path = %file_path.display(), error = %e, "failed to read static file");
            }
            return status_text_response(StatusCode::NOT_FOUND);
        }
    };

    (
        [
            (header::CONTENT_TYPE, mime_from_path(&file_path)),
            (header::CACHE_CONTROL, "public, max-age=86400"),
        ],
        content,
    )
        .into_response()
}

fn mime_from_path(path: &std::path::Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("js") => "application/javascript",
        Some("css") => "text/css; charset=utf-8",
        Some("html") => "text/html; charset=utf-8",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("ico") => "image/x-icon",
        _ => "application/octet-stream",
    }
}
