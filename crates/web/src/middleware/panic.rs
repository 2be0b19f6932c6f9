//! Converts handler panics into a plain 500 response.

use std::any::Any;

use axum::http::{HeaderValue, StatusCode, header};
use axum::response::Response;
use tracing::error;

use crate::error::status_text_response;

/// Panic handler for `CatchPanicLayer::custom`.
///
/// The panic payload is logged, never sent to the client. The connection
/// is closed after the response.
pub fn handle_panic(payload: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else {
        "unknown panic payload"
    };

    error!(panic = %detail, "request handler panicked");

    let mut response = status_text_response(StatusCode::INTERNAL_SERVER_ERROR);
    response
        .headers_mut()
        .insert(header::CONNECTION, HeaderValue::from_static("close"));
    response
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_panic_hides_payload() {
        let response = handle_panic(Box::new(String::from("secret detail")));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.headers().get(header::CONNECTION).unwrap(), "close");
    }

    #[test]
    fn test_handle_panic_str_payload() {
        let response = handle_panic(Box::new("boom"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
