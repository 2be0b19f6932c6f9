//! Shared route helpers for decoding submissions and rendering pages.

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use chrono::{Datelike, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tower_sessions::Session;

use crate::error::{AppError, AppResult};
use crate::form::{DecodeError, decode_form};
use crate::session::{authenticated_user_id, pop_flash};
use crate::state::AppState;
use crate::theme::TemplateData;

/// Build the envelope every page starts from.
///
/// Pops the pending flash message, so it is shown exactly once.
pub async fn new_template_data(session: &Session) -> AppResult<TemplateData> {
    let flash = pop_flash(session).await?;
    let is_authenticated = authenticated_user_id(session).await?.is_some();

    Ok(TemplateData {
        current_year: Utc::now().year(),
        flash,
        is_authenticated,
        ..TemplateData::default()
    })
}

/// Render `page` with `status`.
///
/// The page is rendered to a string first; only a complete page is sent.
pub fn render(
    state: &AppState,
    status: StatusCode,
    page: &str,
    data: &TemplateData,
) -> AppResult<Response> {
    let html = state.theme().render_page(page, data)?;
    Ok((status, Html(html)).into_response())
}

/// Re-render a form page at 422 with the form's values and errors.
pub async fn render_invalid<F: Serialize>(
    state: &AppState,
    session: &Session,
    page: &str,
    form: &F,
) -> AppResult<Response> {
    let data = new_template_data(session).await?.with_form(form)?;
    render(state, StatusCode::UNPROCESSABLE_ENTITY, page, &data)
}

/// Decode a urlencoded request body into a form.
///
/// Bad input becomes a 400. A form type the decoder cannot bind to is a
/// programming error and panics; the panic layer answers with a 500.
pub fn decode_post_form<T: DeserializeOwned>(body: &[u8]) -> AppResult<T> {
    match decode_form(body) {
        Ok(form) => Ok(form),
        Err(DecodeError::Malformed(detail)) => Err(AppError::BadRequest(detail)),
        Err(DecodeError::InvalidTarget(detail)) => {
            panic!("form type cannot be decoded: {detail}")
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::form::SnippetCreateForm;

    #[derive(Debug, Default, serde::Deserialize)]
    #[serde(default)]
    #[allow(dead_code)]
    struct ListForm {
        items: Vec<String>,
    }

    #[test]
    fn test_decode_post_form_ok() {
        let form: SnippetCreateForm = decode_post_form(b"title=A&content=B&expires=7").unwrap();
        assert_eq!(form.title, "A");
    }

    #[test]
    fn test_decode_post_form_malformed_is_bad_request() {
        let err = decode_post_form::<SnippetCreateForm>(b"expires=never").unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    #[should_panic(expected = "form type cannot be decoded")]
    fn test_decode_post_form_invalid_target_panics() {
        let _ = decode_post_form::<ListForm>(b"items=a");
    }
}
