//! Submitted forms: urlencoded decoding and the typed form for each use case.
//!
//! A submission handler decodes the body with [`decode_form`], runs the form's
//! rules through [`crate::validator::Validatable`], then either persists the
//! result or re-renders the page with the accumulated errors.

mod decode;
mod types;

pub use decode::{DecodeError, decode_form, parse_pairs};
pub use types::{
    CONTENT_MAX_CHARS, DEFAULT_EXPIRY_DAYS, PASSWORD_MIN_CHARS, PERMITTED_EXPIRY_DAYS,
    SnippetCreateForm, TITLE_MAX_CHARS, UserLoginForm, UserSignupForm,
};
