//! Field validation predicates and the error accumulator embedded in forms.
//!
//! The predicates are pure functions with no shared state. Forms own a
//! [`Validator`] by composition and expose it through [`Validatable`], so a
//! handler can run the checks, test validity, and add errors it only learns
//! about after a store round-trip (duplicate email, bad credentials).

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

/// Email shape accepted on signup and login.
///
/// Anchored at both ends, so a match covers the whole input.
///
/// # Panics
///
/// Panics if the hard-coded regex literal is invalid.
#[allow(clippy::expect_used)]
pub static EMAIL_RX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
    )
    .expect("valid regex literal")
});

/// Accumulated validation errors for one form submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Validator {
    /// Errors that belong to the form as a whole.
    pub non_field_errors: Vec<String>,
    /// One message per field name.
    pub field_errors: BTreeMap<String, String>,
}

impl Validator {
    /// True when no field or non-field error has been recorded.
    pub fn valid(&self) -> bool {
        self.field_errors.is_empty() && self.non_field_errors.is_empty()
    }

    /// Record an error for `key`. The first message for a field wins.
    pub fn add_field_error(&mut self, key: impl Into<String>, message: impl Into<String>) {
        self.field_errors
            .entry(key.into())
            .or_insert_with(|| message.into());
    }

    /// Record an error that is not tied to a single field.
    pub fn add_non_field_error(&mut self, message: impl Into<String>) {
        self.non_field_errors.push(message.into());
    }

    /// Record `message` against `key` only when `ok` is false.
    pub fn check_field(&mut self, ok: bool, key: &str, message: &str) {
        if !ok {
            self.add_field_error(key, message);
        }
    }

    /// Message recorded for `key`, if any.
    pub fn field_error(&self, key: &str) -> Option<&str> {
        self.field_errors.get(key).map(String::as_str)
    }
}

/// A form that carries a [`Validator`] and knows its own rules.
pub trait Validatable {
    fn validator(&self) -> &Validator;

    fn validator_mut(&mut self) -> &mut Validator;

    /// Run every rule for this form, in a fixed order.
    fn validate(&mut self);

    fn valid(&self) -> bool {
        self.validator().valid()
    }
}

/// False when `value` is empty after trimming whitespace.
pub fn not_blank(value: &str) -> bool {
    !value.trim().is_empty()
}

/// False when `value` holds more than `n` characters.
pub fn max_chars(value: &str, n: usize) -> bool {
    value.chars().count() <= n
}

/// False when `value` holds fewer than `n` characters.
pub fn min_chars(value: &str, n: usize) -> bool {
    value.chars().count() >= n
}

/// True when `value` equals one of `permitted`.
pub fn permitted_value<T: PartialEq>(value: T, permitted: &[T]) -> bool {
    permitted.contains(&value)
}

/// True when `value` matches `rx`.
pub fn matches(value: &str, rx: &Regex) -> bool {
    rx.is_match(value)
}
