//! Form types for each submission use case.
//!
//! Each form derives `Deserialize` for the decoder and `Serialize` for the
//! template envelope. The embedded [`Validator`] is never read from input;
//! passwords are never written back into a rendered page.

use serde::{Deserialize, Serialize};

use crate::validator::{
    EMAIL_RX, Validatable, Validator, matches, max_chars, min_chars, not_blank, permitted_value,
};

/// Expiry choices offered on the create page, in days.
pub const PERMITTED_EXPIRY_DAYS: [i32; 3] = [1, 7, 365];

/// Expiry preselected on an empty create form.
pub const DEFAULT_EXPIRY_DAYS: i32 = 365;

pub const TITLE_MAX_CHARS: usize = 100;
pub const CONTENT_MAX_CHARS: usize = 400;
pub const PASSWORD_MIN_CHARS: usize = 8;

const BLANK: &str = "This field cannot be blank";

/// Create-snippet form.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct SnippetCreateForm {
    pub title: String,
    pub content: String,
    pub expires: i32,
    #[serde(skip_deserializing)]
    pub validator: Validator,
}

impl SnippetCreateForm {
    /// Empty form with the default expiry preselected.
    pub fn blank() -> Self {
        Self {
            expires: DEFAULT_EXPIRY_DAYS,
            ..Self::default()
        }
    }
}

impl Validatable for SnippetCreateForm {
    fn validator(&self) -> &Validator {
        &self.validator
    }

    fn validator_mut(&mut self) -> &mut Validator {
        &mut self.validator
    }

    fn validate(&mut self) {
        let v = &mut self.validator;
        v.check_field(not_blank(&self.title), "title", BLANK);
        v.check_field(
            max_chars(&self.title, TITLE_MAX_CHARS),
            "title",
            "This field cannot be more than 100 characters long",
        );
        v.check_field(not_blank(&self.content), "content", BLANK);
        v.check_field(
            max_chars(&self.content, CONTENT_MAX_CHARS),
            "content",
            "This field cannot be more than 400 characters long",
        );
        v.check_field(
            permitted_value(self.expires, &PERMITTED_EXPIRY_DAYS),
            "expires",
            "This field must equal 1, 7 or 365",
        );
    }
}

/// Signup form.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct UserSignupForm {
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    #[serde(skip_deserializing)]
    pub validator: Validator,
}

impl Validatable for UserSignupForm {
    fn validator(&self) -> &Validator {
        &self.validator
    }

    fn validator_mut(&mut self) -> &mut Validator {
        &mut self.validator
    }

    fn validate(&mut self) {
        let v = &mut self.validator;
        v.check_field(not_blank(&self.name), "name", BLANK);
        v.check_field(not_blank(&self.email), "email", BLANK);
        v.check_field(
            matches(&self.email, &EMAIL_RX),
            "email",
            "This field must be a valid email address",
        );
        v.check_field(not_blank(&self.password), "password", BLANK);
        v.check_field(
            min_chars(&self.password, PASSWORD_MIN_CHARS),
            "password",
            "This field must be at least 8 characters long",
        );
    }
}

/// Login form.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct UserLoginForm {
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    #[serde(skip_deserializing)]
    pub validator: Validator,
}

impl Validatable for UserLoginForm {
    fn validator(&self) -> &Validator {
        &self.validator
    }

    fn validator_mut(&mut self) -> &mut Validator {
        &mut self.validator
    }

    fn validate(&mut self) {
        let v = &mut self.validator;
        v.check_field(not_blank(&self.email), "email", BLANK);
        v.check_field(
            matches(&self.email, &EMAIL_RX),
            "email",
            "This field must be a valid email address",
        );
        v.check_field(not_blank(&self.password), "password", BLANK);
    }
}
