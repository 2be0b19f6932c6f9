//! The data envelope passed to every page render.

use serde::Serialize;

use crate::models::Snippet;

/// Everything a page template can see.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TemplateData {
    pub current_year: i32,
    /// One-shot notice popped from the session for this request.
    pub flash: Option<String>,
    pub is_authenticated: bool,
    /// The form being shown, with its values and accumulated errors.
    pub form: Option<serde_json::Value>,
    pub snippet: Option<Snippet>,
    pub snippets: Vec<Snippet>,
}

impl TemplateData {
    /// Attach a form to the envelope.
    pub fn with_form<F: Serialize>(mut self, form: &F) -> Result<Self, serde_json::Error> {
        self.form = Some(serde_json::to_value(form)?);
        Ok(self)
    }

    pub fn with_snippet(mut self, snippet: Snippet) -> Self {
        self.snippet = Some(snippet);
        self
    }

    pub fn with_snippets(mut self, snippets: Vec<Snippet>) -> Self {
        self.snippets = snippets;
        self
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::form::SnippetCreateForm;
    use crate::validator::Validatable;

    #[test]
    fn test_with_form_carries_values_and_errors() {
        let mut form = SnippetCreateForm {
            title: String::new(),
            content: "body".to_string(),
            expires: 7,
            ..Default::default()
        };
        form.validate();

        let data = TemplateData::default().with_form(&form).unwrap();
        let value = data.form.unwrap();
        assert_eq!(value["content"], "body");
        assert_eq!(value["expires"], 7);
        assert_eq!(
            value["validator"]["field_errors"]["title"],
            "This field cannot be blank"
        );
    }
}
