//! Theme engine with Tera templates.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tera::Tera;
use thiserror::Error;
use tracing::debug;

use super::data::TemplateData;

/// Page rendering failure. Both variants are server errors.
#[derive(Debug, Error)]
pub enum RenderError {
    /// A handler asked for a page that has no template.
    #[error("the template {0} does not exist")]
    MissingTemplate(String),

    #[error("failed to build template context")]
    Context(#[source] tera::Error),

    #[error("failed to render template {page}")]
    Execute {
        page: String,
        #[source]
        source: tera::Error,
    },
}

/// Theme engine for rendering pages.
///
/// Templates are parsed once at startup; rendering produces a complete
/// `String`, so a failure never leaves a half-written response behind.
pub struct ThemeEngine {
    tera: Tera,
}

impl ThemeEngine {
    /// Create a new theme engine loading templates from the given directory.
    pub fn new(template_dir: &Path) -> Result<Self> {
        let pattern = template_dir.join("**/*.html");
        let pattern_str = pattern
            .to_str()
            .context("invalid template directory path")?;

        let mut tera = Tera::new(pattern_str).context("failed to initialize Tera templates")?;
        Self::register_filters(&mut tera);

        let template_names: Vec<_> = tera.get_template_names().collect();
        debug!(count = template_names.len(), "loaded templates");

        Ok(Self { tera })
    }

    /// Create a theme engine from in-memory `(name, source)` templates.
    pub fn from_raw(templates: &[(&str, &str)]) -> Result<Self> {
        let mut tera = Tera::default();
        tera.autoescape_on(vec![".html"]);
        tera.add_raw_templates(templates.iter().copied())
            .context("failed to parse templates")?;
        Self::register_filters(&mut tera);
        Ok(Self { tera })
    }

    /// Register custom Tera filters.
    fn register_filters(tera: &mut Tera) {
        // RFC 3339 timestamp -> "02 Jan 2006 at 15:04" (UTC)
        tera.register_filter(
            "human_date",
            |value: &tera::Value, _args: &HashMap<String, tera::Value>| {
                let raw = tera::try_get_value!("human_date", "value", String, value);
                let formatted = DateTime::parse_from_rfc3339(&raw)
                    .map(|dt| human_date(dt.with_timezone(&Utc)))
                    .unwrap_or_default();
                Ok(tera::Value::String(formatted))
            },
        );
    }

    /// Whether a template named `page` has been loaded.
    pub fn has_page(&self, page: &str) -> bool {
        self.tera.get_template_names().any(|name| name == page)
    }

    /// Render the template `page` against `data`.
    pub fn render_page(&self, page: &str, data: &TemplateData) -> Result<String, RenderError> {
        if !self.has_page(page) {
            return Err(RenderError::MissingTemplate(page.to_string()));
        }

        let context = tera::Context::from_serialize(data).map_err(RenderError::Context)?;

        self.tera
            .render(page, &context)
            .map_err(|source| RenderError::Execute {
                page: page.to_string(),
                source,
            })
    }
}

impl std::fmt::Debug for ThemeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThemeEngine")
            .field("template_count", &self.tera.get_template_names().count())
            .finish()
    }
}

/// Format a timestamp the way pages display dates.
pub fn human_date(t: DateTime<Utc>) -> String {
    t.format("%d %b %Y at %H:%M").to_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    use crate::models::Snippet;

    fn engine() -> ThemeEngine {
        ThemeEngine::from_raw(&[
            ("base.html", "<title>{% block title %}{% endblock %}</title>{% block main %}{% endblock %}"),
            (
                "pages/view.html",
                "{% extends \"base.html\" %}{% block title %}#{{ snippet.id }}{% endblock %}{% block main %}<h2>{{ snippet.title }}</h2><time>{{ snippet.created | human_date }}</time>{% if flash %}<p>{{ flash }}</p>{% endif %}{% endblock %}",
            ),
            ("pages/broken.html", "{{ missing_variable.field }}"),
        ])
        .unwrap()
    }

    fn snippet() -> Snippet {
        Snippet {
            id: 3,
            title: "<An old silent pond>".to_string(),
            content: "A frog jumps into the pond".to_string(),
            created: Utc.with_ymd_and_hms(2025, 2, 15, 9, 30, 0).unwrap(),
            expires: Utc.with_ymd_and_hms(2026, 2, 15, 9, 30, 0).unwrap(),
        }
    }

    #[test]
    fn test_human_date() {
        let t = Utc.with_ymd_and_hms(2024, 3, 17, 10, 15, 0).unwrap();
        assert_eq!(human_date(t), "17 Mar 2024 at 10:15");
    }

    #[test]
    fn test_render_page_with_filter_and_escaping() {
        let data = TemplateData {
            snippet: Some(snippet()),
            flash: Some("Snippet successfully created!".to_string()),
            ..TemplateData::default()
        };

        let html = engine().render_page("pages/view.html", &data).unwrap();
        assert!(html.contains("<title>#3</title>"));
        assert!(html.contains("&lt;An old silent pond&gt;"));
        assert!(html.contains("<time>15 Feb 2025 at 09:30</time>"));
        assert!(html.contains("<p>Snippet successfully created!</p>"));
    }

    #[test]
    fn test_render_is_deterministic() {
        let engine = engine();
        let data = TemplateData {
            current_year: 2025,
            snippet: Some(snippet()),
            ..TemplateData::default()
        };

        let first = engine.render_page("pages/view.html", &data).unwrap();
        let second = engine.render_page("pages/view.html", &data).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_missing_template_is_an_error() {
        let err = engine()
            .render_page("pages/nope.html", &TemplateData::default())
            .unwrap_err();
        assert!(matches!(err, RenderError::MissingTemplate(ref page) if page == "pages/nope.html"));
        assert_eq!(err.to_string(), "the template pages/nope.html does not exist");
    }

    #[test]
    fn test_has_page() {
        let engine = engine();
        assert!(engine.has_page("pages/view.html"));
        assert!(!engine.has_page("pages/home.html"));
        assert!(matches!(
            engine.render_page("pages/home.html", &TemplateData::default()),
            Err(RenderError::MissingTemplate(_))
        ));
    }

    #[test]
    fn test_execution_failure_is_an_error() {
        let err = engine()
            .render_page("pages/broken.html", &TemplateData::default())
            .unwrap_err();
        assert!(matches!(err, RenderError::Execute { .. }), "{err:?}");
    }
}
