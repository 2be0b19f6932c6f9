//! Application state shared across all handlers.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use crate::config::Config;
use crate::db;
use crate::models::{PgSnippetStore, PgUserStore, SnippetStore, UserStore};
use crate::theme::ThemeEngine;

/// Shared application state.
///
/// Built once at startup and handed to every handler through axum's `State`
/// extractor. Wrapped in Arc internally so Clone is cheap.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Snippet persistence.
    snippets: Arc<dyn SnippetStore>,

    /// User persistence and authentication.
    users: Arc<dyn UserStore>,

    /// Theme engine for page rendering.
    theme: Arc<ThemeEngine>,

    /// Directory served under /static.
    static_dir: PathBuf,
}

impl AppState {
    /// Connect to PostgreSQL, apply migrations, and load templates.
    pub async fn new(config: &Config) -> Result<Self> {
        let pool = db::create_pool(config)
            .await
            .context("failed to create database pool")?;

        db::run_migrations(&pool)
            .await
            .context("failed to run migrations")?;

        info!("database migrations applied");

        let theme = ThemeEngine::new(&config.templates_dir).with_context(|| {
            format!(
                "failed to load templates from {}",
                config.templates_dir.display()
            )
        })?;

        Ok(Self::from_parts(
            Arc::new(PgSnippetStore::new(pool.clone())),
            Arc::new(PgUserStore::new(pool)),
            Arc::new(theme),
            config.static_dir.clone(),
        ))
    }

    /// Assemble state from already-built parts.
    pub fn from_parts(
        snippets: Arc<dyn SnippetStore>,
        users: Arc<dyn UserStore>,
        theme: Arc<ThemeEngine>,
        static_dir: PathBuf,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                snippets,
                users,
                theme,
                static_dir,
            }),
        }
    }

    pub fn snippets(&self) -> &Arc<dyn SnippetStore> {
        &self.inner.snippets
    }

    pub fn users(&self) -> &Arc<dyn UserStore> {
        &self.inner.users
    }

    pub fn theme(&self) -> &ThemeEngine {
        &self.inner.theme
    }

    pub fn static_dir(&self) -> &Path {
        &self.inner.static_dir
    }
}
