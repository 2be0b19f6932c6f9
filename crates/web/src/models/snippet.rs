//! Snippet model and store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use super::error::{ModelError, ModelResult};

/// Number of snippets shown on the home page.
pub const LATEST_LIMIT: i64 = 10;

/// Snippet record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Snippet {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub created: DateTime<Utc>,
    pub expires: DateTime<Utc>,
}

/// Persistence for snippets.
///
/// Expired snippets are invisible to every read.
#[async_trait]
pub trait SnippetStore: Send + Sync {
    /// Insert a snippet that expires `expires_days` from now. Returns its id.
    async fn insert(&self, title: &str, content: &str, expires_days: i32) -> ModelResult<i64>;

    /// Fetch one unexpired snippet, or [`ModelError::NoRecord`].
    async fn get(&self, id: i64) -> ModelResult<Snippet>;

    /// The most recently created unexpired snippets, newest first.
    async fn latest(&self) -> ModelResult<Vec<Snippet>>;
}

/// PostgreSQL-backed snippet store.
#[derive(Debug, Clone)]
pub struct PgSnippetStore {
    pool: PgPool,
}

impl PgSnippetStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SnippetStore for PgSnippetStore {
    async fn insert(&self, title: &str, content: &str, expires_days: i32) -> ModelResult<i64> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO snippets (title, content, created, expires)
            VALUES ($1, $2, NOW(), NOW() + make_interval(days => $3))
            RETURNING id
            "#,
        )
        .bind(title)
        .bind(content)
        .bind(expires_days)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    async fn get(&self, id: i64) -> ModelResult<Snippet> {
        sqlx::query_as::<_, Snippet>(
            r#"
            SELECT id, title, content, created, expires
            FROM snippets
            WHERE expires > NOW() AND id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(ModelError::NoRecord)
    }

    async fn latest(&self) -> ModelResult<Vec<Snippet>> {
        let snippets = sqlx::query_as::<_, Snippet>(
            r#"
            SELECT id, title, content, created, expires
            FROM snippets
            WHERE expires > NOW()
            ORDER BY id DESC
            LIMIT $1
            "#,
        )
        .bind(LATEST_LIMIT)
        .fetch_all(&self.pool)
        .await?;

        Ok(snippets)
    }
}
