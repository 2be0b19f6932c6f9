//! User model, password hashing, and store.

use anyhow::Context;
use argon2::password_hash::SaltString;
use argon2::password_hash::rand_core::OsRng;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use super::error::{ModelError, ModelResult};

/// Name of the unique constraint on `users.email`.
pub const EMAIL_UNIQUE_CONSTRAINT: &str = "users_uc_email";

/// User record.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub hashed_password: String,
    pub created: DateTime<Utc>,
}

impl User {
    /// Verify a password against this user's hash.
    pub fn verify_password(&self, password: &str) -> bool {
        verify_password(&self.hashed_password, password)
    }
}

/// Persistence and authentication for users.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Create a user, hashing `password`.
    ///
    /// Fails with [`ModelError::DuplicateEmail`] when the email is taken.
    async fn insert(&self, name: &str, email: &str, password: &str) -> ModelResult<()>;

    /// Check credentials and return the user's id.
    ///
    /// Fails with [`ModelError::InvalidCredentials`] for an unknown email or a
    /// wrong password, without saying which.
    async fn authenticate(&self, email: &str, password: &str) -> ModelResult<i64>;
}

/// PostgreSQL-backed user store.
#[derive(Debug, Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_by_email(&self, email: &str) -> ModelResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, name, email, hashed_password, created FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn insert(&self, name: &str, email: &str, password: &str) -> ModelResult<()> {
        let password = password.to_owned();
        let hashed_password = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .context("password hashing task panicked")??;

        let result = sqlx::query(
            r#"
            INSERT INTO users (name, email, hashed_password, created)
            VALUES ($1, $2, $3, NOW())
            "#,
        )
        .bind(name)
        .bind(email)
        .bind(&hashed_password)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_duplicate_email(&e) => Err(ModelError::DuplicateEmail),
            Err(e) => Err(e.into()),
        }
    }

    async fn authenticate(&self, email: &str, password: &str) -> ModelResult<i64> {
        let Some(user) = self.find_by_email(email).await? else {
            return Err(ModelError::InvalidCredentials);
        };

        let password = password.to_owned();
        let id = user.id;
        let verified = tokio::task::spawn_blocking(move || user.verify_password(&password))
            .await
            .context("password verification task panicked")?;

        if verified {
            Ok(id)
        } else {
            Err(ModelError::InvalidCredentials)
        }
    }
}

fn is_duplicate_email(error: &sqlx::Error) -> bool {
    match error {
        sqlx::Error::Database(db_err) => {
            db_err.is_unique_violation() && db_err.constraint() == Some(EMAIL_UNIQUE_CONSTRAINT)
        }
        _ => false,
    }
}

/// Hash a password using Argon2id.
pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("failed to hash password: {e}"))?;

    Ok(hash.to_string())
}

/// Check `password` against a PHC-format hash.
pub fn verify_password(hash: &str, password: &str) -> bool {
    if hash.is_empty() {
        return false;
    }

    let Ok(parsed_hash) = PasswordHash::new(hash) else {
        return false;
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hashing() {
        let password = "test_password_123";
        let hash = hash_password(password).unwrap();

        assert!(hash.starts_with("$argon2"));
        assert!(verify_password(&hash, password));
        assert!(!verify_password(&hash, "wrong_password"));
    }

    #[test]
    fn test_verify_rejects_empty_and_garbage_hashes() {
        assert!(!verify_password("", "anything"));
        assert!(!verify_password("not-a-phc-string", "anything"));
    }

    #[test]
    fn test_user_serialization_hides_hash() {
        let user = User {
            id: 1,
            name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
            hashed_password: hash_password("pa55word").unwrap(),
            created: Utc::now(),
        };
        assert!(user.verify_password("pa55word"));

        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("hashed_password").is_none());
        assert_eq!(json["email"], "alice@example.com");
    }
}
