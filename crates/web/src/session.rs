//! Session management using Redis, plus the one-shot flash message.

use anyhow::{Context, Result};
use fred::prelude::*;
use tower_sessions::cookie::SameSite;
use tower_sessions::cookie::time::Duration;
use tower_sessions::{Expiry, Session, SessionManagerLayer};
use tower_sessions_redis_store::RedisStore;

use crate::config::Config as AppConfig;

/// Session key for the one-shot flash message.
pub const SESSION_FLASH: &str = "flash";

/// Session key for the authenticated user's id.
pub const SESSION_USER_ID: &str = "authenticated_user_id";

/// Parse a SameSite policy name; anything unrecognized is treated as strict.
pub fn same_site_from_str(value: &str) -> SameSite {
    match value {
        "lax" => SameSite::Lax,
        "none" => SameSite::None,
        _ => SameSite::Strict,
    }
}

/// Create the session layer using Redis as the backend.
pub async fn create_session_layer(
    config: &AppConfig,
) -> Result<SessionManagerLayer<RedisStore<Pool>>> {
    let redis_config = Config::from_url(&config.redis_url).context("failed to parse Redis URL")?;

    let pool = Builder::from_config(redis_config)
        .build_pool(1)
        .context("failed to create Redis pool")?;

    pool.init()
        .await
        .context("failed to connect to Redis for sessions")?;

    let store = RedisStore::new(pool);

    let session_layer = SessionManagerLayer::new(store)
        .with_secure(config.cookie_secure)
        .with_http_only(true)
        .with_same_site(same_site_from_str(&config.cookie_same_site))
        .with_expiry(Expiry::OnInactivity(Duration::hours(
            config.session_lifetime_hours,
        )));

    Ok(session_layer)
}

/// Store a flash message for the next page that renders.
pub async fn put_flash(
    session: &Session,
    message: &str,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(SESSION_FLASH, message).await
}

/// Take the pending flash message, clearing it from the session.
pub async fn pop_flash(session: &Session) -> Result<Option<String>, tower_sessions::session::Error> {
    session.remove::<String>(SESSION_FLASH).await
}

/// The id of the logged-in user, if any.
pub async fn authenticated_user_id(
    session: &Session,
) -> Result<Option<i64>, tower_sessions::session::Error> {
    session.get::<i64>(SESSION_USER_ID).await
}
