//! Snippetbox test utilities.
//!
//! In-memory stores that stand in for PostgreSQL in handler tests. Each
//! one records how it was called and can be switched into a failing mode.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use parking_lot::Mutex;

use snippetbox_web::models::user::{hash_password, verify_password};
use snippetbox_web::models::{ModelError, ModelResult, Snippet, SnippetStore, UserStore};

fn store_failure() -> ModelError {
    ModelError::Internal(anyhow::anyhow!("store unavailable"))
}

/// Snippet store backed by a vector.
#[derive(Debug, Default)]
pub struct MemorySnippetStore {
    snippets: Mutex<Vec<Snippet>>,
    insert_calls: AtomicUsize,
    failing: AtomicBool,
}

impl MemorySnippetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with an internal error.
    pub fn fail(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    /// Number of times `insert` was called, failed calls included.
    pub fn insert_calls(&self) -> usize {
        self.insert_calls.load(Ordering::SeqCst)
    }

    /// Snapshot of every stored snippet, expired ones included.
    pub fn all(&self) -> Vec<Snippet> {
        self.snippets.lock().clone()
    }

    /// Add a snippet directly, returning its id.
    pub fn seed(&self, title: &str, content: &str, expires_days: i64) -> i64 {
        let mut snippets = self.snippets.lock();
        let id = snippets.len() as i64 + 1;
        let created = Utc::now() + Duration::seconds(id);
        snippets.push(Snippet {
            id,
            title: title.to_string(),
            content: content.to_string(),
            created,
            expires: created + Duration::days(expires_days),
        });
        id
    }

    fn check(&self) -> ModelResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(store_failure());
        }
        Ok(())
    }
}

#[async_trait]
impl SnippetStore for MemorySnippetStore {
    async fn insert(&self, title: &str, content: &str, expires_days: i32) -> ModelResult<i64> {
        self.insert_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self.seed(title, content, i64::from(expires_days)))
    }

    async fn get(&self, id: i64) -> ModelResult<Snippet> {
        self.check()?;
        let now = Utc::now();
        self.snippets
            .lock()
            .iter()
            .find(|s| s.id == id && s.expires > now)
            .cloned()
            .ok_or(ModelError::NoRecord)
    }

    async fn latest(&self) -> ModelResult<Vec<Snippet>> {
        self.check()?;
        let now = Utc::now();
        let mut live: Vec<Snippet> = self
            .snippets
            .lock()
            .iter()
            .filter(|s| s.expires > now)
            .cloned()
            .collect();
        live.sort_by(|a, b| b.created.cmp(&a.created));
        live.truncate(snippetbox_web::models::snippet::LATEST_LIMIT as usize);
        Ok(live)
    }
}

#[derive(Debug, Clone)]
struct StoredUser {
    id: i64,
    email: String,
    hashed_password: String,
}

/// User store backed by a vector.
#[derive(Debug, Default)]
pub struct MemoryUserStore {
    users: Mutex<Vec<StoredUser>>,
    insert_calls: AtomicUsize,
    failing: AtomicBool,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with an internal error.
    pub fn fail(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    /// Number of times `insert` was called, failed calls included.
    pub fn insert_calls(&self) -> usize {
        self.insert_calls.load(Ordering::SeqCst)
    }

    /// Number of stored users.
    pub fn len(&self) -> usize {
        self.users.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check(&self) -> ModelResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(store_failure());
        }
        Ok(())
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn insert(&self, _name: &str, email: &str, password: &str) -> ModelResult<()> {
        self.insert_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;

        let hashed_password = hash_password(password)?;

        let mut users = self.users.lock();
        if users.iter().any(|u| u.email == email) {
            return Err(ModelError::DuplicateEmail);
        }
        let id = users.len() as i64 + 1;
        users.push(StoredUser {
            id,
            email: email.to_string(),
            hashed_password,
        });
        Ok(())
    }

    async fn authenticate(&self, email: &str, password: &str) -> ModelResult<i64> {
        self.check()?;

        let user = self
            .users
            .lock()
            .iter()
            .find(|u| u.email == email)
            .cloned()
            .ok_or(ModelError::InvalidCredentials)?;

        if verify_password(&user.hashed_password, password) {
            Ok(user.id)
        } else {
            Err(ModelError::InvalidCredentials)
        }
    }
}
