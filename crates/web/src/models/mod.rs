//! Domain models and their stores.

pub mod error;
pub mod snippet;
pub mod user;

pub use error::{ModelError, ModelResult};
pub use snippet::{PgSnippetStore, Snippet, SnippetStore};
pub use user::{PgUserStore, User, UserStore};
