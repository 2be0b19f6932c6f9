//! Snippetbox web library.
//!
//! Exposes the server's internals for integration testing. The main entry
//! point for running the server is the `snippetbox` binary.

pub mod config;
pub mod db;
pub mod error;
pub mod form;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod session;
pub mod state;
pub mod theme;
pub mod validator;

pub use config::Config;
pub use state::AppState;
