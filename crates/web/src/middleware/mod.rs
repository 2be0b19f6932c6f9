//! HTTP middleware components.
//!
//! Response hardening headers and the panic-to-500 handler.

pub mod headers;
pub mod panic;

pub use headers::{CONTENT_SECURITY_POLICY, secure_headers};
pub use panic::handle_panic;
