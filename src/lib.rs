//! Online Notes Server Library
//!
//! Authentication subsystem of the online notes service: session tokens,
//! password hashing, the session cookie and the middleware guarding the API.

pub mod api;
pub mod auth;
pub mod core;
pub mod db;

// Re-export commonly used types
pub use api::{ApiServer, AppState};
pub use crate::core::{Config, Logger};
pub use db::{MemoryUserStore, UserStore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Result type alias for the library
pub type Result<T> = anyhow::Result<T>;
