//! Core application layer
//!
//! This module provides:
//! - Configuration management
//! - Structured logging system
//! - Error handling and the HTTP error body
//! - Per-request deadline and cancellation

pub mod config;
pub mod context;
pub mod error;
pub mod logging;

pub use config::Config;
pub use context::{ContextError, RequestContext};
pub use error::{ApiError, ErrorResponse, Result};
pub use logging::Logger;
