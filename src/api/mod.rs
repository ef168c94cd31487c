//! REST API module
//!
//! This module provides the HTTP server and REST API endpoints including:
//! - API routing and shared handler state
//! - Request scope middleware (trace id, deadline, cancellation)
//! - Server startup and graceful shutdown

pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod server;

pub use handlers::AppState;
pub use middleware::{request_scope, TraceId, TRACE_ID_HEADER};
pub use server::ApiServer;
