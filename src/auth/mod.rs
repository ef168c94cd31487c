//! Authentication module
//!
//! This module provides authentication functionality including:
//! - Password hashing and verification
//! - Session token issuance and verification
//! - The session cookie codec
//! - Authentication middleware
//! - Registration, login and logout handlers

pub mod cookie;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod password;
pub mod token;

pub use cookie::{SessionCookieCodec, SESSION_COOKIE_NAME};
pub use handlers::{get_me, login, logout, register};
pub use middleware::{authenticate, AuthError, AuthGate, AuthUser};
pub use password::{PasswordError, PasswordHasher};
pub use token::{Clock, SymmetricKey, SystemClock, TokenError, TokenManager, TokenPayload};
