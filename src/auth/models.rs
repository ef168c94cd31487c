//! Authentication request/response models

use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

pub const USERNAME_MIN_LENGTH: usize = 2;
pub const USERNAME_MAX_LENGTH: usize = 64;

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s.]+(\.[^@\s.]+)+$").unwrap();
}

/// Register request
#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub email: String,
}

impl RegisterRequest {
    /// Check username and email shape; password policy belongs to the hasher
    pub fn validate(&self) -> Result<(), &'static str> {
        validate_username(&self.username)?;
        if !EMAIL_RE.is_match(&self.email) {
            return Err("email is malformed");
        }
        Ok(())
    }
}

/// Login request
#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Login response
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub success: String,
    pub expires_at: DateTime<Utc>,
}

/// Identity of the authenticated caller
#[derive(Debug, Serialize, Deserialize)]
pub struct MeResponse {
    pub username: String,
    pub expires_at: DateTime<Utc>,
}

/// Generic success response
#[derive(Debug, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: String,
}

impl SuccessResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: message.into(),
        }
    }
}

fn validate_username(username: &str) -> Result<(), &'static str> {
    let len = username.chars().count();
    if !(USERNAME_MIN_LENGTH..=USERNAME_MAX_LENGTH).contains(&len) {
        return Err("username must be between 2 and 64 characters");
    }
    if username.chars().any(|c| c.is_control() || c.is_whitespace()) {
        return Err("username must consist of printable characters without spaces");
    }
    Ok(())
}
