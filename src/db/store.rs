//! User store capability consumed by the authentication handlers

use crate::core::context::{ContextError, RequestContext};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("user already exists")]
    AlreadyExists,

    #[error("user not found")]
    UserNotFound,

    #[error("database error: {0}")]
    DbInternal(String),

    #[error(transparent)]
    Context(#[from] ContextError),
}

/// Stored login credential
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub username: String,
    pub password_hash: String,
    pub email: String,
}

/// User to register; the password is already hashed
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub email: String,
}

/// The subset of the note service the authentication flow depends on
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Persist a new user, returning its username
    async fn register_user(&self, ctx: &RequestContext, user: NewUser) -> Result<String, StoreError>;

    /// Look up the credential stored for `username`
    async fn get_user(&self, ctx: &RequestContext, username: &str) -> Result<Credential, StoreError>;
}
