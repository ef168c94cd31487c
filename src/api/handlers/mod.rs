//! Shared handler state

use crate::auth::password::PasswordHasher;
use crate::auth::token::{SymmetricKey, TokenError, TokenManager};
use crate::core::config::AuthConfig;
use crate::db::store::UserStore;
use std::sync::Arc;
use std::time::Duration;

/// Shared application state for handlers
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub tokens: Arc<TokenManager>,
    pub passwords: Arc<PasswordHasher>,
    /// Lifetime of tokens issued at login
    pub token_duration: Duration,
}

impl AppState {
    /// Build the auth components described by `config` around `users`
    pub fn from_config(config: &AuthConfig, users: Arc<dyn UserStore>) -> Result<Self, TokenError> {
        let key = SymmetricKey::derive(&config.token_secret)?;

        Ok(Self {
            users,
            tokens: Arc::new(TokenManager::new(&key)),
            passwords: Arc::new(PasswordHasher::new(
                config.min_password_length,
                config.bcrypt_cost,
            )),
            token_duration: config.token_duration(),
        })
    }
}
