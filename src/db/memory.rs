//! In-process user store

use crate::core::context::RequestContext;
use crate::db::store::{Credential, NewUser, StoreError, UserStore};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// [`UserStore`] backed by a map; usernames and emails are unique
#[derive(Debug, Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<String, Credential>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn register_user(&self, ctx: &RequestContext, user: NewUser) -> Result<String, StoreError> {
        ctx.check()?;

        let mut users = self.users.write().await;
        if users.contains_key(&user.username) || users.values().any(|c| c.email == user.email) {
            return Err(StoreError::AlreadyExists);
        }

        let username = user.username.clone();
        users.insert(
            user.username.clone(),
            Credential {
                username: user.username,
                password_hash: user.password_hash,
                email: user.email,
            },
        );
        Ok(username)
    }

    async fn get_user(&self, ctx: &RequestContext, username: &str) -> Result<Credential, StoreError> {
        ctx.check()?;

        self.users
            .read()
            .await
            .get(username)
            .cloned()
            .ok_or(StoreError::UserNotFound)
    }
}
