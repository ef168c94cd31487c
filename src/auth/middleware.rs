//! Authentication middleware
//!
//! Gates protected routes on a valid session cookie. The only accepted
//! carrier is the `paseto` cookie; `Authorization` headers are ignored.

use crate::auth::cookie::SessionCookieCodec;
use crate::auth::token::{TokenError, TokenManager, TokenPayload};
use crate::core::error::ApiError;
use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

/// Verified identity bound to the request by [`authenticate`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthUser {
    pub username: String,
    pub token_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

impl From<TokenPayload> for AuthUser {
    fn from(payload: TokenPayload) -> Self {
        Self {
            username: payload.subject,
            token_id: payload.id,
            expires_at: payload.expires_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("missing session token")]
    MissingToken,

    #[error(transparent)]
    Token(#[from] TokenError),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        ApiError::from(self).into_response()
    }
}

/// State for the authentication middleware
#[derive(Clone)]
pub struct AuthGate {
    tokens: Arc<TokenManager>,
    max_token_lifetime: Duration,
}

impl AuthGate {
    /// Build a gate that accepts tokens living at most `identity_duration`
    pub fn new(tokens: Arc<TokenManager>, identity_duration: Duration) -> Self {
        Self {
            tokens,
            max_token_lifetime: identity_duration,
        }
    }

    /// Establish the caller's identity from the request headers
    pub fn admit(&self, headers: &HeaderMap) -> Result<AuthUser, AuthError> {
        let token = SessionCookieCodec::read(headers).ok_or(AuthError::MissingToken)?;
        let payload = self.tokens.verify_token(&token)?;

        // A lifetime beyond what this service issues means the token was not minted here.
        if let Ok(max) = chrono::Duration::from_std(self.max_token_lifetime) {
            if payload.lifetime() > max {
                tracing::warn!(
                    token_id = %payload.id,
                    "Rejected session token with oversized lifetime"
                );
                return Err(AuthError::Token(TokenError::InvalidToken));
            }
        }

        Ok(payload.into())
    }
}

/// Authentication middleware
pub async fn authenticate(
    State(gate): State<AuthGate>,
    mut request: Request,
    next: Next,
) -> Response {
    let user = match gate.admit(request.headers()) {
        Ok(user) => user,
        Err(e) => {
            match &e {
                AuthError::MissingToken => tracing::debug!("Request without session cookie"),
                AuthError::Token(TokenError::ExpiredToken) => {
                    tracing::info!("Request with expired session token")
                }
                AuthError::Token(_) => tracing::warn!("Request with invalid session token"),
            }
            return e.into_response();
        }
    };

    tracing::debug!(username = %user.username, token_id = %user.token_id, "Request authenticated");

    request.extensions_mut().insert(user);
    next.run(request).await
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(AuthError::MissingToken)
    }
}
