//! HTTP-facing error type
//!
//! Component errors (password, token, middleware, store, context) are closed
//! enums owned by their modules. This module is the single boundary that maps
//! them onto status codes. Client-visible messages are fixed strings; the
//! internal detail only goes to the log, tagged with the response trace id.

use crate::auth::middleware::AuthError;
use crate::auth::password::PasswordError;
use crate::auth::token::TokenError;
use crate::core::context::{current_trace_id, ContextError};
use crate::db::store::StoreError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Main error type returned by HTTP handlers
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Password shorter than {min} characters")]
    PasswordTooShort { min: usize },

    #[error("Authentication failed: {0}")]
    Unauthenticated(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidRequest(_) | ApiError::PasswordTooShort { .. } => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            ApiError::AlreadyExists(_) => StatusCode::FORBIDDEN,
            ApiError::Timeout(_) => StatusCode::REQUEST_TIMEOUT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error type name for API responses
    pub fn error_type(&self) -> &'static str {
        match self {
            ApiError::InvalidRequest(_) => "InvalidRequest",
            ApiError::PasswordTooShort { .. } => "InvalidRequest",
            ApiError::Unauthenticated(_) => "Unauthenticated",
            ApiError::AlreadyExists(_) => "AlreadyExists",
            ApiError::Timeout(_) => "Timeout",
            ApiError::Internal(_) => "InternalError",
        }
    }

    /// Message that is safe to show to the client
    pub fn public_message(&self) -> String {
        match self {
            // Validation messages are written by the handlers for the client.
            ApiError::InvalidRequest(msg) => msg.clone(),
            ApiError::PasswordTooShort { .. } => "password is too short".to_string(),
            ApiError::Unauthenticated(_) => "unauthenticated".to_string(),
            ApiError::AlreadyExists(_) => "username or email already in use".to_string(),
            ApiError::Timeout(_) => "request timed out".to_string(),
            ApiError::Internal(_) => "internal server error".to_string(),
        }
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        match err {
            PasswordError::TooShort { min } => ApiError::PasswordTooShort { min },
            PasswordError::Mismatch => ApiError::Unauthenticated(err.to_string()),
            PasswordError::HashingFailure(_) => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::InvalidToken | TokenError::ExpiredToken => {
                ApiError::Unauthenticated(err.to_string())
            }
            TokenError::InvalidRequest(_)
            | TokenError::InvalidKey(_)
            | TokenError::TokenCreationFailure(_) => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingToken => ApiError::Unauthenticated(err.to_string()),
            AuthError::Token(inner) => inner.into(),
        }
    }
}

impl From<ContextError> for ApiError {
    fn from(err: ContextError) -> Self {
        match err {
            ContextError::Cancelled | ContextError::DeadlineExceeded => {
                ApiError::Timeout(err.to_string())
            }
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::AlreadyExists => ApiError::AlreadyExists(err.to_string()),
            // Same answer as a wrong password so usernames cannot be enumerated.
            StoreError::UserNotFound => ApiError::Unauthenticated(err.to_string()),
            StoreError::DbInternal(_) => ApiError::Internal(err.to_string()),
            StoreError::Context(inner) => inner.into(),
        }
    }
}

/// Error response structure for API endpoints
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error type identifier
    pub error: String,
    /// Human-readable error message
    pub message: String,
    /// Unique trace ID for this error
    pub trace_id: String,
}

impl ErrorResponse {
    /// Create a new error response carrying the current request's trace ID
    pub fn new(error: String, message: String) -> Self {
        Self {
            error,
            message,
            trace_id: current_trace_id().unwrap_or_else(|| Uuid::new_v4().to_string()),
        }
    }

    /// Create an error response from an ApiError, without internal detail
    pub fn from_error(error: &ApiError) -> Self {
        Self::new(error.error_type().to_string(), error.public_message())
    }
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} (trace_id: {})", self.error, self.message, self.trace_id)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status_code = self.status_code();
        let error_response = ErrorResponse::from_error(&self);

        if status_code.is_server_error() {
            tracing::error!(
                error_type = self.error_type(),
                trace_id = %error_response.trace_id,
                status_code = %status_code,
                "Request failed: {}",
                self
            );
        } else {
            tracing::info!(
                error_type = self.error_type(),
                trace_id = %error_response.trace_id,
                status_code = %status_code,
                "Request rejected: {}",
                self
            );
        }

        (status_code, Json(error_response)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(
            ApiError::InvalidRequest("test".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::PasswordTooShort { min: 5 }.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Unauthenticated("test".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::AlreadyExists("test".into()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::Timeout("test".into()).status_code(),
            StatusCode::REQUEST_TIMEOUT
        );
        assert_eq!(
            ApiError::Internal("test".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_token_errors_are_indistinguishable_to_clients() {
        let invalid = ApiError::from(TokenError::InvalidToken);
        let expired = ApiError::from(TokenError::ExpiredToken);
        let missing = ApiError::from(AuthError::MissingToken);

        for err in [&invalid, &expired, &missing] {
            assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
            assert_eq!(err.public_message(), "unauthenticated");
        }
        // Internal text still differs for logging.
        assert_ne!(invalid.to_string(), expired.to_string());
    }

    #[test]
    fn test_unknown_user_and_wrong_password_look_the_same() {
        let unknown = ApiError::from(StoreError::UserNotFound);
        let mismatch = ApiError::from(PasswordError::Mismatch);

        assert_eq!(unknown.status_code(), mismatch.status_code());
        assert_eq!(unknown.public_message(), mismatch.public_message());
    }

    #[test]
    fn test_internal_detail_is_not_public() {
        let err = ApiError::from(PasswordError::HashingFailure("invalid cost 99".into()));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.public_message().contains("cost"));

        let response = ErrorResponse::from_error(&err);
        assert_eq!(response.error, "InternalError");
        assert_eq!(response.message, "internal server error");
        assert!(!response.trace_id.is_empty());
    }

    #[test]
    fn test_store_and_context_mapping() {
        assert_eq!(
            ApiError::from(StoreError::AlreadyExists).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::from(StoreError::DbInternal("disk full".into())).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::from(StoreError::Context(ContextError::DeadlineExceeded)).status_code(),
            StatusCode::REQUEST_TIMEOUT
        );
    }
}
