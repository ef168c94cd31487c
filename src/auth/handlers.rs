//! Authentication API handlers

use crate::api::handlers::AppState;
use crate::auth::cookie::SessionCookieCodec;
use crate::auth::middleware::AuthUser;
use crate::auth::models::{LoginRequest, LoginResponse, MeResponse, RegisterRequest, SuccessResponse};
use crate::core::context::RequestContext;
use crate::core::error::{ApiError, Result};
use crate::db::store::{NewUser, StoreError};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};

/// Handler for POST /api/auth/register - User registration
pub async fn register(
    State(state): State<AppState>,
    ctx: RequestContext,
    payload: std::result::Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let req = json_body(payload)?;
    tracing::info!(username = %req.username, "User registration attempt");

    req.validate()
        .map_err(|msg| ApiError::InvalidRequest(msg.to_string()))?;

    let hasher = state.passwords.clone();
    let password = req.password;
    let password_hash = run_blocking(&ctx, move || hasher.hash(&password)).await??;

    let new_user = NewUser {
        username: req.username,
        password_hash,
        email: req.email,
    };
    let attempted = new_user.username.clone();

    match ctx.run(state.users.register_user(&ctx, new_user)).await? {
        Ok(username) => {
            tracing::info!(username = %username, "User registered successfully");
            Ok((
                StatusCode::CREATED,
                Json(SuccessResponse::new("user registration successful")),
            ))
        }
        Err(e) => {
            tracing::warn!(username = %attempted, error = %e, "Registration failed");
            Err(e.into())
        }
    }
}

/// Handler for POST /api/auth/login - User login
pub async fn login(
    State(state): State<AppState>,
    ctx: RequestContext,
    payload: std::result::Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let req = json_body(payload)?;
    tracing::info!(username = %req.username, "Login attempt");

    let credential = match ctx.run(state.users.get_user(&ctx, &req.username)).await? {
        Ok(credential) => credential,
        Err(StoreError::UserNotFound) => {
            tracing::warn!(username = %req.username, "Login for unknown user");
            // Same bcrypt work as a wrong password, so timing does not reveal the account.
            let hasher = state.passwords.clone();
            let candidate = req.password;
            let e = run_blocking(&ctx, move || hasher.reject_unknown(&candidate)).await?;
            return Err(e.into());
        }
        Err(e) => {
            tracing::warn!(username = %req.username, error = %e, "User lookup failed");
            return Err(e.into());
        }
    };

    let hasher = state.passwords.clone();
    let stored_hash = credential.password_hash;
    let candidate = req.password;
    if let Err(e) = run_blocking(&ctx, move || hasher.validate(&stored_hash, &candidate)).await? {
        tracing::warn!(username = %credential.username, error = %e, "Password check failed");
        return Err(e.into());
    }

    let (token, payload) = state
        .tokens
        .create_token(&credential.username, state.token_duration)?;

    let mut headers = HeaderMap::new();
    SessionCookieCodec::write(&mut headers, &token, payload.expires_at)
        .map_err(|e| ApiError::Internal(format!("failed to encode session cookie: {}", e)))?;

    tracing::info!(
        username = %credential.username,
        token_id = %payload.id,
        "Login successful"
    );

    Ok((
        headers,
        Json(LoginResponse {
            success: "login successful".to_string(),
            expires_at: payload.expires_at,
        }),
    ))
}

/// Handler for POST /api/auth/logout - drop the session cookie
pub async fn logout() -> Result<impl IntoResponse> {
    let mut headers = HeaderMap::new();
    SessionCookieCodec::clear(&mut headers)
        .map_err(|e| ApiError::Internal(format!("failed to encode session cookie: {}", e)))?;

    tracing::info!("Session cookie cleared");

    Ok((headers, Json(SuccessResponse::new("user successfully logged out"))))
}

/// Handler for GET /api/me - Get current user info
pub async fn get_me(user: AuthUser) -> Json<MeResponse> {
    tracing::debug!(username = %user.username, "Getting current user info");

    Json(MeResponse {
        username: user.username,
        expires_at: user.expires_at,
    })
}

/// Unwrap a JSON body, hiding the parser's detail from the client
fn json_body<T>(payload: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    match payload {
        Ok(Json(body)) => Ok(body),
        Err(rejection) => {
            tracing::debug!(error = %rejection.body_text(), "Rejected request body");
            Err(ApiError::InvalidRequest("request body is malformed".to_string()))
        }
    }
}

/// Run CPU-heavy work off the async workers, bounded by the request context
async fn run_blocking<T, F>(ctx: &RequestContext, f: F) -> Result<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    ctx.run(tokio::task::spawn_blocking(f))
        .await?
        .map_err(|e| ApiError::Internal(format!("blocking task failed: {}", e)))
}
