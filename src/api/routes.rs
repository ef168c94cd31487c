//! API routes

use crate::api::handlers::AppState;
use crate::auth::handlers::{get_me, login, logout, register};
use crate::auth::middleware::{authenticate, AuthGate};
use axum::{
    middleware,
    routing::{get, post},
    Router,
};

/// Build the API routes
///
/// Routes under the authentication gate only admit tokens whose lifetime does
/// not exceed the lifetime this server issues.
pub fn build_api_routes(state: AppState) -> Router {
    let gate = AuthGate::new(state.tokens.clone(), state.token_duration);

    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/logout", post(logout));

    // Protected routes (authentication required)
    let protected_routes = Router::new()
        .route("/api/me", get(get_me))
        .route_layer(middleware::from_fn_with_state(gate, authenticate));

    public_routes
        .merge(protected_routes)
        .with_state(state)
}
