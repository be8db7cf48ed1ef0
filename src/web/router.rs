//! Router configuration for the Web API.

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use super::handlers::{
    forgot_password, login, logout, register, resend_verification, reset_password, verify_email,
    verify_reset_token, AppState,
};
use super::middleware::create_cors_layer;

/// Create the main API router.
pub fn create_router(app_state: Arc<AppState>, cors_origins: &[String]) -> Router {
    let auth_routes = Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/resend-verification", post(resend_verification))
        .route("/verify-email/:token", get(verify_email))
        .route("/forgot-password", post(forgot_password))
        .route("/verify-reset/:token", get(verify_reset_token))
        .route("/reset-password", post(reset_password));

    let api_routes = Router::new().nest("/auth", auth_routes);

    Router::new()
        .nest("/api", api_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(create_cors_layer(cors_origins)),
        )
        .with_state(app_state)
}

/// Create a health check router.
pub fn create_health_router() -> Router {
    Router::new().route("/health", get(health_check))
}

/// Health check handler.
async fn health_check() -> &'static str {
    "OK"
}
