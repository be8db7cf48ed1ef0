//! Authentication handlers.
//!
//! One handler per operation. The login handler additionally owns the abuse
//! policy: CAPTCHA gating before credentials, failure budget accounting, and
//! counter reset on success.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use axum_extra::extract::CookieJar;
use std::sync::Arc;

use crate::auth::{
    AccountService, AuthError, CaptchaVerifier, CounterKind, PublicUser, RateLimiter,
    RegisterParams, ResetPasswordParams, SessionManager,
};
use crate::web::dto::{ApiResponse, LoginRequest, RegisterRequest, ResetPasswordRequest};
use crate::web::error::ApiError;
use crate::web::middleware::ClientIp;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Account lifecycle engine.
    pub accounts: AccountService,
    /// Session issuance.
    pub sessions: SessionManager,
    /// Per-IP abuse guard.
    pub guard: Arc<dyn RateLimiter>,
    /// CAPTCHA verifier.
    pub captcha: Arc<dyn CaptchaVerifier>,
}

/// POST /api/auth/register - Create a new account.
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<()>>), ApiError> {
    state
        .accounts
        .register(&RegisterParams {
            username: req.username,
            email: req.email,
            password: req.password,
            confirm_password: req.confirm_password,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::message("Registration successfully", 201)),
    ))
}

/// POST /api/auth/login - Validate credentials and issue a session cookie.
pub async fn login(
    State(state): State<Arc<AppState>>,
    ClientIp(ip): ClientIp,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<(CookieJar, Json<ApiResponse<PublicUser>>), ApiError> {
    // Once the escalation budget is exhausted, a CAPTCHA solution is
    // mandatory before credentials are even looked at.
    let captcha_required = state.guard.peek(CounterKind::CaptchaEscalation, &ip) == 0;
    if captcha_required {
        let Some(solution) = req.captcha_response.as_deref() else {
            return Err(AuthError::CaptchaRequired.into());
        };
        if !state.captcha.verify(solution).await {
            return Err(AuthError::CaptchaInvalid.into());
        }
    }

    match state.accounts.login(&req.email, &req.password).await {
        Ok(user) => {
            state.guard.reset(&ip);
            let token = state
                .sessions
                .issue(user.id, &user.email, &user.username)
                .map_err(|e| AuthError::Internal(e.to_string()))?;
            let jar = jar.add(state.sessions.session_cookie(token));
            Ok((jar, Json(ApiResponse::new("Login successfully", 200, user))))
        }
        Err(AuthError::InvalidCredentials) => {
            // Charge the failure budget; at or past capacity the outcome
            // hardens into TooManyAttempts and one escalation is charged
            // (skipped when a CAPTCHA was already demanded this attempt,
            // to avoid a double penalty).
            let exhausted = match state.guard.consume(CounterKind::LoginFailure, &ip) {
                Ok(remaining) => remaining == 0,
                Err(_) => true,
            };
            if exhausted {
                if !captcha_required {
                    let _ = state.guard.consume(CounterKind::CaptchaEscalation, &ip);
                }
                tracing::warn!(ip = %ip, "Login failure budget exhausted");
                return Err(AuthError::TooManyAttempts.into());
            }
            Err(AuthError::InvalidCredentials.into())
        }
        Err(e) => Err(e.into()),
    }
}

/// POST /api/auth/logout - Revoke the session cookie.
pub async fn logout(jar: CookieJar, State(state): State<Arc<AppState>>) -> (CookieJar, Json<ApiResponse<()>>) {
    let jar = jar.add(state.sessions.revocation_cookie());
    (jar, Json(ApiResponse::message("Logout success", 200)))
}

/// POST /api/auth/resend-verification - Mail a fresh verification link.
///
/// The body is the bare email address as a JSON string.
pub async fn resend_verification(
    State(state): State<Arc<AppState>>,
    ClientIp(ip): ClientIp,
    Json(email): Json<String>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    if state.guard.consume(CounterKind::EmailRequest, &ip).is_err() {
        tracing::warn!(ip = %ip, "Email request budget exhausted");
        return Err(AuthError::TooManyAttempts.into());
    }

    state.accounts.resend_verification(&email).await?;
    Ok(Json(ApiResponse::message(
        "Resend verification successfully, Please check your email.",
        200,
    )))
}

/// GET /api/auth/verify-email/{token} - Consume a verification token.
pub async fn verify_email(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    state.accounts.verify_email(&token).await?;
    Ok(Json(ApiResponse::message("Email verified successfully", 200)))
}

/// POST /api/auth/forgot-password - Start the password reset flow.
///
/// The body is the bare email address as a JSON string.
pub async fn forgot_password(
    State(state): State<Arc<AppState>>,
    ClientIp(ip): ClientIp,
    Json(email): Json<String>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    if state.guard.consume(CounterKind::EmailRequest, &ip).is_err() {
        tracing::warn!(ip = %ip, "Email request budget exhausted");
        return Err(AuthError::TooManyAttempts.into());
    }

    state.accounts.forgot_password(&email).await?;
    Ok(Json(ApiResponse::message(
        "Please check your email for reset password.",
        200,
    )))
}

/// GET /api/auth/verify-reset/{token} - Read-only reset token check.
pub async fn verify_reset_token(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> Result<Json<ApiResponse<String>>, ApiError> {
    let email = state.accounts.verify_reset_token(&token).await?;
    Ok(Json(ApiResponse::new(
        "Verify token success, please update your password",
        200,
        email,
    )))
}

/// POST /api/auth/reset-password - Set a new password.
pub async fn reset_password(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ResetPasswordRequest>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    state
        .accounts
        .reset_password(&ResetPasswordParams {
            email: req.email,
            password: req.password,
            confirm_password: req.confirm_password,
        })
        .await?;

    Ok(Json(ApiResponse::message(
        "Update password successfully, please login.",
        200,
    )))
}
