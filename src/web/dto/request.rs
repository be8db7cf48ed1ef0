//! Request DTOs for the Web API.

use serde::Deserialize;

/// User registration request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    /// Requested username.
    pub username: String,
    /// Email address.
    pub email: String,
    /// Password.
    pub password: String,
    /// Password confirmation.
    pub confirm_password: String,
}

/// Login request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    /// Email address.
    pub email: String,
    /// Password.
    pub password: String,
    /// CAPTCHA solution, mandatory once the client IP has escalated.
    #[serde(default)]
    pub captcha_response: Option<String>,
}

/// Password reset request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    /// Account email address.
    pub email: String,
    /// New password.
    pub password: String,
    /// Password confirmation.
    pub confirm_password: String,
}
