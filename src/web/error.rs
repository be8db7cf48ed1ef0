//! API error handling.
//!
//! Every domain error is caught here, once, and mapped to the wire envelope
//! `{error, status, details?}`. Unexpected failures collapse into a generic
//! 500 with no detail leakage.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;

use crate::auth::{AuthError, FieldError};

/// Error response body: `{error, status, details?}`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Human-readable message.
    pub error: String,
    /// HTTP status code, mirrored in the body.
    pub status: u16,
    /// Optional structured details, usually field-level.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// API error type carried through handlers.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    details: Option<serde_json::Value>,
}

impl ApiError {
    /// Create an error without details.
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            details: None,
        }
    }

    /// Create an error carrying field-level details.
    pub fn with_fields(
        status: StatusCode,
        message: impl Into<String>,
        fields: Vec<FieldError>,
    ) -> Self {
        Self {
            status,
            message: message.into(),
            details: serde_json::to_value(fields).ok(),
        }
    }

    /// HTTP status of this error.
    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        let message = e.to_string();
        match e {
            AuthError::Validation(fields) | AuthError::Conflict(fields) => {
                ApiError::with_fields(StatusCode::BAD_REQUEST, message, fields)
            }
            AuthError::EmailNotVerified => ApiError::with_fields(
                StatusCode::BAD_REQUEST,
                message,
                vec![FieldError::new(
                    "request_new_verification",
                    "Request new verification email.",
                )],
            ),
            AuthError::TokenExpired => ApiError {
                status: StatusCode::BAD_REQUEST,
                message,
                details: Some(json!("token has expired")),
            },
            AuthError::NotFound(_)
            | AuthError::NotRegistered
            | AuthError::InvalidCredentials
            | AuthError::TokenMalformed
            | AuthError::TokenInvalid
            | AuthError::CaptchaRequired
            | AuthError::CaptchaInvalid => ApiError::new(StatusCode::BAD_REQUEST, message),
            AuthError::TooManyAttempts => ApiError::new(StatusCode::TOO_MANY_REQUESTS, message),
            AuthError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, message)
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.message,
            status: self.status.as_u16(),
            details: self.details,
        };
        (self.status, Json(body)).into_response()
    }
}
