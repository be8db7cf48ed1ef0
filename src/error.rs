//! Error types for gatehouse.

use thiserror::Error;

/// Common error type for gatehouse.
#[derive(Error, Debug)]
pub enum GatehouseError {
    /// Database error.
    ///
    /// Wraps errors from the sqlx backend.
    #[error("database error: {0}")]
    Database(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Outbound mail dispatch error.
    #[error("mail error: {0}")]
    Mail(String),

    /// Outbound HTTP error (CAPTCHA verification, mail API).
    #[error("HTTP error: {0}")]
    Http(String),
}

impl GatehouseError {
    /// Whether this error was caused by a unique constraint violation.
    ///
    /// The unique constraints on `users.username` and `users.email` are the
    /// authoritative duplicate guard; the service layer pre-checks purely for
    /// a friendlier error message and falls back to this under races.
    pub fn is_unique_violation(&self) -> bool {
        match self {
            GatehouseError::Database(msg) => msg.contains("UNIQUE"),
            _ => false,
        }
    }
}

impl From<sqlx::Error> for GatehouseError {
    fn from(e: sqlx::Error) -> Self {
        GatehouseError::Database(e.to_string())
    }
}

impl From<reqwest::Error> for GatehouseError {
    fn from(e: reqwest::Error) -> Self {
        GatehouseError::Http(e.to_string())
    }
}

/// Result type alias for gatehouse operations.
pub type Result<T> = std::result::Result<T, GatehouseError>;
