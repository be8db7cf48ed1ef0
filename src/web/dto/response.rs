//! Response DTOs for the Web API.

use serde::Serialize;

/// Generic success envelope: `{message, status, data}`.
///
/// `data` is always present, `null` when the operation carries no payload.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    /// Human-readable message.
    pub message: String,
    /// HTTP status code, mirrored in the body.
    pub status: u16,
    /// Response payload.
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a success envelope with a payload.
    pub fn new(message: impl Into<String>, status: u16, data: T) -> Self {
        Self {
            message: message.into(),
            status,
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    /// Create a payload-less success envelope (`data: null`).
    pub fn message(message: impl Into<String>, status: u16) -> Self {
        Self {
            message: message.into(),
            status,
            data: None,
        }
    }
}
