//! Session issuance: stateless bearer tokens carried in an HTTP-only cookie.

use axum_extra::extract::cookie::{Cookie, SameSite};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::token::{TokenCodec, TokenError, TokenPurpose};

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "token";

/// Claims carried by a session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// User ID.
    pub id: i64,
    /// Email address.
    pub email: String,
    /// Username.
    pub username: String,
    /// Issued-at timestamp.
    pub iat: i64,
    /// Expiry timestamp.
    pub exp: i64,
}

/// Issues and validates session tokens and builds their cookies.
#[derive(Clone)]
pub struct SessionManager {
    codec: Arc<TokenCodec>,
    ttl_secs: i64,
    secure_cookies: bool,
}

impl SessionManager {
    /// Create a session manager.
    pub fn new(codec: Arc<TokenCodec>, ttl_secs: i64, secure_cookies: bool) -> Self {
        Self {
            codec,
            ttl_secs,
            secure_cookies,
        }
    }

    /// Session lifetime in seconds.
    pub fn ttl_secs(&self) -> i64 {
        self.ttl_secs
    }

    /// Sign a session token for a validated login.
    pub fn issue(&self, id: i64, email: &str, username: &str) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = SessionClaims {
            id,
            email: email.to_string(),
            username: username.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::seconds(self.ttl_secs)).timestamp(),
        };
        self.codec.issue(TokenPurpose::Session, &claims)
    }

    /// Decode and check a session token.
    ///
    /// Any failure yields `None`: downstream consumers treat "no session"
    /// and "bad session" identically.
    pub fn current_user(&self, token: &str) -> Option<SessionClaims> {
        self.codec.validate(TokenPurpose::Session, token).ok()
    }

    /// Build the session cookie carrying `token`.
    pub fn session_cookie(&self, token: String) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE, token))
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure_cookies)
            .path("/")
            .max_age(time::Duration::seconds(self.ttl_secs))
            .build()
    }

    /// Build the cookie that revokes the session: empty value, max-age 0.
    pub fn revocation_cookie(&self) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE, ""))
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure_cookies)
            .path("/")
            .max_age(time::Duration::ZERO)
            .build()
    }
}
