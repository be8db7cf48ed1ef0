//! Token codec: issues and validates signed, expiring tokens.
//!
//! Three purposes use three distinct signing secrets, so a token minted for
//! one purpose cannot validate under another purpose's check. This is a
//! deliberate isolation boundary.
//!
//! Callers that need to know *who* a token belonged to even after it expired
//! (to offer a resend) use [`TokenCodec::peek_claims`], which enforces the
//! signature but ignores expiry. Every state change is gated by the strict
//! [`TokenCodec::validate`]. Neither operation mutates state.

use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;

/// What a token is minted for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenPurpose {
    /// Session bearer token.
    Session,
    /// Email verification link.
    EmailVerify,
    /// Password reset link.
    ForgetPassword,
}

impl TokenPurpose {
    /// String representation, used in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenPurpose::Session => "session",
            TokenPurpose::EmailVerify => "email_verify",
            TokenPurpose::ForgetPassword => "forget_password",
        }
    }
}

/// Token validation failures, distinguished so callers can give
/// differentiated guidance (offer "resend" only on `Expired`).
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    /// Well-signed token whose expiry has passed.
    #[error("token has expired")]
    Expired,

    /// Tampered, truncated or wrongly-signed token.
    #[error("malformed token or bad signature")]
    Malformed,
}

/// Claims carried by email verification and password reset tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailClaims {
    /// Subject email address.
    pub email: String,
    /// Issued-at timestamp.
    pub iat: i64,
    /// Expiry timestamp.
    pub exp: i64,
}

impl EmailClaims {
    /// Build claims for `email` expiring after `ttl`.
    pub fn new(email: impl Into<String>, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            email: email.into(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        }
    }
}

struct KeyPair {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl KeyPair {
    fn from_secret(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

/// Issues and validates signed tokens under per-purpose secrets.
pub struct TokenCodec {
    session: KeyPair,
    email_verify: KeyPair,
    forget_password: KeyPair,
}

impl TokenCodec {
    /// Create a codec from the three per-purpose secrets.
    pub fn new(session_secret: &str, email_verify_secret: &str, forget_password_secret: &str) -> Self {
        Self {
            session: KeyPair::from_secret(session_secret),
            email_verify: KeyPair::from_secret(email_verify_secret),
            forget_password: KeyPair::from_secret(forget_password_secret),
        }
    }

    fn keys(&self, purpose: TokenPurpose) -> &KeyPair {
        match purpose {
            TokenPurpose::Session => &self.session,
            TokenPurpose::EmailVerify => &self.email_verify,
            TokenPurpose::ForgetPassword => &self.forget_password,
        }
    }

    /// Sign `claims` under the purpose's secret. The claims struct must carry
    /// its own `exp` field.
    pub fn issue<C: Serialize>(&self, purpose: TokenPurpose, claims: &C) -> Result<String, TokenError> {
        encode(&Header::default(), claims, &self.keys(purpose).encoding)
            .map_err(|_| TokenError::Malformed)
    }

    /// Full validation: signature and expiry. Never mutates state.
    pub fn validate<C: DeserializeOwned>(
        &self,
        purpose: TokenPurpose,
        token: &str,
    ) -> Result<C, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        decode::<C>(token, &self.keys(purpose).decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Malformed,
            })
    }

    /// Tolerant decode: the signature is still enforced, but expiry is
    /// ignored, so claims can be read from an expired token.
    pub fn peek_claims<C: DeserializeOwned>(
        &self,
        purpose: TokenPurpose,
        token: &str,
    ) -> Result<C, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = false;

        decode::<C>(token, &self.keys(purpose).decoding, &validation)
            .map(|data| data.claims)
            .map_err(|_| TokenError::Malformed)
    }
}
