//! Gatehouse - authentication service
//!
//! Registration, login, email verification and password reset flows over a
//! JSON API, with per-IP abuse guarding and CAPTCHA escalation.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod mail;
pub mod web;

pub use auth::{
    hash_password_with, verify_password, AccountService, AuthError, CaptchaVerifier, CounterKind,
    EmailClaims, FieldError, HashParams, LimitExceeded, MemoryRateLimiter, PublicUser,
    RateLimiter, RecaptchaVerifier, RegisterParams, ResetPasswordParams, SessionClaims,
    SessionManager, TokenCodec, TokenError, TokenPurpose, SESSION_COOKIE,
};
pub use config::Config;
pub use db::{Database, NewUser, NewVerificationToken, TokenRepository, User, UserRepository};
pub use error::{GatehouseError, Result};
pub use mail::{HttpMailer, Mailer, MemoryMailer};
pub use web::WebServer;
