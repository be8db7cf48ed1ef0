//! Authentication core: credentials, tokens, sessions and abuse guarding.

pub mod captcha;
pub mod password;
pub mod rate_limit;
pub mod service;
pub mod session;
pub mod token;
pub mod validation;

pub use captcha::{CaptchaVerifier, RecaptchaVerifier};
pub use password::{hash_password_with, verify_password, HashParams};
pub use rate_limit::{CounterKind, LimitExceeded, MemoryRateLimiter, RateLimiter};
pub use service::{AccountService, AuthError, PublicUser, RegisterParams, ResetPasswordParams};
pub use session::{SessionClaims, SessionManager, SESSION_COOKIE};
pub use token::{EmailClaims, TokenCodec, TokenError, TokenPurpose};
pub use validation::FieldError;
