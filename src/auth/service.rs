//! Account lifecycle engine.
//!
//! Orchestrates registration, email verification, login, resend-verification
//! and the password reset flows as one state machine over the credential
//! store, the token codec and the mailer. An account moves
//! unregistered -> pending verification -> verified; short-lived single-use
//! tokens gate the transitions.

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::db::{Database, NewUser, NewVerificationToken, TokenRepository, User, UserRepository};
use crate::mail::Mailer;
use crate::GatehouseError;

use super::password::{self, HashParams};
use super::token::{EmailClaims, TokenCodec, TokenError, TokenPurpose};
use super::validation::{self, FieldError};

/// Domain errors raised by the engine, caught once at the web boundary.
#[derive(Error, Debug)]
pub enum AuthError {
    /// Input failed field-level validation.
    #[error("Validation failed!")]
    Validation(Vec<FieldError>),

    /// Username and/or email already taken; every conflict is listed.
    #[error("Validation failed!")]
    Conflict(Vec<FieldError>),

    /// Referenced account does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Forgot-password for an unknown email.
    #[error("Email is not registered yet.")]
    NotRegistered,

    /// Unknown email or wrong password; deliberately undifferentiated to
    /// avoid account enumeration.
    #[error("Email / Password incorrect")]
    InvalidCredentials,

    /// Correct credentials but the email was never verified. The response
    /// carries a hint telling the client to offer a resend.
    #[error("Your email has not been activated. Please check your email or you can request a new activation link.")]
    EmailNotVerified,

    /// Well-signed token whose expiry has passed; the client may offer a
    /// resend.
    #[error("Token has expired. Please request a new verification email.")]
    TokenExpired,

    /// Tampered or wrongly-signed token.
    #[error("Invalid token format, Please check your url")]
    TokenMalformed,

    /// Well-signed token whose stored row is gone (superseded or consumed).
    #[error("Invalid token, please check a new url on email or try to login.")]
    TokenInvalid,

    /// A CAPTCHA solution is mandatory for this attempt.
    #[error("Please complete the CAPTCHA challenge.")]
    CaptchaRequired,

    /// The supplied CAPTCHA solution did not verify.
    #[error("CAPTCHA verification failed.")]
    CaptchaInvalid,

    /// The per-IP failure budget is exhausted.
    #[error("Too many attempts. Please try again later.")]
    TooManyAttempts,

    /// Anything unexpected; details never reach the client.
    #[error("Internal Server Error")]
    Internal(String),
}

impl From<GatehouseError> for AuthError {
    fn from(e: GatehouseError) -> Self {
        AuthError::Internal(e.to_string())
    }
}

impl From<TokenError> for AuthError {
    fn from(e: TokenError) -> Self {
        match e {
            TokenError::Expired => AuthError::TokenExpired,
            TokenError::Malformed => AuthError::TokenMalformed,
        }
    }
}

/// Minimal public projection of a user, safe to put on the wire.
#[derive(Debug, Clone, Serialize)]
pub struct PublicUser {
    /// User ID.
    pub id: i64,
    /// Email address.
    pub email: String,
    /// Username.
    pub username: String,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            username: user.username.clone(),
        }
    }
}

/// Registration input.
#[derive(Debug, Clone)]
pub struct RegisterParams {
    /// Requested username.
    pub username: String,
    /// Email address.
    pub email: String,
    /// Plaintext password.
    pub password: String,
    /// Password confirmation.
    pub confirm_password: String,
}

/// Password reset input.
#[derive(Debug, Clone)]
pub struct ResetPasswordParams {
    /// Account email address.
    pub email: String,
    /// New plaintext password.
    pub password: String,
    /// Password confirmation.
    pub confirm_password: String,
}

/// The account lifecycle engine.
#[derive(Clone)]
pub struct AccountService {
    db: Database,
    codec: Arc<TokenCodec>,
    mailer: Arc<dyn Mailer>,
    base_url: String,
    token_ttl_secs: i64,
    hash_params: HashParams,
    // Verified against when no user matches the email, so both login failure
    // branches cost one hash verification. Hashed under the same params as
    // real credentials.
    dummy_hash: String,
}

impl AccountService {
    /// Create the engine over its collaborators.
    pub fn new(
        db: Database,
        codec: Arc<TokenCodec>,
        mailer: Arc<dyn Mailer>,
        base_url: impl Into<String>,
        token_ttl_secs: i64,
        hash_params: HashParams,
    ) -> crate::Result<Self> {
        let dummy_hash = password::hash_password_with("decoy-password", &hash_params)
            .map_err(|e| GatehouseError::Config(format!("failed to prepare hasher: {e}")))?;

        Ok(Self {
            db,
            codec,
            mailer,
            base_url: base_url.into(),
            token_ttl_secs,
            hash_params,
            dummy_hash,
        })
    }

    fn token_ttl(&self) -> Duration {
        Duration::seconds(self.token_ttl_secs)
    }

    /// Mint a token for `email` under `purpose` and persist it, superseding
    /// any prior token for the user.
    async fn mint_and_store(
        &self,
        user_id: i64,
        email: &str,
        purpose: TokenPurpose,
    ) -> Result<String, AuthError> {
        let claims = EmailClaims::new(email, self.token_ttl());
        let token = self.codec.issue(purpose, &claims)?;

        let repo = TokenRepository::new(self.db.pool());
        repo.replace_for_user(&NewVerificationToken::new(
            user_id,
            token.clone(),
            Utc::now() + self.token_ttl(),
        ))
        .await?;

        Ok(token)
    }

    /// Dispatch a link-carrying mail. Delivery failures are logged, never
    /// surfaced to the client; the link can be re-requested.
    async fn send_link(&self, to: &str, subject: &str, intro: &str, url: &str) {
        let html = format!("<p>{intro}</p><a href=\"{url}\">{url}</a>");
        if let Err(e) = self.mailer.send(to, subject, &html).await {
            warn!(to = %to, "Failed to dispatch mail: {}", e);
        }
    }

    /// Register a new account.
    ///
    /// The account starts unverified, with exactly one live email
    /// verification token, and a verification link is mailed out.
    pub async fn register(&self, params: &RegisterParams) -> Result<User, AuthError> {
        let errors = validation::validate_registration(
            &params.username,
            &params.email,
            &params.password,
            &params.confirm_password,
        );
        if !errors.is_empty() {
            return Err(AuthError::Validation(errors));
        }

        // Pre-check both conflicts so they are all reported together. The
        // unique constraints remain the authoritative guard under races.
        let users = UserRepository::new(self.db.pool());
        let mut conflicts = Vec::new();
        if users.find_by_username(&params.username).await?.is_some() {
            conflicts.push(FieldError::new("username", "Username already taken."));
        }
        if users.find_by_email(&params.email).await?.is_some() {
            conflicts.push(FieldError::new("email", "Email already taken."));
        }
        if !conflicts.is_empty() {
            return Err(AuthError::Conflict(conflicts));
        }

        let hash = password::hash_password_with(&params.password, &self.hash_params)
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        let user = users
            .create(&NewUser::new(&params.username, &params.email, hash))
            .await
            .map_err(|e| {
                if e.is_unique_violation() {
                    let field = if e.to_string().contains("users.email") {
                        FieldError::new("email", "Email already taken.")
                    } else {
                        FieldError::new("username", "Username already taken.")
                    };
                    AuthError::Conflict(vec![field])
                } else {
                    e.into()
                }
            })?;

        let token = self
            .mint_and_store(user.id, &user.email, TokenPurpose::EmailVerify)
            .await?;
        let url = format!("{}/auth/verify-account/{}", self.base_url, token);
        self.send_link(
            &user.email,
            "Verification account : ",
            "Click the link below to verify your email",
            &url,
        )
        .await;

        info!(user_id = user.id, username = %user.username, "Registered new account");
        Ok(user)
    }

    /// Validate credentials and return the public projection.
    ///
    /// Session issuance is the caller's job.
    pub async fn login(&self, email: &str, password_input: &str) -> Result<PublicUser, AuthError> {
        let errors = validation::validate_login(email, password_input);
        if !errors.is_empty() {
            return Err(AuthError::Validation(errors));
        }

        let users = UserRepository::new(self.db.pool());
        let user = users.find_by_email(email).await?;

        // Unknown email and wrong password collapse into the same outcome.
        // The unknown-email branch still burns a verification, against the
        // dummy hash, so the two failures cost the same and cannot be told
        // apart by response time.
        let valid = match &user {
            Some(u) => password::verify_password(password_input, &u.password).is_ok(),
            None => {
                let _ = password::verify_password(password_input, &self.dummy_hash);
                false
            }
        };
        let Some(user) = user.filter(|_| valid) else {
            return Err(AuthError::InvalidCredentials);
        };

        if !user.is_verified {
            return Err(AuthError::EmailNotVerified);
        }

        info!(user_id = user.id, "Login succeeded");
        Ok(PublicUser::from(&user))
    }

    /// Consume a verification token and mark the account verified.
    ///
    /// Two-phase decode: the tolerant pass recovers the subject even from an
    /// expired token (so the caller can be told to request a resend), then
    /// the stored row and a strict validation gate the state change.
    pub async fn verify_email(&self, token: &str) -> Result<(), AuthError> {
        let claims: EmailClaims = self
            .codec
            .peek_claims(TokenPurpose::EmailVerify, token)
            .map_err(|_| AuthError::TokenMalformed)?;

        let users = UserRepository::new(self.db.pool());
        let user = users
            .find_by_email(&claims.email)
            .await?
            .ok_or_else(|| AuthError::NotFound("user not found".to_string()))?;

        let tokens = TokenRepository::new(self.db.pool());
        let row = tokens
            .find_by_user_and_token(user.id, token)
            .await?
            .ok_or(AuthError::TokenInvalid)?;

        // The signed expiry and the stored expiry must both agree the token
        // is live before any state changes.
        if row.is_expired(Utc::now()) {
            return Err(AuthError::TokenExpired);
        }
        self.codec
            .validate::<EmailClaims>(TokenPurpose::EmailVerify, token)?;

        // Re-verifying an already-verified account is a no-op in effect
        if !user.is_verified {
            users.mark_verified(user.id).await?;
        }
        tokens.delete_for_user(user.id).await?;

        info!(user_id = user.id, "Email verified");
        Ok(())
    }

    /// Supersede the outstanding verification token and mail a fresh link.
    pub async fn resend_verification(&self, email: &str) -> Result<(), AuthError> {
        let users = UserRepository::new(self.db.pool());
        let user = users
            .find_by_email(email)
            .await?
            .ok_or_else(|| AuthError::NotFound("Email not found.".to_string()))?;

        let token = self
            .mint_and_store(user.id, &user.email, TokenPurpose::EmailVerify)
            .await?;
        let url = format!("{}/auth/verify-account/{}", self.base_url, token);
        self.send_link(
            &user.email,
            "Verification account : ",
            "Click the link below to verify your email",
            &url,
        )
        .await;

        info!(user_id = user.id, "Resent verification mail");
        Ok(())
    }

    /// Start the password reset flow: mint a reset token and mail the link.
    pub async fn forgot_password(&self, email: &str) -> Result<(), AuthError> {
        if email.is_empty() {
            return Err(AuthError::Validation(vec![FieldError::new(
                "email",
                "Email is required!",
            )]));
        }

        let users = UserRepository::new(self.db.pool());
        let user = users
            .find_by_email(email)
            .await?
            .ok_or(AuthError::NotRegistered)?;

        let token = self
            .mint_and_store(user.id, &user.email, TokenPurpose::ForgetPassword)
            .await?;
        let url = format!("{}/auth/reset-password/{}", self.base_url, token);
        self.send_link(
            &user.email,
            "Reset password : ",
            "Click the link below to reset your password",
            &url,
        )
        .await;

        info!(user_id = user.id, "Sent password reset mail");
        Ok(())
    }

    /// Read-only check of a reset token; returns the associated email so the
    /// client can pre-fill the reset form. No state changes.
    pub async fn verify_reset_token(&self, token: &str) -> Result<String, AuthError> {
        let claims: EmailClaims = self
            .codec
            .peek_claims(TokenPurpose::ForgetPassword, token)
            .map_err(|_| AuthError::TokenMalformed)?;

        let users = UserRepository::new(self.db.pool());
        let user = users
            .find_by_email(&claims.email)
            .await?
            .ok_or_else(|| AuthError::NotFound("User not found.".to_string()))?;

        let tokens = TokenRepository::new(self.db.pool());
        let row = tokens
            .find_by_user_and_token(user.id, token)
            .await?
            .ok_or(AuthError::TokenInvalid)?;

        if row.is_expired(Utc::now()) {
            return Err(AuthError::TokenExpired);
        }
        self.codec
            .validate::<EmailClaims>(TokenPurpose::ForgetPassword, token)?;

        Ok(user.email)
    }

    /// Set a new password, gated by the stored reset token.
    ///
    /// The token row must exist and re-validate at the mutation step, not
    /// just at the earlier read-only check; the row is deleted in the same
    /// operation so the token cannot be replayed.
    pub async fn reset_password(&self, params: &ResetPasswordParams) -> Result<(), AuthError> {
        let errors = validation::validate_password_reset(
            &params.email,
            &params.password,
            &params.confirm_password,
        );
        if !errors.is_empty() {
            return Err(AuthError::Validation(errors));
        }

        let users = UserRepository::new(self.db.pool());
        let user = users
            .find_by_email(&params.email)
            .await?
            .ok_or_else(|| AuthError::NotFound("user not found".to_string()))?;

        let tokens = TokenRepository::new(self.db.pool());
        let row = tokens
            .find_by_user(user.id)
            .await?
            .ok_or(AuthError::TokenInvalid)?;

        if row.is_expired(Utc::now()) {
            return Err(AuthError::TokenExpired);
        }
        self.codec
            .validate::<EmailClaims>(TokenPurpose::ForgetPassword, &row.token)?;

        let hash = password::hash_password_with(&params.password, &self.hash_params)
            .map_err(|e| AuthError::Internal(e.to_string()))?;
        users.update_password(user.id, &hash).await?;

        // Revoke the token immediately so it cannot be replayed
        tokens.delete_for_user(user.id).await?;

        info!(user_id = user.id, "Password reset completed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::mail::MemoryMailer;

    fn cheap_hash_params() -> HashParams {
        HashParams {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
        }
    }

    async fn service() -> (AccountService, Arc<MemoryMailer>) {
        let db = Database::open_in_memory().await.unwrap();
        let codec = Arc::new(TokenCodec::new("session", "email", "reset"));
        let mailer = Arc::new(MemoryMailer::new());
        let service = AccountService::new(
            db,
            codec,
            mailer.clone(),
            "http://localhost:8080",
            3600,
            cheap_hash_params(),
        )
        .unwrap();
        (service, mailer)
    }

    fn register_params(username: &str, email: &str) -> RegisterParams {
        RegisterParams {
            username: username.to_string(),
            email: email.to_string(),
            password: "Str0ng-pass".to_string(),
            confirm_password: "Str0ng-pass".to_string(),
        }
    }

    /// Pull the token out of the link in the most recent mail to `email`.
    fn mailed_token(mailer: &MemoryMailer, email: &str) -> String {
        let mail = mailer.last_to(email).expect("no mail recorded");
        let url_start = mail.html.find("href=\"").unwrap() + 6;
        let url_end = mail.html[url_start..].find('"').unwrap() + url_start;
        let url = &mail.html[url_start..url_end];
        url.rsplit('/').next().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_register_creates_unverified_user_with_token() {
        let (service, mailer) = service().await;

        let user = service
            .register(&register_params("alice", "alice@example.com"))
            .await
            .unwrap();

        assert!(!user.is_verified);
        // Exactly one live token
        let tokens = TokenRepository::new(service.db.pool());
        let row = tokens.find_by_user(user.id).await.unwrap().unwrap();
        assert!(!row.is_expired(Utc::now()));
        // Verification mail carries the token
        assert_eq!(mailed_token(&mailer, "alice@example.com"), row.token);
    }

    #[tokio::test]
    async fn test_register_validation_failure() {
        let (service, _) = service().await;

        let err = service
            .register(&RegisterParams {
                username: "al".to_string(),
                email: "bad".to_string(),
                password: "weak".to_string(),
                confirm_password: "other".to_string(),
            })
            .await
            .unwrap_err();

        let AuthError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        assert!(errors.iter().any(|e| e.field == "username"));
        assert!(errors.iter().any(|e| e.field == "email"));
        assert!(errors.iter().any(|e| e.field == "password"));
        assert!(errors.iter().any(|e| e.field == "confirmPassword"));
    }

    #[tokio::test]
    async fn test_register_reports_all_conflicts() {
        let (service, _) = service().await;
        service
            .register(&register_params("alice", "alice@example.com"))
            .await
            .unwrap();

        // Same username and same email: both conflicts listed
        let err = service
            .register(&register_params("alice", "alice@example.com"))
            .await
            .unwrap_err();
        let AuthError::Conflict(errors) = err else {
            panic!("expected conflict");
        };
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().any(|e| e.field == "username"));
        assert!(errors.iter().any(|e| e.field == "email"));

        // Only the email taken
        let err = service
            .register(&register_params("bob", "alice@example.com"))
            .await
            .unwrap_err();
        let AuthError::Conflict(errors) = err else {
            panic!("expected conflict");
        };
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "email");
    }

    #[tokio::test]
    async fn test_login_unknown_and_wrong_password_identical() {
        let (service, _) = service().await;
        service
            .register(&register_params("alice", "alice@example.com"))
            .await
            .unwrap();

        let unknown = service
            .login("nobody@example.com", "Str0ng-pass")
            .await
            .unwrap_err();
        let wrong = service
            .login("alice@example.com", "Wrong-pass1!")
            .await
            .unwrap_err();

        assert_eq!(unknown.to_string(), wrong.to_string());
        assert!(matches!(unknown, AuthError::InvalidCredentials));
        assert!(matches!(wrong, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_unknown_email_costs_a_password_verification() {
        let (service, _) = service().await;
        service
            .register(&register_params("alice", "alice@example.com"))
            .await
            .unwrap();

        // Warm both paths once
        let _ = service.login("nobody@example.com", "Str0ng-pass").await;
        let _ = service.login("alice@example.com", "Wrong-pass1!").await;

        let start = std::time::Instant::now();
        for _ in 0..5 {
            let _ = service.login("nobody@example.com", "Str0ng-pass").await;
        }
        let unknown = start.elapsed();

        let start = std::time::Instant::now();
        for _ in 0..5 {
            let _ = service.login("alice@example.com", "Wrong-pass1!").await;
        }
        let wrong = start.elapsed();

        // Both failure branches verify a hash, so the unknown-email path
        // must be within an order of magnitude of the wrong-password path.
        // Without the dummy verification it is thousands of times faster.
        assert!(
            unknown * 10 > wrong,
            "unknown-email login returned too quickly: {unknown:?} vs {wrong:?}"
        );
    }

    #[tokio::test]
    async fn test_dummy_hash_uses_service_params() {
        let (service, _) = service().await;

        // The decoy carries the same cost parameters as real credentials,
        // so its verification takes comparable time.
        assert!(service.dummy_hash.starts_with("$argon2id$"));
        assert!(service.dummy_hash.contains("m=1024"));
        assert!(service.dummy_hash.contains("t=1"));
    }

    #[tokio::test]
    async fn test_login_unverified_gets_resend_hint() {
        let (service, _) = service().await;
        service
            .register(&register_params("alice", "alice@example.com"))
            .await
            .unwrap();

        let err = service
            .login("alice@example.com", "Str0ng-pass")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::EmailNotVerified));
    }

    #[tokio::test]
    async fn test_verify_email_then_login() {
        let (service, mailer) = service().await;
        let user = service
            .register(&register_params("alice", "alice@example.com"))
            .await
            .unwrap();

        let token = mailed_token(&mailer, "alice@example.com");
        service.verify_email(&token).await.unwrap();

        // Verified flag set, token consumed
        let users = UserRepository::new(service.db.pool());
        assert!(users.find_by_id(user.id).await.unwrap().unwrap().is_verified);
        let tokens = TokenRepository::new(service.db.pool());
        assert!(tokens.find_by_user(user.id).await.unwrap().is_none());

        let public = service
            .login("alice@example.com", "Str0ng-pass")
            .await
            .unwrap();
        assert_eq!(public.id, user.id);
        assert_eq!(public.username, "alice");
    }

    #[tokio::test]
    async fn test_verify_email_tampered_token() {
        let (service, mailer) = service().await;
        service
            .register(&register_params("alice", "alice@example.com"))
            .await
            .unwrap();

        let mut token = mailed_token(&mailer, "alice@example.com");
        token.push('x');
        let err = service.verify_email(&token).await.unwrap_err();
        assert!(matches!(err, AuthError::TokenMalformed));
    }

    #[tokio::test]
    async fn test_verify_email_superseded_token() {
        let (service, mailer) = service().await;
        service
            .register(&register_params("alice", "alice@example.com"))
            .await
            .unwrap();
        let old_token = mailed_token(&mailer, "alice@example.com");

        // A resend supersedes the first token
        service
            .resend_verification("alice@example.com")
            .await
            .unwrap();

        let err = service.verify_email(&old_token).await.unwrap_err();
        assert!(matches!(err, AuthError::TokenInvalid));

        // The fresh token still works
        let new_token = mailed_token(&mailer, "alice@example.com");
        service.verify_email(&new_token).await.unwrap();
    }

    #[tokio::test]
    async fn test_verify_email_expired_token() {
        let (service, _) = service().await;
        let user = service
            .register(&register_params("alice", "alice@example.com"))
            .await
            .unwrap();

        // Craft an expired-but-well-signed token and store its row
        let claims = EmailClaims::new("alice@example.com", Duration::seconds(-120));
        let token = service
            .codec
            .issue(TokenPurpose::EmailVerify, &claims)
            .unwrap();
        TokenRepository::new(service.db.pool())
            .replace_for_user(&NewVerificationToken::new(
                user.id,
                token.clone(),
                Utc::now() - Duration::seconds(120),
            ))
            .await
            .unwrap();

        let err = service.verify_email(&token).await.unwrap_err();
        assert!(matches!(err, AuthError::TokenExpired));
    }

    #[tokio::test]
    async fn test_verify_email_is_idempotent_in_effect() {
        let (service, mailer) = service().await;
        service
            .register(&register_params("alice", "alice@example.com"))
            .await
            .unwrap();
        let token = mailed_token(&mailer, "alice@example.com");
        service.verify_email(&token).await.unwrap();

        // Re-verifying with a fresh token on an already-verified account
        service
            .resend_verification("alice@example.com")
            .await
            .unwrap();
        let token = mailed_token(&mailer, "alice@example.com");
        service.verify_email(&token).await.unwrap();
    }

    #[tokio::test]
    async fn test_resend_unknown_email() {
        let (service, _) = service().await;
        let err = service
            .resend_verification("nobody@example.com")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_forgot_password_unknown_email() {
        let (service, _) = service().await;
        let err = service
            .forgot_password("nobody@example.com")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::NotRegistered));

        let err = service.forgot_password("").await.unwrap_err();
        assert!(matches!(err, AuthError::Validation(_)));
    }

    #[tokio::test]
    async fn test_reset_password_round_trip() {
        let (service, mailer) = service().await;
        service
            .register(&register_params("alice", "alice@example.com"))
            .await
            .unwrap();
        let token = mailed_token(&mailer, "alice@example.com");
        service.verify_email(&token).await.unwrap();

        service.forgot_password("alice@example.com").await.unwrap();
        let reset_token = mailed_token(&mailer, "alice@example.com");

        // Read-only check returns the email without consuming the token
        let email = service.verify_reset_token(&reset_token).await.unwrap();
        assert_eq!(email, "alice@example.com");
        let email = service.verify_reset_token(&reset_token).await.unwrap();
        assert_eq!(email, "alice@example.com");

        service
            .reset_password(&ResetPasswordParams {
                email: "alice@example.com".to_string(),
                password: "N3w-password!".to_string(),
                confirm_password: "N3w-password!".to_string(),
            })
            .await
            .unwrap();

        // Old password no longer works, new one does
        let err = service
            .login("alice@example.com", "Str0ng-pass")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
        service
            .login("alice@example.com", "N3w-password!")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_reset_password_revokes_token() {
        let (service, mailer) = service().await;
        service
            .register(&register_params("alice", "alice@example.com"))
            .await
            .unwrap();
        service.forgot_password("alice@example.com").await.unwrap();
        let reset_token = mailed_token(&mailer, "alice@example.com");

        service
            .reset_password(&ResetPasswordParams {
                email: "alice@example.com".to_string(),
                password: "N3w-password!".to_string(),
                confirm_password: "N3w-password!".to_string(),
            })
            .await
            .unwrap();

        // The reset token cannot be replayed
        let err = service.verify_reset_token(&reset_token).await.unwrap_err();
        assert!(matches!(err, AuthError::TokenInvalid));
        let err = service
            .reset_password(&ResetPasswordParams {
                email: "alice@example.com".to_string(),
                password: "An0ther-pass!".to_string(),
                confirm_password: "An0ther-pass!".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::TokenInvalid));
    }

    #[tokio::test]
    async fn test_reset_password_requires_live_token() {
        let (service, _) = service().await;
        let user = service
            .register(&register_params("alice", "alice@example.com"))
            .await
            .unwrap();

        // No reset flow was started
        let err = service
            .reset_password(&ResetPasswordParams {
                email: "alice@example.com".to_string(),
                password: "N3w-password!".to_string(),
                confirm_password: "N3w-password!".to_string(),
            })
            .await
            .unwrap_err();
        // The registration minted an email-verify token; it must not pass
        // the reset-purpose check.
        assert!(matches!(err, AuthError::TokenMalformed));

        // With the stored row removed entirely the outcome is InvalidToken
        TokenRepository::new(service.db.pool())
            .delete_for_user(user.id)
            .await
            .unwrap();
        let err = service
            .reset_password(&ResetPasswordParams {
                email: "alice@example.com".to_string(),
                password: "N3w-password!".to_string(),
                confirm_password: "N3w-password!".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::TokenInvalid));
    }

    #[tokio::test]
    async fn test_verify_reset_token_wrong_purpose() {
        let (service, mailer) = service().await;
        service
            .register(&register_params("alice", "alice@example.com"))
            .await
            .unwrap();

        // An email-verification token must not open the reset flow
        let verify_token = mailed_token(&mailer, "alice@example.com");
        let err = service.verify_reset_token(&verify_token).await.unwrap_err();
        assert!(matches!(err, AuthError::TokenMalformed));
    }
}
