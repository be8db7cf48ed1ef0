//! Configuration module for gatehouse.

use serde::Deserialize;
use std::path::Path;

use crate::{GatehouseError, Result};

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port number to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Allowed CORS origins. Empty means same-origin only.
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: Vec::new(),
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,
}

fn default_db_path() -> String {
    "data/gatehouse.db".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Authentication configuration: signing secrets, token lifetimes and the
/// base URL embedded in verification / reset links.
///
/// The three secrets are deliberately distinct so a token minted for one
/// purpose cannot validate under another purpose's check.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Public base URL used to build verification and reset links.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Signing secret for session tokens.
    #[serde(default = "default_session_secret")]
    pub session_secret: String,
    /// Signing secret for email verification tokens.
    #[serde(default = "default_email_secret")]
    pub email_verification_secret: String,
    /// Signing secret for password reset tokens.
    #[serde(default = "default_reset_secret")]
    pub forget_password_secret: String,
    /// Lifetime of email verification / password reset tokens in seconds.
    #[serde(default = "default_token_ttl")]
    pub token_ttl_secs: i64,
    /// Lifetime of session tokens (and the session cookie) in seconds.
    #[serde(default = "default_session_ttl")]
    pub session_ttl_secs: i64,
    /// Whether to set the Secure flag on session cookies.
    /// Should be true on any TLS-terminated deployment.
    #[serde(default)]
    pub secure_cookies: bool,
    /// Argon2 memory cost in KiB.
    #[serde(default = "default_hash_memory")]
    pub hash_memory_kib: u32,
    /// Argon2 time cost (iterations).
    #[serde(default = "default_hash_iterations")]
    pub hash_iterations: u32,
    /// Argon2 parallelism (threads).
    #[serde(default = "default_hash_parallelism")]
    pub hash_parallelism: u32,
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_session_secret() -> String {
    "token_secret".to_string()
}

fn default_email_secret() -> String {
    "email_verification_secret".to_string()
}

fn default_reset_secret() -> String {
    "forget_password_secret".to_string()
}

fn default_token_ttl() -> i64 {
    3600
}

fn default_session_ttl() -> i64 {
    3600
}

fn default_hash_memory() -> u32 {
    65536
}

fn default_hash_iterations() -> u32 {
    3
}

fn default_hash_parallelism() -> u32 {
    4
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            session_secret: default_session_secret(),
            email_verification_secret: default_email_secret(),
            forget_password_secret: default_reset_secret(),
            token_ttl_secs: default_token_ttl(),
            session_ttl_secs: default_session_ttl(),
            secure_cookies: false,
            hash_memory_kib: default_hash_memory(),
            hash_iterations: default_hash_iterations(),
            hash_parallelism: default_hash_parallelism(),
        }
    }
}

/// Rate limiting configuration for the abuse guard.
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    /// Counter window in seconds.
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
    /// Failed login attempts allowed per IP per window.
    #[serde(default = "default_login_failures")]
    pub login_failures: u32,
    /// CAPTCHA escalations allowed per IP per window.
    #[serde(default = "default_captcha_failures")]
    pub captcha_failures: u32,
    /// Verification / reset email requests allowed per IP per window.
    #[serde(default = "default_email_requests")]
    pub email_requests: u32,
}

fn default_window_secs() -> u64 {
    900
}

fn default_login_failures() -> u32 {
    5
}

fn default_captcha_failures() -> u32 {
    3
}

fn default_email_requests() -> u32 {
    5
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window_secs: default_window_secs(),
            login_failures: default_login_failures(),
            captcha_failures: default_captcha_failures(),
            email_requests: default_email_requests(),
        }
    }
}

/// CAPTCHA verification configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CaptchaConfig {
    /// Shared secret for the third-party verification API.
    /// When unset, every CAPTCHA solution is rejected (fail closed).
    #[serde(default)]
    pub secret: Option<String>,
    /// Verification endpoint.
    #[serde(default = "default_captcha_url")]
    pub verify_url: String,
}

fn default_captcha_url() -> String {
    "https://www.google.com/recaptcha/api/siteverify".to_string()
}

/// Outbound mail configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MailConfig {
    /// HTTP mail API endpoint. When unset, mails are kept in memory
    /// (development mode).
    #[serde(default)]
    pub endpoint: Option<String>,
    /// API key for the mail endpoint.
    #[serde(default)]
    pub api_key: Option<String>,
    /// From address for outgoing mail.
    #[serde(default = "default_mail_from")]
    pub from: String,
}

fn default_mail_from() -> String {
    "no-reply@localhost".to_string()
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Optional log file path. When unset, logs go to stdout only.
    #[serde(default)]
    pub file: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database settings.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Authentication settings.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Rate limiting settings.
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    /// CAPTCHA settings.
    #[serde(default)]
    pub captcha: CaptchaConfig,
    /// Mail settings.
    #[serde(default)]
    pub mail: MailConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| GatehouseError::Config(format!("failed to parse config: {e}")))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.auth.token_ttl_secs, 3600);
        assert_eq!(config.auth.session_ttl_secs, 3600);
        assert_eq!(config.rate_limit.login_failures, 5);
        assert_eq!(config.rate_limit.captcha_failures, 3);
        assert_eq!(config.rate_limit.window_secs, 900);
        assert!(config.captcha.secret.is_none());
        assert!(config.mail.endpoint.is_none());
    }

    #[test]
    fn test_parse_partial_config() {
        let toml = r#"
            [server]
            port = 9000

            [auth]
            base_url = "https://accounts.example.com"
            session_secret = "s1"
            email_verification_secret = "s2"
            forget_password_secret = "s3"
            secure_cookies = true

            [rate_limit]
            login_failures = 10
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.auth.base_url, "https://accounts.example.com");
        assert!(config.auth.secure_cookies);
        assert_eq!(config.rate_limit.login_failures, 10);
        // Unspecified sections fall back to defaults
        assert_eq!(config.rate_limit.captcha_failures, 3);
        assert_eq!(config.database.path, "data/gatehouse.db");
    }

    #[test]
    fn test_distinct_default_secrets() {
        let config = AuthConfig::default();
        assert_ne!(config.session_secret, config.email_verification_secret);
        assert_ne!(config.session_secret, config.forget_password_secret);
        assert_ne!(
            config.email_verification_secret,
            config.forget_password_secret
        );
    }

    #[test]
    fn test_parse_empty_config() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.logging.level, "info");
    }
}
