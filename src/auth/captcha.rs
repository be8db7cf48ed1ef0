//! CAPTCHA verification against a third-party endpoint.
//!
//! Verification fails closed: a missing secret, a transport error or a
//! non-success answer all count as an invalid solution.

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::CaptchaConfig;

/// CAPTCHA verification contract, injected so tests can script outcomes.
#[async_trait]
pub trait CaptchaVerifier: Send + Sync {
    /// Whether `response` is a valid CAPTCHA solution.
    async fn verify(&self, response: &str) -> bool;
}

#[derive(Debug, Deserialize)]
struct SiteVerifyResponse {
    success: bool,
}

/// Verifier backed by the reCAPTCHA siteverify API.
pub struct RecaptchaVerifier {
    secret: Option<String>,
    verify_url: String,
    client: reqwest::Client,
}

impl RecaptchaVerifier {
    /// Create a verifier from configuration.
    pub fn new(config: &CaptchaConfig) -> Self {
        Self {
            secret: config.secret.clone(),
            verify_url: config.verify_url.clone(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl CaptchaVerifier for RecaptchaVerifier {
    async fn verify(&self, response: &str) -> bool {
        let Some(secret) = &self.secret else {
            tracing::warn!("CAPTCHA verification requested but no secret is configured");
            return false;
        };

        let result = self
            .client
            .post(&self.verify_url)
            .query(&[("secret", secret.as_str()), ("response", response)])
            .send()
            .await;

        match result {
            Ok(resp) => match resp.json::<SiteVerifyResponse>().await {
                Ok(body) => body.success,
                Err(e) => {
                    tracing::warn!("CAPTCHA verification returned unparseable body: {}", e);
                    false
                }
            },
            Err(e) => {
                tracing::warn!("CAPTCHA verification request failed: {}", e);
                false
            }
        }
    }
}
