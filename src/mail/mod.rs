//! Outbound mail dispatch for gatehouse.
//!
//! Transport is an external collaborator; only the dispatch contract matters
//! here. [`HttpMailer`] posts to an HTTP mail API, [`MemoryMailer`] records
//! messages for tests and development.

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Mutex;

use crate::config::MailConfig;
use crate::{GatehouseError, Result};

/// A dispatched message.
#[derive(Debug, Clone)]
pub struct OutgoingMail {
    /// Recipient address.
    pub to: String,
    /// Subject line.
    pub subject: String,
    /// HTML body.
    pub html: String,
}

/// Mail dispatch contract.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Send an HTML mail to a single recipient.
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<()>;
}

#[derive(Debug, Serialize)]
struct MailApiRequest<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    html: &'a str,
}

/// Mailer backed by an HTTP mail API endpoint.
#[derive(Debug)]
pub struct HttpMailer {
    endpoint: String,
    api_key: Option<String>,
    from: String,
    client: reqwest::Client,
}

impl HttpMailer {
    /// Create a mailer from configuration. Fails when no endpoint is set.
    pub fn new(config: &MailConfig) -> Result<Self> {
        let endpoint = config
            .endpoint
            .clone()
            .ok_or_else(|| GatehouseError::Config("mail endpoint is not configured".to_string()))?;

        Ok(Self {
            endpoint,
            api_key: config.api_key.clone(),
            from: config.from.clone(),
            client: reqwest::Client::new(),
        })
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<()> {
        let body = MailApiRequest {
            from: &self.from,
            to,
            subject,
            html,
        };

        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(GatehouseError::Mail(format!(
                "mail API returned {}",
                response.status()
            )));
        }

        Ok(())
    }
}

/// In-memory mailer recording every message.
#[derive(Default)]
pub struct MemoryMailer {
    sent: Mutex<Vec<OutgoingMail>>,
}

impl MemoryMailer {
    /// Create an empty recording mailer.
    pub fn new() -> Self {
        Self::default()
    }

    /// All messages sent so far.
    pub fn sent(&self) -> Vec<OutgoingMail> {
        self.sent.lock().unwrap().clone()
    }

    /// The most recent message to `to`, if any.
    pub fn last_to(&self, to: &str) -> Option<OutgoingMail> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|m| m.to == to)
            .cloned()
    }
}

#[async_trait]
impl Mailer for MemoryMailer {
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<()> {
        tracing::debug!(to = %to, subject = %subject, "Recording outgoing mail");
        self.sent.lock().unwrap().push(OutgoingMail {
            to: to.to_string(),
            subject: subject.to_string(),
            html: html.to_string(),
        });
        Ok(())
    }
}
