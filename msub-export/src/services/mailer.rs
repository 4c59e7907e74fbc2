//! Outbound notification mail
//!
//! Mail goes out through an HTTP relay. When outbound mail is disabled in
//! configuration, `send_email` reports `Ok(false)` rather than an error, so
//! callers can distinguish "not sent by policy" from a relay failure.

use async_trait::async_trait;
use msub_common::config::MailConfig;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

/// Mail relay errors
#[derive(Debug, Error)]
pub enum MailError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Relay error {0}: {1}")]
    Relay(u16, String),
}

/// Mail delivery seam
#[async_trait]
pub trait MailSender: Send + Sync {
    /// Returns true if a message was handed to the relay, false if outbound
    /// mail is disabled.
    async fn send_email(
        &self,
        text: &str,
        html: &str,
        subject: &str,
        to: &[String],
    ) -> Result<bool, MailError>;
}

#[derive(Debug, Serialize)]
struct RelayMessage<'a> {
    from: &'a str,
    to: &'a [String],
    subject: &'a str,
    text: &'a str,
    html: &'a str,
}

/// HTTP relay mailer
pub struct RelayMailer {
    http_client: reqwest::Client,
    enabled: bool,
    relay_url: String,
    sender: String,
}

impl RelayMailer {
    pub fn new(config: &MailConfig) -> Result<Self, MailError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| MailError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            enabled: config.enabled,
            relay_url: config.relay_url.clone(),
            sender: config.sender.clone(),
        })
    }
}

#[async_trait]
impl MailSender for RelayMailer {
    async fn send_email(
        &self,
        text: &str,
        html: &str,
        subject: &str,
        to: &[String],
    ) -> Result<bool, MailError> {
        if !self.enabled {
            tracing::debug!(subject = %subject, "Outbound mail disabled, not sending");
            return Ok(false);
        }

        let message = RelayMessage {
            from: &self.sender,
            to,
            subject,
            text,
            html,
        };

        let response = self
            .http_client
            .post(&self.relay_url)
            .json(&message)
            .send()
            .await
            .map_err(|e| MailError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(MailError::Relay(status.as_u16(), error_text));
        }

        tracing::info!(subject = %subject, recipients = to.len(), "Mail handed to relay");
        Ok(true)
    }
}
