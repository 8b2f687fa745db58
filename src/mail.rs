//! Outbound mail
//!
//! Mail delivery is an external collaborator. `HttpMailSender` posts to a
//! JSON mail API (Resend-compatible `{from, to, subject, text}` body with a
//! bearer key); `LogMailSender` only writes the message to the log and is
//! used when no API is configured.

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::types::MailConfig;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("Failed to build mail client: {0}")]
    Client(String),
    #[error("Failed to send mail: {0}")]
    Transport(String),
    #[error("Mail API rejected message with status {status}: {body}")]
    Rejected {
        status: u16,
        body: String,
    },
}

#[async_trait]
pub trait MailSender: Send + Sync {
    /// Send a plain-text message
    async fn send_simple_mail(&self, to: &str, subject: &str, content: &str) -> Result<(), MailError>;
}

#[derive(Debug, Serialize)]
struct OutgoingMail<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    text: &'a str,
}

pub struct HttpMailSender {
    client: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
    from: String,
}

impl HttpMailSender {
    pub fn new(
        api_url: impl Into<String>,
        api_key: Option<String>,
        from: impl Into<String>,
    ) -> Result<Self, MailError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| MailError::Client(e.to_string()))?;

        Ok(Self {
            client,
            api_url: api_url.into(),
            api_key,
            from: from.into(),
        })
    }
}

#[async_trait]
impl MailSender for HttpMailSender {
    async fn send_simple_mail(&self, to: &str, subject: &str, content: &str) -> Result<(), MailError> {
        let mail = OutgoingMail {
            from: &self.from,
            to: [to],
            subject,
            text: content,
        };

        let mut request = self.client.post(&self.api_url).json(&mail);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| MailError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MailError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        log::info!("Mail '{}' sent to {}", subject, to);
        Ok(())
    }
}

/// Writes mail to the log instead of sending it
#[derive(Debug, Default)]
pub struct LogMailSender;

#[async_trait]
impl MailSender for LogMailSender {
    async fn send_simple_mail(&self, to: &str, subject: &str, content: &str) -> Result<(), MailError> {
        log::info!("Mail to {} with subject '{}': {}", to, subject, content);
        Ok(())
    }
}

/// Pick the sender for the configured mail settings
pub fn mailer_from_config(config: &MailConfig) -> Result<Arc<dyn MailSender>, MailError> {
    match &config.api_url {
        Some(url) if !url.is_empty() => {
            Ok(Arc::new(HttpMailSender::new(url.clone(), config.api_key.clone(), config.from.clone())?))
        },
        _ => {
            log::warn!("No mail API configured, mail will only be logged");
            Ok(Arc::new(LogMailSender))
        },
    }
}
