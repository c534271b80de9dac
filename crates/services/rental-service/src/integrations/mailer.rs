//! Outbound transactional email.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use common::{AppError, AppResult};

use super::http_client;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// A rendered message ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundEmail {
    pub to: String,
    /// Template identifier, kept for logs
    pub template: &'static str,
    pub locale: String,
    pub subject: String,
    pub text: String,
}

/// Hands a message to a delivery service. Success means accepted, not
/// delivered.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &OutboundEmail) -> AppResult<()>;
}

#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    text: &'a str,
}

/// JSON mail API (`POST {base}/emails` with a bearer key).
pub struct HttpMailer {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    from: String,
}

impl HttpMailer {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        from: impl Into<String>,
        timeout: Duration,
    ) -> AppResult<Self> {
        Ok(Self {
            client: http_client(timeout)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            from: from.into(),
        })
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, email: &OutboundEmail) -> AppResult<()> {
        let request = SendRequest {
            from: &self.from,
            to: [&email.to],
            subject: &email.subject,
            text: &email.text,
        };

        let response = self
            .client
            .post(format!("{}/emails", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::external(format!("Mail API unreachable: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::external(format!(
                "Mail API rejected {} with status {}: {}",
                email.template, status, body
            )));
        }
        Ok(())
    }
}

/// Logs messages instead of sending them.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: &OutboundEmail) -> AppResult<()> {
        tracing::info!(
            to = %email.to,
            template = email.template,
            locale = %email.locale,
            subject = %email.subject,
            "Mail API not configured, logging email instead"
        );
        tracing::debug!("Email body:\n{}", email.text);
        Ok(())
    }
}
