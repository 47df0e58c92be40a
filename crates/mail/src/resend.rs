//! Delivery through the Resend HTTP API.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{MailError, MailReceipt, Mailer, OutgoingEmail};

const RESEND_API_URL: &str = "https://api.resend.com/emails";

/// HTTP request timeout for a single send.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Sandbox sender accepted by Resend without a verified domain.
pub const SANDBOX_SENDER: &str = "Latchkey <onboarding@resend.dev>";

/// Sandbox inbox that accepts every message and delivers nowhere.
pub const SANDBOX_RECIPIENT: &str = "delivered@resend.dev";

#[derive(Debug, Clone)]
pub struct ResendConfig {
    pub api_key: String,
    /// `From` address used outside sandbox mode.
    pub sender: String,
    /// When set, the sandbox sender is used and every message is redirected
    /// to [`SANDBOX_RECIPIENT`].
    pub sandbox: bool,
}

impl ResendConfig {
    /// Load configuration from environment variables.
    ///
    /// Returns `None` if `RESEND_API_KEY` is not set.
    ///
    /// | Variable         | Required | Default                  |
    /// |------------------|----------|--------------------------|
    /// | `RESEND_API_KEY` | yes      | --                       |
    /// | `EMAIL_SENDER`   | no       | the sandbox sender       |
    pub fn from_env(sandbox: bool) -> Option<Self> {
        let api_key = std::env::var("RESEND_API_KEY").ok()?;
        Some(Self {
            api_key,
            sender: std::env::var("EMAIL_SENDER").unwrap_or_else(|_| SANDBOX_SENDER.to_string()),
            sandbox,
        })
    }
}

#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    text: &'a str,
    html: &'a str,
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    id: Option<String>,
}

pub struct ResendMailer {
    client: reqwest::Client,
    config: ResendConfig,
    endpoint: String,
}

impl ResendMailer {
    pub fn new(config: ResendConfig) -> Result<Self, MailError> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            config,
            endpoint: RESEND_API_URL.to_string(),
        })
    }

    fn envelope<'a>(&'a self, email: &'a OutgoingEmail) -> SendRequest<'a> {
        let (from, to) = if self.config.sandbox {
            (SANDBOX_SENDER, SANDBOX_RECIPIENT)
        } else {
            (self.config.sender.as_str(), email.to.as_str())
        };
        SendRequest {
            from,
            to: [to],
            subject: &email.subject,
            text: &email.text,
            html: &email.html,
        }
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<MailReceipt, MailError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.config.api_key)
            .json(&self.envelope(email))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MailError::Provider {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: SendResponse = response.json().await?;
        tracing::info!(to = %email.to, id = ?parsed.id, "Email sent via Resend");
        Ok(MailReceipt { id: parsed.id })
    }
}
