//! Mailer that only writes to the log. Used when no provider is configured.

use async_trait::async_trait;

use crate::{MailError, MailReceipt, Mailer, OutgoingEmail};

#[derive(Debug, Clone, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<MailReceipt, MailError> {
        tracing::info!(
            to = %email.to,
            subject = %email.subject,
            body = %email.text,
            "Email delivery not configured, logging message instead"
        );
        Ok(MailReceipt::default())
    }
}
