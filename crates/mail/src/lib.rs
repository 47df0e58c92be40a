//! Outbound email for the authentication flows.
//!
//! Every provider implements [`Mailer`]. Sending is best-effort from the
//! caller's point of view: flows log a [`MailError`] and carry on.

pub mod error;
pub mod log;
pub mod resend;
pub mod smtp;
pub mod templates;

use async_trait::async_trait;

pub use error::MailError;
pub use log::LogMailer;
pub use resend::{ResendConfig, ResendMailer};
pub use smtp::{SmtpConfig, SmtpMailer};

/// A fully rendered message ready for a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub text: String,
    pub html: String,
}

/// What a provider reports back after accepting a message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MailReceipt {
    /// Provider-assigned message id, when the provider returns one.
    pub id: Option<String>,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> Result<MailReceipt, MailError>;
}
