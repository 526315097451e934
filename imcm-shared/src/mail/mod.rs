/// Outbound mail
///
/// Workflows compose an [`OutgoingMail`] and hand it to a [`Mailer`]. The
/// server picks the implementation at startup:
///
/// - [`smtp::SmtpMailer`] relays through an SMTP server (STARTTLS).
/// - [`log::LogMailer`] only logs the message, for development without a
///   mail server.
///
/// Delivery failures are reported as [`MailError`] so callers can tell them
/// apart from persistence failures.

pub mod log;
pub mod smtp;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A multipart (plain text + HTML) message to a single recipient
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingMail {
    pub to: String,
    pub subject: String,
    pub text_body: String,
    pub html_body: String,
}

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("Invalid address {address}: {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("Failed to build message: {0}")]
    Build(String),

    #[error("Mail transport failed: {0}")]
    Transport(String),
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: OutgoingMail) -> Result<(), MailError>;
}
