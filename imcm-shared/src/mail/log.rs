/// Mailer that writes messages to the log instead of sending them

use async_trait::async_trait;

use super::{MailError, Mailer, OutgoingMail};

#[derive(Debug, Clone, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<(), MailError> {
        tracing::info!(
            to = %mail.to,
            subject = %mail.subject,
            body = %mail.text_body,
            "Mail not sent (no SMTP host configured)"
        );
        Ok(())
    }
}
