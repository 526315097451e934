/// SMTP delivery through `lettre`
///
/// # Example
///
/// ```no_run
/// use imcm_shared::mail::smtp::{SmtpMailer, SmtpSettings};
/// use imcm_shared::mail::{Mailer, OutgoingMail};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let mailer = SmtpMailer::new(SmtpSettings {
///     host: "smtp.example.com".to_string(),
///     port: 587,
///     username: Some("noreply@example.com".to_string()),
///     password: Some("app-password".to_string()),
///     from: "Is My Customer Moving <noreply@example.com>".to_string(),
/// })?;
///
/// mailer.send(OutgoingMail {
///     to: "agent@example.com".to_string(),
///     subject: "Hello".to_string(),
///     text_body: "Hello".to_string(),
///     html_body: "<p>Hello</p>".to_string(),
/// }).await?;
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use lettre::{
    message::{Mailbox, MultiPart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use super::{MailError, Mailer, OutgoingMail};

#[derive(Debug, Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,

    /// Sender, either `addr@host` or `Name <addr@host>`
    pub from: String,
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

fn parse_mailbox(address: &str) -> Result<Mailbox, MailError> {
    address.parse().map_err(|e: lettre::address::AddressError| MailError::InvalidAddress {
        address: address.to_string(),
        reason: e.to_string(),
    })
}

/// Builds the multipart message for `mail`
pub fn build_message(from: &Mailbox, mail: &OutgoingMail) -> Result<Message, MailError> {
    Message::builder()
        .from(from.clone())
        .to(parse_mailbox(&mail.to)?)
        .subject(mail.subject.as_str())
        .multipart(MultiPart::alternative_plain_html(
            mail.text_body.clone(),
            mail.html_body.clone(),
        ))
        .map_err(|e| MailError::Build(e.to_string()))
}

impl SmtpMailer {
    /// Sets up a STARTTLS relay; no connection is made until the first send
    pub fn new(settings: SmtpSettings) -> Result<Self, MailError> {
        let from = parse_mailbox(&settings.from)?;

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)
            .map_err(|e| MailError::Transport(e.to_string()))?
            .port(settings.port);

        if let (Some(username), Some(password)) = (settings.username, settings.password) {
            builder = builder.credentials(Credentials::new(username, password));
        }

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<(), MailError> {
        let message = build_message(&self.from, &mail)?;

        self.transport
            .send(message)
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;

        tracing::info!(to = %mail.to, subject = %mail.subject, "Mail sent");
        Ok(())
    }
}
