//! Email messages and senders.
//!
//! When no SMTP host is configured, messages are logged instead of sent
//! (development mode). Otherwise they go through lettre's async SMTP transport.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use common::{AppError, AppResult, SmtpConfig};
use lettre::message::header::ContentType;
use lettre::message::{Attachment as LettreAttachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

fn mailbox(address: &str) -> AppResult<Mailbox> {
    address
        .trim()
        .parse::<Mailbox>()
        .map_err(|e| AppError::invalid_argument(format!("invalid email address '{}': {}", address, e)))
}

/// File attached to a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub file_name: String,
    pub content_type: String,
    pub content: Vec<u8>,
}

impl Attachment {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        content: impl Into<Vec<u8>>,
    ) -> AppResult<Self> {
        let file_name = file_name.into();
        if file_name.trim().is_empty() {
            return Err(AppError::invalid_argument("attachment file name must not be empty"));
        }
        let content_type = content_type.into();
        ContentType::parse(&content_type).map_err(|e| {
            AppError::invalid_argument(format!("invalid content type '{}': {}", content_type, e))
        })?;
        Ok(Self {
            file_name,
            content_type,
            content: content.into(),
        })
    }

    fn to_part(&self) -> AppResult<SinglePart> {
        let content_type = ContentType::parse(&self.content_type)
            .map_err(|e| AppError::invalid_argument(e.to_string()))?;
        Ok(LettreAttachment::new(self.file_name.clone()).body(self.content.clone(), content_type))
    }
}

/// An email with validated addresses.
#[derive(Debug, Clone, Default)]
pub struct MailMessage {
    pub(crate) from: Option<Mailbox>,
    pub(crate) to: Vec<Mailbox>,
    pub(crate) cc: Vec<Mailbox>,
    pub(crate) bcc: Vec<Mailbox>,
    pub(crate) reply_to: Option<Mailbox>,
    pub(crate) subject: String,
    pub(crate) text: Option<String>,
    pub(crate) html: Option<String>,
    pub(crate) attachments: Vec<Attachment>,
}

impl MailMessage {
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            ..Self::default()
        }
    }

    /// Add a recipient (`user@example.com` or `Name <user@example.com>`).
    pub fn to(mut self, address: &str) -> AppResult<Self> {
        self.to.push(mailbox(address)?);
        Ok(self)
    }

    pub fn cc(mut self, address: &str) -> AppResult<Self> {
        self.cc.push(mailbox(address)?);
        Ok(self)
    }

    pub fn bcc(mut self, address: &str) -> AppResult<Self> {
        self.bcc.push(mailbox(address)?);
        Ok(self)
    }

    pub fn reply_to(mut self, address: &str) -> AppResult<Self> {
        self.reply_to = Some(mailbox(address)?);
        Ok(self)
    }

    /// Override the configured sender.
    pub fn sender(mut self, address: &str) -> AppResult<Self> {
        self.from = Some(mailbox(address)?);
        Ok(self)
    }

    pub fn text(mut self, body: impl Into<String>) -> Self {
        self.text = Some(body.into());
        self
    }

    pub fn html(mut self, body: impl Into<String>) -> Self {
        self.html = Some(body.into());
        self
    }

    pub fn attach(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn recipients(&self) -> impl Iterator<Item = &Mailbox> {
        self.to.iter().chain(&self.cc).chain(&self.bcc)
    }

    fn validate(&self) -> AppResult<()> {
        if self.to.is_empty() {
            return Err(AppError::invalid_argument("message needs at least one recipient"));
        }
        if self.text.is_none() && self.html.is_none() {
            return Err(AppError::invalid_argument("message needs a text or html body"));
        }
        Ok(())
    }
}

enum Body {
    Single(SinglePart),
    Multi(MultiPart),
}

/// Map a message to a lettre `Message`, using `default_from` when none is set.
pub fn to_lettre_message(message: &MailMessage, default_from: &str) -> AppResult<Message> {
    message.validate()?;

    let from = match &message.from {
        Some(from) => from.clone(),
        None => mailbox(default_from)?,
    };

    let mut builder = Message::builder().from(from).subject(message.subject.clone());
    for to in &message.to {
        builder = builder.to(to.clone());
    }
    for cc in &message.cc {
        builder = builder.cc(cc.clone());
    }
    for bcc in &message.bcc {
        builder = builder.bcc(bcc.clone());
    }
    if let Some(reply_to) = &message.reply_to {
        builder = builder.reply_to(reply_to.clone());
    }

    let body = match (&message.text, &message.html) {
        (Some(text), Some(html)) => {
            Body::Multi(MultiPart::alternative_plain_html(text.clone(), html.clone()))
        }
        (Some(text), None) => Body::Single(SinglePart::plain(text.clone())),
        (None, Some(html)) => Body::Single(SinglePart::html(html.clone())),
        (None, None) => return Err(AppError::invalid_argument("message needs a text or html body")),
    };

    let built = if message.attachments.is_empty() {
        match body {
            Body::Single(part) => builder.singlepart(part),
            Body::Multi(parts) => builder.multipart(parts),
        }
    } else {
        let mut mixed = match body {
            Body::Single(part) => MultiPart::mixed().singlepart(part),
            Body::Multi(parts) => MultiPart::mixed().multipart(parts),
        };
        for attachment in &message.attachments {
            mixed = mixed.singlepart(attachment.to_part()?);
        }
        builder.multipart(mixed)
    };

    built.map_err(|e| AppError::smtp("failed to build message", e))
}

/// Email sending service.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, message: MailMessage) -> AppResult<()>;
}

/// Sends through an SMTP relay.
#[derive(Clone)]
pub struct SmtpSender {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    default_from: String,
}

impl SmtpSender {
    /// Build the transport; no connection is opened until the first send.
    pub fn from_config(config: &SmtpConfig) -> AppResult<Self> {
        let host = config
            .host
            .as_deref()
            .ok_or_else(|| AppError::invalid_argument("SMTP host is not configured"))?;

        let mut builder = if config.tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
                .map_err(|e| AppError::smtp("invalid SMTP relay", e))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host)
        };
        builder = builder
            .port(config.port)
            .timeout(Some(Duration::from_secs(config.timeout_seconds)));
        if let (Some(user), Some(pass)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        tracing::info!(host = %host, port = config.port, tls = config.tls, "SMTP sender configured");
        Ok(Self {
            transport: builder.build(),
            default_from: config.from.clone(),
        })
    }
}

#[async_trait]
impl EmailSender for SmtpSender {
    async fn send(&self, message: MailMessage) -> AppResult<()> {
        let email = to_lettre_message(&message, &self.default_from)?;
        self.transport.send(email).await.map_err(|e| {
            tracing::error!(subject = %message.subject, "Failed to send email: {}", e);
            AppError::smtp("failed to send email", e)
        })?;

        tracing::info!(subject = %message.subject, recipients = message.to.len(), "Email sent");
        Ok(())
    }
}

/// Logs messages instead of sending them.
#[derive(Debug, Clone)]
pub struct LogSender {
    default_from: String,
}

impl LogSender {
    pub fn new(default_from: impl Into<String>) -> Self {
        Self {
            default_from: default_from.into(),
        }
    }
}

#[async_trait]
impl EmailSender for LogSender {
    async fn send(&self, message: MailMessage) -> AppResult<()> {
        to_lettre_message(&message, &self.default_from)?;
        let to: Vec<String> = message.to.iter().map(ToString::to_string).collect();
        let from = message
            .from
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_else(|| self.default_from.clone());

        tracing::warn!("SMTP not configured - logging email instead of sending");
        tracing::info!(
            "=== EMAIL (not sent) ===\n\
             From: {}\n\
             To: {}\n\
             Subject: {}\n\
             Body:\n{}\n\
             ========================",
            from,
            to.join(", "),
            message.subject,
            message.text.as_deref().or(message.html.as_deref()).unwrap_or_default()
        );
        Ok(())
    }
}

/// Select the SMTP sender when a host is configured, the logging sender otherwise.
pub fn email_sender(config: &SmtpConfig) -> AppResult<Arc<dyn EmailSender>> {
    if config.host.is_some() {
        Ok(Arc::new(SmtpSender::from_config(config)?))
    } else {
        Ok(Arc::new(LogSender::new(config.from.clone())))
    }
}

#[cfg(test)]
mod tests {
    use common::testing::LogCapture;

    use super::*;

    fn formatted(message: &Message) -> String {
        String::from_utf8_lossy(&message.formatted()).into_owned()
    }

    #[test]
    fn test_invalid_address_rejected() {
        let err = MailMessage::new("hi").to("not an address").unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn test_message_requires_recipient_and_body() {
        let no_to = MailMessage::new("hi").text("body");
        assert!(to_lettre_message(&no_to, "a@example.com").unwrap_err().is_invalid_argument());

        let no_body = MailMessage::new("hi").to("b@example.com").unwrap();
        assert!(to_lettre_message(&no_body, "a@example.com").unwrap_err().is_invalid_argument());
    }

    #[test]
    fn test_default_from_applied() {
        let message = MailMessage::new("Welcome")
            .to("Bob <bob@example.com>")
            .unwrap()
            .cc("carol@example.com")
            .unwrap()
            .text("hello");

        let email = to_lettre_message(&message, "noreply@example.com").unwrap();
        let raw = formatted(&email);
        assert!(raw.contains("From: noreply@example.com"));
        assert!(raw.contains("Subject: Welcome"));
        assert!(raw.contains("Cc: carol@example.com"));
        assert_eq!(email.envelope().to().len(), 2);
    }

    #[test]
    fn test_bcc_is_in_envelope_only() {
        let message = MailMessage::new("Hidden")
            .to("a@example.com")
            .unwrap()
            .bcc("secret@example.com")
            .unwrap()
            .text("x");

        let email = to_lettre_message(&message, "noreply@example.com").unwrap();
        assert!(!formatted(&email).contains("secret@example.com"));
        assert_eq!(email.envelope().to().len(), 2);
    }

    #[test]
    fn test_alternative_body_with_attachment() {
        let attachment = Attachment::new("report.csv", "text/csv", b"a,b\n1,2".to_vec()).unwrap();
        let message = MailMessage::new("Report")
            .to("a@example.com")
            .unwrap()
            .sender("Reports <reports@example.com>")
            .unwrap()
            .reply_to("help@example.com")
            .unwrap()
            .text("see attached")
            .html("<p>see attached</p>")
            .attach(attachment);

        let raw = formatted(&to_lettre_message(&message, "noreply@example.com").unwrap());
        assert!(raw.contains("multipart/mixed"));
        assert!(raw.contains("multipart/alternative"));
        assert!(raw.contains("report.csv"));
        assert!(raw.contains("Reply-To: help@example.com"));
        assert!(raw.contains("reports@example.com"));
    }

    #[test]
    fn test_attachment_content_type_validated() {
        assert!(Attachment::new("a.bin", "not a type", vec![1]).is_err());
        assert!(Attachment::new(" ", "text/plain", vec![1]).is_err());
    }

    #[tokio::test]
    async fn test_log_sender_accepts_valid_message() {
        let sender = LogSender::new("noreply@example.com");
        let message = MailMessage::new("Hi").to("a@example.com").unwrap().text("x");
        sender.send(message).await.unwrap();
    }

    #[tokio::test]
    async fn test_log_sender_rejects_invalid_message() {
        let sender = LogSender::new("noreply@example.com");
        let err = sender.send(MailMessage::new("Hi").text("x")).await.unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[tokio::test]
    async fn test_smtp_failure_is_logged_and_mapped() {
        let (logs, _guard) = LogCapture::install();
        let sender = SmtpSender::from_config(&SmtpConfig {
            host: Some("127.0.0.1".to_string()),
            port: 1,
            tls: false,
            timeout_seconds: 2,
            ..SmtpConfig::default()
        })
        .unwrap();

        let message = MailMessage::new("Hi").to("a@example.com").unwrap().text("x");
        let err = sender.send(message).await.unwrap_err();

        assert_eq!(err.code(), "SMTP_ERROR");
        assert!(std::error::Error::source(&err).is_some());
        assert!(logs.errors().iter().any(|line| line.contains("Failed to send email")));
    }

    #[tokio::test]
    async fn test_sender_selection() {
        let config = SmtpConfig::default();
        assert!(config.host.is_none());
        assert!(email_sender(&config).is_ok());

        let config = SmtpConfig {
            host: Some("localhost".to_string()),
            tls: false,
            port: 2525,
            ..SmtpConfig::default()
        };
        assert!(SmtpSender::from_config(&config).is_ok());
    }
}
