//! Mail and sms commands - Outbound messages.

use std::path::Path;

use common::{AppError, AppResult};
use communication::{Attachment, MailMessage, SmsMessage};

use crate::cli::args::{MailArgs, SmsArgs};
use crate::container::ServiceContainer;

fn content_type_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("txt") => "text/plain",
        Some("html") | Some("htm") => "text/html",
        Some("csv") => "text/csv",
        Some("json") => "application/json",
        Some("pdf") => "application/pdf",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        _ => "application/octet-stream",
    }
}

async fn read_attachment(path: &Path) -> AppResult<Attachment> {
    let content = tokio::fs::read(path).await.map_err(|e| {
        AppError::invalid_argument(format!("cannot read attachment {}: {}", path.display(), e))
    })?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    Attachment::new(file_name, content_type_for(path), content)
}

/// Build the message described by the mail arguments.
pub async fn build_mail(args: MailArgs) -> AppResult<MailMessage> {
    let mut message = MailMessage::new(args.subject);
    for address in &args.to {
        message = message.to(address)?;
    }
    for address in &args.cc {
        message = message.cc(address)?;
    }
    if let Some(text) = args.text {
        message = message.text(text);
    }
    if let Some(html) = args.html {
        message = message.html(html);
    }
    for path in &args.attach {
        message = message.attach(read_attachment(path).await?);
    }
    Ok(message)
}

/// Execute the mail command
pub async fn mail(args: MailArgs, services: &dyn ServiceContainer) -> AppResult<String> {
    let sender = services.email()?;
    let message = build_mail(args).await?;
    let recipients = message.recipients().count();

    sender.send(message).await?;
    Ok(format!("mail sent to {} recipient(s)", recipients))
}

/// Execute the sms command
pub async fn sms(args: SmsArgs, services: &dyn ServiceContainer) -> AppResult<String> {
    let sender = services.sms()?;
    let mut message = SmsMessage::new(&args.to, args.body)?;
    if let Some(from) = &args.from {
        message = message.sender(from)?;
    }

    let receipt = sender.send(message).await?;
    Ok(format!("{} ({})", receipt.sid, receipt.status))
}
