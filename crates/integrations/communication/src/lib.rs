//! Outbound communication: email over SMTP and SMS over Twilio.

pub mod email;
pub mod sms;

pub use email::{email_sender, to_lettre_message, Attachment, EmailSender, LogSender, MailMessage, SmtpSender};
pub use sms::{SmsMessage, SmsReceipt, SmsSender, TwilioSender};

#[cfg(any(test, feature = "test-utils"))]
pub use email::MockEmailSender;
#[cfg(any(test, feature = "test-utils"))]
pub use sms::MockSmsSender;
