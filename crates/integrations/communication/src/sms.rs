//! SMS messages and the Twilio sender.

use async_trait::async_trait;
use common::constants::MAX_SMS_BODY_LENGTH;
use common::{require_non_blank, AppError, AppResult, BoxError, SmsConfig};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

static E164: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\+[1-9]\d{1,14}$").expect("valid regex"));

/// Convert a failed Twilio call to AppError, logging it.
fn sms_error(context: impl Into<String>, source: impl Into<BoxError>) -> AppError {
    let context = context.into();
    let source = source.into();
    tracing::error!("{}: {}", context, source);
    AppError::sms(context, source)
}

fn phone_number(number: &str) -> AppResult<String> {
    let number = number.trim();
    if !E164.is_match(number) {
        return Err(AppError::invalid_argument(format!(
            "phone number '{}' is not in E.164 form",
            number
        )));
    }
    Ok(number.to_string())
}

/// A text message with a validated recipient and body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmsMessage {
    pub(crate) to: String,
    pub(crate) from: Option<String>,
    pub(crate) body: String,
}

impl SmsMessage {
    pub fn new(to: &str, body: impl Into<String>) -> AppResult<Self> {
        let body = body.into();
        require_non_blank(&body, "body")?;
        if body.chars().count() > MAX_SMS_BODY_LENGTH {
            return Err(AppError::invalid_argument(format!(
                "body must be at most {} characters",
                MAX_SMS_BODY_LENGTH
            )));
        }
        Ok(Self {
            to: phone_number(to)?,
            from: None,
            body,
        })
    }

    /// Override the configured sender number.
    pub fn sender(mut self, number: &str) -> AppResult<Self> {
        self.from = Some(phone_number(number)?);
        Ok(self)
    }

    pub fn to(&self) -> &str {
        &self.to
    }

    pub fn body(&self) -> &str {
        &self.body
    }
}

/// Provider acknowledgement of an accepted message.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SmsReceipt {
    pub sid: String,
    pub status: String,
}

/// SMS sending service.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait SmsSender: Send + Sync {
    async fn send(&self, message: SmsMessage) -> AppResult<SmsReceipt>;
}

#[derive(Debug, Deserialize)]
struct TwilioError {
    message: Option<String>,
    code: Option<i64>,
}

/// Sends through the Twilio Messages REST API.
#[derive(Clone)]
pub struct TwilioSender {
    client: reqwest::Client,
    base_url: String,
    account_sid: String,
    auth_token: String,
    default_from: Option<String>,
}

impl std::fmt::Debug for TwilioSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwilioSender")
            .field("base_url", &self.base_url)
            .field("account_sid", &self.account_sid)
            .field("auth_token", &"[REDACTED]")
            .field("default_from", &self.default_from)
            .finish()
    }
}

impl TwilioSender {
    pub fn from_config(config: &SmsConfig) -> AppResult<Self> {
        require_non_blank(&config.account_sid, "account_sid")?;
        require_non_blank(&config.auth_token, "auth_token")?;
        let default_from = config.from.as_deref().map(phone_number).transpose()?;

        Ok(Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            account_sid: config.account_sid.clone(),
            auth_token: config.auth_token.clone(),
            default_from,
        })
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.base_url, self.account_sid
        )
    }
}

#[async_trait]
impl SmsSender for TwilioSender {
    async fn send(&self, message: SmsMessage) -> AppResult<SmsReceipt> {
        let from = message
            .from
            .as_deref()
            .or(self.default_from.as_deref())
            .ok_or_else(|| AppError::invalid_argument("no sender number configured"))?;

        let params = [
            ("To", message.to.as_str()),
            ("From", from),
            ("Body", message.body.as_str()),
        ];

        let response = self
            .client
            .post(self.messages_url())
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&params)
            .send()
            .await
            .map_err(|e| sms_error("failed to reach Twilio", e))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response
                .json::<TwilioError>()
                .await
                .ok()
                .map(|err| match (err.code, err.message) {
                    (Some(code), Some(msg)) => format!("{} (code {})", msg, code),
                    (_, Some(msg)) => msg,
                    _ => "no error message".to_string(),
                })
                .unwrap_or_else(|| "unreadable error body".to_string());
            return Err(sms_error(format!("Twilio returned {}", status), detail));
        }

        let receipt = response
            .json::<SmsReceipt>()
            .await
            .map_err(|e| sms_error("invalid Twilio response", e))?;
        tracing::info!(sid = %receipt.sid, status = %receipt.status, "SMS sent");
        Ok(receipt)
    }
}
