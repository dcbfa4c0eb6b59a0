//! Unified error handling for every wrapper crate.
//!
//! Failures from wrapped libraries are re-raised as one of a small set of
//! domain variants. The original library error is always kept as the
//! `source()` so callers can still downcast to it.

use std::error::Error as StdError;
use std::time::Duration;

use thiserror::Error;

/// Boxed error used as the cause of wrapped failures.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// A failure reported by a wrapped library, with context and the original cause.
#[derive(Error, Debug)]
#[error("{context}")]
pub struct SourcedError {
    context: String,
    #[source]
    source: Option<BoxError>,
}

impl SourcedError {
    /// Wrap `source` with a context message.
    pub fn new(context: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self {
            context: context.into(),
            source: Some(source.into()),
        }
    }

    /// A failure that has no underlying error value (e.g. an opaque AEAD error).
    pub fn message(context: impl Into<String>) -> Self {
        Self {
            context: context.into(),
            source: None,
        }
    }

    /// Context message attached when the error was wrapped.
    pub fn context(&self) -> &str {
        &self.context
    }
}

/// Application error types.
#[derive(Error, Debug)]
pub enum AppError {
    // Argument validation (raised before any external call)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // Resource errors
    #[error("Resource not found")]
    NotFound,

    #[error("{0} already exists")]
    Conflict(String),

    #[error("Service not registered: {0}")]
    NotRegistered(&'static str),

    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    // Wrapped library errors
    #[cfg(feature = "database")]
    #[error("Database error")]
    Database(#[from] sea_orm::DbErr),

    #[cfg(feature = "documents")]
    #[error("Document database error")]
    Document(#[from] mongodb::error::Error),

    #[cfg(feature = "storage")]
    #[error("Object storage error")]
    Storage(#[from] object_store::Error),

    #[error("Cache error: {0}")]
    Cache(#[source] SourcedError),

    #[error("SMTP error: {0}")]
    Smtp(#[source] SourcedError),

    #[error("SMS error: {0}")]
    Sms(#[source] SourcedError),

    #[error("Cryptography error: {0}")]
    Cryptography(#[source] SourcedError),

    #[error("Serialization error")]
    Serialization(#[from] serde_json::Error),

    // Internal
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Stable error code for logs and callers.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::InvalidArgument(_) => "INVALID_ARGUMENT",
            AppError::NotFound => "NOT_FOUND",
            AppError::Conflict(_) => "CONFLICT",
            AppError::NotRegistered(_) => "NOT_REGISTERED",
            AppError::Timeout(_) => "TIMEOUT",
            #[cfg(feature = "database")]
            AppError::Database(_) => "DATABASE_ERROR",
            #[cfg(feature = "documents")]
            AppError::Document(_) => "DOCUMENT_ERROR",
            #[cfg(feature = "storage")]
            AppError::Storage(_) => "STORAGE_ERROR",
            AppError::Cache(_) => "CACHE_ERROR",
            AppError::Smtp(_) => "SMTP_ERROR",
            AppError::Sms(_) => "SMS_ERROR",
            AppError::Cryptography(_) => "CRYPTOGRAPHY_ERROR",
            AppError::Serialization(_) => "SERIALIZATION_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// True for failures raised by argument validation.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, AppError::InvalidArgument(_))
    }
}

/// Result type alias
pub type AppResult<T> = Result<T, AppError>;

/// Extension trait for Option -> AppError conversion
pub trait OptionExt<T> {
    fn ok_or_not_found(self) -> AppResult<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_not_found(self) -> AppResult<T> {
        self.ok_or(AppError::NotFound)
    }
}

/// Convenience constructors
impl AppError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        AppError::InvalidArgument(msg.into())
    }

    pub fn conflict(entity: impl Into<String>) -> Self {
        AppError::Conflict(entity.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        AppError::Internal(msg.into())
    }

    pub fn cache(context: impl Into<String>, source: impl Into<BoxError>) -> Self {
        AppError::Cache(SourcedError::new(context, source))
    }

    pub fn smtp(context: impl Into<String>, source: impl Into<BoxError>) -> Self {
        AppError::Smtp(SourcedError::new(context, source))
    }

    pub fn sms(context: impl Into<String>, source: impl Into<BoxError>) -> Self {
        AppError::Sms(SourcedError::new(context, source))
    }

    pub fn cryptography(context: impl Into<String>, source: impl Into<BoxError>) -> Self {
        AppError::Cryptography(SourcedError::new(context, source))
    }
}

/// Reject blank strings with an `InvalidArgument` naming the field.
pub fn require_non_blank(value: &str, field: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::invalid_argument(format!("{} must not be empty", field)));
    }
    Ok(())
}
