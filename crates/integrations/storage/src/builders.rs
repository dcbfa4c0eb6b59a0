//! Builders for object storage operations.

use std::time::Duration;

use bytes::Bytes;
use common::constants::{MAX_SIGN_EXPIRY_SECONDS, MIN_SIGN_EXPIRY_SECONDS};
use common::{impl_timed, AppError, AppResult, TimeoutSetting};
use object_store::path::Path;

/// Validate an object key and convert it to a store path.
pub(crate) fn object_path(key: &str) -> AppResult<Path> {
    if key.trim().is_empty() {
        return Err(AppError::invalid_argument("object key must not be empty"));
    }
    if key.starts_with('/') {
        return Err(AppError::invalid_argument(format!(
            "object key '{}' must not start with '/'",
            key
        )));
    }
    Path::parse(key)
        .map_err(|e| AppError::invalid_argument(format!("invalid object key '{}': {}", key, e)))
}

/// Store an object.
#[derive(Debug)]
pub struct Upload {
    pub(crate) key: String,
    pub(crate) path: Path,
    pub(crate) body: Bytes,
    pub(crate) content_type: Option<String>,
    pub(crate) timeout: TimeoutSetting,
}

impl Upload {
    pub fn new(key: impl Into<String>, body: impl Into<Bytes>) -> AppResult<Self> {
        let key = key.into();
        Ok(Self {
            path: object_path(&key)?,
            key,
            body: body.into(),
            content_type: None,
            timeout: TimeoutSetting::default(),
        })
    }

    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

/// Fetch an object.
#[derive(Debug)]
pub struct Download {
    pub(crate) key: String,
    pub(crate) path: Path,
    pub(crate) timeout: TimeoutSetting,
}

impl Download {
    pub fn new(key: impl Into<String>) -> AppResult<Self> {
        let key = key.into();
        Ok(Self {
            path: object_path(&key)?,
            key,
            timeout: TimeoutSetting::default(),
        })
    }
}

/// Delete an object.
#[derive(Debug)]
pub struct RemoveObject {
    pub(crate) path: Path,
    pub(crate) timeout: TimeoutSetting,
}

impl RemoveObject {
    pub fn new(key: impl Into<String>) -> AppResult<Self> {
        Ok(Self {
            path: object_path(&key.into())?,
            timeout: TimeoutSetting::default(),
        })
    }
}

/// HTTP method a presigned URL is valid for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SignMethod {
    #[default]
    Get,
    Put,
    Delete,
}

impl SignMethod {
    pub fn as_http(self) -> http::Method {
        match self {
            SignMethod::Get => http::Method::GET,
            SignMethod::Put => http::Method::PUT,
            SignMethod::Delete => http::Method::DELETE,
        }
    }
}

impl std::str::FromStr for SignMethod {
    type Err = AppError;

    fn from_str(s: &str) -> AppResult<Self> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(SignMethod::Get),
            "PUT" => Ok(SignMethod::Put),
            "DELETE" => Ok(SignMethod::Delete),
            other => Err(AppError::invalid_argument(format!(
                "unsupported signing method '{}'",
                other
            ))),
        }
    }
}

/// Check whether an object exists.
#[derive(Debug)]
pub struct ObjectExists {
    pub(crate) path: Path,
    pub(crate) timeout: TimeoutSetting,
}

impl ObjectExists {
    pub fn new(key: impl Into<String>) -> AppResult<Self> {
        Ok(Self {
            path: object_path(&key.into())?,
            timeout: TimeoutSetting::default(),
        })
    }
}

/// Produce a presigned URL.
///
/// `disable_constraints` lifts both the timeout and the expiry bounds.
#[derive(Debug)]
pub struct Sign {
    pub(crate) path: Path,
    pub(crate) method: SignMethod,
    pub(crate) expires_in: Duration,
    pub(crate) timeout: TimeoutSetting,
}

impl Sign {
    /// Smallest accepted expiry while constraints are enabled.
    pub const MIN_EXPIRY: Duration = Duration::from_secs(MIN_SIGN_EXPIRY_SECONDS);
    /// Largest accepted expiry while constraints are enabled.
    pub const MAX_EXPIRY: Duration = Duration::from_secs(MAX_SIGN_EXPIRY_SECONDS);

    /// GET URL valid for one hour.
    pub fn new(key: impl Into<String>) -> AppResult<Self> {
        Ok(Self {
            path: object_path(&key.into())?,
            method: SignMethod::Get,
            expires_in: Duration::from_secs(3600),
            timeout: TimeoutSetting::default(),
        })
    }

    pub fn method(mut self, method: SignMethod) -> Self {
        self.method = method;
        self
    }

    /// Set the URL lifetime, enforcing bounds unless constraints are disabled.
    pub fn expires_in(mut self, expiry: Duration) -> AppResult<Self> {
        if expiry.is_zero() {
            return Err(AppError::invalid_argument("expiry must be greater than zero"));
        }
        if self.timeout.is_constrained() && (expiry < Self::MIN_EXPIRY || expiry > Self::MAX_EXPIRY) {
            return Err(AppError::invalid_argument(format!(
                "expiry must be between {}s and {}s, got {:?}",
                MIN_SIGN_EXPIRY_SECONDS, MAX_SIGN_EXPIRY_SECONDS, expiry
            )));
        }
        self.expires_in = expiry;
        Ok(self)
    }
}

impl_timed!(Upload);
impl_timed!(Download);
impl_timed!(RemoveObject);
impl_timed!(ObjectExists);
impl_timed!(Sign);
