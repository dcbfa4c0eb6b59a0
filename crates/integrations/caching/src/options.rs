//! Per-entry expiration options.

use std::time::Duration;

use common::{AppError, AppResult, CacheConfig};

/// Absolute and/or sliding expiration for one cache entry.
///
/// With both set, an entry expires at whichever comes first: the absolute
/// deadline, or `sliding` after its last access.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheEntryOptions {
    absolute: Option<Duration>,
    sliding: Option<Duration>,
}

fn positive(duration: Duration, what: &str) -> AppResult<Duration> {
    if duration.is_zero() {
        return Err(AppError::invalid_argument(format!("{} must be greater than zero", what)));
    }
    Ok(duration)
}

impl CacheEntryOptions {
    /// No expiration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Absolute expiration after the configured default TTL.
    pub fn from_config(config: &CacheConfig) -> AppResult<Self> {
        Self::new().absolute_expiration_relative_to_now(Duration::from_secs(config.default_ttl_seconds))
    }

    pub fn absolute_expiration_relative_to_now(mut self, ttl: Duration) -> AppResult<Self> {
        self.absolute = Some(positive(ttl, "absolute expiration")?);
        Ok(self)
    }

    pub fn sliding_expiration(mut self, window: Duration) -> AppResult<Self> {
        self.sliding = Some(positive(window, "sliding expiration")?);
        Ok(self)
    }

    pub fn absolute(&self) -> Option<Duration> {
        self.absolute
    }

    pub fn sliding(&self) -> Option<Duration> {
        self.sliding
    }

    /// Lifetime of a freshly written entry.
    pub fn initial_ttl(&self) -> Option<Duration> {
        match (self.absolute, self.sliding) {
            (Some(a), Some(s)) => Some(a.min(s)),
            (a, s) => a.or(s),
        }
    }
}

/// Lifetime after an access: the sliding window, capped by the time left
/// before the absolute deadline. `None` once the deadline has passed.
pub(crate) fn slide(sliding: Duration, remaining: Option<Duration>) -> Option<Duration> {
    match remaining {
        Some(left) if left.is_zero() => None,
        Some(left) => Some(sliding.min(left)),
        None => Some(sliding),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_durations_rejected() {
        assert!(CacheEntryOptions::new()
            .absolute_expiration_relative_to_now(Duration::ZERO)
            .unwrap_err()
            .is_invalid_argument());
        assert!(CacheEntryOptions::new().sliding_expiration(Duration::ZERO).is_err());
    }

    #[test]
    fn test_initial_ttl_takes_shorter() {
        let options = CacheEntryOptions::new()
            .absolute_expiration_relative_to_now(Duration::from_secs(60))
            .unwrap()
            .sliding_expiration(Duration::from_secs(10))
            .unwrap();
        assert_eq!(options.initial_ttl(), Some(Duration::from_secs(10)));
        assert_eq!(CacheEntryOptions::new().initial_ttl(), None);
    }

    #[test]
    fn test_from_config_rejects_zero_ttl() {
        let config = CacheConfig {
            default_ttl_seconds: 0,
            ..CacheConfig::default()
        };
        assert!(CacheEntryOptions::from_config(&config).is_err());
    }

    #[test]
    fn test_slide_capped_by_deadline() {
        let window = Duration::from_secs(10);
        assert_eq!(slide(window, None), Some(window));
        assert_eq!(slide(window, Some(Duration::from_secs(3))), Some(Duration::from_secs(3)));
        assert_eq!(slide(window, Some(Duration::from_secs(30))), Some(window));
        assert_eq!(slide(window, Some(Duration::ZERO)), None);
    }
}
