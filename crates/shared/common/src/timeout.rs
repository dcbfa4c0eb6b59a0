//! Validated timeouts shared by every builder.

use std::future::Future;
use std::time::Duration;

use crate::constants::{MAX_TIMEOUT_SECONDS, MIN_TIMEOUT_SECONDS};
use crate::error::{AppError, AppResult};

/// A timeout that passed the builder range check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeout(Duration);

impl Timeout {
    /// Smallest accepted timeout while constraints are enabled.
    pub const MIN: Duration = Duration::from_secs(MIN_TIMEOUT_SECONDS);
    /// Largest accepted timeout while constraints are enabled.
    pub const MAX: Duration = Duration::from_secs(MAX_TIMEOUT_SECONDS);

    /// Validate `duration` against `[MIN, MAX]`.
    pub fn new(duration: Duration) -> AppResult<Self> {
        if duration < Self::MIN || duration > Self::MAX {
            return Err(AppError::invalid_argument(format!(
                "timeout must be between {}s and {}s, got {:?}",
                MIN_TIMEOUT_SECONDS, MAX_TIMEOUT_SECONDS, duration
            )));
        }
        Ok(Self(duration))
    }

    /// Skip the range check. Zero is still rejected.
    pub fn unconstrained(duration: Duration) -> AppResult<Self> {
        if duration.is_zero() {
            return Err(AppError::invalid_argument("timeout must be greater than zero"));
        }
        Ok(Self(duration))
    }

    /// Validate with or without range constraints.
    pub fn checked(duration: Duration, constrained: bool) -> AppResult<Self> {
        if constrained {
            Self::new(duration)
        } else {
            Self::unconstrained(duration)
        }
    }

    pub fn duration(&self) -> Duration {
        self.0
    }
}

/// Shared timeout state embedded in builders.
///
/// Constraints start enabled; `disable()` must be called before `set()` for
/// an out-of-range duration to be accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutSetting {
    timeout: Option<Timeout>,
    constrained: bool,
}

impl Default for TimeoutSetting {
    fn default() -> Self {
        Self {
            timeout: None,
            constrained: true,
        }
    }
}

impl TimeoutSetting {
    pub fn set(&mut self, duration: Duration) -> AppResult<()> {
        self.timeout = Some(Timeout::checked(duration, self.constrained)?);
        Ok(())
    }

    pub fn disable(&mut self) {
        self.constrained = false;
    }

    pub fn is_constrained(&self) -> bool {
        self.constrained
    }

    pub fn get(&self) -> Option<Timeout> {
        self.timeout
    }
}

/// Fluent timeout setters shared by every builder.
pub trait Timed: Sized {
    fn timeout_setting(&self) -> &TimeoutSetting;
    fn timeout_setting_mut(&mut self) -> &mut TimeoutSetting;

    /// Set the operation timeout, enforcing bounds unless constraints are disabled.
    fn timeout(mut self, duration: Duration) -> AppResult<Self> {
        self.timeout_setting_mut().set(duration)?;
        Ok(self)
    }

    /// Disable the timeout range check for subsequent `timeout` calls.
    fn disable_constraints(mut self) -> Self {
        self.timeout_setting_mut().disable();
        self
    }
}

/// Implement [`Timed`] for a builder with a `timeout: TimeoutSetting` field.
#[macro_export]
macro_rules! impl_timed {
    ($ty:ident $(< $($gen:ident $(: $bound:path)?),+ >)?) => {
        impl $(< $($gen $(: $bound)?),+ >)? $crate::timeout::Timed for $ty $(< $($gen),+ >)? {
            fn timeout_setting(&self) -> &$crate::timeout::TimeoutSetting {
                &self.timeout
            }

            fn timeout_setting_mut(&mut self) -> &mut $crate::timeout::TimeoutSetting {
                &mut self.timeout
            }
        }
    };
}

/// Run `fut`, failing with [`AppError::Timeout`] once `timeout` elapses.
pub async fn run_with_timeout<F, T>(timeout: Option<Timeout>, fut: F) -> AppResult<T>
where
    F: Future<Output = AppResult<T>>,
{
    match timeout {
        Some(limit) => tokio::time::timeout(limit.duration(), fut)
            .await
            .map_err(|_| {
                tracing::warn!(timeout = ?limit.duration(), "Operation timed out");
                AppError::Timeout(limit.duration())
            })?,
        None => fut.await,
    }
}
