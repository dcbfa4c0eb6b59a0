//! Common types shared by every wrapper crate.
//!
//! This crate provides:
//! - Unified error taxonomy wrapping external library failures
//! - Configuration structures loaded from the environment
//! - Builder primitives (timeouts, audit users, pagination)

pub mod audit;
pub mod config;
pub mod constants;
pub mod error;
pub mod pagination;
pub mod timeout;

#[cfg(feature = "test-utils")]
pub mod testing;

pub use audit::AuditUser;
pub use config::*;
pub use error::{require_non_blank, AppError, AppResult, BoxError, OptionExt, SourcedError};
pub use pagination::{Paginated, PaginationMeta, PaginationParams, SortDirection};
pub use timeout::{run_with_timeout, Timed, Timeout, TimeoutSetting};
