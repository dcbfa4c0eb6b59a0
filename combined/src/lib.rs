//! Ferrule - thin, typed wrappers over persistence, document storage,
//! object storage, messaging, caching and cryptography.
//!
//! Each integration lives in its own crate and is re-exported here. The
//! [`container`] module registers them for dependency injection and the
//! [`cli`] / [`commands`] modules drive them from the `ferrule` binary.

pub mod cli;
pub mod commands;
pub mod container;

pub use caching;
pub use common;
pub use communication;
pub use documents;
pub use persistence;
pub use security;
pub use storage;

pub use container::{ServiceContainer, Services, ServicesBuilder};

#[cfg(any(test, feature = "test-utils"))]
pub use container::MockServiceContainer;
