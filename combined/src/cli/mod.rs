//! CLI module - Command-line interface for the wrappers.
//!
//! Provides commands for:
//! - `hash` / `verify` - Password hashing
//! - `encrypt` / `decrypt` - Symmetric encryption
//! - `presign` - Presigned object storage URLs
//! - `mail` / `sms` - Outbound messages
//! - `ping-db` - Database connectivity

pub mod args;

pub use args::{Cli, Commands};
