//! CLI argument definitions.
//!
//! Uses clap derive macros for type-safe argument parsing.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Ferrule - typed wrappers over databases, storage, messaging and crypto
#[derive(Parser, Debug)]
#[command(name = "ferrule")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Hash a password with Argon2id
    Hash(HashArgs),

    /// Verify a password against a PHC hash string
    Verify(VerifyArgs),

    /// Encrypt text with the configured cipher
    Encrypt(CipherArgs),

    /// Decrypt text produced by `encrypt`
    Decrypt(CipherArgs),

    /// Produce a presigned object storage URL
    Presign(PresignArgs),

    /// Send an email
    Mail(MailArgs),

    /// Send a text message
    Sms(SmsArgs),

    /// Check database connectivity
    PingDb(PingDbArgs),
}

/// Arguments for the hash command
#[derive(Args, Debug)]
pub struct HashArgs {
    pub password: String,
}

/// Arguments for the verify command
#[derive(Args, Debug)]
pub struct VerifyArgs {
    pub password: String,
    pub hash: String,
}

/// Arguments for the encrypt and decrypt commands
#[derive(Args, Debug)]
pub struct CipherArgs {
    pub text: String,
}

/// Arguments for the presign command
#[derive(Args, Debug)]
pub struct PresignArgs {
    /// Object key (e.g. "reports/2024.pdf")
    pub key: String,

    /// HTTP method the URL is valid for
    #[arg(short, long, default_value = "GET")]
    pub method: String,

    /// URL lifetime in seconds
    #[arg(short, long, default_value = "3600")]
    pub expires_in: u64,
}

/// Arguments for the mail command
#[derive(Args, Debug)]
pub struct MailArgs {
    /// Recipient address (repeatable)
    #[arg(long, required = true)]
    pub to: Vec<String>,

    #[arg(long)]
    pub cc: Vec<String>,

    #[arg(short, long)]
    pub subject: String,

    /// Plain text body
    #[arg(long)]
    pub text: Option<String>,

    /// HTML body
    #[arg(long)]
    pub html: Option<String>,

    /// File to attach (repeatable)
    #[arg(long)]
    pub attach: Vec<PathBuf>,
}

/// Arguments for the sms command
#[derive(Args, Debug)]
pub struct SmsArgs {
    /// Recipient number in E.164 form
    #[arg(long)]
    pub to: String,

    /// Override the configured sender number
    #[arg(long)]
    pub from: Option<String>,

    pub body: String,
}

/// Arguments for the ping-db command
#[derive(Args, Debug)]
pub struct PingDbArgs {
    /// Ping the document database instead of the relational one
    #[arg(long)]
    pub documents: bool,
}
