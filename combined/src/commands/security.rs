//! Hash, verify, encrypt and decrypt commands.

use common::AppResult;

use crate::cli::args::{CipherArgs, HashArgs, VerifyArgs};
use crate::container::ServiceContainer;

/// Execute the hash command
pub fn hash(args: HashArgs, services: &dyn ServiceContainer) -> AppResult<String> {
    services.hasher()?.hash(&args.password)
}

/// Execute the verify command
pub fn verify(args: VerifyArgs, services: &dyn ServiceContainer) -> AppResult<String> {
    let matches = services.hasher()?.verify(&args.password, &args.hash)?;
    tracing::debug!(matches, "Password verified");
    Ok(if matches { "match" } else { "mismatch" }.to_string())
}

/// Execute the encrypt command
pub fn encrypt(args: CipherArgs, services: &dyn ServiceContainer) -> AppResult<String> {
    services.cipher()?.encrypt(&args.text)
}

/// Execute the decrypt command
pub fn decrypt(args: CipherArgs, services: &dyn ServiceContainer) -> AppResult<String> {
    services.cipher()?.decrypt(&args.text)
}
