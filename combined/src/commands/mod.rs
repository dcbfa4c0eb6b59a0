//! Commands module - CLI command implementations.
//!
//! Every command resolves its services from a [`ServiceContainer`] and
//! returns the text to print.
//!
//! [`ServiceContainer`]: crate::container::ServiceContainer

pub mod communication;
pub mod database;
pub mod security;
pub mod storage;

use common::{AppResult, Settings};

use crate::cli::Commands;
use crate::container::{ServiceContainer, Services, ServicesBuilder};

/// Register only the services `command` uses.
///
/// Nothing else is built, so an unreachable database or cache cannot fail
/// an unrelated command.
pub async fn services_for(command: &Commands, settings: &Settings) -> AppResult<Services> {
    let builder = ServicesBuilder::new();
    let builder = match command {
        Commands::Hash(_) | Commands::Verify(_) => builder.add_hasher(&settings.hashing)?,
        Commands::Encrypt(_) | Commands::Decrypt(_) => builder.add_cipher(&settings.cipher)?,
        Commands::Presign(_) => builder.add_storage(&settings.storage)?,
        Commands::Mail(_) => builder.add_email(&settings.smtp)?,
        Commands::Sms(_) => builder.add_sms(&settings.sms)?,
        Commands::PingDb(args) if args.documents => match &settings.documents {
            Some(config) => builder.add_documents(config).await?,
            None => builder,
        },
        Commands::PingDb(_) => match &settings.database {
            Some(config) => builder.add_persistence(config).await?,
            None => builder,
        },
    };
    Ok(builder.build())
}

/// Dispatch a parsed command against the registered services.
pub async fn execute(command: Commands, services: &dyn ServiceContainer) -> AppResult<String> {
    match command {
        Commands::Hash(args) => security::hash(args, services),
        Commands::Verify(args) => security::verify(args, services),
        Commands::Encrypt(args) => security::encrypt(args, services),
        Commands::Decrypt(args) => security::decrypt(args, services),
        Commands::Presign(args) => storage::presign(args, services).await,
        Commands::Mail(args) => communication::mail(args, services).await,
        Commands::Sms(args) => communication::sms(args, services).await,
        Commands::PingDb(args) => database::ping(args, services).await,
    }
}
