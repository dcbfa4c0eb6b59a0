//! Ping-db command - Database connectivity check.

use common::AppResult;

use crate::cli::args::PingDbArgs;
use crate::container::ServiceContainer;

/// Execute the ping-db command
pub async fn ping(args: PingDbArgs, services: &dyn ServiceContainer) -> AppResult<String> {
    if args.documents {
        let store = services.documents()?;
        store.ping().await?;
        return Ok(format!("document database '{}' is reachable", store.name()));
    }

    services.persistence()?.ping().await?;
    Ok("database is reachable".to_string())
}
