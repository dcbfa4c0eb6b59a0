//! Database connection and health check.

use std::time::Duration;

use common::{AppResult, DatabaseConfig};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};

/// Open a pooled connection using the configured pool sizing and logging.
pub async fn connect(config: &DatabaseConfig) -> AppResult<DatabaseConnection> {
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(Duration::from_secs(config.connect_timeout_seconds))
        .sqlx_logging(config.sqlx_logging);

    let connection = Database::connect(options).await?;
    tracing::info!(
        max_connections = config.max_connections,
        "Database connected"
    );
    Ok(connection)
}

/// Check connectivity by executing a simple query.
pub async fn ping<C: ConnectionTrait>(conn: &C) -> AppResult<()> {
    conn.execute(Statement::from_string(
        conn.get_database_backend(),
        "SELECT 1".to_string(),
    ))
    .await?;
    Ok(())
}
