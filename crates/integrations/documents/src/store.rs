//! Document database connection.

use common::{AppResult, DocumentConfig};
use mongodb::bson::doc;
use mongodb::options::ClientOptions;
use mongodb::{Client, Database};
use serde::{de::DeserializeOwned, Serialize};

use crate::repository::DocumentRepository;

/// Handle to one document database.
#[derive(Debug, Clone)]
pub struct DocumentStore {
    database: Database,
}

impl DocumentStore {
    pub fn new(database: Database) -> Self {
        Self { database }
    }

    /// Build a client from the configured URI. No server round trip is made.
    pub async fn connect(config: &DocumentConfig) -> AppResult<Self> {
        let mut options = ClientOptions::parse(&config.uri).await?;
        if let Some(app_name) = &config.app_name {
            options.app_name = Some(app_name.clone());
        }

        let client = Client::with_options(options)?;
        tracing::info!(database = %config.database, "Document store configured");
        Ok(Self::new(client.database(&config.database)))
    }

    pub fn name(&self) -> &str {
        self.database.name()
    }

    /// Repository over the named collection.
    pub fn collection<T>(&self, name: &str) -> DocumentRepository<T>
    where
        T: Serialize + DeserializeOwned + Unpin + Send + Sync,
    {
        DocumentRepository::new(self.database.collection::<T>(name))
    }

    /// Check connectivity with the `ping` command.
    pub async fn ping(&self) -> AppResult<()> {
        self.database.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }
}
