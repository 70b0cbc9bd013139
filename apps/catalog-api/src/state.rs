//! Application state management

use database::common::RetryConfig;
use domain_catalog::InMemoryCatalog;
use mongodb::{Client, Database};
use tracing::{info, warn};

use crate::config::{Config, StorageConfig};

/// Open storage handles
#[derive(Clone)]
pub enum Storage {
    MongoDb { client: Client, db: Database },
    Memory(InMemoryCatalog),
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub storage: Storage,
}

impl AppState {
    /// Opens the configured storage, retrying the MongoDB connection with backoff.
    pub async fn connect(config: Config) -> eyre::Result<Self> {
        let storage = match &config.storage {
            StorageConfig::MongoDb(mongo) => {
                let client =
                    database::mongodb::connect_from_config_with_retry(mongo, RetryConfig::default())
                        .await?;
                let db = client.database(&mongo.database_name());
                info!(database = %mongo.database_name(), "Using MongoDB storage");
                Storage::MongoDb { client, db }
            }
            StorageConfig::Memory => {
                warn!("Using in-memory storage; data is lost on restart");
                Storage::Memory(InMemoryCatalog::new())
            }
        };

        Ok(Self { config, storage })
    }

    /// The MongoDB client, when there is one to close on shutdown
    pub fn mongo_client(&self) -> Option<Client> {
        match &self.storage {
            Storage::MongoDb { client, .. } => Some(client.clone()),
            Storage::Memory(_) => None,
        }
    }
}
