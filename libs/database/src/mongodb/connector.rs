use mongodb::{Client, bson::doc, options::ClientOptions};
use std::time::Duration;
use tracing::info;

use super::MongoConfig;
use crate::common::{DatabaseError, DatabaseResult, RetryConfig, retry_with_backoff};

/// Connect with the driver's defaults and verify the server answers a ping.
pub async fn connect(uri: &str) -> DatabaseResult<Client> {
    connect_from_config(&MongoConfig::new(uri)).await
}

/// Build a pooled client from `config` and ping the resolved database.
pub async fn connect_from_config(config: &MongoConfig) -> DatabaseResult<Client> {
    info!(uri = %config.redacted_uri(), "Connecting to MongoDB");

    let mut options = ClientOptions::parse(&config.uri).await?;
    options.max_pool_size = Some(config.max_pool_size);
    options.min_pool_size = Some(config.min_pool_size);
    options.connect_timeout = Some(Duration::from_millis(config.connect_timeout_ms));
    options.server_selection_timeout =
        Some(Duration::from_millis(config.server_selection_timeout_ms));
    if let Some(app_name) = &config.app_name {
        options.app_name = Some(app_name.clone());
    }

    let client = Client::with_options(options)?;

    client
        .database(&config.database_name())
        .run_command(doc! { "ping": 1 })
        .await
        .map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))?;

    info!(database = %config.database_name(), "Connected to MongoDB");
    Ok(client)
}

/// [`connect_from_config`] under exponential backoff, for startups racing the database container.
pub async fn connect_from_config_with_retry(
    config: &MongoConfig,
    retry_config: RetryConfig,
) -> DatabaseResult<Client> {
    retry_with_backoff(|| connect_from_config(config), retry_config).await
}
