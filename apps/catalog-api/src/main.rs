//! Product Catalog API - REST server

use axum_helpers::{server::create_production_app, RateLimitState};
use core_config::tracing::{init_tracing, install_color_eyre};
use std::time::Duration;
use tracing::info;

mod api;
mod config;
mod openapi;
mod state;

use config::Config;
use state::AppState;

const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);
const RATE_LIMIT_PRUNE_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> eyre::Result<()> {
    install_color_eyre();

    let config = Config::from_env()?;
    init_tracing(&config.environment);
    observability::init_metrics();

    let state = AppState::connect(config).await?;
    api::init_indexes(&state).await?;

    let limiter = RateLimitState::new(&state.config.rate_limit);
    let pruner = {
        let limiter = limiter.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(RATE_LIMIT_PRUNE_INTERVAL);
            loop {
                interval.tick().await;
                limiter.prune();
            }
        })
    };

    let app = api::app(&state, limiter)?;

    info!(
        environment = state.config.environment.as_str(),
        "Starting {} v{} on port {}",
        state.config.app.name,
        state.config.app.version,
        state.config.server.port
    );

    let mongo_client = state.mongo_client();
    let result = create_production_app(app, &state.config.server, SHUTDOWN_TIMEOUT, async move {
        if let Some(client) = mongo_client {
            info!("Shutting down: closing MongoDB connections");
            client.shutdown().await;
            info!("MongoDB connection closed");
        }
    })
    .await;

    pruner.abort();
    result.map_err(|e| eyre::eyre!("Server error: {}", e))?;

    info!("Catalog API shutdown complete");
    Ok(())
}
