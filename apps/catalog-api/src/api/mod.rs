//! API routes module

pub mod catalog;
pub mod health;

use axum::{middleware, routing::get, Router};
use axum_helpers::{create_router, rate_limit, RateLimitState};
use observability::{metrics_handler, metrics_middleware};

use crate::openapi::ApiDoc;
use crate::state::AppState;

/// Routes under `/api`, rate limited per client IP
pub fn routes(state: &AppState, limiter: RateLimitState) -> Router {
    catalog::router(state)
        .route_layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn_with_state(limiter, rate_limit))
}

/// The complete application: `/api`, documentation, health and metrics
pub fn app(state: &AppState, limiter: RateLimitState) -> eyre::Result<Router> {
    let config = &state.config;
    let router = create_router::<ApiDoc>(
        routes(state, limiter),
        &config.cors,
        config.server.body_limit,
    )?;

    Ok(router
        .merge(health::router(state.clone()))
        .route("/metrics", get(metrics_handler)))
}

/// Initialize database indexes
pub async fn init_indexes(state: &AppState) -> eyre::Result<()> {
    catalog::init_indexes(state).await
}
