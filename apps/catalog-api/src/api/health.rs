//! Health check endpoints

use axum::{extract::State, routing::get, Router};
use axum_helpers::{
    server::{health::ReadinessData, run_health_checks, HealthCheckFuture},
    ApiResponse, AppError,
};
use database::mongodb::check_health_detailed;

use crate::state::{AppState, Storage};

async fn ready(State(state): State<AppState>) -> Result<ApiResponse<ReadinessData>, AppError> {
    let check: HealthCheckFuture = match &state.storage {
        Storage::MongoDb { db, .. } => Box::pin(async move {
            let status = check_health_detailed(db).await;
            if status.healthy {
                Ok(())
            } else {
                Err(status.message.unwrap_or_else(|| "ping failed".to_string()))
            }
        }),
        Storage::Memory(_) => Box::pin(async { Ok(()) }),
    };

    run_health_checks(vec![("database", check)]).await
}

/// `/health` for liveness, `/ready` for storage reachability
pub fn router(state: AppState) -> Router {
    let liveness = axum_helpers::health_router(state.config.app, state.config.environment);

    Router::new()
        .route("/ready", get(ready))
        .with_state(state)
        .merge(liveness)
}
