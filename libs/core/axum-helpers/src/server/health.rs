use crate::errors::AppError;
use crate::response::ApiResponse;
use axum::{Router, extract::State, routing::get};
use chrono::{DateTime, Utc};
use core_config::{AppInfo, Environment};
use futures::future::join_all;
use serde::Serialize;
use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::time::Instant;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthData {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
    /// Seconds since the router was built
    pub uptime: f64,
    pub environment: &'static str,
    pub version: &'static str,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReadinessData {
    pub status: &'static str,
    /// Check name to `connected`
    pub checks: BTreeMap<String, &'static str>,
}

#[derive(Clone)]
struct HealthState {
    info: AppInfo,
    environment: Environment,
    started_at: Instant,
}

/// A boxed future for health checks with a string error
pub type HealthCheckFuture<'a> = Pin<Box<dyn Future<Output = Result<(), String>> + Send + 'a>>;

/// Runs `checks` concurrently.
///
/// All passing yields the success envelope listing each check; any failure
/// yields `503` naming the failed checks.
///
/// ```ignore
/// let checks: Vec<(&str, HealthCheckFuture)> = vec![(
///     "database",
///     Box::pin(async { repo.ping().await.map_err(|e| e.to_string()) }),
/// )];
/// run_health_checks(checks).await
/// ```
pub async fn run_health_checks(
    checks: Vec<(&str, HealthCheckFuture<'_>)>,
) -> Result<ApiResponse<ReadinessData>, AppError> {
    let names: Vec<_> = checks.iter().map(|(name, _)| *name).collect();
    let futures: Vec<_> = checks.into_iter().map(|(_, check)| check).collect();
    let results = join_all(futures).await;

    let mut checks = BTreeMap::new();
    let mut failed = Vec::new();

    for (name, result) in names.into_iter().zip(results) {
        match result {
            Ok(()) => {
                checks.insert(name.to_string(), "connected");
            }
            Err(e) => {
                tracing::error!(check = name, error = %e, "Readiness check failed");
                failed.push(name);
            }
        }
    }

    if !failed.is_empty() {
        return Err(AppError::ServiceUnavailable(format!(
            "Service not ready: {} unavailable",
            failed.join(", ")
        )));
    }

    Ok(ApiResponse::ok(ReadinessData {
        status: "ready",
        checks,
    })
    .with_message("Service is ready"))
}

async fn health_handler(State(state): State<HealthState>) -> ApiResponse<HealthData> {
    ApiResponse::ok(HealthData {
        status: "healthy",
        timestamp: Utc::now(),
        uptime: state.started_at.elapsed().as_secs_f64(),
        environment: state.environment.as_str(),
        version: state.info.version,
    })
    .with_message(format!("{} is running", state.info.name))
}

/// Liveness endpoint at `/health`.
///
/// Always `200` while the process serves requests; readiness belongs to the
/// app's own `/ready` handler built on [`run_health_checks`].
pub fn health_router(info: AppInfo, environment: Environment) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .with_state(HealthState {
            info,
            environment,
            started_at: Instant::now(),
        })
}
