//! Server infrastructure: router assembly with OpenAPI UIs, health and
//! readiness endpoints, and graceful shutdown.
//!
//! ```ignore
//! use axum_helpers::server::{create_production_app, create_router, health_router};
//!
//! let router = create_router::<ApiDoc>(api_routes, &config.cors, config.server.body_limit)?
//!     .merge(health_router(app_info!(), config.environment));
//!
//! create_production_app(router, &config.server, Duration::from_secs(30), cleanup).await?;
//! ```

pub mod app;
pub mod health;
pub mod shutdown;

pub use app::{create_production_app, create_router};
pub use health::{HealthCheckFuture, HealthData, health_router, run_health_checks};
pub use shutdown::{ShutdownCoordinator, shutdown_signal};
