//! # Axum Helpers
//!
//! Shared HTTP plumbing for the catalog services.
//!
//! ## Modules
//!
//! - **[`response`]**: success envelope and pagination metadata
//! - **[`errors`]**: `AppError`, the error envelope and field-level validation errors
//! - **[`extractors`]**: `ValidatedJson`, `ValidatedQuery`, `ObjectIdPath`
//! - **[`http`]**: CORS, security headers, per-IP rate limiting
//! - **[`server`]**: router assembly with OpenAPI UIs, health checks, graceful shutdown
//!
//! ## Quick Start
//!
//! ```ignore
//! use axum_helpers::server::{create_production_app, create_router};
//! use core_config::{CorsConfig, server::ServerConfig};
//! use utoipa::OpenApi;
//!
//! #[derive(OpenApi)]
//! #[openapi(paths())]
//! struct ApiDoc;
//!
//! let router = create_router::<ApiDoc>(api_routes, &CorsConfig::any(), 10 * 1024 * 1024)?;
//! create_production_app(router, &ServerConfig::default(), Duration::from_secs(30), async {}).await?;
//! ```

pub mod errors;
pub mod extractors;
pub mod http;
pub mod response;
pub mod server;

pub use errors::{AppError, ErrorCode, ErrorResponse, FieldError, FieldLocation, field_errors};
pub use extractors::{FromQueryParams, ObjectIdPath, ValidatedJson, ValidatedQuery};
pub use http::{RateLimitState, create_cors_layer, rate_limit, security_headers};
pub use response::{ApiResponse, Created, Meta, PaginationMeta};
pub use server::{
    HealthCheckFuture, ShutdownCoordinator, create_production_app, create_router, health_router,
    run_health_checks, shutdown_signal,
};
