use axum::http::{HeaderValue, Method, header};
use core_config::{AllowedOrigins, CorsConfig};
use std::io;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

const ALLOWED_METHODS: [Method; 6] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::DELETE,
    Method::PATCH,
    Method::OPTIONS,
];

/// Builds the CORS layer for `config`.
///
/// A wildcard origin cannot be combined with credentials, so credentials are
/// only allowed for an explicit origin list.
///
/// # Errors
/// Returns `InvalidInput` when an origin is not a valid header value.
pub fn create_cors_layer(config: &CorsConfig) -> io::Result<CorsLayer> {
    let headers = [header::CONTENT_TYPE, header::ACCEPT, header::AUTHORIZATION];
    let layer = CorsLayer::new()
        .allow_methods(ALLOWED_METHODS)
        .max_age(Duration::from_secs(3600));

    match &config.origins {
        AllowedOrigins::Any => Ok(layer.allow_origin(Any).allow_headers(headers)),
        AllowedOrigins::List(origins) => {
            let values = origins
                .iter()
                .map(|origin| origin.parse::<HeaderValue>())
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| {
                    io::Error::new(
                        io::ErrorKind::InvalidInput,
                        format!("Invalid ALLOWED_ORIGINS value: {e}"),
                    )
                })?;

            tracing::info!(origins = ?origins, "CORS restricted to configured origins");

            Ok(layer
                .allow_origin(AllowOrigin::list(values))
                .allow_headers(headers)
                .allow_credentials(true))
        }
    }
}
