//! Prometheus metrics for the catalog services.
//!
//! - recorder installation and the `/metrics` handler
//! - HTTP request metrics middleware
//! - catalog counters ([`CatalogMetrics`])
//!
//! ```rust,ignore
//! use observability::{init_metrics, metrics_handler, CatalogMetrics};
//!
//! init_metrics();
//! CatalogMetrics::record_product_created();
//!
//! let app = Router::new().route("/metrics", get(metrics_handler));
//! ```

pub mod catalog;
pub mod middleware;

pub use catalog::CatalogMetrics;
pub use middleware::metrics_middleware;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use tracing::{info, warn};

static METRICS_HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

/// Installs the global Prometheus recorder once and returns its handle.
///
/// If another recorder is already installed, metrics are still accepted but
/// `/metrics` renders nothing.
pub fn init_metrics() -> &'static PrometheusHandle {
    METRICS_HANDLE.get_or_init(|| {
        let handle = match PrometheusBuilder::new().install_recorder() {
            Ok(handle) => {
                info!("Prometheus metrics recorder initialized");
                handle
            }
            Err(e) => {
                warn!(error = %e, "Could not install Prometheus recorder");
                PrometheusBuilder::new().build_recorder().handle()
            }
        };

        register_metric_descriptions();
        handle
    })
}

pub fn get_metrics_handle() -> Option<&'static PrometheusHandle> {
    METRICS_HANDLE.get()
}

/// Axum handler for `/metrics`
pub async fn metrics_handler() -> String {
    match get_metrics_handle() {
        Some(handle) => handle.render(),
        None => "# Metrics not initialized\n".to_string(),
    }
}

fn register_metric_descriptions() {
    use metrics::{describe_counter, describe_histogram};

    describe_counter!("http_requests_total", "Total number of HTTP requests");
    describe_histogram!(
        "http_request_duration_seconds",
        "HTTP request duration in seconds"
    );
    describe_counter!(
        "http_requests_errors_total",
        "Total number of HTTP request errors"
    );

    describe_counter!(
        "catalog_writes_total",
        "Catalog writes by resource and operation"
    );
    describe_counter!(
        "catalog_conflicts_total",
        "Writes rejected by uniqueness or reference rules"
    );
    describe_counter!("catalog_reports_total", "Reports served by kind");
    describe_histogram!(
        "catalog_report_duration_seconds",
        "Report aggregation duration in seconds"
    );
}
