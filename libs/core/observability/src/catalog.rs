//! Catalog counters.

use metrics::{counter, histogram};
use std::time::Duration;

/// Catalog metrics recorder
pub struct CatalogMetrics;

impl CatalogMetrics {
    fn write(resource: &'static str, operation: &'static str) {
        counter!("catalog_writes_total", "resource" => resource, "operation" => operation)
            .increment(1);
    }

    pub fn record_product_created() {
        Self::write("product", "create");
    }

    pub fn record_product_updated() {
        Self::write("product", "update");
    }

    pub fn record_product_deleted() {
        Self::write("product", "delete");
    }

    pub fn record_category_created() {
        Self::write("category", "create");
    }

    pub fn record_category_updated() {
        Self::write("category", "update");
    }

    pub fn record_category_deleted() {
        Self::write("category", "delete");
    }

    /// `reason` is a short label such as `duplicate_sku` or `category_in_use`.
    pub fn record_conflict(resource: &'static str, reason: &'static str) {
        counter!("catalog_conflicts_total", "resource" => resource, "reason" => reason)
            .increment(1);
    }

    pub fn record_report(kind: &'static str, duration: Duration) {
        counter!("catalog_reports_total", "kind" => kind).increment(1);
        histogram!("catalog_report_duration_seconds", "kind" => kind)
            .record(duration.as_secs_f64());

        tracing::debug!(
            kind = kind,
            duration_ms = duration.as_millis() as u64,
            "Report served"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use metrics_exporter_prometheus::PrometheusBuilder;

    #[test]
    fn test_counters_are_labelled() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        metrics::with_local_recorder(&recorder, || {
            CatalogMetrics::record_product_created();
            CatalogMetrics::record_product_created();
            CatalogMetrics::record_category_deleted();
            CatalogMetrics::record_conflict("category", "category_in_use");
            CatalogMetrics::record_report("low_stock", Duration::from_millis(12));
        });

        let rendered = handle.render();
        let sample = |name: &str, labels: &[&str]| -> Option<String> {
            rendered
                .lines()
                .find(|line| line.starts_with(name) && labels.iter().all(|l| line.contains(l)))
                .and_then(|line| line.rsplit(' ').next())
                .map(str::to_string)
        };

        assert_eq!(
            sample("catalog_writes_total", &[r#"resource="product""#, r#"operation="create""#]),
            Some("2".to_string())
        );
        assert_eq!(
            sample("catalog_writes_total", &[r#"resource="category""#, r#"operation="delete""#]),
            Some("1".to_string())
        );
        assert_eq!(
            sample("catalog_conflicts_total", &[r#"reason="category_in_use""#]),
            Some("1".to_string())
        );
        assert_eq!(
            sample("catalog_reports_total", &[r#"kind="low_stock""#]),
            Some("1".to_string())
        );
    }
}
