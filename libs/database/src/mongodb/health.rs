use mongodb::{Database, bson::doc};
use std::time::Instant;

/// Outcome of a database ping
#[derive(Debug, Clone)]
pub struct HealthStatus {
    pub healthy: bool,
    /// Driver error, when unhealthy
    pub message: Option<String>,
    pub response_time_ms: u64,
}

/// `true` when the server answers `ping`.
pub async fn check_health(db: &Database) -> bool {
    check_health_detailed(db).await.healthy
}

pub async fn check_health_detailed(db: &Database) -> HealthStatus {
    let start = Instant::now();
    let result = db.run_command(doc! { "ping": 1 }).await;
    let response_time_ms = start.elapsed().as_millis() as u64;

    match result {
        Ok(_) => HealthStatus {
            healthy: true,
            message: None,
            response_time_ms,
        },
        Err(e) => HealthStatus {
            healthy: false,
            message: Some(e.to_string()),
            response_time_ms,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::{Client, options::ClientOptions};
    use std::time::Duration;

    #[tokio::test]
    async fn test_unreachable_server_is_unhealthy() {
        let mut options = ClientOptions::parse("mongodb://127.0.0.1:1").await.unwrap();
        options.server_selection_timeout = Some(Duration::from_millis(100));
        let client = Client::with_options(options).unwrap();

        let status = check_health_detailed(&client.database("catalog")).await;
        assert!(!status.healthy);
        assert!(status.message.is_some());
    }
}
