use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};

use crate::agents::domain::WorkerKind;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub checks: HealthChecks,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthChecks {
    pub config: String,
    /// Route labels with a registered worker
    pub workers: Vec<String>,
}

pub struct HealthHandler {
    workers: Vec<WorkerKind>,
    start_time: std::time::Instant,
}

impl HealthHandler {
    pub fn new(workers: impl IntoIterator<Item = WorkerKind>) -> Self {
        let mut workers: Vec<WorkerKind> = workers.into_iter().collect();
        workers.sort();
        Self {
            workers,
            start_time: std::time::Instant::now(),
        }
    }

    /// Basic health check - returns 200 if server is running
    pub async fn health(&self) -> impl IntoResponse {
        let status = HealthStatus {
            status: "healthy".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds: self.start_time.elapsed().as_secs(),
            checks: HealthChecks {
                config: "ok".to_string(),
                workers: self.workers.iter().map(|w| w.as_str().to_string()).collect(),
            },
        };

        (StatusCode::OK, Json(status))
    }

    /// Ready once every route label has a worker behind it
    pub async fn ready(&self) -> impl IntoResponse {
        let missing: Vec<&str> = WorkerKind::ALL
            .iter()
            .filter(|kind| !self.workers.contains(kind))
            .map(|kind| kind.as_str())
            .collect();

        if missing.is_empty() {
            (StatusCode::OK, Json(serde_json::json!({
                "status": "ready",
                "message": "Server is ready to accept requests"
            })))
        } else {
            (StatusCode::SERVICE_UNAVAILABLE, Json(serde_json::json!({
                "status": "not_ready",
                "message": format!("No worker registered for: {}", missing.join(", "))
            })))
        }
    }

    /// Liveness check - returns 200 if server is alive
    pub async fn live(&self) -> impl IntoResponse {
        (StatusCode::OK, Json(serde_json::json!({
            "status": "alive",
            "message": "Server is alive"
        })))
    }
}
