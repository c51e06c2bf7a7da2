//! Unauthenticated liveness endpoint.

use std::sync::Arc;
use std::time::Instant;

use axum::{extract::State, Json};
use serde::Serialize;

/// Path the health route is mounted on.
pub const HEALTH_PATH: &str = "/health";

/// State behind the health route.
#[derive(Debug, Clone)]
pub struct HealthState {
    server_name: String,
    started: Instant,
}

impl HealthState {
    /// Starts the uptime clock now.
    pub fn new(server_name: impl Into<String>) -> Self {
        Self {
            server_name: server_name.into(),
            started: Instant::now(),
        }
    }

    /// Builds the report as of `now`.
    #[must_use]
    pub fn report_at(&self, now: Instant) -> HealthReport {
        HealthReport {
            status: "healthy",
            server: self.server_name.clone(),
            version: env!("CARGO_PKG_VERSION"),
            uptime_seconds: now.saturating_duration_since(self.started).as_secs(),
        }
    }
}

/// Body of a `GET /health` response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    /// Always `"healthy"` while the process answers.
    pub status: &'static str,
    /// Configured server name.
    pub server: String,
    /// Crate version.
    pub version: &'static str,
    /// Whole seconds since startup.
    pub uptime_seconds: u64,
}

/// `GET /health` handler.
pub async fn health_handler(State(state): State<Arc<HealthState>>) -> Json<HealthReport> {
    Json(state.report_at(Instant::now()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_report_fields() {
        let state = HealthState::new("DevRev MCP Server");
        let report = state.report_at(state.started + Duration::from_millis(2500));
        assert_eq!(report.status, "healthy");
        assert_eq!(report.server, "DevRev MCP Server");
        assert_eq!(report.version, env!("CARGO_PKG_VERSION"));
        assert_eq!(report.uptime_seconds, 2);
    }

    #[test]
    fn test_report_serializes() {
        let state = HealthState::new("x");
        let value = serde_json::to_value(state.report_at(state.started)).unwrap();
        assert_eq!(value["status"], "healthy");
        assert_eq!(value["uptime_seconds"], 0);
    }
}
