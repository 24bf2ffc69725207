//! Health and probe endpoints.

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use serde_json::{json, Value};
use std::time::Instant;

use crate::app::AppState;

/// Response for the full health check.
#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub version: &'static str,
    pub database_connected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_latency_ms: Option<u64>,
}

/// Round-trips a trivial query, returning the latency when the database
/// answers.
async fn ping_database(state: &AppState) -> Option<u64> {
    let started = Instant::now();
    sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(&state.pool)
        .await
        .ok()
        .map(|_| started.elapsed().as_millis() as u64)
}

/// Full health check: database connectivity plus latency.
///
/// GET /api/health
pub async fn health_check(
    State(state): State<AppState>,
) -> Result<Json<HealthReport>, StatusCode> {
    match ping_database(&state).await {
        Some(latency_ms) => Ok(Json(HealthReport {
            status: "healthy",
            version: env!("CARGO_PKG_VERSION"),
            database_connected: true,
            database_latency_ms: Some(latency_ms),
        })),
        None => Err(StatusCode::SERVICE_UNAVAILABLE),
    }
}

/// Liveness probe: the process is up.
///
/// GET /api/health/live
pub async fn live() -> Json<Value> {
    Json(json!({ "status": "alive" }))
}

/// Readiness probe: the database answers.
///
/// GET /api/health/ready
pub async fn ready(State(state): State<AppState>) -> Result<Json<Value>, StatusCode> {
    if ping_database(&state).await.is_some() {
        Ok(Json(json!({ "status": "ready" })))
    } else {
        Err(StatusCode::SERVICE_UNAVAILABLE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn healthy_report_carries_latency() {
        let report = HealthReport {
            status: "healthy",
            version: "0.6.0",
            database_connected: true,
            database_latency_ms: Some(4),
        };
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"database_latency_ms\":4"));
        assert!(json.contains("\"status\":\"healthy\""));
    }

    #[test]
    fn missing_latency_is_omitted_from_the_body() {
        let report = HealthReport {
            status: "unhealthy",
            version: "0.6.0",
            database_connected: false,
            database_latency_ms: None,
        };
        let json = serde_json::to_string(&report).unwrap();
        assert!(!json.contains("database_latency_ms"));
    }
}
