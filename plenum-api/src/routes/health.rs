//! Health and internal state endpoints.

use axum::extract::State;
use axum::Json;
use plenum_review::{AnalysisCoordinator, AnalysisMetricsSnapshot};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub uptime_secs: u64,
}

/// GET /health
pub async fn health(State(start_time): State<Instant>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        uptime_secs: start_time.elapsed().as_secs(),
    })
}

/// GET /internal/analysis-metrics
pub async fn analysis_metrics(
    State(coordinator): State<Arc<AnalysisCoordinator>>,
) -> Json<AnalysisMetricsSnapshot> {
    Json(coordinator.metrics())
}
