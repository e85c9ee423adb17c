use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use memo_store::SweepState;
use serde::Serialize;

use crate::state::AppState;

pub const SERVICE_NAME: &str = "memo-relay";

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub sweep: SweepSummary,
}

/// What the background sweep has done since startup.
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepSummary {
    pub total_runs: u64,
    pub consecutive_failures: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_run: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_deleted: Option<usize>,
}

impl SweepSummary {
    fn from_state(state: &SweepState) -> Self {
        Self {
            total_runs: state.total_runs(),
            consecutive_failures: state.failure_count(),
            last_run: state.last_run(),
            last_deleted: state.last_report().map(|r| r.total_deleted()),
        }
    }
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            service: SERVICE_NAME.to_string(),
            sweep: SweepSummary::default(),
        }
    }
}

/// Handler for GET /health.
///
/// Always 200: a failing sweep is reported in the body, not the status.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        sweep: SweepSummary::from_state(state.sweep_state()),
        ..HealthResponse::default()
    })
}
