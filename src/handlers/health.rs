//! Health endpoint. Outside the rate-limited path prefix, so probes never
//! consume rate budget.

use axum::Json;
use axum::extract::State;

use crate::models::HealthResponse;
use crate::state::AppState;

/// `GET /health` - liveness probe with uptime.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.uptime_seconds(),
    })
}
