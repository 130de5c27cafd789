//! Health check handler
//!
//! Liveness endpoint for load balancers and uptime checks.

use axum::{Json, extract::State};
use serde::Serialize;

use crate::state::AppState;

/// Public health check response
///
/// No secrets or provider details are exposed.
#[derive(Debug, Serialize)]
pub struct HealthCheckResponse {
    /// Status indicator (always "ok")
    pub status: String,
    /// Active payment gateway ("paystack" or "mock")
    pub gateway: String,
}

/// Public health check handler that returns simple status
///
/// # Example
/// ```bash
/// curl http://localhost:3000/api/v1/health
/// # Returns: {"status":"ok","gateway":"paystack"}
/// ```
pub async fn health_check(State(state): State<AppState>) -> Json<HealthCheckResponse> {
    tracing::debug!("Health check requested");
    Json(HealthCheckResponse {
        status: "ok".to_string(),
        gateway: state.payments.gateway().name().to_string(),
    })
}
