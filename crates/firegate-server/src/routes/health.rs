//! Liveness endpoint.

use axum::{Json, Router, extract::State, routing::get};
use serde::{Deserialize, Serialize};

use crate::state::AppState;

/// Body of `GET /health`.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// API root requests under `/proxy/` are forwarded to.
    pub upstream: String,
    pub single_flight_refresh: bool,
}

/// Reports the wiring without touching the session or calling the upstream.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        upstream: state.gateway.api_root().to_string(),
        single_flight_refresh: state.tokens.single_flight_enabled(),
    })
}

pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health))
}
