//! Health check endpoint

use axum::{extract::State, routing::get, Json, Router};
use chordscope_common::time::elapsed_seconds;
use chrono::Utc;
use serde::Serialize;

use crate::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status ("ok")
    pub status: String,
    /// Module name ("chordscope-fe")
    pub module: String,
    /// Crate version from Cargo.toml
    pub version: String,
    /// Seconds since service started
    pub uptime_seconds: u64,
    /// Sessions with a running analysis task
    pub live_sessions: usize,
    /// Last analysis failure, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let uptime_seconds = elapsed_seconds(state.startup_time, Utc::now());
    let last_error = state.last_error.read().await.clone();
    let live_sessions = state.orchestrator.live_session_count().await;

    Json(HealthResponse {
        status: "ok".to_string(),
        module: "chordscope-fe".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds,
        live_sessions,
        last_error,
    })
}

/// Build health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
