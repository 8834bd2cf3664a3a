//! chordscope-fe library interface
//!
//! Exposes the router and application state for the binary and for
//! integration tests.

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod services;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chordscope_common::events::EventBus;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;

use crate::services::{AnalysisBackend, AnalysisOrchestrator, AnalysisSettings, InputCollector};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Owns analysis sessions and their tasks
    pub orchestrator: AnalysisOrchestrator,
    /// Validates submissions before they reach the orchestrator
    pub input_collector: InputCollector,
    /// Event bus for SSE broadcasting
    pub event_bus: EventBus,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    /// Last analysis failure, reported by /health
    pub last_error: Arc<RwLock<Option<String>>>,
}

impl AppState {
    pub fn new(
        backend: Arc<dyn AnalysisBackend>,
        event_bus: EventBus,
        settings: AnalysisSettings,
    ) -> Self {
        let orchestrator = AnalysisOrchestrator::new(backend, event_bus.clone(), settings);
        Self {
            input_collector: InputCollector::new(orchestrator.clone()),
            last_error: orchestrator.last_error_handle(),
            orchestrator,
            event_bus,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;

    Router::new()
        // UI routes (HTML pages)
        .merge(api::ui_routes())
        // API routes
        .merge(api::analysis_routes())
        .route("/events", get(api::event_stream))
        .route("/analysis/events", get(api::analysis_event_stream))
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
