//! Server-Sent Events (SSE) for analysis progress streaming
//!
//! The progress and input pages follow sessions through these events; the
//! `ViewChanged` event tells the browser which page to show.

use crate::AppState;
use axum::{
    extract::{Query, State},
    response::sse::{Event, Sse},
};
use chordscope_common::events::ChordscopeEvent;
use chordscope_common::sse::{heartbeat_keep_alive, heartbeat_stream, HEARTBEAT_INTERVAL};
use futures::stream::{Stream, StreamExt};
use serde::Deserialize;
use std::convert::Infallible;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Optional session filter
#[derive(Debug, Default, Deserialize)]
pub struct EventFilter {
    pub session: Option<Uuid>,
}

impl EventFilter {
    fn accepts(&self, event: &ChordscopeEvent) -> bool {
        self.session.map_or(true, |id| event.session_id() == id)
    }
}

/// GET /events - connection status heartbeat
///
/// Ends when the service shuts down so graceful shutdown is not held open.
pub async fn event_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let shutdown = state.orchestrator.shutdown_token();
    let stream = heartbeat_stream("chordscope-fe")
        .take_until(async move { shutdown.cancelled().await });

    Sse::new(stream).keep_alive(heartbeat_keep_alive())
}

/// GET /analysis/events[?session=<id>] - SSE event stream for analysis sessions
///
/// Streams events:
/// - AnalysisSubmitted
/// - AnalysisProgress (once per estimator tick)
/// - AnalysisSucceeded
/// - AnalysisFailed
/// - AnalysisCancelled
/// - ViewChanged
pub async fn analysis_event_stream(
    State(state): State<AppState>,
    Query(filter): Query<EventFilter>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let mut rx = state.event_bus.subscribe();
    info!(
        session = ?filter.session,
        subscribers = state.event_bus.subscriber_count(),
        "New SSE client connected to analysis events"
    );
    let shutdown = state.orchestrator.shutdown_token();

    let stream = async_stream::stream! {
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    debug!("SSE: Service shutting down, ending stream");
                    break;
                }

                _ = tokio::time::sleep(HEARTBEAT_INTERVAL) => {
                    debug!("SSE: Sending heartbeat");
                    yield Ok(Event::default().comment("heartbeat"));
                }

                received = rx.recv() => {
                    let event = match received {
                        Ok(event) => event,
                        Err(RecvError::Lagged(skipped)) => {
                            warn!(skipped, "SSE: Client lagging, events dropped");
                            continue;
                        }
                        Err(RecvError::Closed) => {
                            info!("SSE: Event bus closed, ending stream");
                            break;
                        }
                    };

                    if !filter.accepts(&event) {
                        continue;
                    }

                    let event_type = event.event_type();
                    match serde_json::to_string(&event) {
                        Ok(event_json) => {
                            debug!("SSE: Broadcasting analysis event: {}", event_type);
                            yield Ok(Event::default()
                                .event(event_type)
                                .data(event_json));
                            if event.is_terminal() {
                                debug!(session_id = %event.session_id(), "SSE: Session reached a final state");
                            }
                        }
                        Err(e) => {
                            warn!("SSE: Failed to serialize event {}: {}", event_type, e);
                        }
                    }
                }
            }
        }
    };

    Sse::new(stream).keep_alive(heartbeat_keep_alive())
}
