//! Server-Sent Events (SSE) utilities
//!
//! Shared SSE pieces for Chordscope services.

use axum::response::sse::{Event, KeepAlive};
use futures::stream::Stream;
use std::convert::Infallible;
use std::time::Duration;
use tracing::{debug, info};

/// Interval between heartbeat comments on every SSE stream
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(15);

/// Keep-alive configuration shared by all Chordscope SSE endpoints
pub fn heartbeat_keep_alive() -> KeepAlive {
    KeepAlive::new().interval(HEARTBEAT_INTERVAL).text("heartbeat")
}

/// Heartbeat-only event stream for connection status monitoring
///
/// Yields a `ConnectionStatus: connected` event, then a heartbeat comment
/// every [`HEARTBEAT_INTERVAL`]. The browser pages use it to show a
/// connected/disconnected badge independent of any analysis session.
///
/// # Arguments
/// * `service_name` - Name of the service for logging (e.g., "chordscope-fe")
pub fn heartbeat_stream(
    service_name: &'static str,
) -> impl Stream<Item = Result<Event, Infallible>> {
    info!("New SSE client connected to {} general events", service_name);

    async_stream::stream! {
        yield Ok(Event::default()
            .event("ConnectionStatus")
            .data("connected"));

        loop {
            tokio::time::sleep(HEARTBEAT_INTERVAL).await;
            debug!("SSE: Sending heartbeat");
            yield Ok(Event::default().comment("heartbeat"));
        }
    }
}
