//! Event types for the Chordscope event system
//!
//! Provides shared event definitions and the EventBus used to fan analysis
//! progress out to SSE clients.

mod analysis_types;

pub use analysis_types::{FailureKind, InputSource, ViewKind};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Chordscope event types
///
/// Events are broadcast via EventBus and serialized for SSE transmission.
/// The `type` tag doubles as the SSE event name.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ChordscopeEvent {
    /// Analysis accepted and dispatched to the backend
    ///
    /// Triggers:
    /// - SSE: Input page navigates to the progress view
    AnalysisSubmitted {
        /// Analysis session UUID
        session_id: Uuid,
        /// File upload or URL
        source: InputSource,
        /// When the submission was accepted
        timestamp: DateTime<Utc>,
    },

    /// Synthetic progress update (once per estimator tick)
    ///
    /// Never exceeds 90 while the session is pending; 100 is only sent
    /// alongside a successful result.
    AnalysisProgress {
        /// Analysis session UUID
        session_id: Uuid,
        /// Percentage complete (0.0 - 100.0)
        percentage: f64,
        /// Progress update timestamp
        timestamp: DateTime<Utc>,
    },

    /// Backend returned a usable chord/note sequence
    AnalysisSucceeded {
        /// Analysis session UUID
        session_id: Uuid,
        /// Display title (remote title, default title, or file name)
        title: String,
        /// Number of entries in the result
        note_count: usize,
        /// When the result was accepted
        timestamp: DateTime<Utc>,
    },

    /// Analysis ended without a result
    ///
    /// Triggers:
    /// - SSE: Progress view shows the message with a "go back" link
    AnalysisFailed {
        /// Analysis session UUID
        session_id: Uuid,
        /// Failure category
        kind: FailureKind,
        /// Human-readable message
        message: String,
        /// When the failure was recorded
        timestamp: DateTime<Utc>,
    },

    /// User navigated away before the analysis resolved
    AnalysisCancelled {
        /// Analysis session UUID
        session_id: Uuid,
        /// When the session was torn down
        timestamp: DateTime<Utc>,
    },

    /// Navigation transition the browser should follow
    ViewChanged {
        /// Analysis session UUID
        session_id: Uuid,
        /// View to show
        view: ViewKind,
        /// When the transition happened
        timestamp: DateTime<Utc>,
    },
}

impl ChordscopeEvent {
    /// Get event type as string for filtering and SSE event names
    pub fn event_type(&self) -> &str {
        match self {
            ChordscopeEvent::AnalysisSubmitted { .. } => "AnalysisSubmitted",
            ChordscopeEvent::AnalysisProgress { .. } => "AnalysisProgress",
            ChordscopeEvent::AnalysisSucceeded { .. } => "AnalysisSucceeded",
            ChordscopeEvent::AnalysisFailed { .. } => "AnalysisFailed",
            ChordscopeEvent::AnalysisCancelled { .. } => "AnalysisCancelled",
            ChordscopeEvent::ViewChanged { .. } => "ViewChanged",
        }
    }

    /// Session this event belongs to
    pub fn session_id(&self) -> Uuid {
        match self {
            ChordscopeEvent::AnalysisSubmitted { session_id, .. }
            | ChordscopeEvent::AnalysisProgress { session_id, .. }
            | ChordscopeEvent::AnalysisSucceeded { session_id, .. }
            | ChordscopeEvent::AnalysisFailed { session_id, .. }
            | ChordscopeEvent::AnalysisCancelled { session_id, .. }
            | ChordscopeEvent::ViewChanged { session_id, .. } => *session_id,
        }
    }

    /// True for events that end a session's pending phase
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ChordscopeEvent::AnalysisSucceeded { .. }
                | ChordscopeEvent::AnalysisFailed { .. }
                | ChordscopeEvent::AnalysisCancelled { .. }
        )
    }
}

// ========================================
// EventBus Implementation
// ========================================

/// Central event distribution bus
///
/// The EventBus uses tokio::broadcast internally, providing:
/// - Non-blocking publish (slow subscribers don't block producers)
/// - Multiple concurrent subscribers
/// - Automatic cleanup when subscribers drop
/// - Lagged message detection for slow subscribers
///
/// # Examples
///
/// ```
/// use chordscope_common::events::{ChordscopeEvent, EventBus};
///
/// let event_bus = EventBus::new(100);
/// let mut rx = event_bus.subscribe();
///
/// event_bus.emit_lossy(ChordscopeEvent::AnalysisProgress {
///     session_id: uuid::Uuid::new_v4(),
///     percentage: 0.3,
///     timestamp: chrono::Utc::now(),
/// });
///
/// assert_eq!(rx.try_recv().unwrap().event_type(), "AnalysisProgress");
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<ChordscopeEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// * `capacity` - Number of events to buffer before slow subscribers lag
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<ChordscopeEvent> {
        self.tx.subscribe()
    }

    /// Emit an event, ignoring if no subscribers are listening
    ///
    /// Progress ticks with no browser attached are simply dropped.
    pub fn emit_lossy(&self, event: ChordscopeEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
