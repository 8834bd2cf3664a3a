//! Analysis session state machine
//!
//! A session moves through:
//! IDLE → SUBMITTING → AWAITING_RESPONSE → {SUCCEEDED | FAILED}
//!
//! CANCELLED is reached from any non-terminal state when the user navigates
//! back before the backend answers. Terminal states never change again.

use chordscope_common::events::{FailureKind, InputSource, ViewKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{AnalysisResult, Instrument};

/// Analysis session state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnalysisState {
    /// Created, nothing sent yet
    Idle,
    /// Payload being built for the backend
    Submitting,
    /// Request in flight; estimator and timeout clock running
    AwaitingResponse,
    /// Backend returned a usable result
    Succeeded,
    /// TimedOut, RequestError or InvalidResponse (see outcome)
    Failed,
    /// Torn down by navigation before resolution
    Cancelled,
}

impl AnalysisState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AnalysisState::Succeeded | AnalysisState::Failed | AnalysisState::Cancelled
        )
    }
}

/// Synthetic completion percentage in [0, 100]
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProgressState(f64);

impl ProgressState {
    /// Only ever set on a real success
    pub const COMPLETE: ProgressState = ProgressState(100.0);
    pub const ZERO: ProgressState = ProgressState(0.0);

    /// Clamp into [0, 100]; NaN becomes 0
    pub fn new(value: f64) -> Self {
        if value.is_nan() {
            return Self::ZERO;
        }
        Self(value.clamp(0.0, 100.0))
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

/// Current outcome of a session
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AnalysisOutcome {
    Pending {
        progress: ProgressState,
    },
    Success {
        result: AnalysisResult,
        title: String,
    },
    Failure {
        kind: FailureKind,
        message: String,
    },
}

/// State transition record (logged by the orchestrator)
#[derive(Debug, Clone, Serialize)]
pub struct StateTransition {
    pub session_id: Uuid,
    pub old_state: AnalysisState,
    pub new_state: AnalysisState,
    pub transitioned_at: DateTime<Utc>,
}

/// One analysis attempt as seen by the views
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisSession {
    pub session_id: Uuid,
    pub source: InputSource,
    /// Upload file name, used as the result title for file analyses
    pub file_name: Option<String>,
    pub state: AnalysisState,
    pub outcome: AnalysisOutcome,
    /// Last progress shown while pending; kept after a failure or cancel
    pub last_progress: ProgressState,
    /// View the browser should currently display
    pub view: ViewKind,
    pub instrument: Instrument,
    pub is_playing: bool,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl AnalysisSession {
    pub fn new(source: InputSource, file_name: Option<String>) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            source,
            file_name,
            state: AnalysisState::Idle,
            outcome: AnalysisOutcome::Pending {
                progress: ProgressState::ZERO,
            },
            last_progress: ProgressState::ZERO,
            view: ViewKind::Input,
            instrument: Instrument::default(),
            is_playing: false,
            started_at: Utc::now(),
            ended_at: None,
        }
    }

    /// Transition to new state
    pub fn transition_to(&mut self, new_state: AnalysisState) -> StateTransition {
        let transition = StateTransition {
            session_id: self.session_id,
            old_state: self.state,
            new_state,
            transitioned_at: Utc::now(),
        };
        self.state = new_state;

        if new_state.is_terminal() {
            self.ended_at = Some(transition.transitioned_at);
        }

        transition
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Submitted but not yet resolved
    pub fn is_in_flight(&self) -> bool {
        matches!(
            self.state,
            AnalysisState::Submitting | AnalysisState::AwaitingResponse
        )
    }

    /// Progress for display: pending value, 100 on success, last value otherwise
    pub fn progress(&self) -> ProgressState {
        match &self.outcome {
            AnalysisOutcome::Pending { progress } => *progress,
            AnalysisOutcome::Success { .. } => ProgressState::COMPLETE,
            AnalysisOutcome::Failure { .. } => self.last_progress,
        }
    }

    pub fn title(&self) -> Option<&str> {
        match &self.outcome {
            AnalysisOutcome::Success { title, .. } => Some(title.as_str()),
            _ => None,
        }
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        match &self.outcome {
            AnalysisOutcome::Success { result, .. } => Some(result),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<(FailureKind, &str)> {
        match &self.outcome {
            AnalysisOutcome::Failure { kind, message } => Some((*kind, message.as_str())),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_is_idle_and_pending() {
        let session = AnalysisSession::new(InputSource::Url, None);
        assert_eq!(session.state, AnalysisState::Idle);
        assert_eq!(session.view, ViewKind::Input);
        assert_eq!(session.progress(), ProgressState::ZERO);
        assert!(!session.is_terminal());
        assert!(!session.is_in_flight());
        assert!(session.ended_at.is_none());
    }

    #[test]
    fn test_terminal_transition_sets_end_time() {
        let mut session = AnalysisSession::new(InputSource::File, Some("a.wav".to_string()));
        session.transition_to(AnalysisState::Submitting);
        assert!(session.is_in_flight());
        assert!(session.ended_at.is_none());

        let transition = session.transition_to(AnalysisState::Failed);
        assert_eq!(transition.old_state, AnalysisState::Submitting);
        assert_eq!(transition.new_state, AnalysisState::Failed);
        assert!(session.is_terminal());
        assert_eq!(session.ended_at, Some(transition.transitioned_at));
    }

    #[test]
    fn test_progress_state_clamps() {
        assert_eq!(ProgressState::new(-5.0).value(), 0.0);
        assert_eq!(ProgressState::new(150.0).value(), 100.0);
        assert_eq!(ProgressState::new(f64::NAN).value(), 0.0);
        assert_eq!(ProgressState::new(42.5).value(), 42.5);
    }

    #[test]
    fn test_state_serializes_screaming_snake_case() {
        let json = serde_json::to_string(&AnalysisState::AwaitingResponse).unwrap();
        assert_eq!(json, "\"AWAITING_RESPONSE\"");
    }

    #[test]
    fn test_outcome_serialization_tags_status() {
        let outcome = AnalysisOutcome::Failure {
            kind: FailureKind::RequestError,
            message: "Analysis service returned 500".to_string(),
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "failure");
        assert_eq!(json["kind"], "request_error");
    }
}
