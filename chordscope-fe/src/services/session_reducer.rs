//! Single writer for analysis session state
//!
//! The estimator, the timeout clock, the network call and user navigation
//! each produce a [`SessionMsg`]. Every message goes through
//! [`SessionReducer::apply`], which decides whether it changes the session.
//! Once a session is terminal, only navigation is still honoured, so the
//! loser of the response/timeout race is dropped without effect.

use chordscope_common::events::{ChordscopeEvent, FailureKind, InputSource, ViewKind};
use chordscope_common::human_time::describe_duration;
use chrono::Utc;
use std::time::Duration;

use super::analysis_client::{ClientError, RemoteAnalysis};
use super::progress_estimator::ESTIMATE_CEILING;
use crate::models::{
    AnalysisOutcome, AnalysisResult, AnalysisSession, AnalysisState, ProgressState,
};

/// Title used for URL analyses when the backend reports none
pub const DEFAULT_URL_TITLE: &str = "YouTube Video";

/// Title used for file analyses when the upload carried no name
const DEFAULT_FILE_TITLE: &str = "Uploaded audio";

/// Inputs to the session state machine
#[derive(Debug)]
pub enum SessionMsg {
    /// User submitted the request (Idle → Submitting, show progress view)
    Submit,
    /// Network call issued (Submitting → AwaitingResponse)
    Dispatched,
    /// Estimator tick
    Tick(ProgressState),
    /// Network call resolved
    Response(Result<RemoteAnalysis, ClientError>),
    /// Timeout clock fired
    TimedOut,
    /// User navigated back to the input view
    Cancel,
    /// Settle delay after success elapsed
    Settled,
}

impl SessionMsg {
    pub fn name(&self) -> &'static str {
        match self {
            SessionMsg::Submit => "submit",
            SessionMsg::Dispatched => "dispatched",
            SessionMsg::Tick(_) => "tick",
            SessionMsg::Response(_) => "response",
            SessionMsg::TimedOut => "timed_out",
            SessionMsg::Cancel => "cancel",
            SessionMsg::Settled => "settled",
        }
    }
}

/// What a message did to the session
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Applied {
    /// No effect (stale, duplicate, or out of order)
    Ignored,
    Submitted,
    Dispatched,
    Progressed(ProgressState),
    Succeeded,
    Failed(FailureKind),
    Cancelled,
    Navigated(ViewKind),
}

/// Applies [`SessionMsg`]s to an [`AnalysisSession`]
#[derive(Debug, Clone)]
pub struct SessionReducer {
    default_url_title: String,
    timeout: Duration,
}

impl SessionReducer {
    pub fn new(default_url_title: impl Into<String>, timeout: Duration) -> Self {
        Self {
            default_url_title: default_url_title.into(),
            timeout,
        }
    }

    /// Message shown when the timeout clock wins
    pub fn timeout_message(&self) -> String {
        format!(
            "Analysis timed out after {}. Please try again.",
            describe_duration(self.timeout)
        )
    }

    pub fn apply(&self, session: &mut AnalysisSession, msg: SessionMsg) -> Applied {
        match msg {
            SessionMsg::Submit => {
                if session.state != AnalysisState::Idle {
                    return Applied::Ignored;
                }
                transition(session, AnalysisState::Submitting);
                session.view = ViewKind::Progress;
                Applied::Submitted
            }

            SessionMsg::Dispatched => {
                if session.state != AnalysisState::Submitting {
                    return Applied::Ignored;
                }
                transition(session, AnalysisState::AwaitingResponse);
                Applied::Dispatched
            }

            SessionMsg::Tick(estimate) => {
                if session.state != AnalysisState::AwaitingResponse {
                    return Applied::Ignored;
                }
                let capped = ProgressState::new(estimate.value().min(ESTIMATE_CEILING));
                if capped <= session.progress() {
                    return Applied::Ignored;
                }
                session.outcome = AnalysisOutcome::Pending { progress: capped };
                session.last_progress = capped;
                Applied::Progressed(capped)
            }

            SessionMsg::Response(Ok(remote)) => {
                if !session.is_in_flight() {
                    return Applied::Ignored;
                }
                let title = self.title_for(session, remote.title);
                session.outcome = AnalysisOutcome::Success {
                    result: AnalysisResult::new(remote.notes),
                    title,
                };
                session.last_progress = ProgressState::COMPLETE;
                transition(session, AnalysisState::Succeeded);
                Applied::Succeeded
            }

            SessionMsg::Response(Err(error)) => {
                if !session.is_in_flight() {
                    return Applied::Ignored;
                }
                let kind = error.kind();
                self.fail(session, kind, error.to_string());
                Applied::Failed(kind)
            }

            SessionMsg::TimedOut => {
                if !session.is_in_flight() {
                    return Applied::Ignored;
                }
                self.fail(session, FailureKind::TimedOut, self.timeout_message());
                Applied::Failed(FailureKind::TimedOut)
            }

            SessionMsg::Cancel => {
                if session.is_terminal() {
                    if session.view == ViewKind::Input {
                        return Applied::Ignored;
                    }
                    session.view = ViewKind::Input;
                    return Applied::Navigated(ViewKind::Input);
                }
                transition(session, AnalysisState::Cancelled);
                session.view = ViewKind::Input;
                Applied::Cancelled
            }

            SessionMsg::Settled => {
                if session.state != AnalysisState::Succeeded || session.view != ViewKind::Progress
                {
                    return Applied::Ignored;
                }
                session.view = ViewKind::Results;
                Applied::Navigated(ViewKind::Results)
            }
        }
    }

    fn fail(&self, session: &mut AnalysisSession, kind: FailureKind, message: String) {
        session.last_progress = session.progress();
        session.outcome = AnalysisOutcome::Failure { kind, message };
        transition(session, AnalysisState::Failed);
    }

    fn title_for(&self, session: &AnalysisSession, remote_title: Option<String>) -> String {
        match &session.file_name {
            Some(name) => name.clone(),
            None if session.source == InputSource::File => {
                DEFAULT_FILE_TITLE.to_string()
            }
            None => remote_title.unwrap_or_else(|| self.default_url_title.clone()),
        }
    }
}

fn transition(session: &mut AnalysisSession, state: AnalysisState) {
    let t = session.transition_to(state);
    tracing::debug!(
        session_id = %t.session_id,
        from = ?t.old_state,
        to = ?t.new_state,
        "Session state transition"
    );
}

/// Events announcing an applied step
pub fn events_for(session: &AnalysisSession, applied: Applied) -> Vec<ChordscopeEvent> {
    let session_id = session.session_id;
    let timestamp = Utc::now();

    match applied {
        Applied::Ignored | Applied::Dispatched => Vec::new(),
        Applied::Submitted => vec![
            ChordscopeEvent::AnalysisSubmitted {
                session_id,
                source: session.source,
                timestamp,
            },
            ChordscopeEvent::ViewChanged {
                session_id,
                view: ViewKind::Progress,
                timestamp,
            },
        ],
        Applied::Progressed(progress) => vec![ChordscopeEvent::AnalysisProgress {
            session_id,
            percentage: progress.value(),
            timestamp,
        }],
        Applied::Succeeded => vec![
            ChordscopeEvent::AnalysisProgress {
                session_id,
                percentage: ProgressState::COMPLETE.value(),
                timestamp,
            },
            ChordscopeEvent::AnalysisSucceeded {
                session_id,
                title: session.title().unwrap_or_default().to_string(),
                note_count: session.result().map(|r| r.len()).unwrap_or(0),
                timestamp,
            },
        ],
        Applied::Failed(kind) => vec![ChordscopeEvent::AnalysisFailed {
            session_id,
            kind,
            message: session
                .failure()
                .map(|(_, message)| message.to_string())
                .unwrap_or_default(),
            timestamp,
        }],
        Applied::Cancelled => vec![
            ChordscopeEvent::AnalysisCancelled {
                session_id,
                timestamp,
            },
            ChordscopeEvent::ViewChanged {
                session_id,
                view: ViewKind::Input,
                timestamp,
            },
        ],
        Applied::Navigated(view) => vec![ChordscopeEvent::ViewChanged {
            session_id,
            view,
            timestamp,
        }],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Note;

    fn reducer() -> SessionReducer {
        SessionReducer::new(DEFAULT_URL_TITLE, Duration::from_secs(300))
    }

    fn awaiting(source: InputSource, file_name: Option<&str>) -> AnalysisSession {
        let mut session = AnalysisSession::new(source, file_name.map(str::to_string));
        let reducer = reducer();
        assert_eq!(reducer.apply(&mut session, SessionMsg::Submit), Applied::Submitted);
        assert_eq!(reducer.apply(&mut session, SessionMsg::Dispatched), Applied::Dispatched);
        session
    }

    fn song_x() -> RemoteAnalysis {
        RemoteAnalysis {
            notes: vec![Note::new("Am", 0.0, 1.0), Note::new("F", 1.0, 2.0)],
            title: Some("Song X".to_string()),
        }
    }

    #[test]
    fn test_submit_shows_progress_view() {
        let mut session = AnalysisSession::new(InputSource::Url, None);
        reducer().apply(&mut session, SessionMsg::Submit);
        assert_eq!(session.state, AnalysisState::Submitting);
        assert_eq!(session.view, ViewKind::Progress);

        assert_eq!(reducer().apply(&mut session, SessionMsg::Submit), Applied::Ignored);
    }

    #[test]
    fn test_ticks_are_monotonic_and_capped() {
        let reducer = reducer();
        let mut session = awaiting(InputSource::Url, None);

        assert_eq!(
            reducer.apply(&mut session, SessionMsg::Tick(ProgressState::new(10.0))),
            Applied::Progressed(ProgressState::new(10.0))
        );
        assert_eq!(
            reducer.apply(&mut session, SessionMsg::Tick(ProgressState::new(5.0))),
            Applied::Ignored
        );
        assert_eq!(
            reducer.apply(&mut session, SessionMsg::Tick(ProgressState::new(99.0))),
            Applied::Progressed(ProgressState::new(90.0))
        );
        assert_eq!(session.progress().value(), 90.0);
    }

    #[test]
    fn test_url_success_uses_remote_title() {
        let reducer = reducer();
        let mut session = awaiting(InputSource::Url, None);

        assert_eq!(
            reducer.apply(&mut session, SessionMsg::Response(Ok(song_x()))),
            Applied::Succeeded
        );
        assert_eq!(session.state, AnalysisState::Succeeded);
        assert_eq!(session.title(), Some("Song X"));
        assert_eq!(session.progress(), ProgressState::COMPLETE);
        // Navigation waits for the settle delay
        assert_eq!(session.view, ViewKind::Progress);
    }

    #[test]
    fn test_url_success_without_title_uses_default() {
        let reducer = reducer();
        let mut session = awaiting(InputSource::Url, None);
        let remote = RemoteAnalysis {
            title: None,
            ..song_x()
        };

        reducer.apply(&mut session, SessionMsg::Response(Ok(remote)));
        assert_eq!(session.title(), Some("YouTube Video"));
    }

    #[test]
    fn test_file_success_uses_file_name() {
        let reducer = reducer();
        let mut session = awaiting(InputSource::File, Some("demo.wav"));

        reducer.apply(&mut session, SessionMsg::Response(Ok(song_x())));
        assert_eq!(session.title(), Some("demo.wav"));
    }

    #[test]
    fn test_timeout_wins_then_late_response_ignored() {
        let reducer = reducer();
        let mut session = awaiting(InputSource::Url, None);
        reducer.apply(&mut session, SessionMsg::Tick(ProgressState::new(42.0)));

        assert_eq!(
            reducer.apply(&mut session, SessionMsg::TimedOut),
            Applied::Failed(FailureKind::TimedOut)
        );
        assert_eq!(
            reducer.apply(&mut session, SessionMsg::Response(Ok(song_x()))),
            Applied::Ignored
        );
        assert_eq!(
            reducer.apply(&mut session, SessionMsg::Tick(ProgressState::new(60.0))),
            Applied::Ignored
        );

        let (kind, message) = session.failure().unwrap();
        assert_eq!(kind, FailureKind::TimedOut);
        assert_eq!(message, "Analysis timed out after 5 minutes. Please try again.");
        assert_eq!(session.progress().value(), 42.0);
        assert_eq!(session.view, ViewKind::Progress);
    }

    #[test]
    fn test_response_wins_then_timeout_ignored() {
        let reducer = reducer();
        let mut session = awaiting(InputSource::Url, None);

        reducer.apply(&mut session, SessionMsg::Response(Ok(song_x())));
        assert_eq!(reducer.apply(&mut session, SessionMsg::TimedOut), Applied::Ignored);
        assert_eq!(session.state, AnalysisState::Succeeded);
    }

    #[test]
    fn test_error_response_fails_with_kind() {
        let reducer = reducer();
        let mut session = awaiting(InputSource::Url, None);

        let applied = reducer.apply(
            &mut session,
            SessionMsg::Response(Err(ClientError::InvalidResponse("missing notes array".into()))),
        );
        assert_eq!(applied, Applied::Failed(FailureKind::InvalidResponse));
        assert_eq!(
            reducer.apply(&mut session, SessionMsg::Settled),
            Applied::Ignored
        );
        assert_ne!(session.view, ViewKind::Results);
    }

    #[test]
    fn test_settled_navigates_once() {
        let reducer = reducer();
        let mut session = awaiting(InputSource::Url, None);
        reducer.apply(&mut session, SessionMsg::Response(Ok(song_x())));

        assert_eq!(
            reducer.apply(&mut session, SessionMsg::Settled),
            Applied::Navigated(ViewKind::Results)
        );
        assert_eq!(reducer.apply(&mut session, SessionMsg::Settled), Applied::Ignored);
    }

    #[test]
    fn test_cancel_in_flight_then_after_terminal() {
        let reducer = reducer();
        let mut session = awaiting(InputSource::Url, None);

        assert_eq!(reducer.apply(&mut session, SessionMsg::Cancel), Applied::Cancelled);
        assert_eq!(session.state, AnalysisState::Cancelled);
        assert_eq!(session.view, ViewKind::Input);
        assert_eq!(reducer.apply(&mut session, SessionMsg::Cancel), Applied::Ignored);
        assert_eq!(
            reducer.apply(&mut session, SessionMsg::Response(Ok(song_x()))),
            Applied::Ignored
        );

        let mut failed = awaiting(InputSource::Url, None);
        reducer.apply(&mut failed, SessionMsg::TimedOut);
        assert_eq!(
            reducer.apply(&mut failed, SessionMsg::Cancel),
            Applied::Navigated(ViewKind::Input)
        );
        assert_eq!(failed.state, AnalysisState::Failed);
    }

    #[test]
    fn test_events_for_success() {
        let reducer = reducer();
        let mut session = awaiting(InputSource::Url, None);
        let applied = reducer.apply(&mut session, SessionMsg::Response(Ok(song_x())));

        let events = events_for(&session, applied);
        let types: Vec<&str> = events.iter().map(|e| e.event_type()).collect();
        assert_eq!(types, vec!["AnalysisProgress", "AnalysisSucceeded"]);
        match &events[1] {
            ChordscopeEvent::AnalysisSucceeded { title, note_count, .. } => {
                assert_eq!(title, "Song X");
                assert_eq!(*note_count, 2);
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_ignored_produces_no_events() {
        let session = AnalysisSession::new(InputSource::Url, None);
        assert!(events_for(&session, Applied::Ignored).is_empty());
    }
}
