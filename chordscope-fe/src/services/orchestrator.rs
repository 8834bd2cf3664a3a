//! Analysis orchestrator
//!
//! Owns every analysis session and drives it through
//! IDLE → SUBMITTING → AWAITING_RESPONSE → {SUCCEEDED | FAILED | CANCELLED}.
//!
//! # Tasks per session
//! Each submission spawns one run task holding the session's cancellation
//! token. The run task spawns three children, each on a child token:
//! - progress estimator (ticks)
//! - timeout clock (one shot)
//! - network call to the analysis backend
//!
//! The children only send [`SessionMsg`]s over a channel; the run task feeds
//! them to the [`SessionReducer`] one at a time. The first terminal message
//! wins and the run task then cancels its token, which tears the rest down.
//! The token is wrapped in a drop guard so an aborted run task still
//! releases the timers.

use chordscope_common::events::EventBus;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, RwLock};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::analysis_client::AnalysisBackend;
use super::progress_estimator::ProgressEstimator;
use super::session_reducer::{events_for, Applied, SessionMsg, SessionReducer, DEFAULT_URL_TITLE};
use crate::models::{AnalysisRequest, AnalysisSession, Instrument};

/// Finished sessions kept for the results and progress views
pub const RETAINED_FINISHED_SESSIONS: usize = 1;

/// Timing and title settings for analysis sessions
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisSettings {
    /// Hard ceiling on one backend call
    pub timeout: Duration,
    /// Estimator tick interval
    pub tick: Duration,
    /// Pause between success and navigation to the results view
    pub settle: Duration,
    /// Title for URL analyses when the backend reports none
    pub default_url_title: String,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(300),
            tick: Duration::from_secs(1),
            settle: Duration::from_millis(500),
            default_url_title: DEFAULT_URL_TITLE.to_string(),
        }
    }
}

/// Orchestrator errors
#[derive(Debug, Error, PartialEq)]
pub enum OrchestratorError {
    /// Another analysis is still waiting for the backend
    #[error("Analysis session {0} is still in progress")]
    SessionInFlight(Uuid),

    #[error("Analysis session not found: {0}")]
    NotFound(Uuid),

    /// Session has no result (yet)
    #[error("Analysis session {0} has no result")]
    NoResult(Uuid),
}

/// Analysis orchestrator service
#[derive(Clone)]
pub struct AnalysisOrchestrator {
    backend: Arc<dyn AnalysisBackend>,
    event_bus: EventBus,
    reducer: Arc<SessionReducer>,
    estimator: ProgressEstimator,
    settle: Duration,
    /// Live sessions plus the most recent finished ones (in memory only)
    sessions: Arc<RwLock<HashMap<Uuid, AnalysisSession>>>,
    /// Tokens for sessions whose run task is still alive
    cancellation_tokens: Arc<RwLock<HashMap<Uuid, CancellationToken>>>,
    /// Parent of every session token; cancelled on shutdown
    shutdown_token: CancellationToken,
    last_error: Arc<RwLock<Option<String>>>,
}

impl AnalysisOrchestrator {
    pub fn new(
        backend: Arc<dyn AnalysisBackend>,
        event_bus: EventBus,
        settings: AnalysisSettings,
    ) -> Self {
        Self {
            backend,
            event_bus,
            reducer: Arc::new(SessionReducer::new(
                settings.default_url_title,
                settings.timeout,
            )),
            estimator: ProgressEstimator::new(settings.timeout, settings.tick),
            settle: settings.settle,
            sessions: Arc::new(RwLock::new(HashMap::new())),
            cancellation_tokens: Arc::new(RwLock::new(HashMap::new())),
            shutdown_token: CancellationToken::new(),
            last_error: Arc::new(RwLock::new(None)),
        }
    }

    /// Shared slot holding the most recent failure message
    pub fn last_error_handle(&self) -> Arc<RwLock<Option<String>>> {
        Arc::clone(&self.last_error)
    }

    /// Accept a validated request and start analysing it
    ///
    /// Rejected while any other session is still in flight. Returns the
    /// session as it stands after the submit step.
    pub async fn start(
        &self,
        request: AnalysisRequest,
    ) -> Result<AnalysisSession, OrchestratorError> {
        let (snapshot, token) = {
            let mut sessions = self.sessions.write().await;
            if let Some(active) = sessions.values().find(|s| s.is_in_flight()) {
                tracing::warn!(
                    active_session = %active.session_id,
                    "Rejecting submission while another analysis is in flight"
                );
                return Err(OrchestratorError::SessionInFlight(active.session_id));
            }

            self.prune_finished(&mut sessions).await;

            let mut session =
                AnalysisSession::new(request.source(), request.file_name().map(str::to_string));
            let applied = self.reducer.apply(&mut session, SessionMsg::Submit);
            self.publish(&session, applied).await;

            let token = self.shutdown_token.child_token();
            self.cancellation_tokens
                .write()
                .await
                .insert(session.session_id, token.clone());

            let snapshot = session.clone();
            sessions.insert(session.session_id, session);
            (snapshot, token)
        };

        let session_id = snapshot.session_id;
        tracing::info!(
            session_id = %session_id,
            source = %snapshot.source,
            "Analysis session started"
        );

        let orchestrator = self.clone();
        tokio::spawn(async move {
            orchestrator.run(session_id, request, token).await;
        });

        Ok(snapshot)
    }

    /// Navigate back to the input view
    ///
    /// Tears down a pending session (CANCELLED); for a finished session it
    /// only changes the view.
    pub async fn cancel(&self, session_id: Uuid) -> Result<AnalysisSession, OrchestratorError> {
        let snapshot = {
            let mut sessions = self.sessions.write().await;
            let session = sessions
                .get_mut(&session_id)
                .ok_or(OrchestratorError::NotFound(session_id))?;
            let applied = self.reducer.apply(session, SessionMsg::Cancel);
            self.publish(session, applied).await;
            session.clone()
        };

        if let Some(token) = self.cancellation_tokens.read().await.get(&session_id) {
            token.cancel();
        }

        Ok(snapshot)
    }

    pub async fn session(&self, session_id: Uuid) -> Option<AnalysisSession> {
        self.sessions.read().await.get(&session_id).cloned()
    }

    /// Session currently submitting or awaiting the backend, if any
    pub async fn active_session(&self) -> Option<AnalysisSession> {
        self.sessions
            .read()
            .await
            .values()
            .find(|s| s.is_in_flight())
            .cloned()
    }

    /// Flip play/pause on a finished analysis; returns the new value
    pub async fn toggle_playback(&self, session_id: Uuid) -> Result<bool, OrchestratorError> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(&session_id)
            .ok_or(OrchestratorError::NotFound(session_id))?;
        if session.result().is_none() {
            return Err(OrchestratorError::NoResult(session_id));
        }

        session.is_playing = !session.is_playing;
        tracing::debug!(session_id = %session_id, is_playing = session.is_playing, "Playback toggled");
        Ok(session.is_playing)
    }

    pub async fn set_instrument(
        &self,
        session_id: Uuid,
        instrument: Instrument,
    ) -> Result<AnalysisSession, OrchestratorError> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(&session_id)
            .ok_or(OrchestratorError::NotFound(session_id))?;
        session.instrument = instrument;
        Ok(session.clone())
    }

    /// Cancel every live session task
    pub async fn shutdown(&self) {
        let live = self.cancellation_tokens.read().await.len();
        tracing::info!(live_sessions = live, "Shutting down analysis orchestrator");
        self.shutdown_token.cancel();
    }

    /// Cancelled once the service is shutting down
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown_token.clone()
    }

    pub async fn last_error(&self) -> Option<String> {
        self.last_error.read().await.clone()
    }

    /// Number of sessions with a live run task
    pub async fn live_session_count(&self) -> usize {
        self.cancellation_tokens.read().await.len()
    }

    async fn run(self, session_id: Uuid, request: AnalysisRequest, token: CancellationToken) {
        let _guard = token.clone().drop_guard();
        let (tx, mut rx) = mpsc::unbounded_channel::<SessionMsg>();

        if self.apply(session_id, SessionMsg::Dispatched).await == Applied::Ignored {
            tracing::debug!(session_id = %session_id, "Session ended before dispatch");
            self.finish(session_id).await;
            return;
        }

        // Estimator and timeout clock share one token so success stops both
        let timers = token.child_token();

        let estimator = {
            let tx = tx.clone();
            self.estimator.start(&timers, move |estimate| {
                let _ = tx.send(SessionMsg::Tick(estimate));
            })
        };

        {
            let tx = tx.clone();
            let clock = timers.child_token();
            let timeout = self.estimator.timeout();
            tokio::spawn(async move {
                tokio::select! {
                    biased;
                    _ = clock.cancelled() => {}
                    _ = tokio::time::sleep(timeout) => {
                        let _ = tx.send(SessionMsg::TimedOut);
                    }
                }
            });
        }

        {
            let tx = tx.clone();
            let call = token.child_token();
            let backend = Arc::clone(&self.backend);
            tokio::spawn(async move {
                tokio::select! {
                    biased;
                    _ = call.cancelled() => {
                        tracing::debug!(session_id = %session_id, "Backend call abandoned");
                    }
                    result = backend.analyze(request) => {
                        let _ = tx.send(SessionMsg::Response(result));
                    }
                }
            });
        }

        loop {
            let msg = tokio::select! {
                biased;
                _ = token.cancelled() => break,
                msg = rx.recv() => match msg {
                    Some(msg) => msg,
                    None => break,
                },
            };

            match self.apply(session_id, msg).await {
                Applied::Succeeded => {
                    estimator.stop();
                    timers.cancel();

                    let tx = tx.clone();
                    let settle_token = token.child_token();
                    let settle = self.settle;
                    tokio::spawn(async move {
                        tokio::select! {
                            biased;
                            _ = settle_token.cancelled() => {}
                            _ = tokio::time::sleep(settle) => {
                                let _ = tx.send(SessionMsg::Settled);
                            }
                        }
                    });
                }
                Applied::Failed(_) | Applied::Cancelled | Applied::Navigated(_) => break,
                _ => {}
            }
        }

        estimator.stop();
        estimator.join().await;
        self.finish(session_id).await;
    }

    /// Apply one message under the session lock and announce the result
    async fn apply(&self, session_id: Uuid, msg: SessionMsg) -> Applied {
        let mut sessions = self.sessions.write().await;
        let Some(session) = sessions.get_mut(&session_id) else {
            return Applied::Ignored;
        };

        let msg_name = msg.name();
        let applied = self.reducer.apply(session, msg);
        if applied == Applied::Ignored {
            tracing::debug!(
                session_id = %session_id,
                message = msg_name,
                state = ?session.state,
                "Message had no effect"
            );
        }

        self.publish(session, applied).await;
        applied
    }

    async fn publish(&self, session: &AnalysisSession, applied: Applied) {
        let session_id = session.session_id;

        match applied {
            Applied::Ignored => return,
            Applied::Progressed(progress) => {
                tracing::debug!(session_id = %session_id, progress = progress.value(), "Progress estimate");
            }
            Applied::Failed(kind) => {
                let message = session
                    .failure()
                    .map(|(_, message)| message.to_string())
                    .unwrap_or_default();
                tracing::warn!(session_id = %session_id, kind = %kind, "Analysis failed: {}", message);
                *self.last_error.write().await = Some(message);
            }
            other => {
                tracing::info!(
                    session_id = %session_id,
                    state = ?session.state,
                    view = ?session.view,
                    step = ?other,
                    "Analysis session updated"
                );
            }
        }

        for event in events_for(session, applied) {
            self.event_bus.emit_lossy(event);
        }
    }

    /// Drop finished sessions beyond the most recent [`RETAINED_FINISHED_SESSIONS`]
    ///
    /// Sessions whose run task is still alive are kept regardless.
    async fn prune_finished(&self, sessions: &mut HashMap<Uuid, AnalysisSession>) {
        let live = self.cancellation_tokens.read().await;

        let mut finished: Vec<(Uuid, DateTime<Utc>)> = sessions
            .values()
            .filter(|s| s.is_terminal() && !live.contains_key(&s.session_id))
            .map(|s| (s.session_id, s.ended_at.unwrap_or(s.started_at)))
            .collect();
        if finished.len() <= RETAINED_FINISHED_SESSIONS {
            return;
        }

        finished.sort_by(|a, b| b.1.cmp(&a.1));
        for (session_id, _) in finished.into_iter().skip(RETAINED_FINISHED_SESSIONS) {
            sessions.remove(&session_id);
            tracing::debug!(session_id = %session_id, "Finished session pruned");
        }
    }

    async fn finish(&self, session_id: Uuid) {
        self.cancellation_tokens.write().await.remove(&session_id);
        tracing::debug!(session_id = %session_id, "Session task finished");
    }
}
