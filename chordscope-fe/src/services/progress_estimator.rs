//! Synthetic progress while the backend is working
//!
//! The analysis service reports nothing until it is done, so progress is
//! estimated from elapsed time: linear over the timeout window, reaching
//! 90% as the deadline approaches. The last 10% belongs to a real result.

use futures::stream::{Stream, StreamExt};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::models::ProgressState;

/// Highest value the estimator will ever report
pub const ESTIMATE_CEILING: f64 = 90.0;

/// Linear time-based progress estimator
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressEstimator {
    timeout: Duration,
    tick: Duration,
}

impl ProgressEstimator {
    pub fn new(timeout: Duration, tick: Duration) -> Self {
        Self { timeout, tick }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Estimate after `ticks` ticks
    ///
    /// Computed from the tick count, never accumulated, so repeated ticks
    /// cannot drift past the ceiling.
    pub fn estimate_at(&self, ticks: u64) -> ProgressState {
        let timeout_secs = self.timeout.as_secs_f64();
        if timeout_secs <= 0.0 {
            return ProgressState::new(ESTIMATE_CEILING);
        }

        let elapsed_secs = ticks as f64 * self.tick.as_secs_f64();
        let value = ESTIMATE_CEILING * elapsed_secs / timeout_secs;
        ProgressState::new(value.min(ESTIMATE_CEILING))
    }

    /// Stream of estimates, one per tick, until cancelled or at the ceiling
    ///
    /// The first value arrives one full tick after the call.
    pub fn ticks(&self, token: CancellationToken) -> impl Stream<Item = ProgressState> {
        let estimator = *self;

        async_stream::stream! {
            let mut interval =
                tokio::time::interval_at(Instant::now() + estimator.tick, estimator.tick);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut count: u64 = 0;

            loop {
                tokio::select! {
                    biased;

                    _ = token.cancelled() => break,

                    _ = interval.tick() => {
                        count += 1;
                        let estimate = estimator.estimate_at(count);
                        yield estimate;

                        if estimate.value() >= ESTIMATE_CEILING {
                            break;
                        }
                    }
                }
            }
        }
    }

    /// Run the estimator on its own task, calling `on_tick` per estimate
    ///
    /// The task stops when `parent` is cancelled, when the returned handle is
    /// stopped or dropped, or when the ceiling is reached.
    pub fn start<F>(&self, parent: &CancellationToken, mut on_tick: F) -> ProgressHandle
    where
        F: FnMut(ProgressState) + Send + 'static,
    {
        let token = parent.child_token();
        let estimates = self.ticks(token.clone());

        let task = tokio::spawn(async move {
            futures::pin_mut!(estimates);
            while let Some(estimate) = estimates.next().await {
                on_tick(estimate);
            }
        });

        ProgressHandle {
            token,
            task: Some(task),
        }
    }
}

/// Running estimator
///
/// Stopping is idempotent; the last reported value is left as it was.
pub struct ProgressHandle {
    token: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl ProgressHandle {
    pub fn stop(&self) {
        self.token.cancel();
    }

    /// Wait for the estimator task to exit
    pub async fn join(mut self) {
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "Progress estimator task ended abnormally");
            }
        }
    }
}

impl Drop for ProgressHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
