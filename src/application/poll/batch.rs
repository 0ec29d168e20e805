//! Batch polling session for a set of recipe runs.
//!
//! One status request per tick covers the whole working set. Finished runs
//! leave the set; the session ends when the set is empty, when the retry
//! budget is spent, or when it is stopped.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::application::state::RunStore;
use crate::domain::{error_message, BatchStatus, RunRecord, RunState};
use crate::error::Result;
use crate::port::RunBackend;

/// Default delay between ticks.
pub const DEFAULT_BATCH_INTERVAL: Duration = Duration::from_millis(1000);

/// Default number of consecutive failed ticks tolerated.
pub const DEFAULT_MAX_RETRY_ATTEMPTS: u32 = 3;

/// Session tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchPollConfig {
    pub interval: Duration,
    pub max_retry_attempts: u32,
}

impl Default for BatchPollConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_BATCH_INTERVAL,
            max_retry_attempts: DEFAULT_MAX_RETRY_ATTEMPTS,
        }
    }
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// Every run reached a terminal state.
    Completed,
    /// Too many consecutive status reads failed.
    RetriesExhausted,
    /// The session was stopped by its owner.
    Stopped,
}

/// Result of one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Runs remain; tick again after the interval.
    Pending,
    Finished(SessionEnd),
}

/// Tracks a set of run ids with one shared retry budget.
pub struct BatchPollSession {
    backend: Arc<dyn RunBackend>,
    store: Arc<RunStore>,
    recipe_id: String,
    config: BatchPollConfig,
    records: Vec<RunRecord>,
    retry_count: u32,
    finished: Option<SessionEnd>,
}

impl BatchPollSession {
    #[must_use]
    pub fn new(
        backend: Arc<dyn RunBackend>,
        store: Arc<RunStore>,
        recipe_id: impl Into<String>,
        config: BatchPollConfig,
    ) -> Self {
        Self {
            backend,
            store,
            recipe_id: recipe_id.into(),
            config,
            records: Vec::new(),
            retry_count: 0,
            finished: None,
        }
    }

    /// Begin tracking `run_ids`, resetting the published snapshot.
    ///
    /// An empty id list leaves the session finished without touching state.
    pub fn start(&mut self, run_ids: &[String]) {
        if run_ids.is_empty() {
            self.finished = Some(SessionEnd::Completed);
            return;
        }
        info!(recipe_id = %self.recipe_id, run_ids = ?run_ids, "Starting batch polling");
        self.records = run_ids.iter().map(RunRecord::pending).collect();
        self.retry_count = 0;
        self.finished = None;
        self.store.begin_processing();
    }

    /// Ids still in the working set.
    #[must_use]
    pub fn run_ids(&self) -> Vec<String> {
        self.records.iter().map(|r| r.run_id.clone()).collect()
    }

    #[must_use]
    pub fn records(&self) -> &[RunRecord] {
        &self.records
    }

    #[must_use]
    pub const fn retry_count(&self) -> u32 {
        self.retry_count
    }

    #[must_use]
    pub const fn finished(&self) -> Option<SessionEnd> {
        self.finished
    }

    /// Issue one status request for the working set and apply the response.
    ///
    /// Cancelling `cancel` while the request is in flight aborts it; an
    /// aborted request resolves nothing and costs no retry budget.
    pub async fn tick(&mut self, cancel: &CancellationToken) -> TickOutcome {
        if let Some(end) = self.finished {
            return TickOutcome::Finished(end);
        }
        if self.records.is_empty() {
            return self.finish(SessionEnd::Completed);
        }

        let ids = self.run_ids();
        let response: Option<Result<BatchStatus>> = tokio::select! {
            biased;
            () = cancel.cancelled() => None,
            response = self.backend.batch_status(&self.recipe_id, &ids) => Some(response),
        };

        match response {
            None => {
                debug!(recipe_id = %self.recipe_id, "Batch status request aborted");
                TickOutcome::Pending
            }
            Some(Err(e)) if e.is_aborted() => {
                debug!(recipe_id = %self.recipe_id, "Batch status request aborted");
                TickOutcome::Pending
            }
            Some(Err(e)) => {
                self.retry_count += 1;
                let message = e.to_string();
                warn!(
                    recipe_id = %self.recipe_id,
                    attempt = self.retry_count,
                    max = self.config.max_retry_attempts,
                    error = %message,
                    "Batch status request failed"
                );
                self.store
                    .update_snapshot(|s| s.error_message = Some(message));
                if self.retry_count >= self.config.max_retry_attempts {
                    return self.finish(SessionEnd::RetriesExhausted);
                }
                TickOutcome::Pending
            }
            Some(Ok(batch)) => {
                self.retry_count = 0;
                self.apply(batch);
                if self.records.is_empty() {
                    self.finish(SessionEnd::Completed)
                } else {
                    TickOutcome::Pending
                }
            }
        }
    }

    /// Stop tracking. The working set is dropped and the snapshot marked idle.
    pub fn stop(&mut self) {
        if self.finished.is_none() {
            self.finish(SessionEnd::Stopped);
        }
    }

    /// Tick until the session ends or `cancel` fires.
    pub async fn run(mut self, cancel: CancellationToken) -> SessionEnd {
        loop {
            if cancel.is_cancelled() {
                self.stop();
                return SessionEnd::Stopped;
            }
            if let TickOutcome::Finished(end) = self.tick(&cancel).await {
                return end;
            }
            tokio::select! {
                () = cancel.cancelled() => {}
                () = tokio::time::sleep(self.config.interval) => {}
            }
        }
    }

    fn apply(&mut self, batch: BatchStatus) {
        let mut completed = Vec::new();
        let mut failure = None;
        let mut remaining = Vec::with_capacity(self.records.len());
        let mut any_succeeded = false;

        for (run_id, status) in batch.runs {
            if !self.records.iter().any(|r| r.run_id == run_id) {
                continue;
            }
            match status.state {
                RunState::Completed => {
                    debug!(run_id = %run_id, results = status.results.len(), "Run completed");
                    any_succeeded = true;
                    completed.extend(status.results);
                }
                RunState::Failed => {
                    let message = status
                        .error
                        .as_ref()
                        .map_or_else(|| "Unknown error".to_string(), error_message);
                    debug!(run_id = %run_id, error = %message, "Run failed");
                    failure = Some(message);
                }
                RunState::Canceled => {
                    debug!(run_id = %run_id, "Run canceled");
                }
                RunState::Running => remaining.push(RunRecord {
                    run_id,
                    state: RunState::Running,
                    progress: status.progress,
                    output_count: status.output_count,
                }),
            }
        }

        self.records = remaining;
        self.store.prepend_results(completed);
        if any_succeeded && !batch.credits.is_empty() {
            self.store.apply_credits(batch.credits);
        }

        let progress = self
            .records
            .iter()
            .map(|r| r.progress)
            .reduce(f64::min);
        let loading: u32 = self.records.iter().map(|r| r.output_count).sum();
        self.store.update_snapshot(|s| {
            if let Some(progress) = progress {
                s.progress = progress;
            }
            if let Some(message) = failure {
                s.error_message = Some(message);
            }
            s.loading_results = loading;
        });
    }

    fn finish(&mut self, end: SessionEnd) -> TickOutcome {
        info!(recipe_id = %self.recipe_id, reason = ?end, "Batch polling finished");
        self.records.clear();
        self.finished = Some(end);
        self.store.finish_processing();
        TickOutcome::Finished(end)
    }
}
