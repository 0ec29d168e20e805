//! Caller-observable run state.

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;
use tokio::sync::watch;

use crate::domain::{Credits, CreditsUpdate, RunResult};

/// What a caller renders while runs are tracked.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PollingSnapshot {
    pub is_processing: bool,
    /// 0-100; the slowest running job when several are tracked.
    pub progress: f64,
    pub error_message: Option<String>,
    /// Outputs announced by running jobs that have not arrived yet.
    pub loading_results: u32,
}

/// Shared state written by the active polling session.
///
/// Results are kept newest first. Credits only change when a job is
/// observed to succeed.
pub struct RunStore {
    results: RwLock<Vec<RunResult>>,
    credits: RwLock<Credits>,
    /// Set while a run is submitted or tracked; enforces single-flight.
    running: AtomicBool,
    snapshot: watch::Sender<PollingSnapshot>,
}

impl Default for RunStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RunStore {
    #[must_use]
    pub fn new() -> Self {
        let (snapshot, _) = watch::channel(PollingSnapshot::default());
        Self {
            results: RwLock::new(Vec::new()),
            credits: RwLock::new(Credits::default()),
            running: AtomicBool::new(false),
            snapshot,
        }
    }

    /// Claim the single run slot.
    ///
    /// Returns `false` if a run is already in flight.
    pub fn try_begin_run(&self) -> bool {
        self.running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    /// Claim the run slot regardless of its current holder.
    pub fn force_begin_run(&self) {
        self.running.store(true, Ordering::SeqCst);
    }

    /// Release the run slot.
    pub fn end_run(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// All results, newest first.
    #[must_use]
    pub fn results(&self) -> Vec<RunResult> {
        self.results.read().clone()
    }

    /// Insert a batch of results ahead of the existing ones, keeping the
    /// batch's own order.
    pub fn prepend_results(&self, batch: Vec<RunResult>) {
        if batch.is_empty() {
            return;
        }
        let mut results = self.results.write();
        results.splice(0..0, batch);
    }

    #[must_use]
    pub fn credits(&self) -> Credits {
        *self.credits.read()
    }

    /// Apply a credit update. Returns `true` if a counter changed.
    pub fn apply_credits(&self, update: CreditsUpdate) -> bool {
        self.credits.write().apply(update)
    }

    #[must_use]
    pub fn snapshot(&self) -> PollingSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Receiver notified on every snapshot change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<PollingSnapshot> {
        self.snapshot.subscribe()
    }

    /// Mutate the snapshot and notify subscribers.
    pub fn update_snapshot(&self, f: impl FnOnce(&mut PollingSnapshot)) {
        self.snapshot.send_modify(f);
    }

    /// Reset the snapshot for a freshly started tracking session.
    pub fn begin_processing(&self) {
        self.snapshot.send_replace(PollingSnapshot {
            is_processing: true,
            ..PollingSnapshot::default()
        });
    }

    /// Mark tracking as finished, keeping progress and any error for display.
    pub fn finish_processing(&self) {
        self.update_snapshot(|s| {
            s.is_processing = false;
            s.loading_results = 0;
        });
    }
}
