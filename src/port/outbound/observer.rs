//! Callbacks fired while a single prediction is polled.

use crate::domain::RunResult;

/// Receives the lifecycle of one prediction.
///
/// All methods default to no-ops. At most one of [`on_success`] and
/// [`on_error`] fires per prediction, and none fire once the caller has
/// canceled the job.
///
/// [`on_success`]: PredictionObserver::on_success
/// [`on_error`]: PredictionObserver::on_error
pub trait PredictionObserver: Send + Sync {
    /// Every observed status, including terminal ones.
    fn on_status_change(&self, _status: &str, _remaining_credits: Option<f64>) {}

    /// Progress of a running prediction, 0-100.
    fn on_progress(&self, _progress: f64) {}

    fn on_success(&self, _results: &[RunResult], _remaining_credits: Option<f64>) {}

    /// Model failure or transport error, already rendered for display.
    fn on_error(&self, _message: &str, _remaining_credits: Option<f64>) {}
}

/// Observer that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl PredictionObserver for NoopObserver {}
