//! Single-prediction poller with an adaptive interval.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, warn};

use crate::domain::{error_message, PredictionStatus, RunResult};
use crate::port::{PredictionObserver, RunBackend};

const FAST_WINDOW: Duration = Duration::from_secs(10);
const MEDIUM_WINDOW: Duration = Duration::from_secs(30);

const FAST_INTERVAL: Duration = Duration::from_millis(1000);
const MEDIUM_INTERVAL: Duration = Duration::from_millis(2500);
const SLOW_INTERVAL: Duration = Duration::from_millis(5000);

/// Delay before the next status read, given the time since the first one.
///
/// Short jobs are polled every second; long jobs back off to 2.5 s after
/// 10 s and to 5 s after 30 s.
#[must_use]
pub fn poll_interval(elapsed: Duration) -> Duration {
    if elapsed < FAST_WINDOW {
        FAST_INTERVAL
    } else if elapsed < MEDIUM_WINDOW {
        MEDIUM_INTERVAL
    } else {
        SLOW_INTERVAL
    }
}

/// How tracking of one prediction ended.
#[derive(Debug, Clone, PartialEq)]
pub enum PredictionOutcome {
    Succeeded {
        results: Vec<RunResult>,
        remaining_credits: Option<f64>,
    },
    Failed {
        message: String,
        remaining_credits: Option<f64>,
    },
    /// The backend reported the job canceled.
    Canceled,
    /// The caller stopped tracking; no callback fired.
    Abandoned,
}

/// Tracks one prediction id until it reaches a terminal status.
pub struct PredictionPoller {
    backend: Arc<dyn RunBackend>,
}

impl PredictionPoller {
    #[must_use]
    pub fn new(backend: Arc<dyn RunBackend>) -> Self {
        Self { backend }
    }

    /// Poll `prediction_id` until it finishes, reporting to `observer`.
    ///
    /// `is_canceled` is consulted before every request and again after every
    /// response; once it returns `true` no further callback fires. A
    /// transport error is reported through `on_error` and ends tracking.
    pub async fn poll<F>(
        &self,
        prediction_id: &str,
        observer: &dyn PredictionObserver,
        is_canceled: F,
    ) -> PredictionOutcome
    where
        F: Fn() -> bool + Send + Sync,
    {
        let started = Instant::now();

        loop {
            if is_canceled() {
                debug!(prediction_id, "Prediction tracking canceled before request");
                return PredictionOutcome::Abandoned;
            }

            let response = self.backend.prediction_status(prediction_id).await;

            if is_canceled() {
                debug!(prediction_id, "Prediction tracking canceled, dropping response");
                return PredictionOutcome::Abandoned;
            }

            let status = match response {
                Ok(status) => status,
                Err(e) => {
                    warn!(prediction_id, error = %e, "Prediction status request failed");
                    let message = e.to_string();
                    observer.on_error(&message, None);
                    return PredictionOutcome::Failed {
                        message,
                        remaining_credits: None,
                    };
                }
            };

            observer.on_status_change(status.as_str(), status.remaining_credits());

            match status {
                PredictionStatus::Starting | PredictionStatus::InitialProcessing => {}
                PredictionStatus::Processing { progress } => observer.on_progress(progress),
                PredictionStatus::Succeeded {
                    results,
                    remaining_credits,
                } => {
                    debug!(prediction_id, results = results.len(), "Prediction succeeded");
                    observer.on_success(&results, remaining_credits);
                    return PredictionOutcome::Succeeded {
                        results,
                        remaining_credits,
                    };
                }
                PredictionStatus::Failed {
                    error,
                    remaining_credits,
                } => {
                    let message = error_message(&error);
                    debug!(prediction_id, error = %message, "Prediction failed");
                    observer.on_error(&message, remaining_credits);
                    return PredictionOutcome::Failed {
                        message,
                        remaining_credits,
                    };
                }
                PredictionStatus::Canceled => {
                    debug!(prediction_id, "Prediction canceled by backend");
                    return PredictionOutcome::Canceled;
                }
            }

            tokio::time::sleep(poll_interval(started.elapsed())).await;
        }
    }
}
