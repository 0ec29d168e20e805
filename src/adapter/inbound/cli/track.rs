//! Following a tracked run from the terminal.

use indicatif::ProgressBar;

use crate::adapter::inbound::cli::output;
use crate::application::{PollingSnapshot, RunOrchestrator};
use crate::domain::RunResult;
use crate::error::{Error, Result};
use crate::port::PredictionObserver;

/// Mirrors single-prediction callbacks onto a spinner.
pub struct SpinnerObserver {
    pb: ProgressBar,
}

impl SpinnerObserver {
    #[must_use]
    pub fn new(pb: ProgressBar) -> Self {
        Self { pb }
    }
}

impl PredictionObserver for SpinnerObserver {
    fn on_status_change(&self, status: &str, _remaining_credits: Option<f64>) {
        tracing::debug!(status, "Prediction status");
        self.pb.set_message(status.replace('_', " "));
    }

    fn on_progress(&self, progress: f64) {
        self.pb.set_message(format!("processing {progress:.0}%"));
    }

    fn on_success(&self, results: &[RunResult], _remaining_credits: Option<f64>) {
        self.pb
            .set_message(format!("received {} result(s)", results.len()));
    }
}

fn progress_message(snapshot: &PollingSnapshot) -> String {
    if snapshot.loading_results > 0 {
        format!(
            "processing {:.0}% ({} output(s) pending)",
            snapshot.progress, snapshot.loading_results
        )
    } else {
        format!("processing {:.0}%", snapshot.progress)
    }
}

/// Wait for the orchestrator to go idle, updating `pb` as snapshots change.
///
/// Returns `None` when interrupted with Ctrl-C; tracking is stopped locally
/// and the backend jobs keep running.
pub async fn follow(orchestrator: &RunOrchestrator, pb: &ProgressBar) -> Option<PollingSnapshot> {
    let mut rx = orchestrator.subscribe();
    loop {
        let snapshot = rx.borrow_and_update().clone();
        if !snapshot.is_processing {
            return Some(snapshot);
        }
        if snapshot.progress > 0.0 || snapshot.loading_results > 0 {
            pb.set_message(progress_message(&snapshot));
        }

        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    return Some(rx.borrow().clone());
                }
            }
            _ = tokio::signal::ctrl_c() => {
                orchestrator.stop().await;
                return None;
            }
        }
    }
}

/// Follow the active run and report its outcome.
///
/// # Errors
///
/// Returns [`Error::RunFailed`] when tracking ended with an error and no
/// results arrived.
pub async fn report(orchestrator: &RunOrchestrator, pb: &ProgressBar) -> Result<()> {
    let Some(snapshot) = follow(orchestrator, pb).await else {
        output::spinner_fail(pb, "Interrupted; jobs keep running on the backend");
        return Ok(());
    };

    let results = orchestrator.results();
    match (&snapshot.error_message, results.is_empty()) {
        (Some(message), true) => {
            output::spinner_fail(pb, message);
            return Err(Error::RunFailed(message.clone()));
        }
        (Some(message), false) => {
            output::spinner_success(pb, &format!("Finished with {} result(s)", results.len()));
            output::warning(message);
        }
        (None, true) => output::spinner_success(pb, "Finished without results"),
        (None, false) => {
            output::spinner_success(pb, &format!("Finished with {} result(s)", results.len()));
        }
    }

    for item in &results {
        output::result(item);
    }

    let credits = orchestrator.credits();
    if credits.user.is_some() || credits.workspace.is_some() {
        output::section("Credits");
        output::field("User", output::credits(credits.user));
        output::field("Workspace", output::credits(credits.workspace));
    }
    Ok(())
}
