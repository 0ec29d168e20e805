//! Recording [`PredictionObserver`] for tests.

use std::sync::Mutex;

use crate::domain::RunResult;
use crate::port::PredictionObserver;

#[derive(Debug, Clone, PartialEq)]
pub enum ObserverEvent {
    Status(String),
    Progress(f64),
    Success(Vec<RunResult>, Option<f64>),
    Error(String, Option<f64>),
}

/// Keeps every callback in arrival order.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<ObserverEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ObserverEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn statuses(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ObserverEvent::Status(s) => Some(s),
                _ => None,
            })
            .collect()
    }

    /// Number of terminal callbacks (`on_success` plus `on_error`).
    pub fn terminal_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, ObserverEvent::Success(..) | ObserverEvent::Error(..)))
            .count()
    }

    fn push(&self, event: ObserverEvent) {
        self.events.lock().unwrap().push(event);
    }
}

impl PredictionObserver for RecordingObserver {
    fn on_status_change(&self, status: &str, _remaining_credits: Option<f64>) {
        self.push(ObserverEvent::Status(status.to_string()));
    }

    fn on_progress(&self, progress: f64) {
        self.push(ObserverEvent::Progress(progress));
    }

    fn on_success(&self, results: &[RunResult], remaining_credits: Option<f64>) {
        self.push(ObserverEvent::Success(results.to_vec(), remaining_credits));
    }

    fn on_error(&self, message: &str, remaining_credits: Option<f64>) {
        self.push(ObserverEvent::Error(message.to_string(), remaining_credits));
    }
}
