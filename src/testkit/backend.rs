//! Scripted [`RunBackend`] for tests.
//!
//! Every call pops the next queued response for its endpoint. An exhausted
//! queue answers with a decode error, so a test that under-scripts a flow
//! fails loudly instead of hanging.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;

use crate::domain::{BatchStatus, PredictionStatus, RecipeRunRequest, RunRequest, SubmitOutcome};
use crate::error::{Error, Result, TransportError};
use crate::port::RunBackend;

/// A transport failure as a flaky backend would produce it.
pub fn transport_failure() -> Error {
    TransportError::Status {
        status: StatusCode::SERVICE_UNAVAILABLE,
        body: "unavailable".into(),
    }
    .into()
}

fn exhausted(endpoint: &str) -> Error {
    TransportError::Decode(format!("no scripted response for {endpoint}")).into()
}

fn pop<T>(queue: &Mutex<VecDeque<Result<T>>>, endpoint: &str) -> Result<T> {
    queue
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or_else(|| Err(exhausted(endpoint)))
}

#[derive(Default)]
pub struct ScriptedBackend {
    submits: Mutex<VecDeque<Result<SubmitOutcome>>>,
    predictions: Mutex<VecDeque<Result<PredictionStatus>>>,
    batches: Mutex<VecDeque<Result<BatchStatus>>>,
    prediction_delay: Option<Duration>,
    batch_delay: Option<Duration>,
    fail_cancel: bool,

    run_requests: Mutex<Vec<RunRequest>>,
    recipe_requests: Mutex<Vec<RecipeRunRequest>>,
    batch_requests: Mutex<Vec<Vec<String>>>,
    cancel_requests: Mutex<Vec<String>>,
    prediction_calls: AtomicU32,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_submits(self, outcomes: Vec<Result<SubmitOutcome>>) -> Self {
        *self.submits.lock().unwrap() = outcomes.into();
        self
    }

    pub fn with_predictions(self, statuses: Vec<Result<PredictionStatus>>) -> Self {
        *self.predictions.lock().unwrap() = statuses.into();
        self
    }

    pub fn with_batches(self, batches: Vec<Result<BatchStatus>>) -> Self {
        *self.batches.lock().unwrap() = batches.into();
        self
    }

    /// Delay every prediction status response by `delay`.
    pub fn with_prediction_delay(mut self, delay: Duration) -> Self {
        self.prediction_delay = Some(delay);
        self
    }

    /// Delay every batch status response by `delay`.
    pub fn with_batch_delay(mut self, delay: Duration) -> Self {
        self.batch_delay = Some(delay);
        self
    }

    /// Make `cancel_runs` fail.
    pub fn with_failing_cancel(mut self) -> Self {
        self.fail_cancel = true;
        self
    }

    pub fn push_batch(&self, batch: Result<BatchStatus>) {
        self.batches.lock().unwrap().push_back(batch);
    }

    pub fn push_prediction(&self, status: Result<PredictionStatus>) {
        self.predictions.lock().unwrap().push_back(status);
    }

    /// Single-node submissions, in order.
    pub fn run_requests(&self) -> Vec<RunRequest> {
        self.run_requests.lock().unwrap().clone()
    }

    pub fn recipe_requests(&self) -> Vec<RecipeRunRequest> {
        self.recipe_requests.lock().unwrap().clone()
    }

    /// Run id lists of every batch status request, in order.
    pub fn batch_requests(&self) -> Vec<Vec<String>> {
        self.batch_requests.lock().unwrap().clone()
    }

    pub fn cancel_requests(&self) -> Vec<String> {
        self.cancel_requests.lock().unwrap().clone()
    }

    pub fn prediction_calls(&self) -> u32 {
        self.prediction_calls.load(Ordering::SeqCst)
    }

    /// Total submissions of either kind.
    pub fn submit_count(&self) -> usize {
        self.run_requests.lock().unwrap().len() + self.recipe_requests.lock().unwrap().len()
    }
}

#[async_trait]
impl RunBackend for ScriptedBackend {
    async fn submit_run(&self, request: &RunRequest) -> Result<SubmitOutcome> {
        self.run_requests.lock().unwrap().push(request.clone());
        pop(&self.submits, "submit_run")
    }

    async fn submit_recipe(&self, request: &RecipeRunRequest) -> Result<SubmitOutcome> {
        self.recipe_requests.lock().unwrap().push(request.clone());
        pop(&self.submits, "submit_recipe")
    }

    async fn prediction_status(&self, _prediction_id: &str) -> Result<PredictionStatus> {
        self.prediction_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.prediction_delay {
            tokio::time::sleep(delay).await;
        }
        pop(&self.predictions, "prediction_status")
    }

    async fn batch_status(&self, _recipe_id: &str, run_ids: &[String]) -> Result<BatchStatus> {
        self.batch_requests.lock().unwrap().push(run_ids.to_vec());
        if let Some(delay) = self.batch_delay {
            tokio::time::sleep(delay).await;
        }
        pop(&self.batches, "batch_status")
    }

    async fn cancel_runs(&self, recipe_id: &str) -> Result<()> {
        self.cancel_requests.lock().unwrap().push(recipe_id.to_string());
        if self.fail_cancel {
            return Err(transport_failure());
        }
        Ok(())
    }
}
