//! Backend port for submitting and tracking model runs.

use async_trait::async_trait;

use crate::domain::{BatchStatus, PredictionStatus, RecipeRunRequest, RunRequest, SubmitOutcome};
use crate::error::Result;

/// Client for the generation backend.
///
/// Implementations must never retry the two submit methods: a repeated POST
/// can create two billable jobs from one user action. Status reads may be
/// retried by the implementation.
///
/// Dropping a returned future aborts the request; callers rely on this to
/// cancel an in-flight batch status read.
#[async_trait]
pub trait RunBackend: Send + Sync {
    /// Submit a single-node run. Sent exactly once.
    async fn submit_run(&self, request: &RunRequest) -> Result<SubmitOutcome>;

    /// Submit a whole-recipe run. Sent exactly once.
    async fn submit_recipe(&self, request: &RecipeRunRequest) -> Result<SubmitOutcome>;

    /// Read the status of one prediction.
    async fn prediction_status(&self, prediction_id: &str) -> Result<PredictionStatus>;

    /// Read the status of a set of runs in one request.
    async fn batch_status(&self, recipe_id: &str, run_ids: &[String]) -> Result<BatchStatus>;

    /// Ask the backend to cancel the recipe's active runs.
    async fn cancel_runs(&self, recipe_id: &str) -> Result<()>;
}
