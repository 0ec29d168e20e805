//! Run orchestration: validate, submit once, then track.
//!
//! The orchestrator owns at most one polling session. Starting a new session
//! cancels and joins the previous one first, so shared state is only ever
//! written by a single task. Hand-overs are serialized: a caller holds the
//! session gate from teardown until its own session is installed.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{watch, Mutex as AsyncMutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::application::normalize::{NodeSnapshot, Normalizer};
use crate::application::poll::{BatchPollConfig, BatchPollSession, PredictionPoller};
use crate::application::state::{PollingSnapshot, RunStore};
use crate::application::validation::{validate_form, FormInput};
use crate::domain::{
    Credits, CreditsUpdate, RecipeRunRequest, RunRequest, RunResult, SubmitOutcome,
};
use crate::error::{Error, Result, TransportError};
use crate::port::{PredictionObserver, RunBackend};

/// Where a single-node run belongs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunTarget {
    pub node_id: String,
    pub recipe_id: String,
    pub recipe_version: u32,
}

impl RunTarget {
    #[must_use]
    pub fn new(
        node_id: impl Into<String>,
        recipe_id: impl Into<String>,
        recipe_version: u32,
    ) -> Self {
        Self {
            node_id: node_id.into(),
            recipe_id: recipe_id.into(),
            recipe_version,
        }
    }
}

struct ActiveSession {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

/// Entry point for starting, tracking and cancelling runs.
pub struct RunOrchestrator {
    backend: Arc<dyn RunBackend>,
    normalizer: Normalizer,
    store: Arc<RunStore>,
    batch_config: BatchPollConfig,
    active: Mutex<Option<ActiveSession>>,
    gate: AsyncMutex<()>,
}

impl RunOrchestrator {
    #[must_use]
    pub fn new(backend: Arc<dyn RunBackend>, normalizer: Normalizer) -> Self {
        Self {
            backend,
            normalizer,
            store: Arc::new(RunStore::new()),
            batch_config: BatchPollConfig::default(),
            active: Mutex::new(None),
            gate: AsyncMutex::new(()),
        }
    }

    #[must_use]
    pub fn with_batch_config(mut self, config: BatchPollConfig) -> Self {
        self.batch_config = config;
        self
    }

    #[must_use]
    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    #[must_use]
    pub fn store(&self) -> &Arc<RunStore> {
        &self.store
    }

    #[must_use]
    pub fn snapshot(&self) -> PollingSnapshot {
        self.store.snapshot()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<PollingSnapshot> {
        self.store.subscribe()
    }

    #[must_use]
    pub fn results(&self) -> Vec<RunResult> {
        self.store.results()
    }

    #[must_use]
    pub fn credits(&self) -> Credits {
        self.store.credits()
    }

    /// Whether a run is submitted or still being tracked.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.store.is_running()
    }

    /// Normalize, submit and track a single-node run.
    ///
    /// Returns the prediction id once the submission is accepted; tracking
    /// continues in the background and reports to `observer`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RunInFlight`] if another run is active, a
    /// normalization error, or the submission's transport error. No tracking
    /// starts in any of these cases.
    pub async fn run_model(
        &self,
        node: NodeSnapshot<'_>,
        target: &RunTarget,
        observer: Arc<dyn PredictionObserver>,
    ) -> Result<String> {
        if !self.store.try_begin_run() {
            return Err(Error::RunInFlight);
        }

        let prediction_id = match self.submit_model(node, target).await {
            Ok(id) => id,
            Err(e) => {
                self.store.end_run();
                return Err(e);
            }
        };
        info!(prediction_id = %prediction_id, model = %node.model.name, "Model run submitted");

        let _gate = self.gate.lock().await;
        self.teardown().await;
        self.store.begin_processing();

        let token = CancellationToken::new();
        let poller = PredictionPoller::new(Arc::clone(&self.backend));
        let store = Arc::clone(&self.store);
        let id = prediction_id.clone();
        let task_token = token.clone();
        let handle = tokio::spawn(async move {
            let tracker = TrackingObserver {
                store: Arc::clone(&store),
                inner: observer,
            };
            let outcome = poller
                .poll(&id, &tracker, || task_token.is_cancelled())
                .await;
            debug!(prediction_id = %id, outcome = ?outcome, "Prediction tracking ended");
            // A canceled task has been torn down; its owner manages the slot.
            if !task_token.is_cancelled() {
                store.finish_processing();
                store.end_run();
            }
        });
        self.install(ActiveSession { token, handle });

        Ok(prediction_id)
    }

    async fn submit_model(&self, node: NodeSnapshot<'_>, target: &RunTarget) -> Result<String> {
        let input = self.normalizer.normalize(node).await?;
        let request = RunRequest::new(
            node.model.clone(),
            input,
            target.node_id.clone(),
            target.recipe_id.clone(),
            target.recipe_version,
        );

        match self.backend.submit_run(&request).await? {
            SubmitOutcome::Prediction(id) => Ok(id),
            SubmitOutcome::Runs(mut ids) => {
                if ids.len() > 1 {
                    warn!(
                        tracked = %ids[0],
                        discarded = ?&ids[1..],
                        "Model submission returned several ids, tracking the first"
                    );
                }
                if ids.is_empty() {
                    return Err(TransportError::Decode(
                        "submission returned no prediction id".into(),
                    )
                    .into());
                }
                Ok(ids.swap_remove(0))
            }
        }
    }

    /// Validate the form, submit a recipe run and track its run ids.
    ///
    /// # Errors
    ///
    /// Returns the validation errors without touching the network,
    /// [`Error::RunInFlight`] if another run is active, or the submission's
    /// transport error.
    pub async fn run_recipe(
        &self,
        request: &RecipeRunRequest,
        form: &[FormInput],
    ) -> Result<Vec<String>> {
        validate_form(form)?;

        if !self.store.try_begin_run() {
            return Err(Error::RunInFlight);
        }

        let run_ids = match self.backend.submit_recipe(request).await {
            Ok(outcome) => outcome.ids(),
            Err(e) => {
                warn!(recipe_id = %request.recipe_id, error = %e, "Failed to run recipe");
                self.store.end_run();
                return Err(e);
            }
        };
        info!(recipe_id = %request.recipe_id, run_ids = ?run_ids, "Recipe run submitted");

        if run_ids.is_empty() {
            self.store.end_run();
            return Ok(run_ids);
        }

        let _gate = self.gate.lock().await;
        self.teardown().await;
        self.spawn_batch(&request.recipe_id, &run_ids);
        Ok(run_ids)
    }

    /// Replace the active session with one tracking `run_ids`.
    ///
    /// Used to resume tracking runs started elsewhere.
    pub async fn start_polling(&self, recipe_id: &str, run_ids: &[String]) {
        if run_ids.is_empty() {
            return;
        }
        let _gate = self.gate.lock().await;
        self.teardown().await;
        self.store.force_begin_run();
        self.spawn_batch(recipe_id, run_ids);
    }

    /// Ask the backend to cancel the recipe's runs.
    ///
    /// Best effort: failures are logged, and tracking continues until the
    /// backend reports the runs canceled.
    pub async fn cancel(&self, recipe_id: &str) {
        match self.backend.cancel_runs(recipe_id).await {
            Ok(()) => info!(recipe_id, "Cancel requested"),
            Err(e) => warn!(recipe_id, error = %e, "Failed to cancel runs"),
        }
    }

    /// Stop tracking locally without contacting the backend.
    pub async fn stop(&self) {
        let _gate = self.gate.lock().await;
        self.teardown().await;
        self.store.finish_processing();
        self.store.end_run();
    }

    fn spawn_batch(&self, recipe_id: &str, run_ids: &[String]) {
        let mut session = BatchPollSession::new(
            Arc::clone(&self.backend),
            Arc::clone(&self.store),
            recipe_id,
            self.batch_config,
        );
        session.start(run_ids);

        let token = CancellationToken::new();
        let store = Arc::clone(&self.store);
        let task_token = token.clone();
        let handle = tokio::spawn(async move {
            let end = session.run(task_token.clone()).await;
            debug!(reason = ?end, "Batch session ended");
            if !task_token.is_cancelled() {
                store.end_run();
            }
        });
        self.install(ActiveSession { token, handle });
    }

    /// Make `session` the active one. Callers hold the gate and have torn
    /// down the previous session, so nothing should be displaced here.
    fn install(&self, session: ActiveSession) {
        if let Some(displaced) = self.active.lock().replace(session) {
            warn!("Displaced a polling session that was not torn down");
            displaced.token.cancel();
            displaced.handle.abort();
        }
    }

    /// Cancel and join the active session, if any.
    async fn teardown(&self) {
        let active = self.active.lock().take();
        if let Some(active) = active {
            active.token.cancel();
            if let Err(e) = active.handle.await {
                warn!(error = %e, "Polling task did not shut down cleanly");
            }
        }
    }
}

/// Mirrors a prediction's lifecycle into the store before forwarding it.
struct TrackingObserver {
    store: Arc<RunStore>,
    inner: Arc<dyn PredictionObserver>,
}

impl PredictionObserver for TrackingObserver {
    fn on_status_change(&self, status: &str, remaining_credits: Option<f64>) {
        self.inner.on_status_change(status, remaining_credits);
    }

    fn on_progress(&self, progress: f64) {
        self.store.update_snapshot(|s| s.progress = progress);
        self.inner.on_progress(progress);
    }

    fn on_success(&self, results: &[RunResult], remaining_credits: Option<f64>) {
        self.store.prepend_results(results.to_vec());
        if remaining_credits.is_some() {
            self.store.apply_credits(CreditsUpdate {
                user: remaining_credits,
                workspace: None,
            });
        }
        self.store.update_snapshot(|s| s.progress = 100.0);
        self.inner.on_success(results, remaining_credits);
    }

    fn on_error(&self, message: &str, remaining_credits: Option<f64>) {
        self.store
            .update_snapshot(|s| s.error_message = Some(message.to_string()));
        self.inner.on_error(message, remaining_credits);
    }
}
