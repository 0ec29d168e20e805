#![allow(dead_code)]

pub mod architecture;
pub mod http;

use std::sync::Arc;
use std::time::Duration;

use modelrun::application::normalize::Normalizer;
use modelrun::application::poll::BatchPollConfig;
use modelrun::application::{PollingSnapshot, RunOrchestrator};
use modelrun::testkit::assets::StaticAssets;
use modelrun::testkit::backend::ScriptedBackend;

/// Batch settings used by orchestrator tests.
pub fn batch_config() -> BatchPollConfig {
    BatchPollConfig {
        interval: Duration::from_millis(1000),
        max_retry_attempts: 3,
    }
}

pub fn orchestrator(backend: &Arc<ScriptedBackend>) -> RunOrchestrator {
    orchestrator_with_assets(backend, StaticAssets::new())
}

pub fn orchestrator_with_assets(
    backend: &Arc<ScriptedBackend>,
    assets: StaticAssets,
) -> RunOrchestrator {
    let normalizer = Normalizer::with_default_rules(Arc::new(assets));
    RunOrchestrator::new(backend.clone(), normalizer).with_batch_config(batch_config())
}

/// Wait until the orchestrator stops processing.
pub async fn wait_idle(orchestrator: &RunOrchestrator) -> PollingSnapshot {
    let mut rx = orchestrator.subscribe();
    let snapshot = tokio::time::timeout(
        Duration::from_secs(600),
        rx.wait_for(|s| !s.is_processing),
    )
    .await
    .expect("tracking did not finish")
    .expect("snapshot channel closed")
    .clone();
    snapshot
}

/// Wait until the run slot is released.
pub async fn wait_released(orchestrator: &RunOrchestrator) {
    for _ in 0..1000 {
        if !orchestrator.is_running() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("run slot was never released");
}

pub fn ids(ids: &[&str]) -> Vec<String> {
    ids.iter().map(ToString::to_string).collect()
}
