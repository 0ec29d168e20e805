//! Composition root: configuration to a ready orchestrator.

use std::sync::Arc;

use tracing::info;

use crate::adapter::outbound::http::HttpBackend;
use crate::application::normalize::registry::RuleRegistry;
use crate::application::normalize::Normalizer;
use crate::application::RunOrchestrator;
use crate::error::Result;
use crate::infrastructure::config::settings::Config;
use crate::port::{AssetService, RunBackend};

/// Build the rule registry with the configured pixel budget.
#[must_use]
pub fn build_rule_registry(config: &Config) -> RuleRegistry {
    RuleRegistry::builder()
        .pixel_budget(config.polling.pixel_budget)
        .build()
}

/// Wire an orchestrator against explicit ports.
#[must_use]
pub fn build_orchestrator_with(
    config: &Config,
    backend: Arc<dyn RunBackend>,
    assets: Arc<dyn AssetService>,
) -> RunOrchestrator {
    let normalizer = Normalizer::new(assets, build_rule_registry(config));
    RunOrchestrator::new(backend, normalizer).with_batch_config(config.polling.batch())
}

/// Build an orchestrator talking to the configured HTTP backend.
///
/// The same client serves run submission and asset probing.
///
/// # Errors
///
/// Returns an error if the backend client cannot be built.
pub fn build_orchestrator(config: &Config) -> Result<RunOrchestrator> {
    let http = Arc::new(HttpBackend::new(&config.backend)?);
    info!(
        base_url = %config.backend.base_url,
        authenticated = config.backend.api_token.is_some(),
        "Backend client ready"
    );
    let backend: Arc<dyn RunBackend> = http.clone();
    let assets: Arc<dyn AssetService> = http;
    Ok(build_orchestrator_with(config, backend, assets))
}
