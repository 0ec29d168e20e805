//! Builders for domain values used across tests.

use serde_json::Value;

use crate::domain::{
    Asset, AssetKind, BatchStatus, CreditsUpdate, ModelDescriptor, ModelService, NodeInputs,
    NodeParams, ParameterValue, RunResult, RunState, RunStatus,
};

/// A model hosted on `service`.
pub fn model(name: &str, service: &str) -> ModelDescriptor {
    ModelDescriptor::new(name, ModelService::from(service.to_string()))
}

pub fn text(value: &str) -> Option<ParameterValue> {
    Some(ParameterValue::text(value))
}

pub fn integer(value: i64) -> Option<ParameterValue> {
    Some(ParameterValue::Integer(value))
}

pub fn float(value: f64) -> Option<ParameterValue> {
    Some(ParameterValue::Float(value))
}

pub fn image(url: &str) -> Option<ParameterValue> {
    Some(ParameterValue::Asset(Asset::new(AssetKind::Image, url)))
}

/// An image whose dimensions are already known.
pub fn sized_image(url: &str, width: u32, height: u32) -> Option<ParameterValue> {
    Some(ParameterValue::Asset(
        Asset::new(AssetKind::Image, url).with_dimensions(width, height),
    ))
}

/// Build a node value map from `(key, value)` pairs.
pub fn values<const N: usize>(pairs: [(&str, Option<ParameterValue>); N]) -> NodeInputs {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect::<NodeParams>()
}

pub fn result(url: &str) -> RunResult {
    RunResult::new(url, "image")
}

pub fn running(progress: f64, output_count: u32) -> RunStatus {
    RunStatus {
        state: RunState::Running,
        progress,
        results: Vec::new(),
        error: None,
        output_count,
    }
}

pub fn completed(results: Vec<RunResult>) -> RunStatus {
    RunStatus {
        state: RunState::Completed,
        progress: 100.0,
        results,
        error: None,
        output_count: 0,
    }
}

pub fn failed(message: &str) -> RunStatus {
    RunStatus {
        state: RunState::Failed,
        progress: 0.0,
        results: Vec::new(),
        error: Some(Value::String(message.to_string())),
        output_count: 0,
    }
}

pub fn canceled() -> RunStatus {
    RunStatus {
        state: RunState::Canceled,
        progress: 0.0,
        results: Vec::new(),
        error: None,
        output_count: 0,
    }
}

/// A batch response listing `runs` in the given order.
pub fn batch<const N: usize>(runs: [(&str, RunStatus); N]) -> BatchStatus {
    BatchStatus {
        runs: runs
            .into_iter()
            .map(|(id, status)| (id.to_string(), status))
            .collect(),
        credits: CreditsUpdate::default(),
    }
}

/// Attach credit balances to a batch response.
pub fn with_credits(mut status: BatchStatus, user: Option<f64>, workspace: Option<f64>) -> BatchStatus {
    status.credits = CreditsUpdate { user, workspace };
    status
}
