//! Job status types reported by the backend.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::credits::CreditsUpdate;

/// A generated asset returned by a finished job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub url: String,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RunResult {
    #[must_use]
    pub fn new(url: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            kind: Some(kind.into()),
            extra: Map::new(),
        }
    }
}

/// Status of a single prediction.
///
/// `Starting`, `InitialProcessing` and `Processing` all mean "still running";
/// the split only tells whether a progress value is known yet.
#[derive(Debug, Clone, PartialEq)]
pub enum PredictionStatus {
    Starting,
    InitialProcessing,
    Processing {
        progress: f64,
    },
    Succeeded {
        results: Vec<RunResult>,
        remaining_credits: Option<f64>,
    },
    Failed {
        error: Value,
        remaining_credits: Option<f64>,
    },
    Canceled,
}

impl PredictionStatus {
    /// Wire name of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Starting => "starting",
            Self::InitialProcessing => "initial_processing",
            Self::Processing { .. } => "processing",
            Self::Succeeded { .. } => "succeeded",
            Self::Failed { .. } => "failed",
            Self::Canceled => "canceled",
        }
    }

    /// True once no further polling may happen for the job.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Succeeded { .. } | Self::Failed { .. } | Self::Canceled
        )
    }

    #[must_use]
    pub fn remaining_credits(&self) -> Option<f64> {
        match self {
            Self::Succeeded {
                remaining_credits, ..
            }
            | Self::Failed {
                remaining_credits, ..
            } => *remaining_credits,
            _ => None,
        }
    }
}

/// Coarse state of one run inside a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunState {
    #[serde(alias = "starting", alias = "processing", alias = "PENDING")]
    Running,
    #[serde(alias = "succeeded")]
    Completed,
    #[serde(alias = "failed")]
    Failed,
    #[serde(alias = "canceled")]
    Canceled,
}

/// Status of one run as reported by the batch status endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct RunStatus {
    pub state: RunState,
    pub progress: f64,
    pub results: Vec<RunResult>,
    pub error: Option<Value>,
    pub output_count: u32,
}

/// Response of one batch status request, in backend order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BatchStatus {
    pub runs: Vec<(String, RunStatus)>,
    pub credits: CreditsUpdate,
}

/// Per-run bookkeeping for the duration of one batch polling session.
#[derive(Debug, Clone, PartialEq)]
pub struct RunRecord {
    pub run_id: String,
    pub state: RunState,
    pub progress: f64,
    pub output_count: u32,
}

impl RunRecord {
    #[must_use]
    pub fn pending(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            state: RunState::Running,
            progress: 0.0,
            output_count: 0,
        }
    }
}

/// Render a server-reported error for display.
///
/// Text is shown as-is, structured errors are serialized, and a missing
/// error falls back to a generic message.
#[must_use]
pub fn error_message(error: &Value) -> String {
    match error {
        Value::String(s) => s.clone(),
        Value::Null => "Unknown error".to_string(),
        other => other.to_string(),
    }
}
