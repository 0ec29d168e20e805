//! Wire shapes of the backend API and their conversion to domain types.

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::domain::{BatchStatus, CreditsUpdate, PredictionStatus, RunResult, RunState, RunStatus};
use crate::error::TransportError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRunResponse {
    pub prediction_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRecipeResponse {
    pub run_ids: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct RegisterImageRequest<'a> {
    pub url: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterImageResponse {
    pub visual_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionStatusResponse {
    pub status: String,
    #[serde(default)]
    pub progress: Option<f64>,
    #[serde(default)]
    pub results: Option<Vec<RunResult>>,
    #[serde(default)]
    pub error: Option<Value>,
    #[serde(default)]
    pub remaining_credits: Option<f64>,
}

impl TryFrom<PredictionStatusResponse> for PredictionStatus {
    type Error = TransportError;

    fn try_from(response: PredictionStatusResponse) -> Result<Self, Self::Error> {
        let status = match response.status.as_str() {
            "starting" => Self::Starting,
            "initial_processing" => Self::InitialProcessing,
            "processing" => match response.progress {
                Some(progress) => Self::Processing { progress },
                None => Self::InitialProcessing,
            },
            "succeeded" => Self::Succeeded {
                results: response.results.unwrap_or_default(),
                remaining_credits: response.remaining_credits,
            },
            "failed" => Self::Failed {
                error: response.error.unwrap_or(Value::Null),
                remaining_credits: response.remaining_credits,
            },
            "canceled" | "cancelled" => Self::Canceled,
            other => {
                return Err(TransportError::Decode(format!(
                    "unknown prediction status '{other}'"
                )))
            }
        };
        Ok(status)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunStatusResponse {
    pub status: RunState,
    #[serde(default)]
    pub progress: Option<f64>,
    #[serde(default)]
    pub results: Vec<RunResult>,
    #[serde(default)]
    pub error: Option<Value>,
    #[serde(default)]
    pub output_count: Option<u32>,
}

impl From<RunStatusResponse> for RunStatus {
    fn from(response: RunStatusResponse) -> Self {
        Self {
            state: response.status,
            progress: response.progress.unwrap_or(0.0),
            results: response.results,
            error: response.error,
            output_count: response.output_count.unwrap_or(0),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchStatusResponse {
    #[serde(deserialize_with = "ordered_runs")]
    pub runs: Vec<(String, RunStatusResponse)>,
    #[serde(default)]
    pub user_remaining_credits: Option<f64>,
    #[serde(default)]
    pub remaining_credits: Option<f64>,
}

impl From<BatchStatusResponse> for BatchStatus {
    fn from(response: BatchStatusResponse) -> Self {
        Self {
            runs: response
                .runs
                .into_iter()
                .map(|(id, status)| (id, status.into()))
                .collect(),
            credits: CreditsUpdate {
                user: response.user_remaining_credits,
                workspace: response.remaining_credits,
            },
        }
    }
}

/// Read the `runs` object as a list, keeping the order the backend sent.
fn ordered_runs<'de, D>(deserializer: D) -> Result<Vec<(String, RunStatusResponse)>, D::Error>
where
    D: Deserializer<'de>,
{
    struct RunsVisitor;

    impl<'de> Visitor<'de> for RunsVisitor {
        type Value = Vec<(String, RunStatusResponse)>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a map of run id to run status")
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut runs = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some(entry) = map.next_entry()? {
                runs.push(entry);
            }
            Ok(runs)
        }
    }

    deserializer.deserialize_map(RunsVisitor)
}
