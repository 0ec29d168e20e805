//! Run requests and submission outcomes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::model::{ModelDescriptor, ModelType};
use super::value::ParameterValue;

/// Resolved values of a node's input ports, keyed by handle name.
///
/// A `None` entry is a port that is connected but currently resolves to
/// nothing (`null` on the wire).
pub type NodeInputs = BTreeMap<String, Option<ParameterValue>>;

/// Parameter values configured on the node itself.
pub type NodeParams = BTreeMap<String, Option<ParameterValue>>;

/// Declaration of a single input handle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Handle {
    #[serde(default)]
    pub required: bool,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

/// Input handles declared by a node.
///
/// Current nodes persist a keyed map; older nodes persist a bare list of
/// handle names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InputHandles {
    Keyed(BTreeMap<String, Handle>),
    Legacy(Vec<String>),
}

impl InputHandles {
    /// Declared handle names.
    pub fn keys(&self) -> Box<dyn Iterator<Item = &str> + '_> {
        match self {
            Self::Keyed(map) => Box::new(map.keys().map(String::as_str)),
            Self::Legacy(list) => Box::new(list.iter().map(String::as_str)),
        }
    }
}

impl Default for InputHandles {
    fn default() -> Self {
        Self::Keyed(BTreeMap::new())
    }
}

impl<const N: usize> From<[&str; N]> for InputHandles {
    fn from(keys: [&str; N]) -> Self {
        Self::Keyed(
            keys.into_iter()
                .map(|k| (k.to_string(), Handle::default()))
                .collect(),
        )
    }
}

/// Model block of a run request: the descriptor plus its resolved type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestModel {
    #[serde(flatten)]
    pub descriptor: ModelDescriptor,
    #[serde(rename = "type")]
    pub model_type: ModelType,
}

/// Body of a single-node run submission.
///
/// Built once per submission and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRequest {
    pub model: RequestModel,
    pub input: Map<String, Value>,
    pub node_id: String,
    pub recipe_id: String,
    pub recipe_version: u32,
}

impl RunRequest {
    #[must_use]
    pub fn new(
        model: ModelDescriptor,
        input: Map<String, Value>,
        node_id: impl Into<String>,
        recipe_id: impl Into<String>,
        recipe_version: u32,
    ) -> Self {
        let model_type = model.model_type();
        Self {
            model: RequestModel {
                descriptor: model,
                model_type,
            },
            input,
            node_id: node_id.into(),
            recipe_id: recipe_id.into(),
            recipe_version,
        }
    }
}

/// One node's value within a recipe run submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeInput {
    pub node_id: String,
    pub input: Value,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Body of a recipe (whole workflow) run submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeRunRequest {
    #[serde(skip)]
    pub recipe_id: String,
    pub inputs: Vec<RecipeInput>,
    pub number_of_runs: u32,
    pub recipe_version: u32,
}

/// What the backend hands back for an accepted submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// A single prediction to track with the single-job poller.
    Prediction(String),
    /// A set of runs to track with a batch polling session.
    Runs(Vec<String>),
}

impl SubmitOutcome {
    /// All job ids carried by the outcome.
    #[must_use]
    pub fn ids(&self) -> Vec<String> {
        match self {
            Self::Prediction(id) => vec![id.clone()],
            Self::Runs(ids) => ids.clone(),
        }
    }
}
