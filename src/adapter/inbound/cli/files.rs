//! JSON input files read by the `normalize`, `run` and `watch` commands.

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::application::normalize::NodeSnapshot;
use crate::application::validation::FormInput;
use crate::application::RunTarget;
use crate::domain::{InputHandles, ModelDescriptor, NodeInputs, NodeParams};
use crate::error::Result;

/// A model node as persisted by the editor.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeFile {
    pub node_id: String,
    pub recipe_id: String,
    #[serde(default)]
    pub recipe_version: u32,
    pub model: ModelDescriptor,
    #[serde(default)]
    pub handles: InputHandles,
    #[serde(default)]
    pub inputs: NodeInputs,
    #[serde(default)]
    pub params: NodeParams,
}

impl NodeFile {
    /// Borrow the node for normalization, with an optional seed override.
    #[must_use]
    pub fn snapshot(&self, seed: Option<i64>) -> NodeSnapshot<'_> {
        NodeSnapshot {
            model: &self.model,
            handles: &self.handles,
            inputs: &self.inputs,
            params: &self.params,
            seed,
        }
    }

    #[must_use]
    pub fn target(&self) -> RunTarget {
        RunTarget::new(&self.node_id, &self.recipe_id, self.recipe_version)
    }
}

/// A recipe's run form.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeFile {
    pub recipe_id: String,
    #[serde(default)]
    pub recipe_version: u32,
    pub inputs: Vec<FormInput>,
}

/// Read and decode a JSON file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not valid JSON for `T`.
pub fn read_json<T, P>(path: P) -> Result<T>
where
    T: DeserializeOwned,
    P: AsRef<Path>,
{
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}
