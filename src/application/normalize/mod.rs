//! Input normalization: node inputs + model descriptor → backend request input.
//!
//! Normalization runs in two phases:
//!
//! 1. [`Normalizer::resolve`] performs the side-effecting steps: probing the
//!    `image` input's dimensions, resolving a visual id for models that need
//!    one, and inverting Ideogram inpainting masks.
//! 2. [`Normalizer::normalize_pure`] extracts inputs, cleans params, runs the
//!    rewrite rules and merges the result. Given the same resolved values it
//!    always produces the same payload.
//!
//! [`Normalizer::normalize`] runs both.

pub mod registry;
pub mod rules;
pub mod scheduler;
pub mod upscale;

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, error};

use crate::domain::error::NormalizeError;
use crate::domain::value::is_truthy;
use crate::domain::{InputHandles, ModelDescriptor, ModelType, NodeInputs, NodeParams};
use crate::error::{Error, Result};
use crate::port::AssetService;

pub use registry::{RuleRegistry, RuleRegistryBuilder};
pub use rules::{InputRule, ModelMatch, RuleContext};

/// Everything the normalizer reads from a node.
#[derive(Debug, Clone, Copy)]
pub struct NodeSnapshot<'a> {
    pub model: &'a ModelDescriptor,
    pub handles: &'a InputHandles,
    pub inputs: &'a NodeInputs,
    pub params: &'a NodeParams,
    /// Explicit seed chosen for this run, replacing any configured seed.
    pub seed: Option<i64>,
}

/// Values produced by the side-effecting normalization steps.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolved {
    pub dimensions: Option<(u32, u32)>,
    pub visual_id: Option<String>,
    /// Colour-inverted `mask` input, as a data URL.
    pub negated_mask: Option<String>,
}

/// Turns node snapshots into backend request inputs.
pub struct Normalizer {
    assets: Arc<dyn AssetService>,
    rules: RuleRegistry,
}

impl Normalizer {
    #[must_use]
    pub fn new(assets: Arc<dyn AssetService>, rules: RuleRegistry) -> Self {
        Self { assets, rules }
    }

    /// Normalizer with the built-in rule set.
    #[must_use]
    pub fn with_default_rules(assets: Arc<dyn AssetService>) -> Self {
        Self::new(assets, RuleRegistry::builder().build())
    }

    #[must_use]
    pub fn rules(&self) -> &RuleRegistry {
        &self.rules
    }

    /// Resolve side-effecting inputs, then build the request input.
    ///
    /// # Errors
    ///
    /// Returns [`NormalizeError::UnreadableImage`] when the `image` input
    /// cannot be probed, [`NormalizeError::VisualIdRegistration`] when
    /// registration fails, [`NormalizeError::MaskNegation`] when an inpainting
    /// mask cannot be inverted, or any error raised by a rewrite rule.
    pub async fn normalize(&self, node: NodeSnapshot<'_>) -> Result<Map<String, Value>> {
        let resolved = self.resolve(&node).await?;
        Ok(self.normalize_pure(node, &resolved)?)
    }

    /// Probe the input image, resolve a visual id and invert the inpainting
    /// mask where the model needs them.
    ///
    /// # Errors
    ///
    /// See [`Normalizer::normalize`].
    pub async fn resolve(&self, node: &NodeSnapshot<'_>) -> Result<Resolved> {
        let image = node
            .inputs
            .get("image")
            .and_then(Option::as_ref)
            .and_then(|value| value.as_asset())
            .filter(|asset| !asset.url.is_empty());

        let mut resolved = Resolved::default();

        if let Some(image) = image {
            match self.assets.image_dimensions(&image.url).await {
                Ok(dimensions) => resolved.dimensions = Some(dimensions),
                Err(e) => {
                    error!(url = %image.url, error = %e, "Cannot read input image");
                    return Err(NormalizeError::UnreadableImage {
                        url: image.url.clone(),
                        reason: e.to_string(),
                    }
                    .into());
                }
            }
        }

        if node.model.model_type() == ModelType::BrPsd {
            let image = image.ok_or_else(|| NormalizeError::MissingInput {
                field: "image".into(),
                model: node.model.name.clone(),
            })?;
            resolved.visual_id = match &image.visual_id {
                Some(id) => Some(id.clone()),
                None => {
                    debug!(url = %image.url, "Registering image for visual id");
                    let id = self
                        .assets
                        .register_visual(&image.url)
                        .await
                        .map_err(|e| match e {
                            Error::Normalize(e) => e,
                            other => NormalizeError::VisualIdRegistration(other.to_string()),
                        })?;
                    Some(id)
                }
            };
        }

        if rules::negates_mask(&node.model.name) {
            if let Some(url) = asset_url(node.inputs, "mask") {
                let negated = self.assets.negate_mask(url).await.map_err(|e| {
                    error!(url, error = %e, "Cannot invert inpainting mask");
                    NormalizeError::MaskNegation {
                        url: url.to_string(),
                        reason: e.to_string(),
                    }
                })?;
                resolved.negated_mask = Some(negated);
            }
        }

        Ok(resolved)
    }

    /// Build the request input from a node snapshot and resolved values.
    ///
    /// Merge order is cleaned params, then extracted inputs, then probed
    /// `width`/`height`. No emitted key holds null, an empty string or an
    /// empty array.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by a rewrite rule.
    pub fn normalize_pure(
        &self,
        node: NodeSnapshot<'_>,
        resolved: &Resolved,
    ) -> std::result::Result<Map<String, Value>, NormalizeError> {
        let mut input = extract_inputs(node.handles, node.inputs);
        let mut params = clean_params(node.params);

        let mut ctx = RuleContext {
            model: ModelMatch {
                name: &node.model.name,
                model_type: node.model.model_type(),
            },
            raw: node.inputs,
            probed_dimensions: resolved.dimensions,
            visual_id: resolved.visual_id.as_deref(),
            negated_mask: resolved.negated_mask.as_deref(),
            input: &mut input,
            params: &mut params,
        };
        self.rules.apply_all(&mut ctx)?;

        if let Some(seed) = node.seed {
            if params.contains_key("seed") {
                params.insert("seed".into(), Value::from(seed));
            }
            if input.contains_key("seed") {
                input.insert("seed".into(), Value::from(seed));
            }
        }

        let mut merged = params;
        merged.extend(input);
        if let Some((width, height)) = resolved.dimensions {
            merged.insert("width".into(), Value::from(width));
            merged.insert("height".into(), Value::from(height));
        }
        merged.retain(|_, value| is_emittable(value));
        Ok(merged)
    }
}

/// Extract a scalar for every declared input that has a value.
#[must_use]
pub fn extract_inputs(handles: &InputHandles, inputs: &NodeInputs) -> Map<String, Value> {
    handles
        .keys()
        .filter_map(|key| {
            let value = inputs.get(key)?.as_ref()?.to_request_value()?;
            Some((key.to_string(), value))
        })
        .collect()
}

/// Drop blank params and filter falsy array elements.
#[must_use]
pub fn clean_params(params: &NodeParams) -> Map<String, Value> {
    params
        .iter()
        .filter_map(|(key, value)| {
            let value = value.as_ref()?.to_request_value()?;
            Some((key.clone(), value))
        })
        .collect()
}

fn asset_url<'a>(inputs: &'a NodeInputs, key: &str) -> Option<&'a str> {
    inputs
        .get(key)?
        .as_ref()?
        .as_asset()
        .map(|asset| asset.url.as_str())
        .filter(|url| !url.is_empty())
}

fn is_emittable(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => items.iter().any(is_truthy),
        _ => true,
    }
}
