//! Model-specific input rewrite rules.
//!
//! Each rule names the models it applies to and rewrites the extracted
//! input (and cleaned params) into the shape that model's backend expects.
//! Rules are pure: anything that needs the network happens before rules run
//! and is handed to them through [`RuleContext`].

use serde_json::{Map, Value};

use crate::domain::error::NormalizeError;
use crate::domain::{AssetKind, ModelType, NodeInputs};

use super::scheduler::fix_scheduler;
use super::upscale::{
    check_scale_factor, max_video_upscale_factor, parse_scale_label, DEFAULT_PIXEL_BUDGET,
};

/// Identity of the model being normalized, as seen by rule predicates.
#[derive(Debug, Clone, Copy)]
pub struct ModelMatch<'a> {
    pub name: &'a str,
    pub model_type: ModelType,
}

impl ModelMatch<'_> {
    fn is_any(&self, types: &[ModelType]) -> bool {
        types.contains(&self.model_type)
    }
}

/// Mutable view handed to each rule.
pub struct RuleContext<'a> {
    pub model: ModelMatch<'a>,
    /// Raw node inputs, before extraction.
    pub raw: &'a NodeInputs,
    /// Dimensions probed for the `image` input, if any.
    pub probed_dimensions: Option<(u32, u32)>,
    /// Visual id resolved for the `image` input, if the model needs one.
    pub visual_id: Option<&'a str>,
    /// Inverted `mask` input, if the model inpaints with a negated mask.
    pub negated_mask: Option<&'a str>,
    /// Extracted inputs.
    pub input: &'a mut Map<String, Value>,
    /// Cleaned params.
    pub params: &'a mut Map<String, Value>,
}

impl RuleContext<'_> {
    /// URL of a raw asset input.
    fn asset_url(&self, key: &str) -> Option<&str> {
        self.raw
            .get(key)?
            .as_ref()?
            .as_asset()
            .map(|asset| asset.url.as_str())
            .filter(|url| !url.is_empty())
    }

    /// URLs of raw asset inputs whose key starts with `prefix`, in natural
    /// key order (`image_2` before `image_10`).
    fn prefixed_urls(&self, prefix: &str) -> Vec<Value> {
        let mut keys: Vec<&String> = self
            .raw
            .keys()
            .filter(|key| key.starts_with(prefix))
            .collect();
        keys.sort_by_key(|key| natural_key(key));
        keys.into_iter()
            .filter_map(|key| self.asset_url(key))
            .map(|url| Value::String(url.to_string()))
            .collect()
    }

    /// Replace every input starting with `prefix` by one array under `target`.
    ///
    /// With `strip_params`, params that shadow one of the collapsed inputs are
    /// removed as well. An empty collection is not emitted.
    fn collapse(&mut self, prefix: &str, target: &str, strip_params: bool) {
        let urls = self.prefixed_urls(prefix);

        self.input
            .retain(|key, _| key == target || !key.starts_with(prefix));
        if strip_params {
            let raw = self.raw;
            self.params
                .retain(|key, _| !(key.starts_with(prefix) && raw.contains_key(key)));
        }

        if urls.is_empty() {
            self.input.remove(target);
        } else {
            self.input.insert(target.to_string(), Value::Array(urls));
        }
    }
}

/// Sort key splitting a trailing number off a handle name.
fn natural_key(key: &str) -> (String, u64) {
    let digits = key.len() - key.trim_end_matches(|c: char| c.is_ascii_digit()).len();
    let (stem, number) = key.split_at(key.len() - digits);
    (stem.to_string(), number.parse().unwrap_or(0))
}

/// Encode a computed number the way the backend's JSON parser expects:
/// integral values without a fractional part.
fn number_value(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        Value::from(n as i64)
    } else {
        serde_json::Number::from_f64(n).map_or(Value::Null, Value::Number)
    }
}

/// A rewrite rule for one family of models.
pub trait InputRule: Send + Sync {
    /// Unique identifier for this rule, used in logs.
    fn name(&self) -> &'static str;

    /// Whether the rule should run for the given model.
    fn applies_to(&self, model: &ModelMatch<'_>) -> bool;

    /// Rewrite the context in place.
    fn apply(&self, ctx: &mut RuleContext<'_>) -> Result<(), NormalizeError>;
}

/// Bria PSD works on a registered image, referenced by its visual id.
pub struct BriaVisualId;

impl InputRule for BriaVisualId {
    fn name(&self) -> &'static str {
        "bria-visual-id"
    }

    fn applies_to(&self, model: &ModelMatch<'_>) -> bool {
        model.model_type == ModelType::BrPsd
    }

    fn apply(&self, ctx: &mut RuleContext<'_>) -> Result<(), NormalizeError> {
        if let Some(visual_id) = ctx.visual_id {
            ctx.input
                .insert("visualId".into(), Value::String(visual_id.to_string()));
        }
        Ok(())
    }
}

/// ControlNet takes its control mode as the `type` input.
pub struct ControlnetType;

impl InputRule for ControlnetType {
    fn name(&self) -> &'static str {
        "controlnet-type"
    }

    fn applies_to(&self, model: &ModelMatch<'_>) -> bool {
        model.model_type == ModelType::SdControlnet
    }

    fn apply(&self, ctx: &mut RuleContext<'_>) -> Result<(), NormalizeError> {
        match ctx.params.get("control_type").cloned() {
            Some(control_type) => {
                ctx.input.insert("type".into(), control_type);
            }
            None => {
                ctx.input.remove("type");
            }
        }
        Ok(())
    }
}

/// Models whose inpainting masks mark the area to keep rather than the area
/// to repaint.
const NEGATED_MASK_MODELS: &[&str] = &["ideogram-ai/ideogram-v2", "ideogram-ai/ideogram-v3-quality"];

/// Whether `model_name` expects its `mask` input colour-inverted.
#[must_use]
pub fn negates_mask(model_name: &str) -> bool {
    NEGATED_MASK_MODELS.contains(&model_name)
}

/// Replace the `mask` input with its inverted copy.
pub struct IdeogramMaskNegation;

impl InputRule for IdeogramMaskNegation {
    fn name(&self) -> &'static str {
        "ideogram-mask-negation"
    }

    fn applies_to(&self, model: &ModelMatch<'_>) -> bool {
        negates_mask(model.name)
    }

    fn apply(&self, ctx: &mut RuleContext<'_>) -> Result<(), NormalizeError> {
        if let Some(mask) = ctx.negated_mask {
            ctx.input.insert("mask".into(), Value::String(mask.to_string()));
        }
        Ok(())
    }
}

/// Ideogram v3 takes style references as one array and the inpaint source
/// as `image`.
pub struct IdeogramStyleReferences;

impl InputRule for IdeogramStyleReferences {
    fn name(&self) -> &'static str {
        "ideogram-style-references"
    }

    fn applies_to(&self, model: &ModelMatch<'_>) -> bool {
        model.name == "ideogram-ai/ideogram-v3-quality"
            || model.is_any(&[ModelType::IdeogramV3, ModelType::IdeogramV3ReplaceBackground])
    }

    fn apply(&self, ctx: &mut RuleContext<'_>) -> Result<(), NormalizeError> {
        if let Some(url) = ctx.asset_url("image_to_inpaint") {
            let url = url.to_string();
            ctx.input.insert("image".into(), Value::String(url));
        }
        ctx.collapse("style_reference_image", "style_reference_images", true);
        Ok(())
    }
}

/// Clamp the video upscale factor so the output stays within 4K UHD.
pub struct TopazUpscaleClamp;

impl InputRule for TopazUpscaleClamp {
    fn name(&self) -> &'static str {
        "topaz-upscale-clamp"
    }

    fn applies_to(&self, model: &ModelMatch<'_>) -> bool {
        model.model_type == ModelType::TopazUpscaleVideo
    }

    fn apply(&self, ctx: &mut RuleContext<'_>) -> Result<(), NormalizeError> {
        let dimensions = ctx
            .raw
            .get("video")
            .and_then(Option::as_ref)
            .and_then(|v| v.as_asset())
            .and_then(|asset| asset.dimensions());
        let Some((width, height)) = dimensions else {
            return Ok(());
        };

        let requested = ctx
            .params
            .get("upscale_factor")
            .and_then(Value::as_f64)
            .filter(|f| *f != 0.0)
            .unwrap_or(1.0);
        let factor = requested.min(max_video_upscale_factor(width, height));
        ctx.input
            .insert("upscale_factor".into(), number_value(factor));
        Ok(())
    }
}

/// Migrate scheduler labels persisted by older Civitai nodes.
pub struct CivitSchedulerFixup;

impl InputRule for CivitSchedulerFixup {
    fn name(&self) -> &'static str {
        "civit-scheduler-fixup"
    }

    fn applies_to(&self, model: &ModelMatch<'_>) -> bool {
        model.model_type == ModelType::Civit
    }

    fn apply(&self, ctx: &mut RuleContext<'_>) -> Result<(), NormalizeError> {
        if let Some(Value::String(scheduler)) = ctx.params.get_mut("scheduler") {
            let fixed = fix_scheduler(scheduler).to_string();
            *scheduler = fixed;
        }
        Ok(())
    }
}

/// Edit models that take every `image*` input as one `images` array.
pub struct ImageArray;

impl InputRule for ImageArray {
    fn name(&self) -> &'static str {
        "image-array"
    }

    fn applies_to(&self, model: &ModelMatch<'_>) -> bool {
        model.is_any(&[
            ModelType::GeminiEdit,
            ModelType::GptImage1Edit,
            ModelType::Hyper3dRodin,
        ])
    }

    fn apply(&self, ctx: &mut RuleContext<'_>) -> Result<(), NormalizeError> {
        ctx.collapse("image", "images", true);
        Ok(())
    }
}

/// Runway Gen-4 Image takes its `image*` inputs as `reference_images`.
pub struct RunwayGen4References;

impl InputRule for RunwayGen4References {
    fn name(&self) -> &'static str {
        "runway-gen4-references"
    }

    fn applies_to(&self, model: &ModelMatch<'_>) -> bool {
        model.name == "runwayml/gen4-image"
    }

    fn apply(&self, ctx: &mut RuleContext<'_>) -> Result<(), NormalizeError> {
        ctx.collapse("image", "reference_images", false);
        Ok(())
    }
}

/// Runway Act-Two wants the driving character split by media kind.
pub struct RunwayActTwoCharacter;

impl InputRule for RunwayActTwoCharacter {
    fn name(&self) -> &'static str {
        "runway-act-two-character"
    }

    fn applies_to(&self, model: &ModelMatch<'_>) -> bool {
        model.model_type == ModelType::RunwayActTwo
    }

    fn apply(&self, ctx: &mut RuleContext<'_>) -> Result<(), NormalizeError> {
        let Some(character) = ctx.input.remove("character") else {
            return Ok(());
        };
        let is_video = ctx
            .raw
            .get("character")
            .and_then(Option::as_ref)
            .and_then(|v| v.as_asset())
            .is_some_and(|asset| asset.kind() == AssetKind::Video);
        let key = if is_video {
            "characterVideo"
        } else {
            "characterImage"
        };
        ctx.input.insert(key.into(), character);
        Ok(())
    }
}

/// Wan VACE and Kling 1.6 take numbered reference images as one array.
pub struct ReferenceImageArray;

impl ReferenceImageArray {
    fn is_kling(model: &ModelMatch<'_>) -> bool {
        model.name == "kwaivgi/kling-v1.6-pro" || model.name == ModelType::Kling16.as_str()
    }
}

impl InputRule for ReferenceImageArray {
    fn name(&self) -> &'static str {
        "reference-image-array"
    }

    fn applies_to(&self, model: &ModelMatch<'_>) -> bool {
        model.name == ModelType::Wan21Vace.as_str() || Self::is_kling(model)
    }

    fn apply(&self, ctx: &mut RuleContext<'_>) -> Result<(), NormalizeError> {
        let target = if Self::is_kling(&ctx.model) {
            "reference_images"
        } else {
            "ref_image_urls"
        };
        ctx.collapse("reference_image", target, true);
        Ok(())
    }
}

/// Runway Aleph takes numbered reference images as `referenceImages`.
pub struct RunwayAlephReferences;

impl InputRule for RunwayAlephReferences {
    fn name(&self) -> &'static str {
        "runway-aleph-references"
    }

    fn applies_to(&self, model: &ModelMatch<'_>) -> bool {
        model.name == ModelType::RunwayAleph.as_str()
    }

    fn apply(&self, ctx: &mut RuleContext<'_>) -> Result<(), NormalizeError> {
        ctx.collapse("reference_image", "referenceImages", false);
        Ok(())
    }
}

/// Reject Magnific upscales that exceed the pixel budget.
pub struct MagnificPixelBudget {
    budget: u64,
}

impl MagnificPixelBudget {
    #[must_use]
    pub const fn new(budget: u64) -> Self {
        Self { budget }
    }
}

impl Default for MagnificPixelBudget {
    fn default() -> Self {
        Self::new(DEFAULT_PIXEL_BUDGET)
    }
}

impl InputRule for MagnificPixelBudget {
    fn name(&self) -> &'static str {
        "magnific-pixel-budget"
    }

    fn applies_to(&self, model: &ModelMatch<'_>) -> bool {
        model.name == ModelType::FreepikMagnificUpscale.as_str()
    }

    fn apply(&self, ctx: &mut RuleContext<'_>) -> Result<(), NormalizeError> {
        let dimensions = ctx
            .raw
            .get("image")
            .and_then(Option::as_ref)
            .and_then(|v| v.as_asset())
            .and_then(|asset| asset.dimensions())
            .or(ctx.probed_dimensions);
        let Some((width, height)) = dimensions else {
            return Ok(());
        };

        let scale = parse_scale_label(ctx.params.get("scale_factor").and_then(Value::as_str));
        check_scale_factor(width, height, scale, self.budget)
    }
}
