//! Model descriptors and model-type resolution.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Well-known model types understood by the backend.
///
/// `Replicate`, `Civit` and `FalImported` name whole hosting services; the
/// remaining variants name individual first-party integrations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelType {
    Replicate,
    Civit,
    FalImported,
    Dalle,
    GptImage1,
    GptImage1Edit,
    GeminiEdit,
    SdImageGeneration,
    SdControlnet,
    SdUpscale,
    BrPsd,
    BrRemoveBackground,
    IdeogramV3,
    IdeogramV3ReplaceBackground,
    TopazUpscaleVideo,
    Hyper3dRodin,
    RunwayActTwo,
    RunwayAleph,
    Wan21Vace,
    Kling16,
    FreepikMagnificUpscale,
}

impl ModelType {
    const ALL: [Self; 21] = [
        Self::Replicate,
        Self::Civit,
        Self::FalImported,
        Self::Dalle,
        Self::GptImage1,
        Self::GptImage1Edit,
        Self::GeminiEdit,
        Self::SdImageGeneration,
        Self::SdControlnet,
        Self::SdUpscale,
        Self::BrPsd,
        Self::BrRemoveBackground,
        Self::IdeogramV3,
        Self::IdeogramV3ReplaceBackground,
        Self::TopazUpscaleVideo,
        Self::Hyper3dRodin,
        Self::RunwayActTwo,
        Self::RunwayAleph,
        Self::Wan21Vace,
        Self::Kling16,
        Self::FreepikMagnificUpscale,
    ];

    /// Wire identifier of the type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Replicate => "replicate",
            Self::Civit => "civit",
            Self::FalImported => "fal_imported",
            Self::Dalle => "dalle",
            Self::GptImage1 => "gpt_image_1",
            Self::GptImage1Edit => "gpt_image_1_edit",
            Self::GeminiEdit => "gemini_edit",
            Self::SdImageGeneration => "sd_image_generation",
            Self::SdControlnet => "sd_controlnet",
            Self::SdUpscale => "sd_upscale",
            Self::BrPsd => "br_psd",
            Self::BrRemoveBackground => "br_remove_background",
            Self::IdeogramV3 => "ideogram_v3",
            Self::IdeogramV3ReplaceBackground => "ideogram_v3_replace_background",
            Self::TopazUpscaleVideo => "topaz_upscale_video",
            Self::Hyper3dRodin => "hyper3d_rodin",
            Self::RunwayActTwo => "runway_act_two",
            Self::RunwayAleph => "runway_aleph",
            Self::Wan21Vace => "wan21_vace",
            Self::Kling16 => "kling16",
            Self::FreepikMagnificUpscale => "freepik_magnific_upscale",
        }
    }

    /// True for the three hosting services whose models are user-imported.
    #[must_use]
    pub const fn is_hosted_service(self) -> bool {
        matches!(self, Self::Replicate | Self::Civit | Self::FalImported)
    }
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or(())
    }
}

/// Hosting service of a model as persisted on the node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ModelService {
    Replicate,
    Civit,
    FalImported,
    /// Any other service string, typically a well-known model type.
    Other(String),
}

impl From<String> for ModelService {
    fn from(s: String) -> Self {
        match s.as_str() {
            "replicate" => Self::Replicate,
            "civit" => Self::Civit,
            "fal_imported" => Self::FalImported,
            _ => Self::Other(s),
        }
    }
}

impl From<ModelService> for String {
    fn from(service: ModelService) -> Self {
        match service {
            ModelService::Replicate => "replicate".into(),
            ModelService::Civit => "civit".into(),
            ModelService::FalImported => "fal_imported".into(),
            ModelService::Other(s) => s,
        }
    }
}

/// The model a node is configured to call.
///
/// Fields the orchestrator does not interpret (label, cover, …) are kept in
/// `extra` and forwarded to the backend untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelDescriptor {
    pub name: String,
    pub service: ModelService,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openapi_schema: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ModelDescriptor {
    #[must_use]
    pub fn new(name: impl Into<String>, service: ModelService) -> Self {
        Self {
            name: name.into(),
            service,
            version: None,
            openapi_schema: None,
            extra: Map::new(),
        }
    }

    /// Resolve the model type that selects normalization rules.
    ///
    /// Hosted services win; otherwise a name matching a well-known type is
    /// used; anything else is treated as a Replicate model.
    #[must_use]
    pub fn model_type(&self) -> ModelType {
        match &self.service {
            ModelService::Replicate => ModelType::Replicate,
            ModelService::Civit => ModelType::Civit,
            ModelService::FalImported => ModelType::FalImported,
            ModelService::Other(_) => self.name.parse().unwrap_or(ModelType::Replicate),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hosted_service_takes_precedence_over_name() {
        let model = ModelDescriptor::new("br_psd", ModelService::Civit);
        assert_eq!(model.model_type(), ModelType::Civit);
    }

    #[test]
    fn well_known_name_resolves_type() {
        let model = ModelDescriptor::new("runway_act_two", ModelService::Other("runway".into()));
        assert_eq!(model.model_type(), ModelType::RunwayActTwo);
    }

    #[test]
    fn unknown_model_falls_back_to_replicate() {
        let model = ModelDescriptor::new(
            "black-forest-labs/flux-dev",
            ModelService::Other("bfl".into()),
        );
        assert_eq!(model.model_type(), ModelType::Replicate);
    }

    #[test]
    fn type_identifiers_round_trip() {
        for t in ModelType::ALL {
            assert_eq!(t.as_str().parse::<ModelType>(), Ok(t));
        }
    }

    #[test]
    fn descriptor_keeps_unknown_fields() {
        let model: ModelDescriptor = serde_json::from_str(
            r#"{"name":"ideogram-ai/ideogram-v3-quality","service":"replicate","label":"Ideogram"}"#,
        )
        .unwrap();
        assert_eq!(model.service, ModelService::Replicate);
        assert_eq!(model.extra["label"], "Ideogram");
    }
}
