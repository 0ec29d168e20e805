//! Node parameter values.
//!
//! Every value that flows through a node port is exactly one
//! [`ParameterValue`] variant. Consumers match on the variant and never
//! guess the shape of a value from its fields.
//!
//! On the wire a value is a JSON object carrying a `type` discriminator.
//! Assets put their media kind in that discriminator
//! (`{"type": "image", "url": "..."}`); every other kind wraps its payload in
//! `value` (`{"type": "integer", "value": 3}`).

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Media kind of an uploaded or generated asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetKind {
    #[serde(rename = "image")]
    Image,
    #[serde(rename = "video")]
    Video,
    #[serde(rename = "audio")]
    Audio,
    #[serde(rename = "3D")]
    Model3d,
}

impl AssetKind {
    /// Wire name of the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Model3d => "3D",
        }
    }
}

/// A file resolved by the asset service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub url: String,
    #[serde(skip)]
    pub kind: Option<AssetKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    /// Identifier assigned when the image was registered for segmentation models.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visual_id: Option<String>,
}

impl Asset {
    #[must_use]
    pub fn new(kind: AssetKind, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            kind: Some(kind),
            width: None,
            height: None,
            visual_id: None,
        }
    }

    #[must_use]
    pub fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    #[must_use]
    pub fn with_visual_id(mut self, visual_id: impl Into<String>) -> Self {
        self.visual_id = Some(visual_id.into());
        self
    }

    /// Both dimensions, when known.
    #[must_use]
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        match (self.width, self.height) {
            (Some(w), Some(h)) if w > 0 && h > 0 => Some((w, h)),
            _ => None,
        }
    }

    #[must_use]
    pub fn kind(&self) -> AssetKind {
        self.kind.unwrap_or(AssetKind::Image)
    }
}

/// Seed parameter: a fixed value or a request for a random one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Seed {
    pub is_random: bool,
    pub seed: i64,
}

/// A value held by a node input or output port.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "WireValue", into = "WireValue")]
pub enum ParameterValue {
    Integer(i64),
    Float(f64),
    String(String),
    Boolean(bool),
    Seed(Seed),
    Asset(Asset),
    Array(Vec<ParameterValue>),
}

impl ParameterValue {
    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        Self::String(value.into())
    }

    /// The asset behind this value, if it is one.
    #[must_use]
    pub fn as_asset(&self) -> Option<&Asset> {
        match self {
            Self::Asset(asset) => Some(asset),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric view of integer and float values.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(n) => Some(*n as f64),
            Self::Float(n) => Some(*n),
            _ => None,
        }
    }

    /// Reduce the value to the scalar the backend expects.
    ///
    /// Assets become their URL, text and numbers become their raw value,
    /// arrays are reduced element-wise with falsy elements filtered out.
    /// Returns `None` when nothing is left to send.
    #[must_use]
    pub fn to_request_value(&self) -> Option<Value> {
        match self {
            Self::Integer(n) => Some(Value::from(*n)),
            Self::Float(n) => serde_json::Number::from_f64(*n).map(Value::Number),
            Self::String(s) if s.is_empty() => None,
            Self::String(s) => Some(Value::String(s.clone())),
            Self::Boolean(b) => Some(Value::Bool(*b)),
            Self::Seed(seed) => serde_json::to_value(seed).ok(),
            Self::Asset(asset) if asset.url.is_empty() => None,
            Self::Asset(asset) => Some(Value::String(asset.url.clone())),
            Self::Array(items) => {
                let values: Vec<Value> = items
                    .iter()
                    .filter_map(Self::to_request_value)
                    .filter(is_truthy)
                    .collect();
                (!values.is_empty()).then_some(Value::Array(values))
            }
        }
    }
}

impl From<Asset> for ParameterValue {
    fn from(asset: Asset) -> Self {
        Self::Asset(asset)
    }
}

/// JavaScript-style truthiness, used when filtering array elements.
#[must_use]
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[derive(Serialize, Deserialize)]
#[serde(tag = "type")]
enum WireValue {
    #[serde(rename = "integer")]
    Integer { value: i64 },
    #[serde(rename = "float", alias = "number")]
    Float { value: f64 },
    #[serde(rename = "string", alias = "text")]
    String { value: String },
    #[serde(rename = "boolean")]
    Boolean { value: bool },
    #[serde(rename = "seed")]
    Seed { value: Seed },
    #[serde(rename = "array")]
    Array { value: Vec<ParameterValue> },
    #[serde(rename = "image")]
    Image(Asset),
    #[serde(rename = "video")]
    Video(Asset),
    #[serde(rename = "audio")]
    Audio(Asset),
    #[serde(rename = "3D")]
    Model3d(Asset),
}

impl From<WireValue> for ParameterValue {
    fn from(wire: WireValue) -> Self {
        let asset = |kind: AssetKind, mut asset: Asset| {
            asset.kind = Some(kind);
            Self::Asset(asset)
        };
        match wire {
            WireValue::Integer { value } => Self::Integer(value),
            WireValue::Float { value } => Self::Float(value),
            WireValue::String { value } => Self::String(value),
            WireValue::Boolean { value } => Self::Boolean(value),
            WireValue::Seed { value } => Self::Seed(value),
            WireValue::Array { value } => Self::Array(value),
            WireValue::Image(a) => asset(AssetKind::Image, a),
            WireValue::Video(a) => asset(AssetKind::Video, a),
            WireValue::Audio(a) => asset(AssetKind::Audio, a),
            WireValue::Model3d(a) => asset(AssetKind::Model3d, a),
        }
    }
}

impl From<ParameterValue> for WireValue {
    fn from(value: ParameterValue) -> Self {
        match value {
            ParameterValue::Integer(value) => Self::Integer { value },
            ParameterValue::Float(value) => Self::Float { value },
            ParameterValue::String(value) => Self::String { value },
            ParameterValue::Boolean(value) => Self::Boolean { value },
            ParameterValue::Seed(value) => Self::Seed { value },
            ParameterValue::Array(value) => Self::Array { value },
            ParameterValue::Asset(asset) => match asset.kind() {
                AssetKind::Image => Self::Image(asset),
                AssetKind::Video => Self::Video(asset),
                AssetKind::Audio => Self::Audio(asset),
                AssetKind::Model3d => Self::Model3d(asset),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn asset_kind_comes_from_type_tag() {
        let value: ParameterValue = serde_json::from_value(json!({
            "type": "video",
            "url": "https://cdn.example/clip.mp4",
            "width": 1920,
            "height": 1080
        }))
        .unwrap();

        let asset = value.as_asset().unwrap();
        assert_eq!(asset.kind(), AssetKind::Video);
        assert_eq!(asset.dimensions(), Some((1920, 1080)));
    }

    #[test]
    fn text_and_number_aliases_are_accepted() {
        let text: ParameterValue =
            serde_json::from_value(json!({"type": "text", "value": "a cat"})).unwrap();
        let number: ParameterValue =
            serde_json::from_value(json!({"type": "number", "value": 0.5})).unwrap();

        assert_eq!(text, ParameterValue::text("a cat"));
        assert_eq!(number, ParameterValue::Float(0.5));
    }

    #[test]
    fn serializes_asset_with_kind_tag() {
        let value = ParameterValue::from(Asset::new(AssetKind::Model3d, "https://x/y.glb"));
        let json = serde_json::to_value(&value).unwrap();
        assert_eq!(json, json!({"type": "3D", "url": "https://x/y.glb"}));
    }

    #[test]
    fn request_value_extracts_scalars() {
        let asset = ParameterValue::from(Asset::new(AssetKind::Image, "https://x/a.png"));
        assert_eq!(asset.to_request_value(), Some(json!("https://x/a.png")));
        assert_eq!(ParameterValue::Integer(4).to_request_value(), Some(json!(4)));
        assert_eq!(ParameterValue::text("").to_request_value(), None);

        let seed = ParameterValue::Seed(Seed {
            is_random: false,
            seed: 9,
        });
        assert_eq!(
            seed.to_request_value(),
            Some(json!({"isRandom": false, "seed": 9}))
        );
    }

    #[test]
    fn request_value_drops_falsy_array_elements() {
        let array = ParameterValue::Array(vec![
            ParameterValue::text(""),
            ParameterValue::text("lora-a"),
            ParameterValue::Integer(0),
        ]);
        assert_eq!(array.to_request_value(), Some(json!(["lora-a"])));

        let empty = ParameterValue::Array(vec![ParameterValue::text("")]);
        assert_eq!(empty.to_request_value(), None);
    }
}
