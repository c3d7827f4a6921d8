// ── Click-to-query types ──

use std::collections::BTreeMap;
use std::fmt;

use geodash_api::{BoundingBox, Feature};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A geographic position in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

/// The visible map: its geographic extent and pixel size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub bbox: BoundingBox,
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn is_valid(&self) -> bool {
        self.bbox.is_valid() && self.width > 0 && self.height > 0
    }
}

/// A click on the map.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapClick {
    pub at: LatLng,
    pub viewport: Viewport,
}

/// A scalar attribute value. Nested GeoJSON values are flattened to text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
}

impl From<Value> for AttributeValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => Self::Number(n),
            Value::String(s) => Self::Text(s),
            nested @ (Value::Array(_) | Value::Object(_)) => Self::Text(nested.to_string()),
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("-"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Attributes of the feature under a click.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureInfoResult {
    pub source_layer_key: String,
    pub feature_id: Option<String>,
    pub attributes: BTreeMap<String, AttributeValue>,
    /// GeoJSON geometry type, when the server sent one.
    pub geometry_hint: Option<String>,
}

impl FeatureInfoResult {
    pub fn from_feature(source_layer_key: &str, feature: Feature) -> Self {
        let geometry_hint = feature.geometry_type().map(str::to_owned);
        Self {
            source_layer_key: source_layer_key.to_owned(),
            feature_id: feature.id,
            attributes: feature
                .properties
                .into_iter()
                .map(|(k, v)| (k, AttributeValue::from(v)))
                .collect(),
            geometry_hint,
        }
    }
}

/// Outcome of resolving one click.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Resolution {
    Found(FeatureInfoResult),
    /// Every queried layer answered, none had a feature here.
    NothingFound,
    /// Every queried layer failed at the network or protocol level.
    Failed { reason: String },
}

/// What the info panel shows: a marker at the last click and its answer.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FeaturePanel {
    pub marker: Option<LatLng>,
    pub resolution: Option<Resolution>,
}
