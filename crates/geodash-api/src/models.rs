// OGC request/response types
//
// GeoJSON shapes returned by GeoServer for `outputFormat=application/json`
// and `info_format=application/json`, plus the request parameter structs
// for GetMap and GetFeatureInfo.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ── Bounding box ─────────────────────────────────────────────────────

/// Axis-aligned extent in EPSG:4326 (`minx,miny,maxx,maxy` = lon/lat order
/// for WMS 1.1.0).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Non-degenerate and finite.
    pub fn is_valid(&self) -> bool {
        [self.min_x, self.min_y, self.max_x, self.max_y]
            .iter()
            .all(|v| v.is_finite())
            && self.max_x > self.min_x
            && self.max_y > self.min_y
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        (self.min_x..=self.max_x).contains(&x) && (self.min_y..=self.max_y).contains(&y)
    }

    /// Render as the WMS `bbox` parameter.
    pub fn to_param(&self) -> String {
        format!("{},{},{},{}", self.min_x, self.min_y, self.max_x, self.max_y)
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_param())
    }
}

impl FromStr for BoundingBox {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<f64> = s
            .split(',')
            .map(|p| p.trim().parse::<f64>())
            .collect::<Result<_, _>>()
            .map_err(|e| format!("invalid bbox '{s}': {e}"))?;

        let [min_x, min_y, max_x, max_y] = parts[..] else {
            return Err(format!(
                "invalid bbox '{s}': expected 4 comma-separated numbers, got {}",
                parts.len()
            ));
        };

        let bbox = Self::new(min_x, min_y, max_x, max_y);
        if !bbox.is_valid() {
            return Err(format!("invalid bbox '{s}': max must exceed min"));
        }
        Ok(bbox)
    }
}

// ── Request parameters ───────────────────────────────────────────────

/// Parameters of a WMS `GetMap` call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GetMapRequest {
    /// Qualified layer names, drawn in order.
    pub layers: Vec<String>,
    /// Style per layer; empty string selects the server default.
    pub styles: Vec<String>,
    pub bbox: BoundingBox,
    pub width: u32,
    pub height: u32,
    pub transparent: bool,
}

/// Parameters of a WMS `GetFeatureInfo` call.
///
/// `x`/`y` are the click position in pixels relative to the
/// `width`×`height` viewport described by `bbox`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeatureInfoQuery {
    pub bbox: BoundingBox,
    pub width: u32,
    pub height: u32,
    pub x: u32,
    pub y: u32,
    pub feature_count: u32,
}

// ── GeoJSON responses ────────────────────────────────────────────────

/// A GeoJSON `FeatureCollection` as emitted by GeoServer.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureCollection {
    #[serde(default)]
    pub features: Vec<Feature>,

    /// Total matching features. GeoServer emits a number, or the string
    /// `"unknown"` when counting is disabled.
    #[serde(default)]
    pub total_features: Option<Value>,

    /// WFS 2.0 equivalent of `totalFeatures`.
    #[serde(default)]
    pub number_matched: Option<Value>,
}

impl FeatureCollection {
    /// Server-side total, if the response carried a numeric one.
    pub fn total(&self) -> Option<u64> {
        self.total_features
            .as_ref()
            .and_then(Value::as_u64)
            .or_else(|| self.number_matched.as_ref().and_then(Value::as_u64))
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

/// A single GeoJSON feature. Geometry is kept opaque; only its type is
/// ever inspected.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Feature {
    #[serde(default)]
    pub id: Option<String>,

    #[serde(default)]
    pub geometry: Option<Value>,

    #[serde(default)]
    pub properties: Map<String, Value>,
}

impl Feature {
    /// GeoJSON geometry type (`"Point"`, `"MultiPolygon"`, ...).
    pub fn geometry_type(&self) -> Option<&str> {
        self.geometry.as_ref()?.get("type")?.as_str()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn bbox_parses_and_renders() {
        let bbox: BoundingBox = "-48,-24,-45,-21".parse().unwrap();
        assert_eq!(bbox, BoundingBox::new(-48.0, -24.0, -45.0, -21.0));
        assert_eq!(bbox.to_param(), "-48,-24,-45,-21");
        assert!(bbox.contains(-46.6, -23.5));
    }

    #[test]
    fn bbox_rejects_degenerate_and_short_input() {
        assert!("1,2,3".parse::<BoundingBox>().is_err());
        assert!("-45,-24,-48,-21".parse::<BoundingBox>().is_err());
        assert!("a,b,c,d".parse::<BoundingBox>().is_err());
    }

    #[test]
    fn total_features_handles_unknown() {
        let numeric: FeatureCollection =
            serde_json::from_value(json!({ "type": "FeatureCollection", "totalFeatures": 645, "features": [] }))
                .unwrap();
        assert_eq!(numeric.total(), Some(645));

        let unknown: FeatureCollection =
            serde_json::from_value(json!({ "totalFeatures": "unknown", "features": [] })).unwrap();
        assert_eq!(unknown.total(), None);

        let wfs2: FeatureCollection =
            serde_json::from_value(json!({ "numberMatched": 12, "features": [] })).unwrap();
        assert_eq!(wfs2.total(), Some(12));
    }

    #[test]
    fn feature_geometry_type() {
        let feature: Feature = serde_json::from_value(json!({
            "type": "Feature",
            "id": "ubs.1",
            "geometry": { "type": "Point", "coordinates": [-46.6, -23.5] },
            "properties": { "nome": "UBS Sé" }
        }))
        .unwrap();
        assert_eq!(feature.geometry_type(), Some("Point"));
        assert_eq!(feature.properties["nome"], "UBS Sé");
    }
}
