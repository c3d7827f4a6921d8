// ── Layer descriptors ──

use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Geometry family of a layer. Decides draw order and click priority.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum GeometryKind {
    Point,
    Polygon,
}

impl GeometryKind {
    /// Lower ranks draw first and win click lookups.
    pub fn rank(self) -> u8 {
        match self {
            Self::Polygon => 0,
            Self::Point => 1,
        }
    }
}

/// A tracked layer. Built once from configuration, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerDescriptor {
    /// Short key (`ubs`), unique within a dashboard.
    pub key: String,
    /// `workspace:layer`, as sent to GeoServer.
    pub qualified_name: String,
    pub title: String,
    pub geometry: GeometryKind,
    /// Probe this layer at most this often. `None` follows the session tick.
    pub poll_interval: Option<Duration>,
    /// Treated as available before the first probe completes.
    pub assume_available: bool,
    /// Initial toggle position.
    pub visible_by_default: bool,
    /// WMS style name; empty selects the server default.
    pub style: String,
    pub opacity: f32,
}

impl LayerDescriptor {
    pub fn new(workspace: &str, key: &str, title: &str, geometry: GeometryKind) -> Self {
        Self {
            key: key.to_owned(),
            qualified_name: format!("{workspace}:{key}"),
            title: title.to_owned(),
            geometry,
            poll_interval: None,
            assume_available: false,
            visible_by_default: true,
            style: String::new(),
            opacity: 1.0,
        }
    }

    pub fn assume_available(mut self) -> Self {
        self.assume_available = true;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible_by_default = false;
        self
    }

    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity.clamp(0.0, 1.0);
        self
    }

    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.style = style.into();
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = Some(interval);
        self
    }
}
