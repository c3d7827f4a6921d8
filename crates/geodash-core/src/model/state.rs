// ── Per-layer runtime state ──

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::Display;

use super::layer::LayerDescriptor;

/// Availability state machine: `Unknown -> Checking -> {Available,
/// Unavailable}`, back to `Checking` on every probe. No terminal state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LayerStatus {
    #[default]
    Unknown,
    Checking,
    Available,
    Unavailable,
}

/// What the dashboard currently knows about one layer.
///
/// `available`, `feature_count`, `last_checked_at` and `status` are written
/// by the tracker as a unit; `visible` only by the user toggle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerState {
    pub available: bool,
    /// Meaningful only while `available`.
    pub feature_count: u64,
    pub visible: bool,
    pub last_checked_at: Option<DateTime<Utc>>,
    pub status: LayerStatus,
    /// Why the last probe failed, for display.
    pub last_error: Option<String>,
}

impl LayerState {
    pub fn initial(descriptor: &LayerDescriptor) -> Self {
        Self {
            available: descriptor.assume_available,
            feature_count: 0,
            visible: descriptor.visible_by_default,
            last_checked_at: None,
            status: LayerStatus::Unknown,
            last_error: None,
        }
    }

    /// Tiles are drawn only for layers that are both on and reachable.
    pub fn is_rendered(&self) -> bool {
        self.available && self.visible
    }

    /// Toggle controls are enabled only for available layers.
    pub fn can_toggle(&self) -> bool {
        self.available
    }
}

/// Descriptor plus state, as published in table snapshots.
#[derive(Debug, Clone, Serialize)]
pub struct LayerView {
    pub descriptor: Arc<LayerDescriptor>,
    pub state: LayerState,
}

impl LayerView {
    pub fn key(&self) -> &str {
        &self.descriptor.key
    }
}
