// ── Dashboard domain model ──
//
// Static layer descriptors, the per-layer state the tracker maintains,
// click-to-query results and report records. Consumers (CLI, tests)
// depend on these rather than on the raw OGC payloads.

pub mod feature_info;
pub mod layer;
pub mod report;
pub mod state;

// ── Re-exports ──────────────────────────────────────────────────────

pub use feature_info::{
    AttributeValue, FeatureInfoResult, FeaturePanel, LatLng, MapClick, Resolution, Viewport,
};
pub use layer::{GeometryKind, LayerDescriptor};
pub use report::{
    ReportArtifact, ReportFormat, ReportKind, ReportLayerRow, ReportRecord, ReportSnapshot,
};
pub use state::{LayerState, LayerStatus, LayerView};
