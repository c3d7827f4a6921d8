// geodash-core: Layer availability polling, map binding, click-to-query and
// reports on top of geodash-api.

pub mod binder;
pub mod config;
pub mod dashboard;
pub mod diagnostics;
pub mod error;
pub mod model;
pub mod probe;
pub mod report;
pub mod resolver;
pub mod store;
pub mod tracker;

// ── Primary re-exports ──────────────────────────────────────────────
pub use binder::{Camera, MapView, RenderPlan, TileLayerSpec, WmsLayerSpec};
pub use config::{CountMode, DashboardConfig, MapDefaults, TlsVerification, default_layers};
pub use dashboard::Dashboard;
pub use diagnostics::{DiagnosticCheck, DiagnosticsReport};
pub use error::CoreError;
pub use probe::{
    CapabilitiesResult, FeatureCountResult, FeatureInfoResponse, FeatureSampleResult, OgcProbe,
    Probe,
};
pub use report::{ReportAssembler, ReportHistory};
pub use resolver::FeatureInfoResolver;
pub use store::{LayerStream, LayerTable};
pub use tracker::PollingSession;

// Re-export model types at the crate root for ergonomics.
pub use model::{
    AttributeValue, FeatureInfoResult, FeaturePanel, GeometryKind, LatLng, LayerDescriptor,
    LayerState, LayerStatus, LayerView, MapClick, ReportArtifact, ReportFormat, ReportKind,
    ReportRecord, ReportSnapshot, Resolution, Viewport,
};

// API types that appear in this crate's signatures.
pub use geodash_api::{BoundingBox, Feature, FeatureInfoQuery};
