// geodash-api: Async Rust client for OGC WMS/WFS endpoints (GeoServer)

pub mod capabilities;
pub mod client;
pub mod error;
pub mod models;
pub mod transport;
pub mod wfs;
pub mod wms;

pub use client::OgcClient;
pub use error::{Error, FailureKind};
pub use models::{BoundingBox, Feature, FeatureCollection, FeatureInfoQuery, GetMapRequest};
pub use transport::{TlsMode, TransportConfig};
