// ── Runtime dashboard configuration ──
//
// These types describe *where* the GeoServer lives, *what* layers to
// track and *how often*. They never touch disk: the CLI builds a
// `DashboardConfig` from its profile and hands it in.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use url::Url;

use crate::model::{GeometryKind, LayerDescriptor};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/geoserver";
pub const DEFAULT_WORKSPACE: &str = "sp_dashboard";
pub const DEFAULT_BASE_MAP_URL: &str = "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png";

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict). GeoServer is usually plain HTTP on a LAN.
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification (self-signed certs).
    DangerAcceptInvalid,
}

/// How a layer's feature count is obtained.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum CountMode {
    /// `totalFeatures` from a one-feature JSON request, falling back to hits.
    #[default]
    Auto,
    /// JSON `totalFeatures` only.
    TotalFeatures,
    /// `resultType=hits` and the `numberOfFeatures` attribute only.
    Hits,
}

/// Configuration for one dashboard against one GeoServer workspace.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// GeoServer root (e.g. `http://localhost:8080/geoserver`).
    pub base_url: Url,
    /// Workspace every layer lives in.
    pub workspace: String,
    /// Tick interval of the availability poll.
    pub poll_interval: Duration,
    /// Tick interval used by report dashboards.
    pub report_poll_interval: Duration,
    /// Per-request timeout, enforced by the HTTP client and by the tracker.
    pub request_timeout: Duration,
    pub count_mode: CountMode,
    /// Report summaries kept in history.
    pub history_limit: usize,
    pub tls: TlsVerification,
    /// Base map tile URL template (`{s}`, `{z}`, `{x}`, `{y}`).
    pub base_map_url: String,
    pub map: MapDefaults,
    /// Tracked layers, in display order.
    pub layers: Vec<LayerDescriptor>,
}

/// Initial camera.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapDefaults {
    pub center_lat: f64,
    pub center_lng: f64,
    pub zoom: u8,
}

impl Default for MapDefaults {
    fn default() -> Self {
        Self {
            center_lat: -23.5505,
            center_lng: -46.6333,
            zoom: 8,
        }
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base URL is valid"),
            workspace: DEFAULT_WORKSPACE.into(),
            poll_interval: Duration::from_secs(30),
            report_poll_interval: Duration::from_secs(300),
            request_timeout: Duration::from_secs(10),
            count_mode: CountMode::Auto,
            history_limit: 10,
            tls: TlsVerification::default(),
            base_map_url: DEFAULT_BASE_MAP_URL.into(),
            map: MapDefaults::default(),
            layers: default_layers(DEFAULT_WORKSPACE),
        }
    }
}

impl DashboardConfig {
    /// Same server and layers, polled at the report cadence.
    pub fn for_reports(&self) -> Self {
        Self {
            poll_interval: self.report_poll_interval,
            ..self.clone()
        }
    }
}

/// The municipal catalog: municipalities (known-good), health units, schools.
pub fn default_layers(workspace: &str) -> Vec<LayerDescriptor> {
    vec![
        LayerDescriptor::new(workspace, "municipios_sp", "Municípios de SP", GeometryKind::Polygon)
            .assume_available()
            .with_opacity(0.7),
        LayerDescriptor::new(workspace, "ubs", "Unidades Básicas de Saúde", GeometryKind::Point),
        LayerDescriptor::new(workspace, "escolas", "Escolas", GeometryKind::Point),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_municipal_deployment() {
        let cfg = DashboardConfig::default();
        assert_eq!(cfg.base_url.as_str(), "http://localhost:8080/geoserver");
        assert_eq!(cfg.workspace, "sp_dashboard");
        assert_eq!(cfg.poll_interval, Duration::from_secs(30));
        assert_eq!(cfg.request_timeout, Duration::from_secs(10));
        assert_eq!(cfg.for_reports().poll_interval, Duration::from_secs(300));

        let keys: Vec<_> = cfg.layers.iter().map(|l| l.key.as_str()).collect();
        assert_eq!(keys, ["municipios_sp", "ubs", "escolas"]);
        assert!(cfg.layers[0].assume_available);
        assert_eq!(cfg.layers[1].qualified_name, "sp_dashboard:ubs");
    }

    #[test]
    fn count_mode_parses_kebab_case() {
        assert_eq!("total-features".parse::<CountMode>().ok(), Some(CountMode::TotalFeatures));
        assert_eq!(CountMode::Hits.to_string(), "hits");
    }
}
