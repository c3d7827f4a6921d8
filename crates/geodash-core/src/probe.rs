// ── Capability / feature probe ──
//
// One boundary between the dashboard and GeoServer. Every probe method
// resolves to a result struct with an `ok` flag: transport failures,
// non-2xx answers, timeouts and bodies without the expected marker all
// become `ok: false` with an empty payload. Callers never see `Err`.

use std::future::Future;

use geodash_api::transport::{TlsMode, TransportConfig};
use geodash_api::{Feature, FeatureInfoQuery, OgcClient};
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::{CountMode, DashboardConfig, TlsVerification};
use crate::error::CoreError;

// ── Results ──────────────────────────────────────────────────────────

/// Layer (or feature type) names advertised by the server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CapabilitiesResult {
    pub ok: bool,
    pub layer_names: Vec<String>,
    pub error: Option<String>,
}

impl CapabilitiesResult {
    pub fn failed(error: impl ToString) -> Self {
        Self {
            ok: false,
            layer_names: Vec::new(),
            error: Some(error.to_string()),
        }
    }
}

/// Feature count of one layer. `count` is zero whenever `ok` is false.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FeatureCountResult {
    pub ok: bool,
    pub count: u64,
    pub error: Option<String>,
}

impl FeatureCountResult {
    pub fn counted(count: u64) -> Self {
        Self {
            ok: true,
            count,
            error: None,
        }
    }

    pub fn failed(error: impl ToString) -> Self {
        Self {
            ok: false,
            count: 0,
            error: Some(error.to_string()),
        }
    }
}

/// A small feature sample, with the server-side total when known.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FeatureSampleResult {
    pub ok: bool,
    pub features: Vec<Feature>,
    pub total: Option<u64>,
    pub error: Option<String>,
}

impl FeatureSampleResult {
    pub fn failed(error: impl ToString) -> Self {
        Self {
            ok: false,
            error: Some(error.to_string()),
            ..Self::default()
        }
    }
}

/// Features under a pixel. `ok` with no features is a valid empty answer.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FeatureInfoResponse {
    pub ok: bool,
    pub features: Vec<Feature>,
    pub error: Option<String>,
}

impl FeatureInfoResponse {
    pub fn found(features: Vec<Feature>) -> Self {
        Self {
            ok: true,
            features,
            error: None,
        }
    }

    pub fn failed(error: impl ToString) -> Self {
        Self {
            ok: false,
            features: Vec::new(),
            error: Some(error.to_string()),
        }
    }
}

// ── Probe trait ──────────────────────────────────────────────────────

/// Read-only questions the dashboard asks GeoServer.
///
/// Layer arguments are qualified names (`workspace:layer`). Implementations
/// make a single attempt per call and must not retry.
pub trait Probe: Send + Sync + 'static {
    /// WMS GetCapabilities: named layers.
    fn capabilities(&self) -> impl Future<Output = CapabilitiesResult> + Send;

    /// WFS GetCapabilities: feature type names.
    fn feature_types(&self) -> impl Future<Output = CapabilitiesResult> + Send;

    fn feature_count(&self, layer: &str) -> impl Future<Output = FeatureCountResult> + Send;

    /// Sequential requests one `feature_count` call may make. Callers
    /// budget one request timeout per attempt.
    fn count_attempts(&self) -> u32 {
        1
    }

    /// Up to one feature, plus the total if the server reports it.
    fn feature_sample(&self, layer: &str) -> impl Future<Output = FeatureSampleResult> + Send;

    fn feature_info(
        &self,
        layer: &str,
        query: FeatureInfoQuery,
    ) -> impl Future<Output = FeatureInfoResponse> + Send;
}

// ── GeoServer implementation ─────────────────────────────────────────

/// [`Probe`] backed by a live [`OgcClient`].
#[derive(Debug, Clone)]
pub struct OgcProbe {
    client: OgcClient,
    count_mode: CountMode,
}

impl OgcProbe {
    pub fn new(client: OgcClient, count_mode: CountMode) -> Self {
        Self { client, count_mode }
    }

    /// Build the HTTP client from dashboard configuration.
    pub fn from_config(config: &DashboardConfig) -> Result<Self, CoreError> {
        Ok(Self::new(build_client(config)?, config.count_mode))
    }

    pub fn client(&self) -> &OgcClient {
        &self.client
    }

    pub fn count_mode(&self) -> CountMode {
        self.count_mode
    }

    async fn count_by_hits(&self, layer: &str) -> FeatureCountResult {
        match self.client.hits(layer).await {
            Ok(count) => FeatureCountResult::counted(count),
            Err(e) => {
                warn!(layer, error = %e, "hits count failed");
                FeatureCountResult::failed(e)
            }
        }
    }

    async fn count_by_total(&self, layer: &str) -> FeatureCountResult {
        match self.client.get_features(layer, 1).await {
            Ok(fc) => match fc.total() {
                Some(count) => FeatureCountResult::counted(count),
                None => FeatureCountResult::failed("response carried no numeric totalFeatures"),
            },
            Err(e) => FeatureCountResult::failed(e),
        }
    }
}

impl Probe for OgcProbe {
    async fn capabilities(&self) -> CapabilitiesResult {
        match self.client.wms_capabilities().await {
            Ok(layer_names) => CapabilitiesResult {
                ok: true,
                layer_names,
                error: None,
            },
            Err(e) => {
                warn!(error = %e, "WMS capabilities probe failed");
                CapabilitiesResult::failed(e)
            }
        }
    }

    async fn feature_types(&self) -> CapabilitiesResult {
        match self.client.wfs_capabilities().await {
            Ok(layer_names) => CapabilitiesResult {
                ok: true,
                layer_names,
                error: None,
            },
            Err(e) => {
                warn!(error = %e, "WFS capabilities probe failed");
                CapabilitiesResult::failed(e)
            }
        }
    }

    async fn feature_count(&self, layer: &str) -> FeatureCountResult {
        match self.count_mode {
            CountMode::Hits => self.count_by_hits(layer).await,
            CountMode::TotalFeatures => {
                let result = self.count_by_total(layer).await;
                if !result.ok {
                    warn!(layer, error = ?result.error, "totalFeatures count failed");
                }
                result
            }
            CountMode::Auto => {
                let result = self.count_by_total(layer).await;
                if result.ok {
                    return result;
                }
                debug!(layer, error = ?result.error, "totalFeatures unavailable, falling back to hits");
                self.count_by_hits(layer).await
            }
        }
    }

    fn count_attempts(&self) -> u32 {
        match self.count_mode {
            CountMode::Auto => 2,
            CountMode::Hits | CountMode::TotalFeatures => 1,
        }
    }

    async fn feature_sample(&self, layer: &str) -> FeatureSampleResult {
        match self.client.get_features(layer, 1).await {
            Ok(fc) => FeatureSampleResult {
                ok: true,
                total: fc.total(),
                features: fc.features,
                error: None,
            },
            Err(e) => {
                warn!(layer, error = %e, "feature sample failed");
                FeatureSampleResult::failed(e)
            }
        }
    }

    async fn feature_info(&self, layer: &str, query: FeatureInfoQuery) -> FeatureInfoResponse {
        match self.client.feature_info(layer, &query).await {
            Ok(fc) => FeatureInfoResponse::found(fc.features),
            Err(e) => {
                warn!(layer, error = %e, "feature info failed");
                FeatureInfoResponse::failed(e)
            }
        }
    }
}

// ── Transport wiring ─────────────────────────────────────────────────

/// Build an [`OgcClient`] for the configured server and workspace.
pub fn build_client(config: &DashboardConfig) -> Result<OgcClient, CoreError> {
    let transport = TransportConfig {
        tls: tls_to_transport(&config.tls),
        timeout: config.request_timeout,
    };
    Ok(OgcClient::new(
        config.base_url.clone(),
        config.workspace.clone(),
        &transport,
    )?)
}

fn tls_to_transport(tls: &TlsVerification) -> TlsMode {
    match tls {
        TlsVerification::SystemDefaults => TlsMode::System,
        TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
        TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
    }
}
