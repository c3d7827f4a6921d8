// ── Dashboard facade ──
//
// Wires the probe, layer table, polling session, map binder, feature
// resolver and report assembler together behind one cheaply cloneable
// handle. This is the only type the CLI talks to.

use std::sync::{Arc, Mutex, PoisonError};

use geodash_api::{BoundingBox, OgcClient};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use url::Url;

use crate::binder::{Camera, MapView, RenderPlan, WmsLayerSpec};
use crate::config::DashboardConfig;
use crate::diagnostics::{Diagnostics, DiagnosticsReport};
use crate::error::CoreError;
use crate::model::{
    FeaturePanel, LatLng, LayerState, LayerView, MapClick, ReportArtifact, ReportFormat,
    ReportKind, ReportRecord, Resolution,
};
use crate::probe::{
    CapabilitiesResult, FeatureCountResult, FeatureSampleResult, OgcProbe, Probe, build_client,
};
use crate::report::{ReportAssembler, ReportHistory};
use crate::resolver::FeatureInfoResolver;
use crate::store::{LayerStream, LayerTable};
use crate::tracker::{PollingSession, probe_round};

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<DashboardInner>`. Constructing a dashboard
/// does no I/O; call [`start()`](Self::start) to begin polling or
/// [`refresh_now()`](Self::refresh_now) for a single round.
pub struct Dashboard<P: Probe = OgcProbe> {
    inner: Arc<DashboardInner<P>>,
}

impl<P: Probe> Clone for Dashboard<P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct DashboardInner<P: Probe> {
    config: DashboardConfig,
    client: OgcClient,
    probe: Arc<P>,
    table: Arc<LayerTable>,
    map: Mutex<MapView>,
    resolver: FeatureInfoResolver<P>,
    reports: ReportAssembler,
    history: ReportHistory,
    session: tokio::sync::Mutex<Option<PollingSession>>,
}

impl Dashboard<OgcProbe> {
    /// Dashboard backed by the configured GeoServer.
    pub fn new(config: DashboardConfig) -> Result<Self, CoreError> {
        let probe = OgcProbe::from_config(&config)?;
        Self::with_probe(config, probe)
    }
}

impl<P: Probe> Dashboard<P> {
    /// Dashboard with a caller-supplied probe.
    ///
    /// Raw client calls (diagnostics, GetMap URLs) still target
    /// `config.base_url`.
    pub fn with_probe(config: DashboardConfig, probe: P) -> Result<Self, CoreError> {
        let client = build_client(&config)?;
        let table = Arc::new(LayerTable::new(config.layers.clone())?);
        let probe = Arc::new(probe);

        let resolver =
            FeatureInfoResolver::new(Arc::clone(&probe), Arc::clone(&table), config.request_timeout);
        let map = MapView::new(&config, client.clone());
        let reports = ReportAssembler::new(config.base_url.as_str(), config.workspace.as_str());
        let history = ReportHistory::new(config.history_limit);

        Ok(Self {
            inner: Arc::new(DashboardInner {
                config,
                client,
                probe,
                table,
                map: Mutex::new(map),
                resolver,
                reports,
                history,
                session: tokio::sync::Mutex::new(None),
            }),
        })
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.inner.config
    }

    pub fn client(&self) -> &OgcClient {
        &self.inner.client
    }

    pub fn table(&self) -> &Arc<LayerTable> {
        &self.inner.table
    }

    // ── Polling lifecycle ────────────────────────────────────────────

    /// Start background polling. A no-op while a session is running.
    pub async fn start(&self) {
        let mut session = self.inner.session.lock().await;
        if session.as_ref().is_some_and(PollingSession::is_running) {
            debug!("polling already running");
            return;
        }
        *session = Some(PollingSession::start(
            &self.inner.config,
            Arc::clone(&self.inner.probe),
            Arc::clone(&self.inner.table),
        ));
    }

    /// Stop background polling and wait for the task to exit.
    pub async fn shutdown(&self) {
        let session = self.inner.session.lock().await.take();
        if let Some(session) = session {
            session.shutdown().await;
        }
    }

    pub async fn is_polling(&self) -> bool {
        self.inner
            .session
            .lock()
            .await
            .as_ref()
            .is_some_and(PollingSession::is_running)
    }

    /// Completed rounds of the current session.
    pub async fn tick_count(&self) -> Option<u64> {
        self.inner
            .session
            .lock()
            .await
            .as_ref()
            .map(PollingSession::tick_count)
    }

    /// Probe every layer once. Returns layers updated.
    ///
    /// Runs after any polling round already in flight, never alongside it.
    pub async fn refresh_now(&self) -> usize {
        let inner = &self.inner;
        let updated = probe_round(
            &inner.probe,
            &inner.table,
            inner.table.descriptors(),
            inner.config.request_timeout,
            &CancellationToken::new(),
        )
        .await
        .unwrap_or(0);
        info!(layers = updated, "manual refresh complete");
        updated
    }

    // ── Layer state ──────────────────────────────────────────────────

    pub fn layers(&self) -> Arc<Vec<LayerView>> {
        self.inner.table.snapshot()
    }

    pub fn layer(&self, key: &str) -> Result<LayerView, CoreError> {
        self.inner
            .table
            .get(key)
            .ok_or_else(|| CoreError::LayerNotFound { key: key.into() })
    }

    pub fn subscribe(&self) -> LayerStream {
        self.inner.table.subscribe()
    }

    /// Show or hide a layer. Fails with [`CoreError::LayerUnavailable`]
    /// for layers the last probe could not reach.
    pub fn set_visible(&self, key: &str, visible: bool) -> Result<LayerState, CoreError> {
        self.inner.table.set_visible(key, visible)
    }

    pub fn toggle(&self, key: &str) -> Result<LayerState, CoreError> {
        let current = self.layer(key)?;
        self.set_visible(key, !current.state.visible)
    }

    // ── Map ──────────────────────────────────────────────────────────

    pub fn render_plan(&self) -> RenderPlan {
        self.lock_map().render_plan(&self.layers())
    }

    pub fn camera(&self) -> Camera {
        self.lock_map().camera()
    }

    pub fn pan_to(&self, center: LatLng) {
        self.lock_map().pan_to(center);
    }

    pub fn set_zoom(&self, zoom: u8) {
        self.lock_map().set_zoom(zoom);
    }

    pub fn get_map_url(
        &self,
        spec: &WmsLayerSpec,
        bbox: BoundingBox,
        width: u32,
        height: u32,
    ) -> Result<Url, CoreError> {
        self.lock_map().get_map_url(spec, bbox, width, height)
    }

    // ── Feature info ─────────────────────────────────────────────────

    pub async fn click(&self, click: MapClick) -> Result<Resolution, CoreError> {
        self.inner.resolver.resolve(click).await
    }

    pub fn dismiss_feature_info(&self) {
        self.inner.resolver.dismiss();
    }

    pub fn feature_panel(&self) -> FeaturePanel {
        self.inner.resolver.panel()
    }

    // ── Reports ──────────────────────────────────────────────────────

    /// Render a report of the current table. `format` defaults per kind.
    pub fn generate_report(
        &self,
        kind: ReportKind,
        format: Option<ReportFormat>,
    ) -> Result<ReportArtifact, CoreError> {
        self.inner.reports.generate(
            kind,
            format.unwrap_or(kind.default_format()),
            &self.layers(),
            &self.inner.history,
        )
    }

    pub fn report_history(&self) -> Vec<ReportRecord> {
        self.inner.history.records()
    }

    // ── Direct probes ────────────────────────────────────────────────

    pub async fn diagnose(&self) -> DiagnosticsReport {
        Diagnostics::new(&self.inner.client, self.inner.table.descriptors())
            .run()
            .await
    }

    pub async fn capabilities(&self) -> CapabilitiesResult {
        self.inner.probe.capabilities().await
    }

    pub async fn feature_types(&self) -> CapabilitiesResult {
        self.inner.probe.feature_types().await
    }

    pub async fn feature_count(&self, key: &str) -> Result<FeatureCountResult, CoreError> {
        let view = self.layer(key)?;
        Ok(self.inner.probe.feature_count(&view.descriptor.qualified_name).await)
    }

    pub async fn feature_sample(&self, key: &str) -> Result<FeatureSampleResult, CoreError> {
        let view = self.layer(key)?;
        Ok(self.inner.probe.feature_sample(&view.descriptor.qualified_name).await)
    }

    fn lock_map(&self) -> std::sync::MutexGuard<'_, MapView> {
        self.inner.map.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
