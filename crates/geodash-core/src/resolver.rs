// ── Feature info resolver ──
//
// Maps a click to the attributes of the feature under it. Every eligible
// layer is queried concurrently; the answer is chosen by layer priority
// (polygons before points, then catalog order), never by arrival order.
// A newer click cancels an older one still in flight.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use futures_util::future::join_all;
use geodash_api::FeatureInfoQuery;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::CoreError;
use crate::model::{
    FeatureInfoResult, FeaturePanel, GeometryKind, LatLng, LayerDescriptor, MapClick, Resolution,
    Viewport,
};
use crate::probe::{FeatureInfoResponse, Probe};
use crate::store::LayerTable;

pub struct FeatureInfoResolver<P> {
    probe: Arc<P>,
    table: Arc<LayerTable>,
    request_timeout: Duration,
    panel: watch::Sender<FeaturePanel>,
    in_flight: Mutex<CancellationToken>,
}

impl<P: Probe> FeatureInfoResolver<P> {
    pub fn new(probe: Arc<P>, table: Arc<LayerTable>, request_timeout: Duration) -> Self {
        let (panel, _) = watch::channel(FeaturePanel::default());
        Self {
            probe,
            table,
            request_timeout,
            panel,
            in_flight: Mutex::new(CancellationToken::new()),
        }
    }

    /// Resolve a click.
    ///
    /// The panel marker moves to the click immediately; the resolution is
    /// published once every eligible layer has answered. Fails with
    /// [`CoreError::Superseded`] if another click arrives first.
    pub async fn resolve(&self, click: MapClick) -> Result<Resolution, CoreError> {
        let (x, y) = pixel_at(&click)?;
        let token = self.begin(click.at);

        let eligible = self.eligible_layers();
        if eligible.is_empty() {
            return self.finish(&token, Resolution::NothingFound);
        }

        let query = FeatureInfoQuery {
            bbox: click.viewport.bbox,
            width: click.viewport.width,
            height: click.viewport.height,
            x,
            y,
            feature_count: 1,
        };
        debug!(x, y, layers = eligible.len(), "resolving feature info");

        let lookups = eligible.iter().cloned().map(|d| {
            let probe = Arc::clone(&self.probe);
            let timeout = self.request_timeout;
            async move {
                match tokio::time::timeout(timeout, probe.feature_info(&d.qualified_name, query)).await {
                    Ok(response) => (d, response),
                    Err(_) => (d, FeatureInfoResponse::failed("timed out")),
                }
            }
        });

        let responses = tokio::select! {
            biased;
            () = token.cancelled() => return Err(CoreError::Superseded),
            responses = join_all(lookups) => responses,
        };

        self.finish(&token, pick(responses))
    }

    /// Clear marker and result, abandoning any lookup in flight.
    pub fn dismiss(&self) {
        let current = self.lock_in_flight();
        current.cancel();
        self.panel.send_replace(FeaturePanel::default());
    }

    pub fn panel(&self) -> FeaturePanel {
        self.panel.borrow().clone()
    }

    pub fn subscribe_panel(&self) -> watch::Receiver<FeaturePanel> {
        self.panel.subscribe()
    }

    /// Visible polygons, plus visible points that are available, in
    /// priority order.
    fn eligible_layers(&self) -> Vec<Arc<LayerDescriptor>> {
        let snapshot = self.table.snapshot();
        let mut eligible: Vec<_> = snapshot
            .iter()
            .filter(|v| {
                v.state.visible
                    && (v.descriptor.geometry == GeometryKind::Polygon || v.state.available)
            })
            .map(|v| Arc::clone(&v.descriptor))
            .collect();
        eligible.sort_by_key(|d| d.geometry.rank());
        eligible
    }

    /// Cancel the previous lookup, register a new one and move the marker.
    ///
    /// Panel writes happen under the in-flight lock, so a superseded
    /// lookup can never publish into a newer click's panel.
    fn begin(&self, marker: LatLng) -> CancellationToken {
        let mut current = self.lock_in_flight();
        current.cancel();
        *current = CancellationToken::new();
        self.panel.send_replace(FeaturePanel {
            marker: Some(marker),
            resolution: None,
        });
        current.clone()
    }

    fn finish(&self, token: &CancellationToken, resolution: Resolution) -> Result<Resolution, CoreError> {
        let _current = self.lock_in_flight();
        if token.is_cancelled() {
            return Err(CoreError::Superseded);
        }
        self.panel.send_modify(|panel| panel.resolution = Some(resolution.clone()));
        Ok(resolution)
    }

    fn lock_in_flight(&self) -> std::sync::MutexGuard<'_, CancellationToken> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// First layer, in priority order, that returned at least one feature.
fn pick(responses: Vec<(Arc<LayerDescriptor>, FeatureInfoResponse)>) -> Resolution {
    let all_failed = responses.iter().all(|(_, r)| !r.ok);
    let mut errors = Vec::new();

    for (descriptor, response) in responses {
        if !response.ok {
            errors.push(format!(
                "{}: {}",
                descriptor.key,
                response.error.as_deref().unwrap_or("failed")
            ));
            continue;
        }
        if let Some(feature) = response.features.into_iter().next() {
            return Resolution::Found(FeatureInfoResult::from_feature(&descriptor.key, feature));
        }
    }

    if all_failed {
        Resolution::Failed {
            reason: errors.join("; "),
        }
    } else {
        Resolution::NothingFound
    }
}

/// Pixel position of the click inside its viewport.
pub fn pixel_at(click: &MapClick) -> Result<(u32, u32), CoreError> {
    let Viewport {
        bbox,
        width,
        height,
    } = click.viewport;
    if !click.viewport.is_valid() {
        return Err(CoreError::Validation {
            message: format!("invalid viewport: bbox {bbox}, size {width}x{height}"),
        });
    }
    if !bbox.contains(click.at.lng, click.at.lat) {
        return Err(CoreError::Validation {
            message: format!(
                "click ({}, {}) is outside the viewport {bbox}",
                click.at.lat, click.at.lng
            ),
        });
    }

    let x = (click.at.lng - bbox.min_x) / bbox.width() * f64::from(width);
    let y = (bbox.max_y - click.at.lat) / bbox.height() * f64::from(height);
    Ok((to_pixel(x, width), to_pixel(y, height)))
}

/// Round to the nearest pixel index. The input is within `0..=limit`;
/// the far edge maps onto the last pixel, `limit - 1`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::as_conversions)]
fn to_pixel(value: f64, limit: u32) -> u32 {
    (value.round() as u32).min(limit.saturating_sub(1))
}
