// ── Map view binder ──
//
// Turns the layer table into the ordered list of tile layers a map canvas
// draws: the base map, then polygon layers, then point layers. Only layers
// that are both visible and available make it into the plan.

use geodash_api::client::Service;
use geodash_api::wms::{SRS, TILE_FORMAT, WMS_VERSION};
use geodash_api::{BoundingBox, GetMapRequest, OgcClient};
use serde::Serialize;
use url::Url;

use crate::config::{DashboardConfig, MapDefaults};
use crate::error::CoreError;
use crate::model::{GeometryKind, LatLng, LayerView, Viewport};

const BASE_MAP_ATTRIBUTION: &str = "© OpenStreetMap contributors";
/// Web-mercator tile edge in pixels.
const TILE_SIZE: f64 = 256.0;
const MAX_ZOOM: u8 = 19;

// ── Camera ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Camera {
    pub center: LatLng,
    pub zoom: u8,
}

impl From<MapDefaults> for Camera {
    fn from(m: MapDefaults) -> Self {
        Self {
            center: LatLng {
                lat: m.center_lat,
                lng: m.center_lng,
            },
            zoom: m.zoom.min(MAX_ZOOM),
        }
    }
}

impl Camera {
    /// Approximate extent of a `width`×`height` pixel viewport at this zoom.
    pub fn viewport(&self, width: u32, height: u32) -> Viewport {
        let degrees_per_pixel = 360.0 / (TILE_SIZE * f64::from(1u32 << self.zoom));
        let half_w = f64::from(width) / 2.0 * degrees_per_pixel;
        let half_h = f64::from(height) / 2.0 * degrees_per_pixel;
        Viewport {
            bbox: BoundingBox::new(
                self.center.lng - half_w,
                self.center.lat - half_h,
                self.center.lng + half_w,
                self.center.lat + half_h,
            ),
            width,
            height,
        }
    }
}

// ── Tile layer specs ─────────────────────────────────────────────────

/// One layer of a render plan, bottom to top.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TileLayerSpec {
    Base {
        url_template: String,
        attribution: String,
    },
    Wms(WmsLayerSpec),
}

/// A WMS overlay as a tile-layer widget needs it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WmsLayerSpec {
    pub key: String,
    pub endpoint: Url,
    /// Qualified `workspace:layer` name.
    pub layers: String,
    pub style: String,
    pub opacity: f32,
    pub format: &'static str,
    pub transparent: bool,
    pub srs: &'static str,
    pub version: &'static str,
    pub geometry: GeometryKind,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderPlan {
    pub camera: Camera,
    pub layers: Vec<TileLayerSpec>,
}

impl RenderPlan {
    /// The WMS overlays only, in draw order.
    pub fn overlays(&self) -> impl Iterator<Item = &WmsLayerSpec> {
        self.layers.iter().filter_map(|l| match l {
            TileLayerSpec::Wms(spec) => Some(spec),
            TileLayerSpec::Base { .. } => None,
        })
    }
}

// ── MapView ──────────────────────────────────────────────────────────

/// Owns the camera and base map; binds layer state to tile layers.
#[derive(Debug, Clone)]
pub struct MapView {
    camera: Camera,
    base_map_url: String,
    client: OgcClient,
}

impl MapView {
    pub fn new(config: &DashboardConfig, client: OgcClient) -> Self {
        Self {
            camera: Camera::from(config.map),
            base_map_url: config.base_map_url.clone(),
            client,
        }
    }

    pub fn camera(&self) -> Camera {
        self.camera
    }

    pub fn pan_to(&mut self, center: LatLng) {
        self.camera.center = center;
    }

    pub fn set_zoom(&mut self, zoom: u8) {
        self.camera.zoom = zoom.min(MAX_ZOOM);
    }

    /// Base map, then polygons, then points; descriptor order within each.
    pub fn render_plan(&self, layers: &[LayerView]) -> RenderPlan {
        let mut overlays: Vec<&LayerView> = layers.iter().filter(|v| v.state.is_rendered()).collect();
        // Stable sort keeps descriptor order inside each geometry group.
        overlays.sort_by_key(|v| v.descriptor.geometry.rank());

        let endpoint = self.client.service_url(Service::Wms);
        let mut specs = Vec::with_capacity(overlays.len() + 1);
        specs.push(TileLayerSpec::Base {
            url_template: self.base_map_url.clone(),
            attribution: BASE_MAP_ATTRIBUTION.into(),
        });
        specs.extend(overlays.into_iter().map(|v| {
            let d = &v.descriptor;
            TileLayerSpec::Wms(WmsLayerSpec {
                key: d.key.clone(),
                endpoint: endpoint.clone(),
                layers: d.qualified_name.clone(),
                style: d.style.clone(),
                opacity: d.opacity,
                format: TILE_FORMAT,
                transparent: true,
                srs: SRS,
                version: WMS_VERSION,
                geometry: d.geometry,
            })
        }));

        RenderPlan {
            camera: self.camera,
            layers: specs,
        }
    }

    /// A concrete GetMap URL for one overlay.
    pub fn get_map_url(
        &self,
        spec: &WmsLayerSpec,
        bbox: BoundingBox,
        width: u32,
        height: u32,
    ) -> Result<Url, CoreError> {
        if !bbox.is_valid() || width == 0 || height == 0 {
            return Err(CoreError::Validation {
                message: format!("invalid map request: bbox {bbox}, size {width}x{height}"),
            });
        }
        Ok(self.client.get_map_url(&GetMapRequest {
            layers: vec![spec.layers.clone()],
            styles: vec![spec.style.clone()],
            bbox,
            width,
            height,
            transparent: spec.transparent,
        }))
    }
}
