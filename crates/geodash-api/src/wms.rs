// WMS endpoints
//
// GetCapabilities (layer discovery), GetMap (tile URLs + a fetch used by
// diagnostics) and GetFeatureInfo (click-to-query). All requests use WMS
// 1.1.0 with EPSG:4326, matching what the dashboard's map canvas speaks.

use tracing::debug;
use url::Url;

use crate::capabilities::parse_layer_names;
use crate::client::{OgcClient, Service};
use crate::error::Error;
use crate::models::{FeatureCollection, FeatureInfoQuery, GetMapRequest};

pub const WMS_VERSION: &str = "1.1.0";
pub const SRS: &str = "EPSG:4326";
pub const TILE_FORMAT: &str = "image/png";
pub const INFO_FORMAT: &str = "application/json";

impl OgcClient {
    /// `GET {ws}/wms?service=WMS&version=1.1.0&request=GetCapabilities`
    pub fn wms_capabilities_url(&self) -> Url {
        self.request_url(Service::Wms, WMS_VERSION, "GetCapabilities", &[])
    }

    /// Names of all named layers advertised by the workspace.
    ///
    /// A document with no named layers is reported as
    /// [`Error::ProtocolMismatch`]: a reachable server that lists nothing is
    /// indistinguishable from a proxy error page for our purposes.
    pub async fn wms_capabilities(&self) -> Result<Vec<String>, Error> {
        let body = self.get_text(self.wms_capabilities_url()).await?;
        let names = parse_layer_names(&body);
        debug!(count = names.len(), "parsed WMS capabilities");
        if names.is_empty() {
            return Err(Error::ProtocolMismatch {
                expected: "<Layer><Name> entries",
            });
        }
        Ok(names)
    }

    /// Build a `GetMap` URL. Layers are qualified with the workspace.
    pub fn get_map_url(&self, req: &GetMapRequest) -> Url {
        let layers = req
            .layers
            .iter()
            .map(|l| self.qualify(l))
            .collect::<Vec<_>>()
            .join(",");
        let styles = req.styles.join(",");
        let bbox = req.bbox.to_param();
        let width = req.width.to_string();
        let height = req.height.to_string();
        let transparent = req.transparent.to_string();

        self.request_url(
            Service::Wms,
            WMS_VERSION,
            "GetMap",
            &[
                ("layers", layers.as_str()),
                ("styles", styles.as_str()),
                ("bbox", bbox.as_str()),
                ("width", width.as_str()),
                ("height", height.as_str()),
                ("srs", SRS),
                ("format", TILE_FORMAT),
                ("transparent", transparent.as_str()),
            ],
        )
    }

    /// Fetch a map image and return its content type.
    ///
    /// GeoServer reports rendering failures as an XML document with status
    /// 200, so anything that is not `image/*` is a protocol mismatch.
    pub async fn get_map(&self, req: &GetMapRequest) -> Result<String, Error> {
        let resp = self.send(self.get_map_url(req)).await?;
        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_owned();

        if !content_type.starts_with("image/") {
            let body = resp.text().await.unwrap_or_default();
            if let Some(message) = crate::capabilities::service_exception(&body) {
                return Err(Error::ServiceException { message });
            }
            return Err(Error::ProtocolMismatch {
                expected: "image/* content type",
            });
        }
        Ok(content_type)
    }

    /// Build a `GetFeatureInfo` URL for one layer.
    pub fn feature_info_url(&self, layer: &str, query: &FeatureInfoQuery) -> Url {
        let layer = self.qualify(layer);
        let bbox = query.bbox.to_param();
        let width = query.width.to_string();
        let height = query.height.to_string();
        let x = query.x.to_string();
        let y = query.y.to_string();
        let feature_count = query.feature_count.to_string();

        self.request_url(
            Service::Wms,
            WMS_VERSION,
            "GetFeatureInfo",
            &[
                ("layers", layer.as_str()),
                ("query_layers", layer.as_str()),
                ("styles", ""),
                ("bbox", bbox.as_str()),
                ("width", width.as_str()),
                ("height", height.as_str()),
                ("x", x.as_str()),
                ("y", y.as_str()),
                ("srs", SRS),
                ("info_format", INFO_FORMAT),
                ("feature_count", feature_count.as_str()),
            ],
        )
    }

    /// Query features under a pixel. An empty collection is a valid answer.
    pub async fn feature_info(
        &self,
        layer: &str,
        query: &FeatureInfoQuery,
    ) -> Result<FeatureCollection, Error> {
        debug!(layer, x = query.x, y = query.y, "querying feature info");
        self.get_json(self.feature_info_url(layer, query)).await
    }
}
