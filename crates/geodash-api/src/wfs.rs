// WFS endpoints
//
// GetCapabilities (feature type discovery) and GetFeature in its two
// shapes: `resultType=hits` for bare counts and `outputFormat=application/json`
// for GeoJSON samples carrying `totalFeatures`.

use tracing::debug;
use url::Url;

use crate::capabilities::{parse_feature_type_names, parse_number_of_features};
use crate::client::{OgcClient, Service};
use crate::error::Error;
use crate::models::FeatureCollection;

/// Version used for JSON GetFeature and capabilities (`maxFeatures` spelling).
pub const WFS_VERSION: &str = "1.0.0";
/// `resultType=hits` arrived in WFS 1.1.0.
pub const WFS_HITS_VERSION: &str = "1.1.0";
pub const JSON_FORMAT: &str = "application/json";

impl OgcClient {
    /// `GET {ws}/wfs?service=WFS&version=1.0.0&request=GetCapabilities`
    pub fn wfs_capabilities_url(&self) -> Url {
        self.request_url(Service::Wfs, WFS_VERSION, "GetCapabilities", &[])
    }

    /// Names of all feature types advertised by the workspace.
    pub async fn wfs_capabilities(&self) -> Result<Vec<String>, Error> {
        let body = self.get_text(self.wfs_capabilities_url()).await?;
        let names = parse_feature_type_names(&body);
        debug!(count = names.len(), "parsed WFS capabilities");
        if names.is_empty() {
            return Err(Error::ProtocolMismatch {
                expected: "<FeatureType><Name> entries",
            });
        }
        Ok(names)
    }

    /// `GetFeature` with `resultType=hits`.
    pub fn hits_url(&self, type_name: &str) -> Url {
        let type_name = self.qualify(type_name);
        self.request_url(
            Service::Wfs,
            WFS_HITS_VERSION,
            "GetFeature",
            &[("typeName", type_name.as_str()), ("resultType", "hits")],
        )
    }

    /// Count features by scanning `numberOfFeatures="N"` out of a hits response.
    ///
    /// Compatibility path for servers without JSON output; prefer
    /// [`get_features`](Self::get_features) and its `totalFeatures`.
    pub async fn hits(&self, type_name: &str) -> Result<u64, Error> {
        let body = self.get_text(self.hits_url(type_name)).await?;
        parse_number_of_features(&body).ok_or(Error::ProtocolMismatch {
            expected: "numberOfFeatures attribute",
        })
    }

    /// `GetFeature` with JSON output and a feature cap.
    pub fn features_url(&self, type_name: &str, max_features: u32) -> Url {
        let type_name = self.qualify(type_name);
        let max_features = max_features.to_string();
        self.request_url(
            Service::Wfs,
            WFS_VERSION,
            "GetFeature",
            &[
                ("typeName", type_name.as_str()),
                ("maxFeatures", max_features.as_str()),
                ("outputFormat", JSON_FORMAT),
            ],
        )
    }

    /// Fetch up to `max_features` features as GeoJSON.
    pub async fn get_features(
        &self,
        type_name: &str,
        max_features: u32,
    ) -> Result<FeatureCollection, Error> {
        debug!(type_name, max_features, "fetching features");
        self.get_json(self.features_url(type_name, max_features)).await
    }
}
