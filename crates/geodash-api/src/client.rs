// OGC HTTP client
//
// Wraps `reqwest::Client` with GeoServer URL construction (workspace-scoped
// `wms` / `wfs` service endpoints), status checking, and ServiceException
// detection. Endpoint operations live in `wms.rs` and `wfs.rs` as inherent
// methods to keep this module focused on transport mechanics.

use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::capabilities::service_exception;
use crate::error::Error;
use crate::transport::TransportConfig;

/// OGC service selector for workspace-scoped endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    Wms,
    Wfs,
}

impl Service {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Wms => "WMS",
            Self::Wfs => "WFS",
        }
    }

    fn path(self) -> &'static str {
        match self {
            Self::Wms => "wms",
            Self::Wfs => "wfs",
        }
    }
}

/// Raw HTTP client for one GeoServer workspace.
///
/// Endpoints resolve to `{base}/{workspace}/wms` and `{base}/{workspace}/wfs`.
/// All methods return parsed payloads; any non-2xx status or embedded
/// `ServiceException` surfaces as an [`Error`].
#[derive(Debug, Clone)]
pub struct OgcClient {
    http: reqwest::Client,
    base_url: Url,
    workspace: String,
    timeout: Duration,
}

impl OgcClient {
    /// Create a new client from a `TransportConfig`.
    ///
    /// `base_url` is the GeoServer root (e.g. `http://localhost:8080/geoserver`).
    pub fn new(base_url: Url, workspace: String, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        let mut client = Self::with_client(http, base_url, workspace)?;
        client.timeout = transport.timeout;
        Ok(client)
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url, workspace: String) -> Result<Self, Error> {
        if base_url.cannot_be_a_base() {
            return Err(Error::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase));
        }
        Ok(Self {
            http,
            base_url,
            workspace,
            timeout: TransportConfig::default().timeout,
        })
    }

    /// The workspace every request is scoped to.
    pub fn workspace(&self) -> &str {
        &self.workspace
    }

    /// The GeoServer base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Prefix a bare layer name with the workspace (`ubs` -> `sp_dashboard:ubs`).
    /// Already-qualified names pass through untouched.
    pub fn qualify(&self, layer: &str) -> String {
        if layer.contains(':') {
            layer.to_owned()
        } else {
            format!("{}:{layer}", self.workspace)
        }
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// `{base}/{segments...}` with any trailing slash on the base collapsed.
    fn join(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        url.set_query(None);
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Workspace-scoped service endpoint without query parameters.
    pub fn service_url(&self, service: Service) -> Url {
        self.join(&[self.workspace.as_str(), service.path()])
    }

    /// Service endpoint with the standard `service`/`version`/`request` triple
    /// followed by `params`.
    pub(crate) fn request_url(
        &self,
        service: Service,
        version: &str,
        request: &str,
        params: &[(&str, &str)],
    ) -> Url {
        let mut url = self.service_url(service);
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("service", service.as_str())
                .append_pair("version", version)
                .append_pair("request", request);
            for (k, v) in params {
                query.append_pair(k, v);
            }
        }
        url
    }

    /// The GeoServer web admin page, used as a reachability check.
    pub fn web_url(&self) -> Url {
        self.join(&["web"])
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Send a GET and return the response, failing on non-2xx status.
    pub(crate) async fn send(&self, url: Url) -> Result<reqwest::Response, Error> {
        debug!("GET {}", url);

        let resp = self.http.get(url.clone()).send().await.map_err(|e| self.map_transport(e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(resp)
    }

    /// GET a textual body, surfacing embedded `ServiceException`s as errors.
    pub(crate) async fn get_text(&self, url: Url) -> Result<String, Error> {
        let resp = self.send(url).await?;
        let body = resp.text().await.map_err(|e| self.map_transport(e))?;

        if let Some(message) = service_exception(&body) {
            return Err(Error::ServiceException { message });
        }
        Ok(body)
    }

    /// GET a JSON body and deserialize it.
    ///
    /// GeoServer answers JSON requests for unknown layers with an XML
    /// exception document and status 200, so the body is checked for that
    /// before deserializing.
    pub(crate) async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        let body = self.get_text(url).await?;
        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body,
        })
    }

    /// Probe the web admin page and return its HTTP status.
    ///
    /// Unlike the service calls, a non-2xx status is a valid answer here.
    pub async fn ping(&self) -> Result<u16, Error> {
        let url = self.web_url();
        debug!("GET {}", url);
        let resp = self.http.get(url).send().await.map_err(|e| self.map_transport(e))?;
        Ok(resp.status().as_u16())
    }

    fn map_transport(&self, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::Timeout {
                timeout_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
            }
        } else {
            Error::Transport(err)
        }
    }
}
