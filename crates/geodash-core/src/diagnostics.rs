// ── Server diagnostics ──
//
// A fixed, ordered checklist against the configured GeoServer: web admin
// reachability, WMS and WFS capabilities, a one-feature sample per layer
// and a GetMap render per layer. Every check runs; none aborts the rest.

use std::sync::Arc;
use std::time::Instant;

use geodash_api::{BoundingBox, GetMapRequest, OgcClient};
use serde::Serialize;
use tracing::debug;

use crate::model::LayerDescriptor;

/// Extent used for the GetMap checks (greater São Paulo).
pub const DIAGNOSTIC_BBOX: BoundingBox = BoundingBox {
    min_x: -48.0,
    min_y: -24.0,
    max_x: -45.0,
    max_y: -21.0,
};
const DIAGNOSTIC_TILE: u32 = 256;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiagnosticCheck {
    pub name: String,
    pub ok: bool,
    /// HTTP status, when the server answered.
    pub status: Option<u16>,
    pub detail: String,
    pub elapsed_ms: u64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DiagnosticsReport {
    pub checks: Vec<DiagnosticCheck>,
}

impl DiagnosticsReport {
    pub fn all_ok(&self) -> bool {
        self.checks.iter().all(|c| c.ok)
    }

    pub fn failures(&self) -> impl Iterator<Item = &DiagnosticCheck> {
        self.checks.iter().filter(|c| !c.ok)
    }
}

pub struct Diagnostics<'a> {
    client: &'a OgcClient,
    layers: &'a [Arc<LayerDescriptor>],
}

impl<'a> Diagnostics<'a> {
    pub fn new(client: &'a OgcClient, layers: &'a [Arc<LayerDescriptor>]) -> Self {
        Self { client, layers }
    }

    pub async fn run(&self) -> DiagnosticsReport {
        let mut checks = Vec::with_capacity(3 + self.layers.len() * 2);

        let started = Instant::now();
        let web = self.client.web_url();
        checks.push(match self.client.ping().await {
            Ok(status) => check(
                "GeoServer web",
                (200..400).contains(&status),
                Some(status),
                web.to_string(),
                started,
            ),
            Err(e) => failed("GeoServer web", &e, started),
        });

        let started = Instant::now();
        checks.push(match self.client.wms_capabilities().await {
            Ok(names) => check(
                "WMS GetCapabilities",
                true,
                Some(200),
                format!("{} layer(s): {}", names.len(), names.join(", ")),
                started,
            ),
            Err(e) => failed("WMS GetCapabilities", &e, started),
        });

        let started = Instant::now();
        checks.push(match self.client.wfs_capabilities().await {
            Ok(names) => check(
                "WFS GetCapabilities",
                true,
                Some(200),
                format!("{} feature type(s): {}", names.len(), names.join(", ")),
                started,
            ),
            Err(e) => failed("WFS GetCapabilities", &e, started),
        });

        for layer in self.layers {
            let name = format!("WFS sample {}", layer.key);
            let started = Instant::now();
            checks.push(match self.client.get_features(&layer.qualified_name, 1).await {
                Ok(fc) => check(
                    &name,
                    true,
                    Some(200),
                    format!("{} feature(s) returned", fc.features.len()),
                    started,
                ),
                Err(e) => failed(&name, &e, started),
            });
        }

        for layer in self.layers {
            let name = format!("WMS GetMap {}", layer.key);
            let request = GetMapRequest {
                layers: vec![layer.qualified_name.clone()],
                styles: vec![layer.style.clone()],
                bbox: DIAGNOSTIC_BBOX,
                width: DIAGNOSTIC_TILE,
                height: DIAGNOSTIC_TILE,
                transparent: true,
            };
            let started = Instant::now();
            checks.push(match self.client.get_map(&request).await {
                Ok(content_type) => check(&name, true, Some(200), content_type, started),
                Err(e) => failed(&name, &e, started),
            });
        }

        debug!(
            checks = checks.len(),
            failed = checks.iter().filter(|c| !c.ok).count(),
            "diagnostics complete"
        );
        DiagnosticsReport { checks }
    }
}

fn check(name: &str, ok: bool, status: Option<u16>, detail: String, started: Instant) -> DiagnosticCheck {
    DiagnosticCheck {
        name: name.to_owned(),
        ok,
        status,
        detail,
        elapsed_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
    }
}

fn failed(name: &str, err: &geodash_api::Error, started: Instant) -> DiagnosticCheck {
    check(name, false, err.status(), err.to_string(), started)
}
