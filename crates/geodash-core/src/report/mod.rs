// ── Report assembly ──
//
// Builds a point-in-time snapshot of the layer table, renders it as HTML
// (handlebars) or CSV, and keeps a bounded history of what was generated.

mod history;
mod render;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::error::CoreError;
use crate::model::{
    LayerView, ReportArtifact, ReportFormat, ReportKind, ReportLayerRow, ReportRecord,
    ReportSnapshot,
};

pub use history::ReportHistory;

/// Assembles and renders reports for one server/workspace.
#[derive(Debug, Clone)]
pub struct ReportAssembler {
    server: String,
    workspace: String,
}

impl ReportAssembler {
    pub fn new(server: impl Into<String>, workspace: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            workspace: workspace.into(),
        }
    }

    /// Capture the table as a report snapshot.
    pub fn snapshot(&self, kind: ReportKind, layers: &[LayerView], at: DateTime<Utc>) -> ReportSnapshot {
        let rows: Vec<ReportLayerRow> = layers
            .iter()
            .map(|v| ReportLayerRow {
                key: v.descriptor.key.clone(),
                title: v.descriptor.title.clone(),
                qualified_name: v.descriptor.qualified_name.clone(),
                geometry: v.descriptor.geometry,
                available: v.state.available,
                feature_count: if v.state.available { v.state.feature_count } else { 0 },
                last_checked_at: v.state.last_checked_at,
            })
            .collect();

        let layer_counts = rows
            .iter()
            .map(|r| (r.key.clone(), r.feature_count))
            .collect::<BTreeMap<_, _>>();

        ReportSnapshot {
            generated_at: at,
            kind,
            server: self.server.clone(),
            workspace: self.workspace.clone(),
            derived_metrics: derived_metrics(&rows),
            layer_counts,
            layers: rows,
        }
    }

    /// Render a snapshot into a downloadable artifact.
    pub fn render(&self, snapshot: &ReportSnapshot, format: ReportFormat) -> Result<ReportArtifact, CoreError> {
        let content = match format {
            ReportFormat::Html => render::html(snapshot)?,
            ReportFormat::Csv => render::csv(snapshot)?,
        };
        Ok(ReportArtifact {
            file_name: file_name(snapshot, format),
            mime_type: format.mime_type(),
            content,
        })
    }

    /// Snapshot, render and record in one step.
    pub fn generate(
        &self,
        kind: ReportKind,
        format: ReportFormat,
        layers: &[LayerView],
        history: &ReportHistory,
    ) -> Result<ReportArtifact, CoreError> {
        let snapshot = self.snapshot(kind, layers, Utc::now());
        let artifact = self.render(&snapshot, format)?;
        history.record(ReportRecord {
            generated_at: snapshot.generated_at,
            kind,
            format,
            file_name: artifact.file_name.clone(),
            layers_available: snapshot.layers.iter().filter(|r| r.available).count(),
            total_features: snapshot.layer_counts.values().sum(),
        });
        info!(%kind, %format, file = %artifact.file_name, "report generated");
        Ok(artifact)
    }
}

#[allow(clippy::cast_precision_loss, clippy::as_conversions)]
fn derived_metrics(rows: &[ReportLayerRow]) -> BTreeMap<String, f64> {
    let total = rows.len();
    let available = rows.iter().filter(|r| r.available).count();
    let features: u64 = rows.iter().map(|r| r.feature_count).sum();
    let ratio = if total == 0 {
        0.0
    } else {
        available as f64 / total as f64
    };

    BTreeMap::from([
        ("layers_total".to_owned(), total as f64),
        ("layers_available".to_owned(), available as f64),
        ("total_features".to_owned(), features as f64),
        ("availability_ratio".to_owned(), ratio),
    ])
}

/// `geodash-status-20250817-103000.html`
fn file_name(snapshot: &ReportSnapshot, format: ReportFormat) -> String {
    format!(
        "geodash-{}-{}.{}",
        snapshot.kind,
        snapshot.generated_at.format("%Y%m%d-%H%M%S"),
        format.extension()
    )
}
