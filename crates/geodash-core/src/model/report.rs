// ── Report types ──

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::layer::GeometryKind;

/// Which report the user asked for.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ReportKind {
    /// Server connection and layer availability.
    Status,
    /// Layer catalog with metadata and feature counts.
    Inventory,
}

impl ReportKind {
    pub fn title(self) -> &'static str {
        match self {
            Self::Status => "Relatório de Conexão GeoServer",
            Self::Inventory => "Inventário de Dados Geoespaciais",
        }
    }

    /// Status reads best as a printable page; inventory as a spreadsheet.
    pub fn default_format(self) -> ReportFormat {
        match self {
            Self::Status => ReportFormat::Html,
            Self::Inventory => ReportFormat::Csv,
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ReportFormat {
    Html,
    Csv,
}

impl ReportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::Csv => "csv",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Html => "text/html; charset=utf-8",
            Self::Csv => "text/csv; charset=utf-8",
        }
    }
}

/// One layer's row in a report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportLayerRow {
    pub key: String,
    pub title: String,
    pub qualified_name: String,
    pub geometry: GeometryKind,
    pub available: bool,
    pub feature_count: u64,
    pub last_checked_at: Option<DateTime<Utc>>,
}

/// Point-in-time data a report is rendered from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportSnapshot {
    pub generated_at: DateTime<Utc>,
    pub kind: ReportKind,
    pub server: String,
    pub workspace: String,
    pub layers: Vec<ReportLayerRow>,
    /// Layer key -> feature count (zero for unavailable layers).
    pub layer_counts: BTreeMap<String, u64>,
    /// `layers_total`, `layers_available`, `total_features`, `availability_ratio`.
    pub derived_metrics: BTreeMap<String, f64>,
}

/// A rendered report, ready to be saved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportArtifact {
    pub file_name: String,
    pub mime_type: &'static str,
    pub content: String,
}

/// Summary of a generated report, kept in history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRecord {
    pub generated_at: DateTime<Utc>,
    pub kind: ReportKind,
    pub format: ReportFormat,
    pub file_name: String,
    pub layers_available: usize,
    pub total_features: u64,
}
