//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and process exit codes.

use miette::Diagnostic;
use thiserror::Error;

use geodash_config::ConfigError;
use geodash_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const UNAVAILABLE: i32 = 5;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach GeoServer at {url}")]
    #[diagnostic(
        code(geodash::connection_failed),
        help(
            "Check that GeoServer is running and the URL includes the context path.\n\
             Reason: {reason}\n\
             Try: geodash diagnose --server http://localhost:8080/geoserver"
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("Request timed out after {millis}ms")]
    #[diagnostic(
        code(geodash::timeout),
        help("Increase the timeout with --timeout or request_timeout_ms in your profile.")
    )]
    Timeout { millis: u64 },

    #[error("GeoServer answered with something unexpected: {message}")]
    #[diagnostic(
        code(geodash::protocol),
        help("Check that the workspace exists and the layer is published for WMS and WFS.")
    )]
    Protocol { message: String },

    #[error("{failed} of {total} diagnostic checks failed")]
    #[diagnostic(code(geodash::diagnostics_failed))]
    DiagnosticsFailed { failed: usize, total: usize },

    // ── Layers ───────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(geodash::not_found),
        help("Run: geodash {list_command} to see available {resource_type}s")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    #[error("Layer '{key}' is unavailable")]
    #[diagnostic(
        code(geodash::layer_unavailable),
        help(
            "The last probe could not reach this layer, so it cannot be toggled.\n\
             Run: geodash layers status {key}"
        )
    )]
    LayerUnavailable { key: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(geodash::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(geodash::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: geodash config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("Configuration error: {message}")]
    #[diagnostic(
        code(geodash::config),
        help("Inspect the resolved configuration with: geodash config show")
    )]
    Config { message: String },

    // ── Interactive ──────────────────────────────────────────────────
    #[error("'{action}' requires confirmation")]
    #[diagnostic(
        code(geodash::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── Reports / IO ─────────────────────────────────────────────────
    #[error("Report failed: {message}")]
    #[diagnostic(code(geodash::report))]
    Report { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. }
            | Self::Protocol { .. }
            | Self::DiagnosticsFailed { .. } => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::NotFound { .. } | Self::ProfileNotFound { .. } => exit_code::NOT_FOUND,
            Self::LayerUnavailable { .. } => exit_code::UNAVAILABLE,
            Self::Validation { .. } | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            Self::Config { .. } | Self::Report { .. } | Self::Io(_) => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => CliError::ConnectionFailed { url, reason },

            CoreError::Timeout { timeout_ms } => CliError::Timeout { millis: timeout_ms },

            CoreError::LayerNotFound { key } => CliError::NotFound {
                resource_type: "layer".into(),
                identifier: key,
                list_command: "layers list".into(),
            },

            CoreError::LayerUnavailable { key } => CliError::LayerUnavailable { key },

            CoreError::Validation { message } => CliError::Validation {
                field: "input".into(),
                reason: message,
            },

            CoreError::Protocol { message } => CliError::Protocol { message },

            CoreError::Report { message } => CliError::Report { message },

            CoreError::Config { message } => CliError::Config { message },

            // A one-shot CLI never issues overlapping clicks.
            CoreError::Superseded => CliError::Report {
                message: "feature lookup was cancelled".into(),
            },

            CoreError::Internal(message) => CliError::Config { message },
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::ProfileNotFound { name, available } => CliError::ProfileNotFound {
                name,
                available: if available.is_empty() {
                    "(none)".into()
                } else {
                    available
                },
            },
            ConfigError::Io(e) => CliError::Io(e),
            other => CliError::Config {
                message: other.to_string(),
            },
        }
    }
}
