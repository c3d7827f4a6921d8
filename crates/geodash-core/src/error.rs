// ── Core error types ──
//
// User-facing errors from geodash-core. Probes never surface these: a
// failed probe is an `ok: false` result. `CoreError` covers the calls
// that do fail loudly (unknown layers, rejected toggles, bad viewports,
// report rendering) and the raw client calls the CLI exposes.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot reach GeoServer at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("GeoServer request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    // ── Layer errors ─────────────────────────────────────────────────
    #[error("Layer not found: {key}")]
    LayerNotFound { key: String },

    #[error("Layer {key} is unavailable")]
    LayerUnavailable { key: String },

    // ── Request errors ───────────────────────────────────────────────
    #[error("Validation failed: {message}")]
    Validation { message: String },

    /// A newer map click replaced this one before it resolved.
    #[error("Feature lookup superseded by a newer click")]
    Superseded,

    /// The server answered, but not with what was asked for.
    #[error("Unexpected response from GeoServer: {message}")]
    Protocol { message: String },

    // ── Report errors ────────────────────────────────────────────────
    #[error("Report rendering failed: {message}")]
    Report { message: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<geodash_api::Error> for CoreError {
    fn from(err: geodash_api::Error) -> Self {
        match err {
            geodash_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout { timeout_ms: 0 }
                } else {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map(ToString::to_string)
                            .unwrap_or_else(|| "<unknown>".into()),
                        reason: e.to_string(),
                    }
                }
            }
            geodash_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            geodash_api::Error::Timeout { timeout_ms } => CoreError::Timeout { timeout_ms },
            geodash_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            geodash_api::Error::Status { status, url } => CoreError::ConnectionFailed {
                url,
                reason: format!("HTTP {status}"),
            },
            geodash_api::Error::ProtocolMismatch { expected } => CoreError::Protocol {
                message: format!("missing {expected}"),
            },
            geodash_api::Error::ServiceException { message } => CoreError::Protocol { message },
            geodash_api::Error::Deserialization { message, body: _ } => CoreError::Protocol {
                message: format!("invalid JSON: {message}"),
            },
        }
    }
}

impl From<handlebars::RenderError> for CoreError {
    fn from(err: handlebars::RenderError) -> Self {
        CoreError::Report {
            message: err.to_string(),
        }
    }
}

impl From<csv::Error> for CoreError {
    fn from(err: csv::Error) -> Self {
        CoreError::Report {
            message: err.to_string(),
        }
    }
}
