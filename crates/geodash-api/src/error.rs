use thiserror::Error;

/// Top-level error type for the `geodash-api` crate.
///
/// Covers every failure mode of a WMS/WFS round trip: transport, HTTP
/// status, and responses that arrive intact but don't carry what the
/// request asked for. `geodash-core` folds these into probe results.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Request timed out.
    #[error("Request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// TLS handshake or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── HTTP ────────────────────────────────────────────────────────
    /// Server answered with a non-2xx status.
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    // ── OGC ─────────────────────────────────────────────────────────
    /// 2xx response whose body lacks the expected marker
    /// (no `numberOfFeatures`, no `<Layer>` names, ...).
    #[error("Unexpected response: missing {expected}")]
    ProtocolMismatch { expected: &'static str },

    /// GeoServer reported a `ServiceException` (usually with HTTP 200).
    #[error("OGC service exception: {message}")]
    ServiceException { message: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

/// Coarse classification used by probes and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Connection refused, DNS, timeout, TLS, non-2xx.
    Network,
    /// The server answered but the body is not what was asked for.
    Protocol,
}

impl Error {
    /// Returns `true` if this is a transient error worth retrying on the next poll.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Timeout { .. } => true,
            Self::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Whether the failure happened on the wire or in the payload.
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            Self::Transport(_)
            | Self::InvalidUrl(_)
            | Self::Timeout { .. }
            | Self::Tls(_)
            | Self::Status { .. } => FailureKind::Network,
            Self::ProtocolMismatch { .. }
            | Self::ServiceException { .. }
            | Self::Deserialization { .. } => FailureKind::Protocol,
        }
    }

    /// HTTP status code, if the failure carried one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
