//! Shared configuration for geodash.
//!
//! TOML profiles (one per GeoServer), layered loading through figment, and
//! translation to `geodash_core::DashboardConfig`. The CLI adds its
//! flag-aware overrides on top.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use geodash_core::config::{DEFAULT_BASE_MAP_URL, DEFAULT_BASE_URL, DEFAULT_WORKSPACE};
use geodash_core::{
    CountMode, DashboardConfig, GeometryKind, LayerDescriptor, MapDefaults, TlsVerification,
    default_layers,
};

/// Upper bound on `history_limit`.
pub const MAX_HISTORY_LIMIT: usize = 1_000;

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{name}' not found (available: {available})")]
    ProfileNotFound { name: String, available: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when `--profile` is not given.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named GeoServer profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    pub fn profile(&self, name: &str) -> Result<&Profile, ConfigError> {
        self.profiles
            .get(name)
            .ok_or_else(|| ConfigError::ProfileNotFound {
                name: name.into(),
                available: self.profile_names().join(", "),
            })
    }

    /// Profile names, sorted.
    pub fn profile_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.profiles.keys().cloned().collect();
        names.sort();
        names
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default)]
    pub insecure: bool,

    /// Per-request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Availability poll interval in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            insecure: false,
            timeout_ms: default_timeout_ms(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout_ms() -> u64 {
    10_000
}
fn default_poll_interval_ms() -> u64 {
    30_000
}

/// A named GeoServer profile.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Profile {
    /// GeoServer root URL (e.g., "http://localhost:8080/geoserver").
    pub server: String,

    #[serde(default = "default_workspace")]
    pub workspace: String,

    pub poll_interval_ms: Option<u64>,
    pub report_poll_interval_ms: Option<u64>,

    /// Override the default request timeout.
    pub request_timeout_ms: Option<u64>,

    /// `auto`, `total-features` or `hits`.
    pub count_mode: Option<CountMode>,

    /// Report summaries kept in memory.
    pub history_limit: Option<usize>,

    /// Accept invalid TLS certificates.
    pub insecure: Option<bool>,

    /// Path to a custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Base map tile template.
    pub base_map_url: Option<String>,

    pub map: Option<MapDefaults>,

    /// Layer catalog. Empty selects the municipal defaults.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub layers: Vec<LayerEntry>,
}

fn default_workspace() -> String {
    DEFAULT_WORKSPACE.into()
}

impl Profile {
    /// A profile for `server` with every other field defaulted.
    pub fn new(server: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            workspace: default_workspace(),
            poll_interval_ms: None,
            report_poll_interval_ms: None,
            request_timeout_ms: None,
            count_mode: None,
            history_limit: None,
            insecure: None,
            ca_cert: None,
            base_map_url: None,
            map: None,
            layers: Vec::new(),
        }
    }
}

impl Default for Profile {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

/// One `[[profiles.<name>.layers]]` entry.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LayerEntry {
    pub key: String,
    pub geometry: GeometryKind,
    pub title: Option<String>,
    /// Qualified layer name; defaults to `{workspace}:{key}`.
    pub name: Option<String>,
    #[serde(default)]
    pub assume_available: bool,
    #[serde(default)]
    pub hidden: bool,
    pub style: Option<String>,
    pub opacity: Option<f32>,
    pub poll_interval_ms: Option<u64>,
}

impl LayerEntry {
    fn to_descriptor(&self, workspace: &str) -> Result<LayerDescriptor, ConfigError> {
        if let Some(opacity) = self.opacity {
            if !(0.0..=1.0).contains(&opacity) {
                return Err(ConfigError::Validation {
                    field: format!("layers.{}.opacity", self.key),
                    reason: format!("expected a value between 0 and 1, got {opacity}"),
                });
            }
        }

        let title = self.title.as_deref().unwrap_or(&self.key);
        let mut descriptor = LayerDescriptor::new(workspace, &self.key, title, self.geometry);
        if let Some(ref name) = self.name {
            descriptor.qualified_name.clone_from(name);
        }
        if self.assume_available {
            descriptor = descriptor.assume_available();
        }
        if self.hidden {
            descriptor = descriptor.hidden();
        }
        if let Some(ref style) = self.style {
            descriptor = descriptor.with_style(style.clone());
        }
        if let Some(opacity) = self.opacity {
            descriptor = descriptor.with_opacity(opacity);
        }
        if let Some(ms) = self.poll_interval_ms {
            descriptor = descriptor.with_poll_interval(positive_ms(
                &format!("layers.{}.poll_interval_ms", self.key),
                ms,
            )?);
        }
        Ok(descriptor)
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("org", "geodash", "geodash").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("geodash");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Defaults, then the TOML file at `path` (if any), then `GEODASH_` env.
///
/// Nested keys use a double underscore: `GEODASH_DEFAULTS__TIMEOUT_MS`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("GEODASH_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file is missing or unreadable.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Translation ─────────────────────────────────────────────────────

/// Build a `DashboardConfig` from a profile, with no CLI overrides.
pub fn profile_to_dashboard_config(
    profile: &Profile,
    defaults: &Defaults,
) -> Result<DashboardConfig, ConfigError> {
    let base_url: url::Url = profile
        .server
        .parse()
        .map_err(|_| ConfigError::Validation {
            field: "server".into(),
            reason: format!("invalid URL: {}", profile.server),
        })?;

    let workspace = profile.workspace.trim();
    if workspace.is_empty() || workspace.contains(['/', ':']) {
        return Err(ConfigError::Validation {
            field: "workspace".into(),
            reason: format!("'{}' is not a workspace name", profile.workspace),
        });
    }

    let tls = if profile.insecure.unwrap_or(defaults.insecure) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    };

    let poll_interval = positive_ms(
        "poll_interval_ms",
        profile.poll_interval_ms.unwrap_or(defaults.poll_interval_ms),
    )?;
    let report_poll_interval = positive_ms(
        "report_poll_interval_ms",
        profile.report_poll_interval_ms.unwrap_or(300_000),
    )?;
    let request_timeout = positive_ms(
        "request_timeout_ms",
        profile.request_timeout_ms.unwrap_or(defaults.timeout_ms),
    )?;

    let history_limit = profile.history_limit.unwrap_or(10);
    if history_limit > MAX_HISTORY_LIMIT {
        return Err(ConfigError::Validation {
            field: "history_limit".into(),
            reason: format!("must be at most {MAX_HISTORY_LIMIT}"),
        });
    }

    let layers = if profile.layers.is_empty() {
        default_layers(workspace)
    } else {
        let mut seen = HashSet::new();
        profile
            .layers
            .iter()
            .map(|entry| {
                if !seen.insert(entry.key.as_str()) {
                    return Err(ConfigError::Validation {
                        field: "layers".into(),
                        reason: format!("duplicate layer key '{}'", entry.key),
                    });
                }
                entry.to_descriptor(workspace)
            })
            .collect::<Result<Vec<_>, _>>()?
    };

    Ok(DashboardConfig {
        base_url,
        workspace: workspace.to_owned(),
        poll_interval,
        report_poll_interval,
        request_timeout,
        count_mode: profile.count_mode.unwrap_or_default(),
        history_limit,
        tls,
        base_map_url: profile
            .base_map_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_MAP_URL.into()),
        map: profile.map.unwrap_or_default(),
        layers,
    })
}

fn positive_ms(field: &str, ms: u64) -> Result<Duration, ConfigError> {
    if ms == 0 {
        return Err(ConfigError::Validation {
            field: field.into(),
            reason: "must be greater than zero".into(),
        });
    }
    Ok(Duration::from_millis(ms))
}
