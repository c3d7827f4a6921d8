//! CLI configuration: a thin wrapper around `geodash_config`.
//!
//! Re-exports the shared types and adds resolution that respects
//! `GlobalOpts` flag overrides (--server, --workspace, --timeout, ...).

use geodash_core::DashboardConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use geodash_config::{Config, Profile, config_path, load_config_or_default, save_config};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Load the config file and build the dashboard configuration.
pub fn resolve_dashboard_config(global: &GlobalOpts) -> Result<DashboardConfig, CliError> {
    resolve_with(&load_config_or_default(), global)
}

/// Translate the active profile + global flags into a `DashboardConfig`.
///
/// Flags take priority over profile values. Without any profile the
/// built-in defaults apply, but a profile named with `--profile` must exist.
pub fn resolve_with(cfg: &Config, global: &GlobalOpts) -> Result<DashboardConfig, CliError> {
    let profile_name = active_profile_name(global, cfg);
    let mut profile = match cfg.profile(&profile_name) {
        Ok(p) => p.clone(),
        Err(e) if global.profile.is_some() => return Err(e.into()),
        Err(_) => Profile::default(),
    };

    if let Some(ref server) = global.server {
        profile.server.clone_from(server);
    }
    if let Some(ref workspace) = global.workspace {
        profile.workspace.clone_from(workspace);
    }
    if global.insecure {
        profile.insecure = Some(true);
    }
    if let Some(secs) = global.timeout {
        profile.request_timeout_ms = Some(secs.saturating_mul(1000));
    }

    tracing::debug!(profile = %profile_name, server = %profile.server, "resolved profile");
    Ok(geodash_config::profile_to_dashboard_config(
        &profile,
        &cfg.defaults,
    )?)
}
