//! Config subcommand handlers.

use std::fmt::Write as _;

use dialoguer::{Input, Select};
use geodash_core::CountMode;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config, Profile};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Helpers ─────────────────────────────────────────────────────────

/// Human-readable TOML-ish view of the configuration.
fn format_config(cfg: &Config) -> String {
    let mut out = String::new();

    if let Some(ref default) = cfg.default_profile {
        let _ = writeln!(out, "default_profile = \"{default}\"");
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "[defaults]");
    let _ = writeln!(out, "output = \"{}\"", cfg.defaults.output);
    let _ = writeln!(out, "color = \"{}\"", cfg.defaults.color);
    let _ = writeln!(out, "insecure = {}", cfg.defaults.insecure);
    let _ = writeln!(out, "timeout_ms = {}", cfg.defaults.timeout_ms);
    let _ = writeln!(out, "poll_interval_ms = {}", cfg.defaults.poll_interval_ms);

    for name in cfg.profile_names() {
        let p = &cfg.profiles[&name];
        let _ = writeln!(out);
        let _ = writeln!(out, "[profiles.{name}]");
        let _ = writeln!(out, "server = \"{}\"", p.server);
        let _ = writeln!(out, "workspace = \"{}\"", p.workspace);
        if let Some(ms) = p.poll_interval_ms {
            let _ = writeln!(out, "poll_interval_ms = {ms}");
        }
        if let Some(ms) = p.report_poll_interval_ms {
            let _ = writeln!(out, "report_poll_interval_ms = {ms}");
        }
        if let Some(ms) = p.request_timeout_ms {
            let _ = writeln!(out, "request_timeout_ms = {ms}");
        }
        if let Some(mode) = p.count_mode {
            let _ = writeln!(out, "count_mode = \"{mode}\"");
        }
        if let Some(limit) = p.history_limit {
            let _ = writeln!(out, "history_limit = {limit}");
        }
        if let Some(insecure) = p.insecure {
            let _ = writeln!(out, "insecure = {insecure}");
        }
        if let Some(ref ca) = p.ca_cert {
            let _ = writeln!(out, "ca_cert = \"{}\"", ca.display());
        }
        if !p.layers.is_empty() {
            let keys: Vec<_> = p.layers.iter().map(|l| l.key.as_str()).collect();
            let _ = writeln!(out, "# layers: {}", keys.join(", "));
        }
    }

    out
}

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

fn save_config(cfg: &Config) -> Result<std::path::PathBuf, CliError> {
    Ok(config::save_config(cfg)?)
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        // ── Init: interactive wizard ────────────────────────────────
        ConfigCommand::Init => {
            let config_path = config::config_path();
            eprintln!("geodash configuration wizard");
            eprintln!("   Config path: {}\n", config_path.display());

            let mut cfg = config::load_config_or_default();

            let profile_name: String = Input::new()
                .with_prompt("Profile name")
                .default("default".into())
                .interact_text()
                .map_err(prompt_err)?;

            if cfg.profiles.contains_key(&profile_name)
                && !util::confirm(
                    &format!("Profile '{profile_name}' exists. Replace it?"),
                    "replace profile",
                    global.yes,
                )?
            {
                return Ok(());
            }

            let server: String = Input::new()
                .with_prompt("GeoServer URL")
                .default(geodash_core::config::DEFAULT_BASE_URL.into())
                .interact_text()
                .map_err(prompt_err)?;

            let workspace: String = Input::new()
                .with_prompt("Workspace")
                .default(geodash_core::config::DEFAULT_WORKSPACE.into())
                .interact_text()
                .map_err(prompt_err)?;

            let modes = [CountMode::Auto, CountMode::TotalFeatures, CountMode::Hits];
            let labels: Vec<String> = modes.iter().map(ToString::to_string).collect();
            let selection = Select::new()
                .with_prompt("Feature count method")
                .items(&labels)
                .default(0)
                .interact()
                .map_err(prompt_err)?;

            let mut profile = Profile::new(server);
            profile.workspace = workspace;
            profile.count_mode = Some(modes[selection]);

            // Validate before writing anything.
            geodash_config::profile_to_dashboard_config(&profile, &cfg.defaults)?;

            cfg.profiles.insert(profile_name.clone(), profile);
            cfg.default_profile = Some(profile_name.clone());
            let path = save_config(&cfg)?;

            eprintln!("\n✓ Configuration written to {}", path.display());
            eprintln!("  Active profile: {profile_name}");
            eprintln!("\n  Test it: geodash diagnose");
            Ok(())
        }

        // ── Show ────────────────────────────────────────────────────
        ConfigCommand::Show => {
            let cfg = config::load_config_or_default();
            let out = output::render_single(&global.output, &cfg, format_config, |_| {
                "config".into()
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }

        // ── Path ────────────────────────────────────────────────────
        ConfigCommand::Path => {
            output::print_output(&config::config_path().display().to_string(), false);
            Ok(())
        }

        // ── Profiles ────────────────────────────────────────────────
        ConfigCommand::Profiles => {
            let cfg = config::load_config_or_default();
            let default = config::active_profile_name(global, &cfg);
            if cfg.profiles.is_empty() {
                eprintln!("No profiles configured. Run: geodash config init");
            } else {
                for name in cfg.profile_names() {
                    let marker = if name == default { " *" } else { "" };
                    println!("{name}{marker}");
                }
            }
            Ok(())
        }

        // ── Use <name> ─────────────────────────────────────────────
        ConfigCommand::Use { name } => {
            let mut cfg = config::load_config_or_default();
            cfg.profile(&name)?;

            cfg.default_profile = Some(name.clone());
            save_config(&cfg)?;
            eprintln!("✓ Default profile set to '{name}'");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_lists_profiles_sorted() {
        let mut cfg = Config::default();
        let mut leste = Profile::new("http://leste.local/geoserver");
        leste.count_mode = Some(CountMode::Hits);
        cfg.profiles.insert("zona_leste".into(), leste);
        cfg.profiles
            .insert("centro".into(), Profile::new("http://centro.local/geoserver"));

        let out = format_config(&cfg);
        let centro = out.find("[profiles.centro]");
        let leste = out.find("[profiles.zona_leste]");
        assert!(centro.is_some() && leste.is_some());
        assert!(centro < leste);
        assert!(out.contains("count_mode = \"hits\""));
        assert!(out.contains("workspace = \"sp_dashboard\""));
    }
}
