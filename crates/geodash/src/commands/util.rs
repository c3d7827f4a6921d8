//! Shared helpers for command handlers.

use std::io::IsTerminal;
use std::time::Duration;

use geodash_core::{CoreError, Dashboard};
use indicatif::{ProgressBar, ProgressStyle};

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, action: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: action.into(),
        });
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    Ok(confirmed)
}

/// Stderr spinner for slow server round-trips. Hidden when quiet or piped.
pub fn spinner(message: &str, global: &GlobalOpts) -> ProgressBar {
    if global.quiet || !std::io::stderr().is_terminal() {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_owned());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Probe every layer once behind a spinner.
pub async fn refresh(dashboard: &Dashboard, global: &GlobalOpts) -> usize {
    let pb = spinner("Probing layers...", global);
    let updated = dashboard.refresh_now().await;
    pb.finish_and_clear();
    updated
}

/// Hide each listed layer. Unavailable layers are never drawn, so they are skipped.
pub fn hide_layers(dashboard: &Dashboard, keys: &[String]) -> Result<(), CliError> {
    for key in keys {
        match dashboard.set_visible(key, false) {
            Ok(_) => {}
            Err(CoreError::LayerUnavailable { .. }) => {
                tracing::debug!(layer = %key, "skipping hide of unavailable layer");
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}
