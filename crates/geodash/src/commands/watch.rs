//! `watch`: run a polling session and print availability changes.

use std::collections::HashMap;
use std::time::Duration;

use chrono::Local;
use geodash_core::{Dashboard, LayerStatus, LayerView};

use crate::cli::{GlobalOpts, OutputFormat, WatchArgs};
use crate::error::CliError;
use crate::output;

/// What a watcher reports on: availability and feature count.
type Observed = (bool, u64);

pub async fn handle(
    dashboard: &Dashboard,
    args: WatchArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let custom;
    let dashboard = match session_config(dashboard, &args)? {
        Some(config) => {
            custom = Dashboard::new(config)?;
            &custom
        }
        None => dashboard,
    };
    let color = output::should_color(&global.color);

    if !global.quiet {
        eprintln!(
            "Watching {} layers every {} (Ctrl-C to stop)",
            dashboard.layers().len(),
            humantime::format_duration(dashboard.config().poll_interval)
        );
    }

    let mut stream = dashboard.subscribe();
    dashboard.start().await;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut seen: HashMap<String, Observed> = HashMap::new();
    let mut rounds = 0u64;
    let mut last_round = None;

    loop {
        let snap = tokio::select! {
            biased;
            _ = &mut ctrl_c => break,
            snap = stream.changed() => match snap {
                Some(snap) => snap,
                None => break,
            },
        };

        if snap.iter().any(|v| v.state.status == LayerStatus::Checking) {
            continue;
        }

        for view in snap.iter() {
            let observed = (view.state.available, view.state.feature_count);
            if seen.insert(view.key().to_owned(), observed) != Some(observed) {
                output::print_output(&change_line(view, &global.output, color), global.quiet);
            }
        }

        // Each finished round stamps its layers, so the newest stamp advances once per round.
        let newest = snap.iter().filter_map(|v| v.state.last_checked_at).max();
        if newest > last_round {
            last_round = newest;
            rounds += 1;
            if args.rounds.is_some_and(|limit| rounds >= limit) {
                break;
            }
        }
    }

    dashboard.shutdown().await;
    tracing::info!(rounds, "watch finished");
    Ok(())
}

/// A replacement session config when `--interval` or `--report-cadence` is given.
fn session_config(
    dashboard: &Dashboard,
    args: &WatchArgs,
) -> Result<Option<geodash_core::DashboardConfig>, CliError> {
    if args.report_cadence {
        return Ok(Some(dashboard.config().for_reports()));
    }
    match args.interval {
        None => Ok(None),
        Some(0) => Err(CliError::Validation {
            field: "interval".into(),
            reason: "must be at least 1 second".into(),
        }),
        Some(secs) => {
            let mut config = dashboard.config().clone();
            config.poll_interval = Duration::from_secs(secs);
            Ok(Some(config))
        }
    }
}

fn change_line(view: &LayerView, format: &OutputFormat, color: bool) -> String {
    let state = &view.state;
    match format {
        OutputFormat::Table => format!(
            "{}  {:<16} {:<14} {} features",
            Local::now().format("%H:%M:%S"),
            view.key(),
            output::availability_label(state.available, color),
            state.feature_count,
        ),
        OutputFormat::Plain => {
            format!("{}\t{}\t{}", view.key(), state.available, state.feature_count)
        }
        // One JSON document per line so the stream stays parseable.
        OutputFormat::Json | OutputFormat::JsonCompact | OutputFormat::Yaml => {
            output::render_single(&OutputFormat::JsonCompact, view, |_| String::new(), |_| {
                String::new()
            })
        }
    }
}
