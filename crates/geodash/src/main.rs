mod cli;
mod commands;
mod config;
mod error;
mod output;

use std::process::ExitCode;

use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use geodash_core::Dashboard;

use crate::cli::{Cli, Command, GlobalOpts};
use crate::error::CliError;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli.global);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let code = u8::try_from(err.exit_code()).unwrap_or(1);
            eprintln!("{:?}", miette::Report::new(err));
            ExitCode::from(code)
        }
    }
}

/// Logs go to stderr; `RUST_LOG` wins over `-v`/`-q`.
fn init_tracing(global: &GlobalOpts) {
    let level = match (global.quiet, global.verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        (false, _) => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(global.verbose > 2)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let Cli { global, command } = cli;

    let command = match command {
        Command::Config(args) => return commands::config_cmd::handle(args, &global),
        Command::Completions(args) => {
            clap_complete::generate(args.shell, &mut Cli::command(), "geodash", &mut std::io::stdout());
            return Ok(());
        }
        other => other,
    };

    let dashboard = Dashboard::new(config::resolve_dashboard_config(&global)?)?;
    tracing::debug!(
        server = %dashboard.config().base_url,
        workspace = %dashboard.config().workspace,
        "dispatching {command:?}"
    );

    // Stop any polling the command started even when it failed.
    let result = commands::dispatch(command, &dashboard, &global).await;
    dashboard.shutdown().await;
    result
}
