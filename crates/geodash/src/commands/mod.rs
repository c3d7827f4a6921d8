//! Command dispatch: bridges CLI args -> dashboard operations -> output formatting.

pub mod config_cmd;
pub mod diagnose;
pub mod info;
pub mod layers;
pub mod probe;
pub mod report;
pub mod tiles;
pub mod util;
pub mod watch;

use geodash_core::Dashboard;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a server-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    dashboard: &Dashboard,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Layers(args) => layers::handle(dashboard, args, global).await,
        Command::Watch(args) => watch::handle(dashboard, args, global).await,
        Command::Probe(args) => probe::handle(dashboard, args, global).await,
        Command::Tiles(args) => tiles::handle(dashboard, args, global).await,
        Command::Info(args) => info::handle(dashboard, args, global).await,
        Command::Report(args) => report::handle(dashboard, args, global).await,
        Command::Diagnose => diagnose::handle(dashboard, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}
