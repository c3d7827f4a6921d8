//! Clap derive structures for the `geodash` CLI.
//!
//! Defines the command tree, global flags, and shared value enums. Kept free
//! of crate-internal types so `build.rs` can include it for man pages.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// geodash -- layer availability and reports for a municipal GeoServer
#[derive(Debug, Parser)]
#[command(
    name = "geodash",
    version,
    about = "Monitor GeoServer layers, render maps and build reports from the command line",
    long_about = "Tracks which WMS/WFS layers of a GeoServer workspace are reachable,\n\
        how many features each holds, and what lies under a map position.\n\n\
        Talks to GeoServer over plain OGC requests: WMS GetCapabilities,\n\
        GetMap and GetFeatureInfo, WFS GetCapabilities and GetFeature.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Server profile to use
    #[arg(long, short = 'p', env = "GEODASH_PROFILE", global = true)]
    pub profile: Option<String>,

    /// GeoServer root URL (overrides profile)
    #[arg(long, short = 'S', env = "GEODASH_SERVER", global = true)]
    pub server: Option<String>,

    /// GeoServer workspace (overrides profile)
    #[arg(long, short = 'w', env = "GEODASH_WORKSPACE", global = true)]
    pub workspace: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "GEODASH_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept invalid TLS certificates
    #[arg(long, short = 'k', env = "GEODASH_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "GEODASH_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Probe and list tracked layers
    #[command(alias = "l")]
    Layers(LayersArgs),

    /// Poll layer availability until interrupted
    Watch(WatchArgs),

    /// Ask GeoServer one question directly
    Probe(ProbeArgs),

    /// Show the tile layers a map would draw
    Tiles(TilesArgs),

    /// Identify the feature at a map position
    Info(InfoArgs),

    /// Generate a status or inventory report
    Report(ReportArgs),

    /// Run the server connectivity checklist
    #[command(alias = "diag")]
    Diagnose,

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Layers ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct LayersArgs {
    #[command(subcommand)]
    pub command: LayersCommand,
}

#[derive(Debug, Subcommand)]
pub enum LayersCommand {
    /// Probe every layer once and list availability
    #[command(alias = "ls")]
    List,

    /// Probe one layer and show its state
    Status {
        /// Layer key (e.g. "ubs")
        key: String,
    },
}

// ── Watch ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Poll interval in seconds (overrides profile)
    #[arg(long, short = 'i')]
    pub interval: Option<u64>,

    /// Use the slower report-dashboard interval
    #[arg(long, conflicts_with = "interval")]
    pub report_cadence: bool,

    /// Exit after this many completed rounds
    #[arg(long, short = 'n')]
    pub rounds: Option<u64>,
}

// ── Probe ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ProbeArgs {
    #[command(subcommand)]
    pub command: ProbeCommand,
}

#[derive(Debug, Subcommand)]
pub enum ProbeCommand {
    /// WMS GetCapabilities: advertised layer names
    #[command(alias = "caps")]
    Capabilities,

    /// WFS GetCapabilities: advertised feature types
    FeatureTypes,

    /// Feature count of one layer
    Count {
        /// Layer key
        key: String,
    },

    /// Fetch one feature of a layer as GeoJSON
    Sample {
        /// Layer key
        key: String,
    },
}

// ── Tiles ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct TilesArgs {
    /// Hide these layers before building the plan
    #[arg(long, value_delimiter = ',')]
    pub hide: Vec<String>,

    /// Print a GetMap URL per overlay for this extent (minx,miny,maxx,maxy)
    #[arg(long, allow_hyphen_values = true)]
    pub bbox: Option<String>,

    /// Image width in pixels for GetMap URLs
    #[arg(long, default_value = "256")]
    pub width: u32,

    /// Image height in pixels for GetMap URLs
    #[arg(long, default_value = "256")]
    pub height: u32,
}

// ── Info ─────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct InfoArgs {
    /// Latitude in degrees
    #[arg(allow_hyphen_values = true)]
    pub lat: f64,

    /// Longitude in degrees
    #[arg(allow_hyphen_values = true)]
    pub lng: f64,

    /// Map zoom level the position is queried at
    #[arg(long, short = 'z')]
    pub zoom: Option<u8>,

    /// Viewport width in pixels
    #[arg(long, default_value = "800")]
    pub width: u32,

    /// Viewport height in pixels
    #[arg(long, default_value = "600")]
    pub height: u32,

    /// Hide these layers before querying
    #[arg(long, value_delimiter = ',')]
    pub hide: Vec<String>,
}

// ── Report ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ReportArgs {
    /// Report type
    #[arg(value_enum)]
    pub kind: ReportKindArg,

    /// File format (status defaults to html, inventory to csv)
    #[arg(long, short = 'f', value_enum)]
    pub format: Option<ReportFormatArg>,

    /// Write to this file or directory instead of the current directory
    #[arg(long = "out", short = 'O')]
    pub out: Option<PathBuf>,

    /// Print the report to stdout instead of writing a file
    #[arg(long, conflicts_with = "out")]
    pub stdout: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ReportKindArg {
    /// Connection status of every layer
    Status,
    /// Geospatial data inventory
    Inventory,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ReportFormatArg {
    Html,
    Csv,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create initial config file with guided setup
    Init,

    /// Display current resolved configuration
    Show,

    /// Print the config file location
    Path,

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
