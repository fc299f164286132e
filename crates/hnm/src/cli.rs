//! Clap derive structures for the `hnm` CLI.
//!
//! Defines the command tree, global flags, and shared value enums.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// hnm -- interface telemetry and topology discovery over SNMP
#[derive(Debug, Parser)]
#[command(
    name = "hnm",
    version,
    about = "Sample interface traffic and map network topology over SNMP",
    long_about = "Polls interface counters from a fleet of network devices, turns them into\n\
        per-interface bit rates, and discovers the links between devices from\n\
        LLDP and MikroTik neighbor tables.",
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
    /// Config file (defaults to $HNM_CONFIG_PATH or the platform config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "HNM_OUTPUT",
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

    /// Log line format on stderr
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,
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

#[derive(Debug, Clone, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the polling engine until interrupted
    Run(RunArgs),

    /// Sample devices for a few rounds and print interface rates
    #[command(alias = "p")]
    Poll(PollArgs),

    /// Discover neighbor links across the fleet
    #[command(alias = "disc")]
    Discover(DiscoverArgs),

    /// Inspect the stored topology
    #[command(alias = "topo")]
    Topology(TopologyArgs),

    /// Manage the configuration file
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Run ──────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Rediscover the topology before the first cycle and save it
    #[arg(long)]
    pub discover: bool,
}

// ── Poll ─────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct PollArgs {
    /// Devices to sample (defaults to the whole fleet)
    pub devices: Vec<String>,

    /// Sampling rounds; rates need at least two
    #[arg(long, short = 'n', default_value = "2")]
    pub rounds: u32,

    /// Seconds between rounds (defaults to poller.live)
    #[arg(long, short = 'i')]
    pub interval: Option<u64>,
}

// ── Discover ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct DiscoverArgs {
    /// Write the result to the topology document
    #[arg(long)]
    pub save: bool,
}

// ── Topology ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct TopologyArgs {
    #[command(subcommand)]
    pub command: TopologyCommand,
}

#[derive(Debug, Subcommand)]
pub enum TopologyCommand {
    /// List links from the topology document
    #[command(alias = "ls")]
    Show,

    /// Show which link type an interface label maps to
    Classify {
        /// Interface labels, e.g. sfp-sfpplus1
        #[arg(required = true)]
        labels: Vec<String>,
    },
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Write a starter config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Display the resolved configuration (secrets masked)
    Show,

    /// Print the config file path
    Path,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
