//! Clap derive structures for the `omctl` CLI.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// omctl -- control OpenMotics installations from the command line
#[derive(Debug, Parser)]
#[command(
    name = "omctl",
    version,
    about = "Control OpenMotics installations from the command line",
    long_about = "Talks to the OpenMotics cloud API or directly to a local gateway,\n\
        depending on the backend of the selected profile.",
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
    /// Profile to use
    #[arg(long, short = 'p', env = "OPENMOTICS_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Output format
    #[arg(long, short = 'o', default_value = "json", global = true)]
    pub output: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Accept invalid TLS certificates
    #[arg(long, short = 'k', global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, global = true)]
    pub timeout: Option<u64>,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// Pretty table
    Table,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List cloud installations
    #[command(alias = "inst")]
    Installations(InstallationsArgs),

    /// List and switch outputs
    #[command(alias = "out")]
    Outputs(OutputsArgs),

    /// List and move shutters
    Shutters(ShuttersArgs),

    /// List sensors
    Sensors(SensorsArgs),

    /// List and trigger group actions
    #[command(alias = "ga")]
    Groupactions(GroupActionsArgs),

    /// Inspect and select configuration profiles
    Config(ConfigArgs),
}

// ── Installations ────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct InstallationsArgs {
    #[command(subcommand)]
    pub command: InstallationsCommand,
}

#[derive(Debug, Subcommand)]
pub enum InstallationsCommand {
    /// List installations visible to the token
    #[command(alias = "ls")]
    List,
}

// ── Outputs ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct OutputsArgs {
    #[command(subcommand)]
    pub command: OutputsCommand,
}

#[derive(Debug, Subcommand)]
pub enum OutputsCommand {
    /// List outputs with their status
    #[command(alias = "ls")]
    List,

    /// Switch an output on
    On {
        /// Output id
        id: u64,

        /// Dimmer level (0-100)
        #[arg(long)]
        value: Option<i64>,
    },

    /// Switch an output off
    Off {
        /// Output id
        id: u64,
    },

    /// Flip an output
    Toggle {
        /// Output id
        id: u64,
    },
}

// ── Shutters ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ShuttersArgs {
    #[command(subcommand)]
    pub command: ShuttersCommand,
}

#[derive(Debug, Subcommand)]
pub enum ShuttersCommand {
    /// List shutters with their status
    #[command(alias = "ls")]
    List,

    /// Open a shutter
    Up {
        /// Shutter id
        id: u64,
    },

    /// Close a shutter
    Down {
        /// Shutter id
        id: u64,
    },

    /// Stop a moving shutter
    Stop {
        /// Shutter id
        id: u64,
    },
}

// ── Sensors ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct SensorsArgs {
    #[command(subcommand)]
    pub command: SensorsCommand,
}

#[derive(Debug, Subcommand)]
pub enum SensorsCommand {
    /// List sensors with their readings
    #[command(alias = "ls")]
    List,
}

// ── Group actions ────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GroupActionsArgs {
    #[command(subcommand)]
    pub command: GroupActionsCommand,
}

#[derive(Debug, Subcommand)]
pub enum GroupActionsCommand {
    /// List group actions
    #[command(alias = "ls")]
    List,

    /// Run a group action
    Trigger {
        /// Group action id
        id: u64,
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
    /// Print the config file location
    Path,

    /// List configured profiles (* marks the default)
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },
}
