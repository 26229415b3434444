//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

use shimreg::{HostPlatform, ReleaseChannel, ResourceType};

/// shimreg - registry and dispatch engine for web compatibility shims
#[derive(Parser)]
#[command(name = "shimreg")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Shim table to load instead of the built-in one (TOML, or JSON by extension)
    #[arg(long, global = true, env = "SHIMREG_TABLE")]
    pub table: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load and validate a shim table
    Check(CheckArgs),

    /// List shims that apply in an environment
    List(ListArgs),

    /// Show what would happen to a request
    Dispatch(DispatchArgs),

    /// Check whether an opt-in lets a blocked URL through
    Unblock(UnblockArgs),

    /// Print a shim's resolved options as JSON
    Options(OptionsArgs),

    /// Explain why a shim does or doesn't apply
    Explain(ExplainArgs),

    /// Dispatch every request in a log file
    Simulate(SimulateArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Environment flags shared by the evaluating commands.
#[derive(Args, Clone, Default)]
pub struct EnvArgs {
    /// Host platform (desktop, android)
    #[arg(long)]
    pub platform: Option<HostPlatform>,

    /// Release channel (nightly, aurora, beta, release, esr)
    #[arg(long)]
    pub channel: Option<ReleaseChannel>,

    /// Page making the request: a host or a full URL
    #[arg(long, value_name = "HOST|URL")]
    pub page: Option<String>,

    /// Treat requests as blocked by tracking protection
    #[arg(long)]
    pub etp_blocked: bool,

    /// Opt into a shim (repeatable)
    #[arg(long = "opt-in", value_name = "ID")]
    pub opt_in: Vec<String>,
}

#[derive(Args)]
pub struct CheckArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct ListArgs {
    /// List every registered shim, ignoring eligibility
    #[arg(long)]
    pub all: bool,

    #[command(flatten)]
    pub env: EnvArgs,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct DispatchArgs {
    /// Request URL
    pub url: String,

    /// Resource type of the request
    #[arg(short = 't', long = "type", default_value = "script")]
    pub resource_type: ResourceType,

    /// Show every matching shim, not just the one that wins
    #[arg(long)]
    pub all: bool,

    #[command(flatten)]
    pub env: EnvArgs,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct UnblockArgs {
    /// Blocked URL
    pub url: String,

    /// Resource type of the request
    #[arg(short = 't', long = "type", default_value = "script")]
    pub resource_type: ResourceType,

    #[command(flatten)]
    pub env: EnvArgs,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct OptionsArgs {
    /// Shim id
    pub id: String,

    #[command(flatten)]
    pub env: EnvArgs,
}

#[derive(Args)]
pub struct ExplainArgs {
    /// Shim id
    pub id: String,

    /// Also test this URL against the shim's match entries
    #[arg(long)]
    pub url: Option<String>,

    /// Resource type used with --url
    #[arg(short = 't', long = "type", default_value = "script")]
    pub resource_type: ResourceType,

    #[command(flatten)]
    pub env: EnvArgs,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct SimulateArgs {
    /// Request log, one `<url> <type> [<page>]` per line (`-` for stdin)
    pub file: PathBuf,

    #[command(flatten)]
    pub env: EnvArgs,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: Shell,
}
