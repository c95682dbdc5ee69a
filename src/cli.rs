//! CLI argument parsing for the proposal gate.
//!
//! Every required setting can come from a flag or from the environment the
//! job runs in, so the same binary works locally and inside CI.
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

pub const DEFAULT_PROPOSALS_DIR: &str = "proposals";
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";

/// Root CLI entrypoint.
#[derive(Parser, Debug)]
#[command(
    name = "pgate",
    version,
    about = "Validate, moderate and submit proposal documents",
    after_help = "Commands:\n  check   Validate and moderate proposals, print the checklist, never submit\n  run     Validate, moderate and submit every proposal that passes\n\nExamples:\n  API_URL=https://registry.example/api/ pgate check\n  pgate run --proposals-dir proposals --repository acme/plugins",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct RootArgs {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    Run(RunArgs),
    Check(CheckArgs),
}

impl Command {
    pub fn verbose(&self) -> bool {
        match self {
            Command::Run(args) => args.source.verbose,
            Command::Check(args) => args.source.verbose,
        }
    }
}

/// Inputs shared by every command.
#[derive(Args, Debug)]
pub struct SourceArgs {
    /// Directory containing proposal documents
    #[arg(long, value_name = "DIR", default_value = DEFAULT_PROPOSALS_DIR)]
    pub proposals_dir: PathBuf,

    /// Process only these documents instead of the whole directory
    #[arg(long = "file", value_name = "PATH")]
    pub files: Vec<PathBuf>,

    /// Base URL of the proposal registry API
    #[arg(long, value_name = "URL", env = "API_URL")]
    pub api_url: Option<String>,

    /// Log every received field and registry call
    #[arg(long)]
    pub verbose: bool,
}

/// Check command inputs: report only.
#[derive(Parser, Debug)]
#[command(about = "Validate and moderate proposals without submitting them")]
pub struct CheckArgs {
    #[command(flatten)]
    pub source: SourceArgs,
}

/// Run command inputs: report and submit.
#[derive(Parser, Debug)]
#[command(about = "Validate, moderate and submit proposals")]
pub struct RunArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Token for the source-control API (falls back to GITHUB_TOKEN)
    #[arg(long, value_name = "TOKEN", env = "GH_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Repository the proposals live in, as owner/name
    #[arg(long, value_name = "OWNER/NAME", env = "GITHUB_REPOSITORY")]
    pub repository: Option<String>,

    /// Base URL of the source-control API
    #[arg(long, value_name = "URL", env = "GITHUB_API_URL", default_value = DEFAULT_GITHUB_API_URL)]
    pub github_api_url: String,
}
