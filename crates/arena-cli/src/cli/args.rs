use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "arena",
    version,
    about = "Normalizes WebArena submission trajectories into dashboard datasets"
)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Command,

    /// emit logs as JSON lines on stderr (filter with ARENA_LOG)
    #[arg(long, global = true)]
    pub log_json: bool,
}

#[derive(Subcommand)]
pub enum Command {
    Normalize(NormalizeArgs),
    Validate(ValidateArgs),
    Init(InitArgs),
    Version,
}

#[derive(Parser, Clone)]
pub struct NormalizeArgs {
    /// config file; the built-in catalogue is used when it does not exist
    #[arg(long, default_value = "arena.yaml")]
    pub config: PathBuf,

    #[arg(long)]
    pub tasks: Option<PathBuf>,

    #[arg(long)]
    pub leaderboard: Option<PathBuf>,

    #[arg(long)]
    pub trajectories: Option<PathBuf>,

    #[arg(long)]
    pub out: Option<PathBuf>,

    /// reject unknown config keys and exit 1 when a model has no leaderboard match
    #[arg(long)]
    pub strict: bool,

    /// only print the final summary line and warnings
    #[arg(long)]
    pub quiet: bool,
}

#[derive(Parser, Clone)]
pub struct ValidateArgs {
    #[arg(long, default_value = "arena.yaml")]
    pub config: PathBuf,

    #[arg(long, value_enum, default_value_t = ValidateFormat::Text)]
    pub format: ValidateFormat,

    #[arg(long)]
    pub strict: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValidateFormat {
    Text,
    Json,
}

#[derive(Parser, Clone)]
pub struct InitArgs {
    #[arg(long, default_value = "arena.yaml")]
    pub config: PathBuf,
}
