use super::args::*;
use arena_core::config::{self, ArenaConfig};
use arena_core::errors::ConfigError;
use std::path::Path;

pub mod init;
pub mod normalize;
pub mod validate;

pub mod exit_codes {
    pub const OK: i32 = 0;
    pub const PROBLEMS: i32 = 1;
    pub const CONFIG_ERROR: i32 = 2;
}

pub fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    match cli.cmd {
        Command::Normalize(args) => normalize::run(args),
        Command::Validate(args) => validate::run(args),
        Command::Init(args) => init::run(args),
        Command::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(exit_codes::OK)
        }
    }
}

/// Loads `path`, or falls back to the built-in catalogue when it is absent.
/// Default paths are then relative to the working directory.
pub(crate) fn load_or_default(path: &Path, strict: bool) -> Result<ArenaConfig, ConfigError> {
    if path.exists() {
        config::load_config(path, strict)
    } else {
        tracing::info!(
            event = "arena.config.default",
            path = %path.display(),
            "config file not found; using built-in catalogue"
        );
        Ok(ArenaConfig::default())
    }
}
