//! Command line interface for gitflow_release.
//!
//! Parses the arguments, sets up logging and runs the selected operation.

mod args;
pub mod commands;
mod output;

pub use args::{Args, Operation, RuntimeConfig, VersionSource};
pub use commands::execute_command;
pub use output::OutputManager;

use crate::error::Result;
use env_logger::Env;

/// Main CLI entry point
pub async fn run() -> Result<i32> {
    let args = Args::parse_args();
    init_logging(args.debug);
    execute_command(args).await
}

/// Initialise `env_logger`. `RUST_LOG` wins over `--debug`.
pub fn init_logging(debug: bool) {
    let default_filter = if debug { "debug" } else { "warn" };
    let _ = env_logger::Builder::from_env(Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .try_init();
}
