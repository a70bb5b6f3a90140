//! Main entry point for the nodeadm CLI.
//!
//! This is the command-line interface for node configuration resolution.
//! It provides commands for:
//! - `config check`: Resolve and validate the configuration
//! - `config dump`: Resolve and print the configuration
//! - `init`: Resolve against the cache, enrich, validate and cache

mod cli;
mod commands;
mod error;
mod utils;

use clap::Parser;
use cli::{Cli, Command, ConfigCommand};
use utils::GlobalOptions;

fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let _level = nodeadm::init_logger(cli.verbose, cli.quiet);

    let global = GlobalOptions {
        verbose: cli.verbose,
        quiet: cli.quiet,
    };

    // Execute the command
    let result = match cli.command {
        Command::Config(ConfigCommand::Check(cmd)) => cmd.execute(&global),
        Command::Config(ConfigCommand::Dump(cmd)) => cmd.execute(&global),
        Command::Init(cmd) => cmd.execute(&global),
    };

    // Handle errors and set exit code
    match result {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(e.exit_code());
        }
    }
}
