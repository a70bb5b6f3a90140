//! CLI structure and command definitions.
//!
//! This module defines the main CLI structure using clap's derive macros,
//! including global options and subcommands.

use crate::commands::{CheckCommand, DumpCommand, InitCommand};
use clap::{Parser, Subcommand};

/// Command-line tool for resolving node bootstrap configuration.
#[derive(Parser)]
#[command(name = "nodeadm")]
#[command(version, about = "Resolve and check node bootstrap configuration", long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand)]
pub enum Command {
    /// Inspect the node configuration
    #[command(subcommand)]
    Config(ConfigCommand),

    /// Resolve, enrich, validate and cache the node configuration
    Init(InitCommand),
}

/// Configuration subcommands.
#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Resolve and validate the configuration
    Check(CheckCommand),

    /// Resolve and print the configuration
    Dump(DumpCommand),
}
