//! CLI command implementations.
//!
//! This module contains the implementations of all CLI commands:
//! - `config check`: Resolve and validate the configuration
//! - `config dump`: Resolve and print the configuration
//! - `init`: Resolve against the cache, enrich, validate and cache

pub mod check;
pub mod dump;
pub mod init;

pub use check::CheckCommand;
pub use dump::DumpCommand;
pub use init::InitCommand;
