//! Utility functions for CLI operations.
//!
//! This module provides helpers shared across commands: loading agent
//! settings, building the provider chain, and writing output.

use crate::error::CliError;
use clap::{Args, ValueEnum};
use nodeadm::config::Settings;
use nodeadm::imds::ImdsClient;
use nodeadm::provider::{ProviderChain, ProviderContext};
use nodeadm::{Cancellation, Format};
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;

/// Global CLI options shared across all commands.
#[derive(Debug, Clone)]
pub struct GlobalOptions {
    /// Enable verbose output.
    pub verbose: bool,

    /// Suppress non-essential output.
    pub quiet: bool,
}

/// Config source selection shared by every command.
#[derive(Args, Debug, Clone, Default)]
pub struct SourceArgs {
    /// Config source URI; repeat to merge several, lowest precedence first
    #[arg(short = 'c', long = "config-source", value_name = "URI")]
    pub config_sources: Vec<String>,
}

/// Output syntax.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Pretty-printed JSON
    #[default]
    Json,
    /// YAML
    Yaml,
}

impl From<OutputFormat> for Format {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Json => Format::Json,
            OutputFormat::Yaml => Format::Yaml,
        }
    }
}

/// Load agent settings from the environment.
pub fn load_settings() -> Result<Settings, CliError> {
    Settings::from_env().map_err(CliError::Settings)
}

/// Sources from the command line, falling back to settings.
pub fn resolve_sources(args: &SourceArgs, settings: &Settings) -> Result<Vec<String>, CliError> {
    if args.config_sources.is_empty() {
        return Ok(settings.config_sources.clone());
    }
    if args.config_sources.iter().any(|s| s.trim().is_empty()) {
        return Err(CliError::InvalidArguments(
            "--config-source must not be empty".to_string(),
        ));
    }
    Ok(args.config_sources.clone())
}

/// Build the provider chain for the given sources.
///
/// The metadata client is created up front but makes no request unless an
/// `imds` source is read.
pub fn build_chain(sources: &[String], settings: &Settings) -> Result<ProviderChain, CliError> {
    let client = ImdsClient::new(&settings.imds)?;
    let context = ProviderContext::new(Arc::new(client)).with_cancellation(Cancellation::new());
    log::debug!("config sources: {}", sources.join(", "));
    Ok(ProviderChain::from_sources(sources, &context)?)
}

/// Write bytes to a file, or to stdout when no path is given.
pub fn write_output(data: &[u8], output: Option<&Path>) -> Result<(), CliError> {
    match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, data)?;
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(data)?;
            stdout.flush()?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_sources_prefers_flags() {
        let settings = Settings::default();
        let args = SourceArgs {
            config_sources: vec!["file:///tmp/a.yaml".into()],
        };
        assert_eq!(
            resolve_sources(&args, &settings).unwrap(),
            vec!["file:///tmp/a.yaml"]
        );
        assert_eq!(
            resolve_sources(&SourceArgs::default(), &settings).unwrap(),
            vec!["imds://user-data"]
        );
    }

    #[test]
    fn test_resolve_sources_rejects_blank_flag() {
        let args = SourceArgs {
            config_sources: vec![" ".into()],
        };
        let err = resolve_sources(&args, &Settings::default()).unwrap_err();
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn test_build_chain_rejects_unknown_scheme() {
        let err = build_chain(&["gopher://x".to_string()], &Settings::default())
            .err()
            .unwrap();
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn test_write_output_to_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("out/config.json");
        write_output(b"{}", Some(&path)).unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"{}");
    }
}
