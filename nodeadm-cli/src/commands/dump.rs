//! Command to print the resolved node configuration.

use crate::error::CliError;
use crate::utils::{
    build_chain, load_settings, resolve_sources, write_output, GlobalOptions, OutputFormat,
    SourceArgs,
};
use clap::Args;
use nodeadm::{Codec, Version};
use std::path::PathBuf;

/// Resolve the configuration from its sources and print it.
///
/// The result is not validated, so partial configurations can be inspected.
#[derive(Args)]
pub struct DumpCommand {
    #[command(flatten)]
    pub sources: SourceArgs,

    /// Write to this path instead of stdout
    #[arg(short = 'o', long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Print the user-facing v1alpha1 document instead of the internal one
    #[arg(long)]
    pub external: bool,
}

impl DumpCommand {
    pub fn execute(self, _global: &GlobalOptions) -> Result<(), CliError> {
        let settings = load_settings()?;
        let sources = resolve_sources(&self.sources, &settings)?;
        let config = build_chain(&sources, &settings)?.provide()?.into_result()?;

        let version = if self.external {
            Version::V1Alpha1
        } else {
            Version::Internal
        };
        let data = Codec::default().encode(&config, version, self.format.into())?;
        write_output(&data, self.output.as_deref())
    }
}
