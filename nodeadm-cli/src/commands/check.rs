//! Command to check the resolved node configuration.

use crate::error::CliError;
use crate::utils::{build_chain, load_settings, resolve_sources, write_output, GlobalOptions, SourceArgs};
use clap::Args;
use nodeadm::config::ConfigValidator;
use nodeadm::{Codec, Format, Version};
use std::path::PathBuf;

/// Resolve the configuration from its sources and validate it.
#[derive(Args)]
pub struct CheckCommand {
    #[command(flatten)]
    pub sources: SourceArgs,

    /// Also write the resolved configuration as JSON to this path
    #[arg(short = 'o', long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

impl CheckCommand {
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let settings = load_settings()?;
        let sources = resolve_sources(&self.sources, &settings)?;
        let config = build_chain(&sources, &settings)?.provide()?.into_result()?;

        let mut problems = ConfigValidator::problems(&config).into_iter();
        if let Some(first) = problems.next() {
            for other in problems {
                log::error!("{other}");
            }
            return Err(first.into());
        }

        if let Some(path) = self.output.as_deref() {
            let data = Codec::default().encode(&config, Version::V1Alpha1, Format::Json)?;
            write_output(&data, Some(path))?;
        }

        if !global.quiet {
            println!("Configuration is valid");
            if global.verbose {
                for source in &sources {
                    println!("  source: {source}");
                }
            }
        }
        Ok(())
    }
}
