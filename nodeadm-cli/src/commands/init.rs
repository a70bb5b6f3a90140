//! Init command implementation.
//!
//! This module implements the `init` command: resolve the configuration
//! against the cache, enrich it when the spec changed, validate it, and
//! cache the result.

use crate::error::CliError;
use crate::utils::{build_chain, load_settings, resolve_sources, GlobalOptions, SourceArgs};
use clap::Args;
use nodeadm::config::{ConfigCache, ConfigResolver};
use nodeadm::imds::ImdsClient;
use nodeadm::{Cancellation, Codec, Enricher, ImdsEnricher, NoopEnricher};
use std::path::PathBuf;
use std::sync::Arc;

/// Resolve, enrich, validate and cache the node configuration.
#[derive(Args)]
pub struct InitCommand {
    #[command(flatten)]
    pub sources: SourceArgs,

    /// Location of the config cache
    #[arg(long, value_name = "PATH")]
    pub config_cache: Option<PathBuf>,

    /// Do not query the metadata service for instance details
    #[arg(long)]
    pub skip_enrichment: bool,
}

impl InitCommand {
    /// Execute the init command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let settings = load_settings()?;
        let sources = resolve_sources(&self.sources, &settings)?;
        let chain = build_chain(&sources, &settings)?;

        let cache_path = self
            .config_cache
            .unwrap_or_else(|| settings.config_cache.clone());
        let cache = ConfigCache::new(&cache_path, Codec::default());
        let resolver = ConfigResolver::new(chain, Some(cache));

        let enricher: Box<dyn Enricher> = if self.skip_enrichment {
            Box::new(NoopEnricher)
        } else {
            let client = ImdsClient::new(&settings.imds)?;
            Box::new(ImdsEnricher::new(Arc::new(client), Cancellation::new()))
        };

        let resolution = resolver.resolve_and_enrich(enricher.as_ref())?;

        if !global.quiet {
            let state = match (resolution.was_cache_hit, resolution.needs_enrichment) {
                (true, false) => "unchanged",
                (true, true) => "updated",
                (false, _) => "created",
            };
            println!(
                "Configuration for cluster {} {state} ({})",
                resolution.config.spec.cluster.name,
                cache_path.display()
            );
        }
        Ok(())
    }
}
