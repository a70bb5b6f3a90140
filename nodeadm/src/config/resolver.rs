//! Configuration resolution against the cache.
//!
//! Resolution runs the provider chain and compares the result with the
//! cached configuration. An unchanged spec reuses the cached status, so
//! enrichment only runs when the declared configuration moves.

use log::{info, warn};

use crate::api::types::NodeConfig;
use crate::config::cache::ConfigCache;
use crate::config::validator::ConfigValidator;
use crate::enrich::Enricher;
use crate::error::{Error, Result};
use crate::provider::{ChainOutcome, ProviderChain};

/// Outcome of [`ConfigResolver::resolve`].
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    /// The configuration to use.
    pub config: NodeConfig,
    /// Whether a cached configuration existed.
    pub was_cache_hit: bool,
    /// Whether the caller must enrich and re-cache `config`.
    pub needs_enrichment: bool,
}

/// Resolves configuration from a provider chain, with an optional cache.
pub struct ConfigResolver {
    chain: ProviderChain,
    cache: Option<ConfigCache>,
}

impl ConfigResolver {
    /// A resolver over a chain. Without a cache, every resolution needs
    /// enrichment.
    #[must_use]
    pub fn new(chain: ProviderChain, cache: Option<ConfigCache>) -> Self {
        Self { chain, cache }
    }

    /// Resolves the configuration.
    ///
    /// 1. Load the cache; a load failure counts as no cache.
    /// 2. Run the chain.
    /// 3. Nothing found: fall back to the cache, or fail without one.
    /// 4. Found, and the spec equals the cached spec: use the cache.
    /// 5. Otherwise use the fresh configuration, which needs enrichment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoConfigInChain`] if nothing was found and there is
    /// no cache, or the chain's error if a provider failed.
    pub fn resolve(&self) -> Result<Resolution> {
        let cached = self.load_cache();

        match (self.chain.provide()?, cached) {
            (ChainOutcome::NoConfigInChain, Some(cached)) => {
                info!("no config found in sources, using cached config");
                Ok(Resolution {
                    config: cached,
                    was_cache_hit: true,
                    needs_enrichment: false,
                })
            }
            (ChainOutcome::NoConfigInChain, None) => Err(Error::NoConfigInChain),
            (ChainOutcome::Merged(fresh), Some(cached)) if fresh.spec == cached.spec => {
                info!("config is unchanged since it was cached");
                Ok(Resolution {
                    config: cached,
                    was_cache_hit: true,
                    needs_enrichment: false,
                })
            }
            (ChainOutcome::Merged(fresh), cached) => {
                if cached.is_some() {
                    info!("config changed since it was cached");
                }
                Ok(Resolution {
                    config: *fresh,
                    was_cache_hit: cached.is_some(),
                    needs_enrichment: true,
                })
            }
        }
    }

    /// Resolves, enriches if needed, validates, and caches the enriched
    /// result.
    ///
    /// Validation runs on every call, cache hits included, and before
    /// anything is written.
    ///
    /// # Errors
    ///
    /// Returns resolution, enrichment, validation or cache write errors.
    pub fn resolve_and_enrich(&self, enricher: &dyn Enricher) -> Result<Resolution> {
        let mut resolution = self.resolve()?;
        if resolution.needs_enrichment {
            enricher.enrich(&mut resolution.config)?;
        }
        ConfigValidator::validate(&resolution.config)?;
        if resolution.needs_enrichment {
            if let Some(cache) = &self.cache {
                cache.save(&resolution.config)?;
            }
        }
        Ok(resolution)
    }

    fn load_cache(&self) -> Option<NodeConfig> {
        let cache = self.cache.as_ref()?;
        match cache.load() {
            Ok(cached) => cached,
            Err(e) => {
                warn!(
                    "ignoring unreadable config cache {}: {e}",
                    cache.path().display()
                );
                None
            }
        }
    }
}
