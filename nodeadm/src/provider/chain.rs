//! Ordered chain of providers.

use log::{debug, info};

use crate::api::types::NodeConfig;
use crate::config::merger::ConfigMerger;
use crate::error::{Error, Result};
use crate::provider::{build_provider, ConfigProvider, ProviderContext, ProviderOutcome};

/// Result of running a chain.
#[derive(Debug, Clone, PartialEq)]
pub enum ChainOutcome {
    /// At least one provider found a configuration; all of them merged.
    Merged(Box<NodeConfig>),
    /// Every provider came back empty.
    NoConfigInChain,
}

impl ChainOutcome {
    /// The merged configuration, or [`Error::NoConfigInChain`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoConfigInChain`] if nothing was found.
    pub fn into_result(self) -> Result<NodeConfig> {
        match self {
            Self::Merged(config) => Ok(*config),
            Self::NoConfigInChain => Err(Error::NoConfigInChain),
        }
    }
}

/// Providers in precedence order: later providers override earlier ones.
pub struct ProviderChain {
    providers: Vec<Box<dyn ConfigProvider>>,
}

impl ProviderChain {
    /// A chain over the given providers.
    #[must_use]
    pub fn new(providers: Vec<Box<dyn ConfigProvider>>) -> Self {
        Self { providers }
    }

    /// Builds a chain from source URIs. Every URI is checked before any
    /// provider runs.
    ///
    /// # Errors
    ///
    /// Returns the factory error for the first bad URI.
    pub fn from_sources<S: AsRef<str>>(sources: &[S], context: &ProviderContext) -> Result<Self> {
        let providers = sources
            .iter()
            .map(|source| build_provider(source.as_ref(), context))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(providers))
    }

    /// Number of providers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Whether the chain has no providers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Runs every provider in order and merges what they find.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Provider`] naming the index of the first provider
    /// that fails, or a merge error.
    pub fn provide(&self) -> Result<ChainOutcome> {
        let mut merged: Option<NodeConfig> = None;
        for (index, provider) in self.providers.iter().enumerate() {
            let outcome = provider.provide().map_err(|e| Error::Provider {
                index,
                source: Box::new(e),
            })?;
            match outcome {
                ProviderOutcome::Found(config) => {
                    debug!("config provider {index} ({}) found a configuration", provider.describe());
                    merged = Some(match merged {
                        Some(acc) => ConfigMerger::merge(&acc, &config)?,
                        None => *config,
                    });
                }
                ProviderOutcome::Absent => {
                    info!("config provider {index} ({}) has no configuration", provider.describe());
                }
            }
        }
        Ok(merged.map_or(ChainOutcome::NoConfigInChain, |c| ChainOutcome::Merged(Box::new(c))))
    }
}
