//! Configuration resolution for nodeadm.
//!
//! This module turns config sources into one validated node configuration:
//! - Merging of configurations from several sources ([`ConfigMerger`])
//! - Validation of the result ([`ConfigValidator`])
//! - Caching and change detection ([`ConfigCache`], [`ConfigResolver`])
//! - Settings of the agent itself ([`Settings`])
//!
//! # Precedence
//!
//! Sources are listed lowest precedence first. Each source's configuration
//! is merged onto everything before it, so later sources win field by
//! field.
//!
//! # Examples
//!
//! ```no_run
//! use std::sync::Arc;
//! use nodeadm::codec::Codec;
//! use nodeadm::config::{ConfigCache, ConfigResolver, Settings};
//! use nodeadm::imds::ImdsClient;
//! use nodeadm::provider::{ProviderChain, ProviderContext};
//!
//! let settings = Settings::from_env().unwrap();
//! let context = ProviderContext::new(Arc::new(ImdsClient::new(&settings.imds).unwrap()));
//! let chain = ProviderChain::from_sources(&settings.config_sources, &context).unwrap();
//! let cache = ConfigCache::new(&settings.config_cache, Codec::default());
//!
//! let resolution = ConfigResolver::new(chain, Some(cache)).resolve().unwrap();
//! println!("enrichment needed: {}", resolution.needs_enrichment);
//! ```

pub mod cache;
pub mod environment;
pub mod merger;
pub mod resolver;
pub mod settings;
pub mod validator;

#[cfg(test)]
mod proptests;

// Re-export key types at module root
pub use cache::ConfigCache;
pub use environment::EnvironmentSettings;
pub use merger::ConfigMerger;
pub use resolver::{ConfigResolver, Resolution};
pub use settings::{ImdsSettings, Settings};
pub use validator::ConfigValidator;
