#![deny(missing_docs, unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! # nodeadm
//!
//! A library for resolving the configuration of a node joining a cluster.
//!
//! Configuration is read from an ordered list of sources, unwrapped from
//! its transport encoding, decoded, merged, compared with a cached copy,
//! and validated before anything acts on it.
//!
//! ## Core Types
//!
//! - [`NodeConfig`]: The internal node configuration
//! - [`ProviderChain`] and [`ConfigProvider`]: Reading config sources
//! - [`ConfigMerger`]: Field-wise merging with per-field precedence rules
//! - [`ConfigResolver`] and [`ConfigCache`]: Change detection against the cache
//! - [`ConfigValidator`]: Checks run before a configuration is trusted
//! - [`Error`] and [`Result`]: Error handling types
//! - [`Logger`] and [`LogLevel`]: Logging infrastructure
//!
//! ## Examples
//!
//! ```
//! use std::sync::Arc;
//! use nodeadm::provider::{FakeUserData, ProviderChain, ProviderContext};
//!
//! let user_data = "apiVersion: node.eks.aws/v1alpha1\nkind: NodeConfig\nspec:\n  cluster:\n    name: demo\n";
//! let context = ProviderContext::new(Arc::new(FakeUserData::new(user_data)));
//! let chain = ProviderChain::from_sources(&["imds://user-data"], &context).unwrap();
//!
//! let config = chain.provide().unwrap().into_result().unwrap();
//! assert_eq!(config.spec.cluster.name, "demo");
//! ```

pub mod api;
pub mod cancel;
pub mod codec;
pub mod config;
pub mod enrich;
pub mod error;
pub mod imds;
pub mod logging;
pub mod provider;
pub mod transport;

// Re-export key types at crate root for convenience
pub use api::NodeConfig;
pub use cancel::Cancellation;
pub use codec::{Codec, Format, Scheme, Version};
pub use config::{ConfigCache, ConfigMerger, ConfigResolver, ConfigValidator, Resolution, Settings};
pub use enrich::{Enricher, ImdsEnricher, NoopEnricher};
pub use error::{Error, MergeSide, Result};
pub use imds::ImdsClient;
pub use logging::{init_logger, LogLevel, Logger};
pub use provider::{ChainOutcome, ConfigProvider, ProviderChain, ProviderContext, ProviderOutcome};
pub use transport::TransportDecoder;
