//! Configuration providers.
//!
//! A provider turns one config source into a [`NodeConfig`] or reports that
//! the source holds none. Sources are named by URI:
//!
//! - `imds://user-data`: instance user data ([`UserDataProvider`])
//! - `file://<path>`: a file, or a directory of drop-ins ([`FileProvider`])
//!
//! [`ProviderChain`] runs several providers and merges what they find.

mod chain;
mod file;
mod userdata;

use std::ffi::OsString;
use std::path::PathBuf;
use std::sync::Arc;

use url::Url;

pub use chain::{ChainOutcome, ProviderChain};
pub use file::{DirectoryProvider, FileProvider};
pub use userdata::{FakeUserData, UserDataProvider, UserDataSource};

use crate::api::types::NodeConfig;
use crate::cancel::Cancellation;
use crate::codec::Codec;
use crate::config::merger::ConfigMerger;
use crate::error::{Error, Result};
use crate::transport::TransportDecoder;

/// What a provider found.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderOutcome {
    /// A configuration was found and decoded.
    Found(Box<NodeConfig>),
    /// The source exists but holds no node configuration.
    Absent,
}

impl ProviderOutcome {
    /// The configuration, if one was found.
    #[must_use]
    pub fn into_config(self) -> Option<NodeConfig> {
        match self {
            Self::Found(config) => Some(*config),
            Self::Absent => None,
        }
    }
}

/// A source of node configuration.
pub trait ConfigProvider: Send + Sync {
    /// Human-readable description of the source, for logs.
    fn describe(&self) -> String;

    /// Reads the source.
    ///
    /// # Errors
    ///
    /// Returns an error if the source is broken. Benign absence is
    /// [`ProviderOutcome::Absent`], not an error.
    fn provide(&self) -> Result<ProviderOutcome>;
}

/// Shared pieces every provider needs.
#[derive(Clone)]
pub struct ProviderContext {
    /// Document codec.
    pub codec: Codec,
    /// Transport decoder.
    pub decoder: TransportDecoder,
    /// Where user data comes from.
    pub user_data: Arc<dyn UserDataSource>,
    /// Cancellation for I/O-bound providers.
    pub cancel: Cancellation,
}

impl ProviderContext {
    /// A context with the default codec and decoder.
    #[must_use]
    pub fn new(user_data: Arc<dyn UserDataSource>) -> Self {
        let codec = Codec::default();
        let decoder = TransportDecoder::new(codec.scheme().media_type());
        Self {
            codec,
            decoder,
            user_data,
            cancel: Cancellation::new(),
        }
    }

    /// Uses the given cancellation token.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: Cancellation) -> Self {
        self.cancel = cancel;
        self
    }
}

/// Builds the provider for a source URI.
///
/// # Errors
///
/// Returns [`Error::InvalidSource`] if the URI does not parse and
/// [`Error::UnsupportedScheme`] for schemes other than `imds` and `file`.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use nodeadm::provider::{build_provider, FakeUserData, ProviderContext};
///
/// let context = ProviderContext::new(Arc::new(FakeUserData::missing()));
/// assert!(build_provider("file:///etc/eks/nodeadm.d", &context).is_ok());
/// assert!(build_provider("s3://bucket/key", &context).is_err());
/// ```
pub fn build_provider(source: &str, context: &ProviderContext) -> Result<Box<dyn ConfigProvider>> {
    let url = Url::parse(source).map_err(|e| Error::InvalidSource {
        uri: source.to_string(),
        reason: e.to_string(),
    })?;
    match url.scheme() {
        "imds" => Ok(Box::new(UserDataProvider::new(
            Arc::clone(&context.user_data),
            context.decoder.clone(),
            context.codec.clone(),
            context.cancel.clone(),
        ))),
        "file" => {
            let path = file_path(&url).ok_or_else(|| Error::InvalidSource {
                uri: source.to_string(),
                reason: "file source has no usable path".to_string(),
            })?;
            Ok(Box::new(FileProvider::new(
                path,
                context.decoder.clone(),
                context.codec.clone(),
            )))
        }
        scheme => Err(Error::UnsupportedScheme {
            scheme: scheme.to_string(),
        }),
    }
}

/// Host and percent-decoded path of a `file://` URI, joined. Query and
/// fragment are dropped.
fn file_path(url: &Url) -> Option<PathBuf> {
    let mut local = url.clone();
    local.set_host(None).ok()?;
    local.set_query(None);
    local.set_fragment(None);
    let path = local.to_file_path().ok()?;
    match url.host_str().filter(|host| !host.is_empty()) {
        Some(host) => {
            let mut joined = OsString::from(host);
            joined.push(path.as_os_str());
            Some(PathBuf::from(joined))
        }
        None => Some(path),
    }
}

/// Decodes plain documents and folds them into one configuration.
pub(crate) fn decode_documents(codec: &Codec, documents: &[Vec<u8>]) -> Result<Option<NodeConfig>> {
    let mut configs = Vec::with_capacity(documents.len());
    for (index, document) in documents.iter().enumerate() {
        let config = codec.decode(document).map_err(|e| {
            if documents.len() > 1 {
                Error::Part {
                    index,
                    source: Box::new(e),
                }
            } else {
                e
            }
        })?;
        configs.push(config);
    }
    ConfigMerger::merge_all(configs)
}
