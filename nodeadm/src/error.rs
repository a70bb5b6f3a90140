//! Error types for the nodeadm library.
//!
//! This module provides the error hierarchy for configuration resolution,
//! using `thiserror` for ergonomic error handling. Benign absence of
//! configuration is not an error; see [`crate::provider::ProviderOutcome`].

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for operations that may fail with a nodeadm error.
///
/// # Examples
///
/// ```
/// use nodeadm::{Error, Result};
///
/// fn example_operation() -> Result<String> {
///     Ok("node.eks.aws".to_string())
/// }
/// ```
pub type Result<T> = std::result::Result<T, Error>;

/// Which side of a merge an overlay came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeSide {
    /// The accumulated configuration being merged onto.
    Destination,
    /// The configuration applied on top.
    Source,
}

impl fmt::Display for MergeSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Destination => write!(f, "destination"),
            Self::Source => write!(f, "source"),
        }
    }
}

/// The main error type for the nodeadm library.
#[derive(Debug, Error)]
pub enum Error {
    /// A config source URI used a scheme with no provider.
    #[error("unsupported config source scheme: {scheme:?}")]
    UnsupportedScheme {
        /// The scheme that was given.
        scheme: String,
    },

    /// A config source URI could not be parsed.
    #[error("invalid config source {uri:?}: {reason}")]
    InvalidSource {
        /// The raw source URI.
        uri: String,
        /// Why it was rejected.
        reason: String,
    },

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A configuration file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    FileRead {
        /// The path that failed.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Data carried the gzip magic number but could not be decompressed.
    #[error("failed to decompress gzip data: {0}")]
    Gzip(#[source] std::io::Error),

    /// A MIME multipart part could not be read.
    #[error("failed to read MIME part {part}: {message}")]
    Mime {
        /// Zero-based index of the part within the message.
        part: usize,
        /// Details from the MIME parser.
        message: String,
    },

    /// A document could not be decoded into a node configuration.
    #[error("failed to decode node configuration: {message}")]
    Decode {
        /// Details about the failure.
        message: String,
    },

    /// A document declared a kind or group this decoder does not accept.
    #[error("unrecognized document: kind {kind:?} in apiVersion {api_version:?}")]
    KindMismatch {
        /// The declared `apiVersion`.
        api_version: String,
        /// The declared `kind`.
        kind: String,
    },

    /// One document out of several failed to decode.
    #[error("configuration part {index}: {source}")]
    Part {
        /// Zero-based index of the document.
        index: usize,
        /// The underlying error.
        #[source]
        source: Box<Error>,
    },

    /// A structured overlay failed to parse while merging.
    #[error("failed to parse {side} {document} during merge: {message}")]
    MergeParse {
        /// Which configuration held the corrupt overlay.
        side: MergeSide,
        /// Name of the overlay.
        document: &'static str,
        /// Parser details.
        message: String,
    },

    /// A validation error occurred.
    #[error("validation error for '{field}': {message}")]
    Validation {
        /// The field that failed validation.
        field: String,
        /// A description of the validation failure.
        message: String,
    },

    /// A provider in a chain failed.
    #[error("config provider at index {index} failed: {source}")]
    Provider {
        /// Position of the provider in the chain.
        index: usize,
        /// The underlying error.
        #[source]
        source: Box<Error>,
    },

    /// A file in a config directory failed to parse.
    #[error("failed to parse config file {filename}: {source}")]
    DirectoryEntry {
        /// Name of the offending file.
        filename: String,
        /// The underlying error.
        #[source]
        source: Box<Error>,
    },

    /// No provider in the chain produced a configuration.
    #[error("no node configuration found in any config source")]
    NoConfigInChain,

    /// An explicitly named file contained no node configuration.
    #[error("no node configuration found in {}", path.display())]
    NoConfigInFile {
        /// The file that was read.
        path: PathBuf,
    },

    /// The metadata service answered with a non-success status.
    #[error("metadata service returned status {status} for {path}")]
    Metadata {
        /// The requested path.
        path: String,
        /// HTTP status code.
        status: u16,
    },

    /// The metadata service has no value for the requested path.
    #[error("metadata not found: {path}")]
    MetadataNotFound {
        /// The requested path.
        path: String,
    },

    /// A request to the metadata service failed in transport.
    #[error("metadata service request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The caller cancelled the operation or its deadline passed.
    #[error("operation cancelled")]
    Cancelled,

    /// YAML encoding failed.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON encoding failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns the innermost error, looking through provider and file wrappers.
    #[must_use]
    pub fn root(&self) -> &Error {
        match self {
            Self::Provider { source, .. }
            | Self::DirectoryEntry { source, .. }
            | Self::Part { source, .. } => source.root(),
            other => other,
        }
    }

    /// Check if the error came from cancellation.
    ///
    /// # Examples
    ///
    /// ```
    /// use nodeadm::Error;
    ///
    /// let err = Error::Provider { index: 0, source: Box::new(Error::Cancelled) };
    /// assert!(err.is_cancelled());
    /// ```
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self.root(), Self::Cancelled)
    }

    /// Check if the metadata service reported the property as missing.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self.root(), Self::MetadataNotFound { .. })
    }

    /// Check if the error is a document decoding failure.
    ///
    /// Transport failures such as corrupt gzip are not decoding failures.
    #[must_use]
    pub fn is_decode_failure(&self) -> bool {
        matches!(self.root(), Self::Decode { .. } | Self::KindMismatch { .. })
    }

    /// Check if the error is a validation failure.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }
}
