//! Document codec.
//!
//! Decodes YAML or JSON documents into the internal [`NodeConfig`] and
//! encodes it back out. Which group, kind and versions are accepted is
//! decided by a [`Scheme`] handed to the codec at construction.

use serde::Serialize;
use serde_yaml::{Mapping, Value};

use crate::api::types::{NodeConfig, GROUP_NAME, KIND_NODE_CONFIG};
use crate::api::v1alpha1;
use crate::error::{Error, Result};

/// A version of the node configuration schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Version {
    /// The external, user-facing version.
    V1Alpha1,
    /// The versionless form used for caching; includes status.
    Internal,
}

impl Version {
    /// The version component of `apiVersion`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::V1Alpha1 => v1alpha1::VERSION,
            Self::Internal => "__internal",
        }
    }
}

/// Output syntax for [`Codec::encode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    /// Pretty-printed JSON.
    #[default]
    Json,
    /// YAML.
    Yaml,
}

/// Registry of the group, kind and versions a codec accepts.
///
/// # Examples
///
/// ```
/// use nodeadm::codec::{Scheme, Version};
///
/// let scheme = Scheme::node_config();
/// assert_eq!(scheme.recognize("node.eks.aws/v1alpha1", "NodeConfig").unwrap(), Version::V1Alpha1);
/// assert!(scheme.recognize("v1", "ConfigMap").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scheme {
    group: String,
    kind: String,
    versions: Vec<Version>,
}

impl Scheme {
    /// An empty scheme for one group and kind.
    #[must_use]
    pub fn new(group: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            kind: kind.into(),
            versions: Vec::new(),
        }
    }

    /// Registers a version.
    #[must_use]
    pub fn with_version(mut self, version: Version) -> Self {
        if !self.versions.contains(&version) {
            self.versions.push(version);
        }
        self
    }

    /// The scheme for `node.eks.aws` `NodeConfig` with every known version.
    #[must_use]
    pub fn node_config() -> Self {
        Self::new(GROUP_NAME, KIND_NODE_CONFIG)
            .with_version(Version::V1Alpha1)
            .with_version(Version::Internal)
    }

    /// Full `apiVersion` string for a version.
    #[must_use]
    pub fn api_version(&self, version: Version) -> String {
        format!("{}/{}", self.group, version.as_str())
    }

    /// Media type that marks node configuration parts in MIME user data.
    #[must_use]
    pub fn media_type(&self) -> String {
        format!("application/{}", self.group)
    }

    /// Maps a declared `apiVersion` and `kind` to a registered version.
    ///
    /// # Errors
    ///
    /// Returns [`Error::KindMismatch`] if the group, kind or version is not
    /// registered.
    pub fn recognize(&self, api_version: &str, kind: &str) -> Result<Version> {
        let mismatch = || Error::KindMismatch {
            api_version: api_version.to_string(),
            kind: kind.to_string(),
        };
        let (group, version) = api_version.split_once('/').ok_or_else(mismatch)?;
        if group != self.group || kind != self.kind {
            return Err(mismatch());
        }
        self.versions
            .iter()
            .copied()
            .find(|v| v.as_str() == version)
            .ok_or_else(mismatch)
    }
}

impl Default for Scheme {
    fn default() -> Self {
        Self::node_config()
    }
}

/// Decodes and encodes node configuration documents.
#[derive(Debug, Clone, Default)]
pub struct Codec {
    scheme: Scheme,
}

impl Codec {
    /// Creates a codec over the given scheme.
    #[must_use]
    pub fn new(scheme: Scheme) -> Self {
        Self { scheme }
    }

    /// The scheme this codec accepts.
    #[must_use]
    pub fn scheme(&self) -> &Scheme {
        &self.scheme
    }

    /// Decodes a document of any registered version.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] for syntax or schema errors and
    /// [`Error::KindMismatch`] for documents of another kind or group.
    ///
    /// # Examples
    ///
    /// ```
    /// use nodeadm::codec::Codec;
    ///
    /// let doc = b"apiVersion: node.eks.aws/v1alpha1\nkind: NodeConfig\nspec:\n  cluster:\n    name: demo\n";
    /// let config = Codec::default().decode(doc).unwrap();
    /// assert_eq!(config.spec.cluster.name, "demo");
    /// ```
    pub fn decode(&self, data: &[u8]) -> Result<NodeConfig> {
        let (version, body) = self.split_envelope(data)?;
        Self::decode_body(version, body)
    }

    /// Decodes a document that must declare the given version.
    ///
    /// # Errors
    ///
    /// Same as [`Codec::decode`], plus [`Error::KindMismatch`] when the
    /// document is of a different registered version.
    pub fn decode_as(&self, data: &[u8], expected: Version) -> Result<NodeConfig> {
        let (version, body) = self.split_envelope(data)?;
        if version != expected {
            return Err(Error::KindMismatch {
                api_version: self.scheme.api_version(version),
                kind: self.scheme.kind.clone(),
            });
        }
        Self::decode_body(version, body)
    }

    /// Encodes a configuration in the given version and syntax.
    ///
    /// The external version drops status; the internal one keeps it.
    ///
    /// # Errors
    ///
    /// Returns an encoding error from the serializer.
    pub fn encode(&self, config: &NodeConfig, version: Version, format: Format) -> Result<Vec<u8>> {
        let body = match version {
            Version::V1Alpha1 => serde_json::to_value(v1alpha1::NodeConfig::from(config))?,
            Version::Internal => serde_json::to_value(config)?,
        };
        let mut document = serde_json::Map::new();
        document.insert(
            "apiVersion".to_string(),
            self.scheme.api_version(version).into(),
        );
        document.insert("kind".to_string(), self.scheme.kind.clone().into());
        if let serde_json::Value::Object(fields) = body {
            document.extend(fields);
        }
        render(&serde_json::Value::Object(document), format)
    }

    fn split_envelope(&self, data: &[u8]) -> Result<(Version, Mapping)> {
        let value = parse_value(data)?;
        let Value::Mapping(mut mapping) = value else {
            return Err(Error::Decode {
                message: "document is not a mapping".to_string(),
            });
        };
        let api_version = take_string(&mut mapping, "apiVersion")?;
        let kind = take_string(&mut mapping, "kind")?;
        mapping.remove("metadata");
        let version = self.scheme.recognize(&api_version, &kind)?;
        Ok((version, mapping))
    }

    fn decode_body(version: Version, body: Mapping) -> Result<NodeConfig> {
        let value = Value::Mapping(body);
        let decoded = match version {
            Version::V1Alpha1 => {
                serde_yaml::from_value::<v1alpha1::NodeConfig>(value).map(NodeConfig::from)
            }
            Version::Internal => serde_yaml::from_value::<NodeConfig>(value),
        };
        decoded.map_err(|e| Error::Decode {
            message: e.to_string(),
        })
    }
}

fn parse_value(data: &[u8]) -> Result<Value> {
    let trimmed = data.trim_ascii_start();
    // JSON with tab indentation is not valid YAML
    if trimmed.first() == Some(&b'{') {
        let json: serde_json::Value = serde_json::from_slice(trimmed).map_err(|e| Error::Decode {
            message: format!("invalid JSON: {e}"),
        })?;
        return serde_yaml::to_value(json).map_err(|e| Error::Decode {
            message: e.to_string(),
        });
    }
    serde_yaml::from_slice(data).map_err(|e| Error::Decode {
        message: format!("invalid YAML: {e}"),
    })
}

fn take_string(mapping: &mut Mapping, key: &str) -> Result<String> {
    match mapping.remove(key) {
        Some(Value::String(s)) => Ok(s),
        Some(_) => Err(Error::Decode {
            message: format!("{key} must be a string"),
        }),
        None => Err(Error::Decode {
            message: format!("{key} is missing"),
        }),
    }
}

fn render<T: Serialize>(value: &T, format: Format) -> Result<Vec<u8>> {
    match format {
        Format::Json => {
            let mut out = serde_json::to_vec_pretty(value)?;
            out.push(b'\n');
            Ok(out)
        }
        Format::Yaml => Ok(serde_yaml::to_string(value)?.into_bytes()),
    }
}
