//! Internal node configuration.
//!
//! This is the canonical, versionless representation used by every
//! component after decoding. External documents are converted into it by
//! [`crate::api::v1alpha1`].

use std::collections::BTreeMap;
use std::fmt;
use std::net::IpAddr;

use serde::{Deserialize, Serialize};

use crate::api::document::InlineDocument;
use crate::error::{Error, Result};

/// Group name of the node configuration API.
pub const GROUP_NAME: &str = "node.eks.aws";

/// Kind of the node configuration object.
pub const KIND_NODE_CONFIG: &str = "NodeConfig";

/// A resolved node configuration: declared spec plus derived status.
///
/// Two configurations with equal specs are interchangeable for caching,
/// whatever their status.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NodeConfig {
    /// Declarative configuration supplied by the user.
    pub spec: NodeConfigSpec,
    /// Facts filled in by enrichment.
    pub status: NodeConfigStatus,
}

/// Declarative part of a node configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NodeConfigSpec {
    /// Cluster coordinates.
    pub cluster: ClusterDetails,
    /// Container runtime overlays.
    pub containerd: ContainerdOptions,
    /// Instance-level options.
    pub instance: InstanceOptions,
    /// Kubelet overlays.
    pub kubelet: KubeletOptions,
    /// HTTP proxy settings.
    pub proxy: ProxyOptions,
    /// Named boolean switches; see [`crate::api::features`].
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub feature_gates: BTreeMap<String, bool>,
}

/// Coordinates of the cluster the node joins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClusterDetails {
    /// Cluster name.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// URL of the API server.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub api_server_endpoint: String,
    /// Certificate authority bundle, base64 in documents.
    #[serde(with = "base64_bytes", skip_serializing_if = "Vec::is_empty")]
    pub certificate_authority: Vec<u8>,
    /// Service CIDR of the cluster.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub cidr: String,
    /// Whether the node runs on an outpost.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_outpost: Option<bool>,
    /// Cluster identifier, required on outposts.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub id: String,
}

/// Address family of a CIDR.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpFamily {
    /// IPv4.
    Ipv4,
    /// IPv6.
    Ipv6,
}

impl fmt::Display for IpFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ipv4 => write!(f, "ipv4"),
            Self::Ipv6 => write!(f, "ipv6"),
        }
    }
}

impl ClusterDetails {
    /// Whether the outpost flag is set to true.
    #[must_use]
    pub fn is_outpost(&self) -> bool {
        self.enable_outpost == Some(true)
    }

    /// Address family of the cluster CIDR.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the CIDR is malformed.
    pub fn ip_family(&self) -> Result<IpFamily> {
        let (address, prefix) = self.cidr.split_once('/').ok_or_else(|| invalid_cidr(&self.cidr))?;
        let ip: IpAddr = address.parse().map_err(|_| invalid_cidr(&self.cidr))?;
        let prefix: u8 = prefix.parse().map_err(|_| invalid_cidr(&self.cidr))?;
        match ip {
            IpAddr::V4(_) if prefix <= 32 => Ok(IpFamily::Ipv4),
            IpAddr::V6(_) if prefix <= 128 => Ok(IpFamily::Ipv6),
            _ => Err(invalid_cidr(&self.cidr)),
        }
    }

    /// Address of the cluster DNS service, inferred from the CIDR.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the CIDR is malformed.
    ///
    /// # Examples
    ///
    /// ```
    /// use nodeadm::api::ClusterDetails;
    ///
    /// let cluster = ClusterDetails { cidr: "10.100.0.0/16".to_string(), ..Default::default() };
    /// assert_eq!(cluster.cluster_dns().unwrap(), "10.100.0.10");
    /// ```
    pub fn cluster_dns(&self) -> Result<String> {
        match self.ip_family()? {
            IpFamily::Ipv4 => {
                let last_dot = self.cidr.rfind('.').ok_or_else(|| invalid_cidr(&self.cidr))?;
                Ok(format!("{}.10", &self.cidr[..last_dot]))
            }
            IpFamily::Ipv6 => {
                let address = self.cidr.split('/').next().unwrap_or_default();
                Ok(format!("{address}a"))
            }
        }
    }
}

fn invalid_cidr(cidr: &str) -> Error {
    Error::Validation {
        field: "cluster.cidr".into(),
        message: format!("{cidr:?} is not a valid CIDR"),
    }
}

/// Kubelet overlays.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct KubeletOptions {
    /// Kubelet configuration overlay, merged onto generated defaults.
    #[serde(skip_serializing_if = "InlineDocument::is_empty")]
    pub config: InlineDocument,
    /// Extra command-line arguments. Order matters: later flags win.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub flags: Vec<String>,
    /// Node labels.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    /// Node taints.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub taints: Vec<Taint>,
}

/// A node taint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Taint {
    /// Taint key.
    pub key: String,
    /// Taint value.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub value: String,
    /// Effect, such as `NoSchedule`.
    pub effect: String,
}

/// Container runtime overlays.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ContainerdOptions {
    /// Inline containerd TOML merged onto generated defaults.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub config: String,
    /// Overlay for the base OCI runtime spec.
    #[serde(skip_serializing_if = "InlineDocument::is_empty")]
    pub base_runtime_spec: InlineDocument,
}

/// Instance-level options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InstanceOptions {
    /// Local instance-store disk handling.
    pub local_storage: LocalStorageOptions,
}

/// Local instance-store disk options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LocalStorageOptions {
    /// How local disks are assembled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<LocalStorageStrategy>,
}

/// Strategy for local instance-store disks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LocalStorageStrategy {
    /// Stripe disks into one array.
    #[serde(rename = "RAID0")]
    Raid0,
    /// Striped mirrors.
    #[serde(rename = "RAID10")]
    Raid10,
    /// Mount each disk separately.
    Mount,
}

/// HTTP proxy options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProxyOptions {
    /// Proxy for plain HTTP.
    #[serde(rename = "httpProxy", skip_serializing_if = "String::is_empty")]
    pub http_proxy: String,
    /// Proxy for HTTPS.
    #[serde(rename = "httpsProxy", skip_serializing_if = "String::is_empty")]
    pub https_proxy: String,
    /// Hosts and patterns that bypass the proxy.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub no_proxy: Vec<String>,
}

impl ProxyOptions {
    /// The bypass list handed to the environment: loopback first, then the
    /// user patterns trimmed and deduplicated in order.
    ///
    /// # Examples
    ///
    /// ```
    /// use nodeadm::api::ProxyOptions;
    ///
    /// let proxy = ProxyOptions {
    ///     no_proxy: vec![" .internal ".to_string(), "localhost".to_string()],
    ///     ..Default::default()
    /// };
    /// assert_eq!(proxy.effective_no_proxy(), vec!["localhost", "127.0.0.1", ".internal"]);
    /// ```
    #[must_use]
    pub fn effective_no_proxy(&self) -> Vec<String> {
        let mut list = vec!["localhost".to_string(), "127.0.0.1".to_string()];
        for pattern in &self.no_proxy {
            let pattern = pattern.trim();
            if !pattern.is_empty() && !list.iter().any(|existing| existing == pattern) {
                list.push(pattern.to_string());
            }
        }
        list
    }
}

/// Derived facts about the node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NodeConfigStatus {
    /// Instance identity.
    pub instance: InstanceDetails,
    /// Defaults picked for this node.
    #[serde(rename = "default")]
    pub defaults: DefaultOptions,
    /// Version reported by the kubelet binary.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub kubelet_version: String,
}

/// Identity of the instance, from the metadata service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InstanceDetails {
    /// Instance ID.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub id: String,
    /// Region.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub region: String,
    /// Instance type.
    #[serde(rename = "type", skip_serializing_if = "String::is_empty")]
    pub instance_type: String,
    /// Availability zone.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub availability_zone: String,
    /// MAC address of the primary interface.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub mac: String,
    /// Private DNS name.
    #[serde(rename = "privateDnsName", skip_serializing_if = "String::is_empty")]
    pub private_dns_name: String,
}

/// Defaults chosen during enrichment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DefaultOptions {
    /// Pause image for pod sandboxes.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub sandbox_image: String,
}

/// Serde adapter carrying bytes as standard base64 text.
pub(crate) mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(deserializer)?;
        let compact: String = text.chars().filter(|c| !c.is_ascii_whitespace()).collect();
        STANDARD
            .decode(compact)
            .map_err(|e| serde::de::Error::custom(format!("invalid base64: {e}")))
    }
}
