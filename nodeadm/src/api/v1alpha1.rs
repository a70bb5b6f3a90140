//! The `node.eks.aws/v1alpha1` external representation.
//!
//! Users write this form. It is strict: unknown fields are rejected, which
//! keeps unrelated documents from being silently accepted. It carries no
//! status.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::api::document::InlineDocument;
use crate::api::types::{self, base64_bytes, LocalStorageStrategy, Taint};

/// Version string of this representation.
pub const VERSION: &str = "v1alpha1";

/// Body of a `v1alpha1` `NodeConfig` document, without the type envelope.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NodeConfig {
    /// Declared configuration.
    pub spec: NodeConfigSpec,
}

/// Declared configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
#[allow(missing_docs)]
pub struct NodeConfigSpec {
    pub cluster: ClusterDetails,
    pub containerd: ContainerdOptions,
    pub instance: InstanceOptions,
    pub kubelet: KubeletOptions,
    pub proxy: ProxyOptions,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub feature_gates: BTreeMap<String, bool>,
}

/// Cluster coordinates, as found with the `DescribeCluster` API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct ClusterDetails {
    /// Name of the cluster.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// URL of the cluster's API server.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub api_server_endpoint: String,
    /// Base64-encoded certificate authority chain.
    #[serde(with = "base64_bytes", skip_serializing_if = "Vec::is_empty")]
    pub certificate_authority: Vec<u8>,
    /// Service IP CIDR, used to infer the DNS address.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub cidr: String,
    /// Whether the node runs on an outpost.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_outpost: Option<bool>,
    /// Cluster identifier; only used on outposts.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub id: String,
}

/// Kubelet overlays.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct KubeletOptions {
    /// Kubelet configuration overriding generated defaults.
    #[serde(skip_serializing_if = "InlineDocument::is_empty")]
    pub config: InlineDocument,
    /// Command-line arguments appended after the generated defaults.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub flags: Vec<String>,
    /// Node labels.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    /// Node taints.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub taints: Vec<Taint>,
}

/// Container runtime overlays.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct ContainerdOptions {
    /// Inline containerd config TOML.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub config: String,
    /// Overlay for the base OCI runtime spec.
    #[serde(skip_serializing_if = "InlineDocument::is_empty")]
    pub base_runtime_spec: InlineDocument,
}

/// Instance-level options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct InstanceOptions {
    /// Local disk options.
    pub local_storage: LocalStorageOptions,
}

/// Local disk options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct LocalStorageOptions {
    /// Disk assembly strategy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<LocalStorageStrategy>,
}

/// HTTP proxy options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct ProxyOptions {
    /// Proxy URL for HTTP.
    #[serde(rename = "httpProxy", skip_serializing_if = "String::is_empty")]
    pub http_proxy: String,
    /// Proxy URL for HTTPS.
    #[serde(rename = "httpsProxy", skip_serializing_if = "String::is_empty")]
    pub https_proxy: String,
    /// Bypass patterns.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub no_proxy: Vec<String>,
}

impl From<NodeConfig> for types::NodeConfig {
    fn from(external: NodeConfig) -> Self {
        let spec = external.spec;
        types::NodeConfig {
            spec: types::NodeConfigSpec {
                cluster: types::ClusterDetails {
                    name: spec.cluster.name,
                    api_server_endpoint: spec.cluster.api_server_endpoint,
                    certificate_authority: spec.cluster.certificate_authority,
                    cidr: spec.cluster.cidr,
                    enable_outpost: spec.cluster.enable_outpost,
                    id: spec.cluster.id,
                },
                containerd: types::ContainerdOptions {
                    config: spec.containerd.config,
                    base_runtime_spec: spec.containerd.base_runtime_spec,
                },
                instance: types::InstanceOptions {
                    local_storage: types::LocalStorageOptions {
                        strategy: spec.instance.local_storage.strategy,
                    },
                },
                kubelet: types::KubeletOptions {
                    config: spec.kubelet.config,
                    flags: spec.kubelet.flags,
                    labels: spec.kubelet.labels,
                    taints: spec.kubelet.taints,
                },
                proxy: types::ProxyOptions {
                    http_proxy: spec.proxy.http_proxy,
                    https_proxy: spec.proxy.https_proxy,
                    no_proxy: spec.proxy.no_proxy,
                },
                feature_gates: spec.feature_gates,
            },
            status: types::NodeConfigStatus::default(),
        }
    }
}

impl From<&types::NodeConfig> for NodeConfig {
    fn from(internal: &types::NodeConfig) -> Self {
        let spec = internal.spec.clone();
        NodeConfig {
            spec: NodeConfigSpec {
                cluster: ClusterDetails {
                    name: spec.cluster.name,
                    api_server_endpoint: spec.cluster.api_server_endpoint,
                    certificate_authority: spec.cluster.certificate_authority,
                    cidr: spec.cluster.cidr,
                    enable_outpost: spec.cluster.enable_outpost,
                    id: spec.cluster.id,
                },
                containerd: ContainerdOptions {
                    config: spec.containerd.config,
                    base_runtime_spec: spec.containerd.base_runtime_spec,
                },
                instance: InstanceOptions {
                    local_storage: LocalStorageOptions {
                        strategy: spec.instance.local_storage.strategy,
                    },
                },
                kubelet: KubeletOptions {
                    config: spec.kubelet.config,
                    flags: spec.kubelet.flags,
                    labels: spec.kubelet.labels,
                    taints: spec.kubelet.taints,
                },
                proxy: ProxyOptions {
                    http_proxy: spec.proxy.http_proxy,
                    https_proxy: spec.proxy.https_proxy,
                    no_proxy: spec.proxy.no_proxy,
                },
                feature_gates: spec.feature_gates,
            },
        }
    }
}
