//! Node configuration API types.
//!
//! - [`types`]: the internal, versionless [`NodeConfig`]
//! - [`v1alpha1`]: the external representation users write
//! - [`document`]: the tree type behind kubelet and containerd overlays
//! - [`features`]: feature gate evaluation

pub mod document;
pub mod features;
pub mod types;
pub mod v1alpha1;

pub use document::{merge_documents, merge_nodes, InlineDocument, Node};
pub use types::{
    ClusterDetails, ContainerdOptions, DefaultOptions, InstanceDetails, InstanceOptions, IpFamily,
    KubeletOptions, LocalStorageOptions, LocalStorageStrategy, NodeConfig, NodeConfigSpec,
    NodeConfigStatus, ProxyOptions, Taint, GROUP_NAME, KIND_NODE_CONFIG,
};
