//! Configuration merging.
//!
//! Merges two node configurations field by field. The source is the
//! higher-precedence side; the destination is what has been accumulated so
//! far. An empty source value never clears a destination value.

use log::debug;

use crate::api::document::{self, merge_documents};
use crate::api::types::{
    ClusterDetails, ContainerdOptions, InstanceDetails, KubeletOptions, NodeConfig,
    NodeConfigSpec, NodeConfigStatus, ProxyOptions,
};
use crate::error::{Error, MergeSide, Result};

const CONTAINERD_CONFIG: &str = "containerd config";

/// Merges node configurations according to precedence rules.
///
/// # Examples
///
/// ```
/// use nodeadm::api::NodeConfig;
/// use nodeadm::config::ConfigMerger;
///
/// let mut low = NodeConfig::default();
/// low.spec.cluster.name = "low".to_string();
/// low.spec.kubelet.flags = vec!["--v=2".to_string()];
/// let mut high = NodeConfig::default();
/// high.spec.cluster.name = "high".to_string();
/// high.spec.kubelet.flags = vec!["--v=4".to_string()];
///
/// let merged = ConfigMerger::merge(&low, &high).unwrap();
/// assert_eq!(merged.spec.cluster.name, "high");
/// assert_eq!(merged.spec.kubelet.flags, vec!["--v=2", "--v=4"]);
/// ```
pub struct ConfigMerger;

impl ConfigMerger {
    /// Merges `source` onto `destination`, returning a new configuration.
    ///
    /// Neither input is modified.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MergeParse`] if a containerd TOML overlay on either
    /// side cannot be parsed.
    pub fn merge(destination: &NodeConfig, source: &NodeConfig) -> Result<NodeConfig> {
        let mut merged = destination.clone();
        Self::merge_into(&mut merged, source)?;
        Ok(merged)
    }

    /// Folds configurations left to right. Returns `None` for no input.
    ///
    /// # Errors
    ///
    /// Returns the first merge failure.
    pub fn merge_all<I>(configs: I) -> Result<Option<NodeConfig>>
    where
        I: IntoIterator<Item = NodeConfig>,
    {
        let mut result: Option<NodeConfig> = None;
        for config in configs {
            match result.as_mut() {
                Some(target) => Self::merge_into(target, &config)?,
                None => result = Some(config),
            }
        }
        Ok(result)
    }

    /// Merges `source` into `target` in place.
    ///
    /// # Merging Rules
    ///
    /// - Scalars: a non-empty source value overwrites
    /// - Kubelet flags: appended, so later flags win on the command line
    /// - Kubelet config, base runtime spec: deep tree merge
    /// - Containerd config: TOML parsed on both sides and deep merged
    /// - Labels, feature gates: key-wise overwrite
    /// - Taints, no-proxy list: replaced when the source list is non-empty
    ///
    /// # Errors
    ///
    /// Returns [`Error::MergeParse`] if a containerd TOML overlay is corrupt.
    pub fn merge_into(target: &mut NodeConfig, source: &NodeConfig) -> Result<()> {
        Self::merge_spec(&mut target.spec, &source.spec)?;
        Self::merge_status(&mut target.status, &source.status);
        Ok(())
    }

    fn merge_spec(target: &mut NodeConfigSpec, source: &NodeConfigSpec) -> Result<()> {
        Self::merge_cluster(&mut target.cluster, &source.cluster);
        Self::merge_containerd(&mut target.containerd, &source.containerd)?;
        Self::merge_kubelet(&mut target.kubelet, &source.kubelet);
        Self::merge_proxy(&mut target.proxy, &source.proxy);

        if source.instance.local_storage.strategy.is_some() {
            target.instance.local_storage.strategy = source.instance.local_storage.strategy;
        }

        target.feature_gates.extend(
            source
                .feature_gates
                .iter()
                .map(|(gate, enabled)| (gate.clone(), *enabled)),
        );
        Ok(())
    }

    fn merge_cluster(target: &mut ClusterDetails, source: &ClusterDetails) {
        override_string(&mut target.name, &source.name);
        override_string(&mut target.api_server_endpoint, &source.api_server_endpoint);
        override_string(&mut target.cidr, &source.cidr);
        override_string(&mut target.id, &source.id);

        if !source.certificate_authority.is_empty() {
            target
                .certificate_authority
                .clone_from(&source.certificate_authority);
        }

        if source.enable_outpost.is_some() {
            target.enable_outpost = source.enable_outpost;
        }
    }

    fn merge_containerd(target: &mut ContainerdOptions, source: &ContainerdOptions) -> Result<()> {
        target.config = Self::merge_containerd_config(&target.config, &source.config)?;
        target.base_runtime_spec =
            merge_documents(&target.base_runtime_spec, &source.base_runtime_spec);
        Ok(())
    }

    fn merge_kubelet(target: &mut KubeletOptions, source: &KubeletOptions) {
        target.config = merge_documents(&target.config, &source.config);
        target.flags.extend(source.flags.iter().cloned());
        target.labels.extend(
            source
                .labels
                .iter()
                .map(|(key, value)| (key.clone(), value.clone())),
        );

        // Taints - replace, never concatenate
        if !source.taints.is_empty() {
            target.taints.clone_from(&source.taints);
        }
    }

    fn merge_proxy(target: &mut ProxyOptions, source: &ProxyOptions) {
        override_string(&mut target.http_proxy, &source.http_proxy);
        override_string(&mut target.https_proxy, &source.https_proxy);
        if !source.no_proxy.is_empty() {
            target.no_proxy.clone_from(&source.no_proxy);
        }
    }

    fn merge_status(target: &mut NodeConfigStatus, source: &NodeConfigStatus) {
        Self::merge_instance(&mut target.instance, &source.instance);
        override_string(
            &mut target.defaults.sandbox_image,
            &source.defaults.sandbox_image,
        );
        override_string(&mut target.kubelet_version, &source.kubelet_version);
    }

    fn merge_instance(target: &mut InstanceDetails, source: &InstanceDetails) {
        override_string(&mut target.id, &source.id);
        override_string(&mut target.region, &source.region);
        override_string(&mut target.instance_type, &source.instance_type);
        override_string(&mut target.availability_zone, &source.availability_zone);
        override_string(&mut target.mac, &source.mac);
        override_string(&mut target.private_dns_name, &source.private_dns_name);
    }

    /// Deep-merges two containerd TOML overlays.
    ///
    /// When only one side is set it is kept verbatim without parsing.
    fn merge_containerd_config(target: &str, source: &str) -> Result<String> {
        if source.trim().is_empty() {
            return Ok(target.to_string());
        }
        if target.trim().is_empty() {
            return Ok(source.to_string());
        }

        let parse = |text: &str, side: MergeSide| {
            document::from_toml(text).map_err(|e| Error::MergeParse {
                side,
                document: CONTAINERD_CONFIG,
                message: e.to_string(),
            })
        };
        let target_doc = parse(target, MergeSide::Destination)?;
        let source_doc = parse(source, MergeSide::Source)?;

        debug!("merging containerd config overlays");
        document::to_toml(&merge_documents(&target_doc, &source_doc)).map_err(|e| {
            Error::MergeParse {
                side: MergeSide::Source,
                document: CONTAINERD_CONFIG,
                message: e.to_string(),
            }
        })
    }
}

fn override_string(target: &mut String, source: &str) {
    if !source.is_empty() {
        source.clone_into(target);
    }
}
