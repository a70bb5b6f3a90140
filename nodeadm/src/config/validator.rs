//! Configuration validation.
//!
//! Checks that a resolved configuration carries everything a node needs to
//! join its cluster. Runs on every resolution, including cache hits.

use log::warn;
use url::Url;

use crate::api::features::unknown_features;
use crate::api::types::{ClusterDetails, KubeletOptions, NodeConfig, ProxyOptions};
use crate::error::{Error, Result};

const TAINT_EFFECTS: &[&str] = &["NoSchedule", "PreferNoSchedule", "NoExecute"];

/// Validates node configurations.
///
/// # Examples
///
/// ```
/// use nodeadm::api::NodeConfig;
/// use nodeadm::config::ConfigValidator;
///
/// let err = ConfigValidator::validate(&NodeConfig::default()).unwrap_err();
/// assert!(err.to_string().contains("cluster.name"));
/// ```
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate a complete configuration, failing on the first problem.
    ///
    /// Unknown feature gates are logged and otherwise ignored.
    ///
    /// # Errors
    ///
    /// Returns an [`Error::Validation`] naming the offending field.
    pub fn validate(config: &NodeConfig) -> Result<()> {
        for gate in unknown_features(&config.spec.feature_gates) {
            warn!("ignoring unknown feature gate {gate:?}");
        }
        match Self::problems(config).into_iter().next() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Every validation problem in the configuration, in field order.
    #[must_use]
    pub fn problems(config: &NodeConfig) -> Vec<Error> {
        let mut problems = Vec::new();
        Self::check_cluster(&config.spec.cluster, &mut problems);
        Self::check_kubelet(&config.spec.kubelet, &mut problems);
        Self::check_proxy(&config.spec.proxy, &mut problems);
        problems
    }

    fn check_cluster(cluster: &ClusterDetails, problems: &mut Vec<Error>) {
        if cluster.name.trim().is_empty() {
            problems.push(invalid("cluster.name", "cluster name is missing"));
        }

        if cluster.api_server_endpoint.trim().is_empty() {
            problems.push(invalid(
                "cluster.apiServerEndpoint",
                "API server endpoint is missing",
            ));
        } else if let Err(e) = Url::parse(&cluster.api_server_endpoint) {
            problems.push(invalid(
                "cluster.apiServerEndpoint",
                &format!("API server endpoint is not a valid URL: {e}"),
            ));
        }

        if cluster.certificate_authority.is_empty() {
            problems.push(invalid(
                "cluster.certificateAuthority",
                "certificate authority is missing",
            ));
        }

        if cluster.cidr.trim().is_empty() {
            problems.push(invalid("cluster.cidr", "CIDR is missing"));
        } else if let Err(e) = cluster.ip_family() {
            problems.push(e);
        }

        if cluster.is_outpost() && cluster.id.trim().is_empty() {
            problems.push(invalid(
                "cluster.id",
                "cluster ID is required when outpost is enabled",
            ));
        }
    }

    fn check_kubelet(kubelet: &KubeletOptions, problems: &mut Vec<Error>) {
        for (index, taint) in kubelet.taints.iter().enumerate() {
            if taint.key.trim().is_empty() {
                problems.push(invalid(
                    &format!("kubelet.taints[{index}].key"),
                    "taint key is missing",
                ));
            }
            if !TAINT_EFFECTS.contains(&taint.effect.as_str()) {
                problems.push(invalid(
                    &format!("kubelet.taints[{index}].effect"),
                    &format!(
                        "unknown taint effect {:?}, expected one of {}",
                        taint.effect,
                        TAINT_EFFECTS.join(", ")
                    ),
                ));
            }
        }
    }

    fn check_proxy(proxy: &ProxyOptions, problems: &mut Vec<Error>) {
        for (field, value) in [
            ("proxy.httpProxy", &proxy.http_proxy),
            ("proxy.httpsProxy", &proxy.https_proxy),
        ] {
            if value.is_empty() {
                continue;
            }
            match Url::parse(value) {
                Ok(url) if url.has_host() => {}
                Ok(_) => problems.push(invalid(field, "proxy URL has no host")),
                Err(e) => problems.push(invalid(field, &format!("invalid proxy URL: {e}"))),
            }
        }

        for (index, pattern) in proxy.no_proxy.iter().enumerate() {
            if pattern.trim().is_empty() {
                problems.push(invalid(
                    &format!("proxy.noProxy[{index}]"),
                    "entry must not be empty",
                ));
            }
        }
    }
}

fn invalid(field: &str, message: &str) -> Error {
    Error::Validation {
        field: field.into(),
        message: message.into(),
    }
}
