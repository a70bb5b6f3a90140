//! Feature gates.
//!
//! Gates are free-form names in documents. Only the names below change
//! behavior; each has a default that applies when the gate is unset.

use std::collections::BTreeMap;

/// Use the instance ID as the node name instead of the private DNS name.
pub const INSTANCE_ID_NODE_NAME: &str = "InstanceIdNodeName";

/// Pull container images in parallel on instances large enough for it.
pub const AGGRESSIVE_IMAGE_PULL: &str = "AggressiveImagePull";

type Verifier = fn(&str, &BTreeMap<String, bool>) -> bool;

const KNOWN_FEATURES: &[(&str, Verifier)] = &[
    (INSTANCE_ID_NODE_NAME, default_false),
    (AGGRESSIVE_IMAGE_PULL, default_false),
];

/// Disabled unless explicitly set to true.
#[must_use]
pub fn default_false(feature: &str, gates: &BTreeMap<String, bool>) -> bool {
    gates.get(feature).copied().unwrap_or(false)
}

/// Whether a feature is enabled. Unknown features are always disabled.
///
/// # Examples
///
/// ```
/// use std::collections::BTreeMap;
/// use nodeadm::api::features::{is_feature_enabled, INSTANCE_ID_NODE_NAME};
///
/// let mut gates = BTreeMap::new();
/// assert!(!is_feature_enabled(INSTANCE_ID_NODE_NAME, &gates));
/// gates.insert(INSTANCE_ID_NODE_NAME.to_string(), true);
/// assert!(is_feature_enabled(INSTANCE_ID_NODE_NAME, &gates));
/// ```
#[must_use]
pub fn is_feature_enabled(feature: &str, gates: &BTreeMap<String, bool>) -> bool {
    KNOWN_FEATURES
        .iter()
        .find(|(name, _)| *name == feature)
        .is_some_and(|(name, verify)| verify(name, gates))
}

/// Gate names that no release recognizes.
#[must_use]
pub fn unknown_features(gates: &BTreeMap<String, bool>) -> Vec<&str> {
    gates
        .keys()
        .map(String::as_str)
        .filter(|gate| !KNOWN_FEATURES.iter().any(|(name, _)| name == gate))
        .collect()
}
