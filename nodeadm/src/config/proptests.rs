//! Property-based tests for configuration merging.

use super::merger::ConfigMerger;
use crate::api::document::{InlineDocument, Node};
use crate::api::types::NodeConfig;
use proptest::prelude::*;

// Strategy for scalar leaves, including null and falsy values
fn leaf_strategy() -> impl Strategy<Value = Node> {
    prop_oneof![
        Just(Node::Null),
        any::<bool>().prop_map(Node::Bool),
        (-1000i64..1000).prop_map(Node::Integer),
        "[a-z]{0,8}".prop_map(Node::String),
    ]
}

// Strategy for nested overlay documents
fn document_strategy() -> impl Strategy<Value = InlineDocument> {
    let node = leaf_strategy().prop_recursive(3, 24, 4, |inner| {
        prop::collection::btree_map("[a-c]", inner, 0..4).prop_map(Node::Map)
    });
    prop::collection::btree_map("[a-e]", node, 0..5)
}

// Strategy for configs with the fields the merge rules treat differently
fn config_strategy() -> impl Strategy<Value = NodeConfig> {
    (
        "[a-z]{0,10}",
        "[a-z]{0,10}",
        prop::collection::vec("--[a-z]{1,8}", 0..4),
        prop::collection::btree_map("[a-c]", "[a-z]{1,4}", 0..3),
        prop::collection::vec("[a-z.]{1,10}", 0..3),
        document_strategy(),
    )
        .prop_map(|(name, cidr, flags, labels, no_proxy, kubelet_config)| {
            let mut config = NodeConfig::default();
            config.spec.cluster.name = name;
            config.spec.cluster.cidr = cidr;
            config.spec.kubelet.flags = flags;
            config.spec.kubelet.labels = labels;
            config.spec.kubelet.config = kubelet_config;
            config.spec.proxy.no_proxy = no_proxy;
            config
        })
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 2000,
        .. ProptestConfig::default()
    })]

    // Merged flags are exactly the destination flags followed by the source flags
    #[test]
    fn merge_flags_concatenate(dst in config_strategy(), src in config_strategy()) {
        let merged = ConfigMerger::merge(&dst, &src).unwrap();
        let mut expected = dst.spec.kubelet.flags.clone();
        expected.extend(src.spec.kubelet.flags.iter().cloned());
        prop_assert_eq!(merged.spec.kubelet.flags, expected);
    }

    // Merging an empty configuration in either direction changes nothing
    #[test]
    fn merge_with_empty_is_identity(config in config_strategy()) {
        let empty = NodeConfig::default();
        prop_assert_eq!(&ConfigMerger::merge(&config, &empty).unwrap(), &config);
        prop_assert_eq!(&ConfigMerger::merge(&empty, &config).unwrap(), &config);
    }

    // A non-empty source scalar always wins; an empty one never clears
    #[test]
    fn merge_scalar_precedence(dst in config_strategy(), src in config_strategy()) {
        let merged = ConfigMerger::merge(&dst, &src).unwrap();
        let want = if src.spec.cluster.name.is_empty() {
            &dst.spec.cluster.name
        } else {
            &src.spec.cluster.name
        };
        prop_assert_eq!(&merged.spec.cluster.name, want);
    }

    // Every key of either overlay survives the tree merge
    #[test]
    fn merge_overlay_keeps_all_keys(dst in config_strategy(), src in config_strategy()) {
        let merged = ConfigMerger::merge(&dst, &src).unwrap();
        for key in dst.spec.kubelet.config.keys().chain(src.spec.kubelet.config.keys()) {
            prop_assert!(merged.spec.kubelet.config.contains_key(key));
        }
    }

    // Source labels always win key-wise
    #[test]
    fn merge_labels_source_wins(dst in config_strategy(), src in config_strategy()) {
        let merged = ConfigMerger::merge(&dst, &src).unwrap();
        for (key, value) in &src.spec.kubelet.labels {
            prop_assert_eq!(&merged.spec.kubelet.labels[key], value);
        }
        for (key, value) in &dst.spec.kubelet.labels {
            if !src.spec.kubelet.labels.contains_key(key) {
                prop_assert_eq!(&merged.spec.kubelet.labels[key], value);
            }
        }
    }

    // Merge is associative for flag order: (a + b) + c == a + (b + c)
    #[test]
    fn merge_associative(a in config_strategy(), b in config_strategy(), c in config_strategy()) {
        let left = ConfigMerger::merge(&ConfigMerger::merge(&a, &b).unwrap(), &c).unwrap();
        let right = ConfigMerger::merge(&a, &ConfigMerger::merge(&b, &c).unwrap()).unwrap();
        prop_assert_eq!(left.spec.kubelet.flags, right.spec.kubelet.flags);
        prop_assert_eq!(left.spec.cluster, right.spec.cluster);
        prop_assert_eq!(left.spec.kubelet.labels, right.spec.kubelet.labels);
    }
}
