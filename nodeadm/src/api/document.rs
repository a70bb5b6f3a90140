//! Structured-document overlays.
//!
//! Kubelet and containerd overlays are carried as a generic tree of maps,
//! sequences and scalars so they can be merged key-by-key without knowing
//! their schema. JSON and YAML map onto [`Node`] through serde; TOML goes
//! through explicit conversions because it has no null and has datetimes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A map-rooted overlay document, as found under `kubelet.config`.
pub type InlineDocument = BTreeMap<String, Node>;

/// One value in a structured document.
///
/// # Examples
///
/// ```
/// use nodeadm::api::Node;
///
/// let node: Node = serde_json::from_str(r#"{"logging":{"verbosity":5}}"#).unwrap();
/// assert_eq!(node.get("logging").and_then(|l| l.get("verbosity")), Some(&Node::Integer(5)));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Node {
    /// An explicit null.
    Null,
    /// A boolean.
    Bool(bool),
    /// A signed integer.
    Integer(i64),
    /// A floating point number.
    Float(f64),
    /// A string.
    String(String),
    /// An ordered sequence.
    Sequence(Vec<Node>),
    /// A map with string keys.
    Map(BTreeMap<String, Node>),
}

impl Node {
    /// Looks up a key when this node is a map.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Node> {
        match self {
            Self::Map(map) => map.get(key),
            _ => None,
        }
    }
}

/// Applies `src` on top of `dst` and returns the result.
///
/// Maps are merged recursively: keys only in one side are kept, keys in
/// both are merged again. Any other `src` value replaces `dst`, except
/// `Null`, which never clobbers.
///
/// # Examples
///
/// ```
/// use nodeadm::api::{merge_nodes, Node};
///
/// let a: Node = serde_json::from_str(r#"{"logging":{"verbosity":5},"podsPerCore":20}"#).unwrap();
/// let b: Node = serde_json::from_str(r#"{"logging":{"verbosity":2},"maxPods":150}"#).unwrap();
/// let want: Node = serde_json::from_str(r#"{"logging":{"verbosity":2},"podsPerCore":20,"maxPods":150}"#).unwrap();
/// assert_eq!(merge_nodes(&a, &b), want);
/// ```
#[must_use]
pub fn merge_nodes(dst: &Node, src: &Node) -> Node {
    match (dst, src) {
        (Node::Map(dst_map), Node::Map(src_map)) => Node::Map(merge_documents(dst_map, src_map)),
        (dst, Node::Null) => dst.clone(),
        (_, src) => src.clone(),
    }
}

/// Merges two map-rooted documents with [`merge_nodes`] semantics.
#[must_use]
pub fn merge_documents(dst: &InlineDocument, src: &InlineDocument) -> InlineDocument {
    let mut merged = dst.clone();
    for (key, src_value) in src {
        let value = match dst.get(key) {
            Some(dst_value) => merge_nodes(dst_value, src_value),
            None => src_value.clone(),
        };
        merged.insert(key.clone(), value);
    }
    merged
}

/// Parses a TOML document into a tree.
///
/// # Errors
///
/// Returns the TOML parser error if the text is not valid TOML.
pub fn from_toml(text: &str) -> Result<InlineDocument, toml::de::Error> {
    let table: toml::Table = text.parse()?;
    Ok(table
        .into_iter()
        .map(|(key, value)| (key, from_toml_value(value)))
        .collect())
}

/// Renders a tree as TOML text. `Null` entries are dropped.
///
/// # Errors
///
/// Returns the TOML serializer error if the tree cannot be represented,
/// for example a sequence mixing tables and scalars.
pub fn to_toml(document: &InlineDocument) -> Result<String, toml::ser::Error> {
    let table: toml::Table = document
        .iter()
        .filter_map(|(key, node)| to_toml_value(node).map(|value| (key.clone(), value)))
        .collect();
    toml::to_string(&table)
}

fn from_toml_value(value: toml::Value) -> Node {
    match value {
        toml::Value::String(s) => Node::String(s),
        toml::Value::Integer(i) => Node::Integer(i),
        toml::Value::Float(f) => Node::Float(f),
        toml::Value::Boolean(b) => Node::Bool(b),
        // carried as text; containerd configs do not use datetimes
        toml::Value::Datetime(dt) => Node::String(dt.to_string()),
        toml::Value::Array(items) => Node::Sequence(items.into_iter().map(from_toml_value).collect()),
        toml::Value::Table(table) => Node::Map(
            table
                .into_iter()
                .map(|(key, value)| (key, from_toml_value(value)))
                .collect(),
        ),
    }
}

fn to_toml_value(node: &Node) -> Option<toml::Value> {
    Some(match node {
        Node::Null => return None,
        Node::Bool(b) => toml::Value::Boolean(*b),
        Node::Integer(i) => toml::Value::Integer(*i),
        Node::Float(f) => toml::Value::Float(*f),
        Node::String(s) => toml::Value::String(s.clone()),
        Node::Sequence(items) => toml::Value::Array(items.iter().filter_map(to_toml_value).collect()),
        Node::Map(map) => toml::Value::Table(
            map.iter()
                .filter_map(|(key, node)| to_toml_value(node).map(|value| (key.clone(), value)))
                .collect(),
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn json(text: &str) -> Node {
        serde_json::from_str(text).unwrap()
    }

    #[test]
    fn test_merge_deep_union() {
        let a = json(r#"{"logging":{"verbosity":5},"podsPerCore":20}"#);
        let b = json(r#"{"logging":{"verbosity":2},"maxPods":150}"#);
        let merged = merge_nodes(&a, &b);
        assert_eq!(
            merged,
            json(r#"{"logging":{"verbosity":2},"podsPerCore":20,"maxPods":150}"#)
        );
    }

    #[test]
    fn test_merge_replaces_sequences() {
        let a = json(r#"{"clusterDNS":["10.100.0.10"]}"#);
        let b = json(r#"{"clusterDNS":["169.254.20.10","10.100.0.10"]}"#);
        assert_eq!(merge_nodes(&a, &b), b);
    }

    #[test]
    fn test_merge_null_does_not_clobber() {
        let a = json(r#"{"maxPods":110}"#);
        let b = json(r#"{"maxPods":null}"#);
        assert_eq!(merge_nodes(&a, &b), a);
    }

    #[test]
    fn test_merge_false_and_zero_override() {
        let a = json(r#"{"serializeImagePulls":true,"podsPerCore":10}"#);
        let b = json(r#"{"serializeImagePulls":false,"podsPerCore":0}"#);
        assert_eq!(merge_nodes(&a, &b), b);
    }

    #[test]
    fn test_merge_scalar_replaced_by_map() {
        let a = json(r#"{"evictionHard":"off"}"#);
        let b = json(r#"{"evictionHard":{"memory.available":"100Mi"}}"#);
        assert_eq!(merge_nodes(&a, &b), b);
    }

    #[test]
    fn test_yaml_maps_onto_tree() {
        let node: Node = serde_yaml::from_str("a:\n  b: [1, 2.5, x, true, null]\n").unwrap();
        let b = node.get("a").and_then(|a| a.get("b")).unwrap();
        assert_eq!(
            b,
            &Node::Sequence(vec![
                Node::Integer(1),
                Node::Float(2.5),
                Node::String("x".to_string()),
                Node::Bool(true),
                Node::Null,
            ])
        );
    }

    #[test]
    fn test_toml_round_trip_merge() {
        let dst = from_toml(
            "version = 2\n[plugins.\"io.containerd.grpc.v1.cri\"]\nsandbox_image = \"pause:3.5\"\n",
        )
        .unwrap();
        let src = from_toml(
            "[plugins.\"io.containerd.grpc.v1.cri\".containerd]\ndiscard_unpacked_layers = true\n",
        )
        .unwrap();
        let merged = to_toml(&merge_documents(&dst, &src)).unwrap();
        let reparsed = from_toml(&merged).unwrap();

        let cri = reparsed
            .get("plugins")
            .and_then(|p| p.get("io.containerd.grpc.v1.cri"))
            .unwrap();
        assert_eq!(cri.get("sandbox_image"), Some(&Node::String("pause:3.5".to_string())));
        assert_eq!(
            cri.get("containerd").and_then(|c| c.get("discard_unpacked_layers")),
            Some(&Node::Bool(true))
        );
        assert_eq!(reparsed.get("version"), Some(&Node::Integer(2)));
    }

    #[test]
    fn test_to_toml_drops_nulls() {
        let mut doc = InlineDocument::new();
        doc.insert("a".to_string(), Node::Null);
        doc.insert("b".to_string(), Node::Integer(1));
        let text = to_toml(&doc).unwrap();
        assert!(!text.contains('a'));
        assert!(text.contains("b = 1"));
    }

    #[test]
    fn test_from_toml_rejects_garbage() {
        assert!(from_toml("[unterminated").is_err());
    }
}
