//! Runtime value tree mirroring a module's field schema.
//!
//! Leaves hold JSON values. Every node knows its own dotted path, derived
//! from where it sits in the tree, so missing-field errors can name it
//! without the caller tracking paths by hand.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueNode {
    segments: Vec<String>,
    leaf: Option<Value>,
    children: BTreeMap<String, ValueNode>,
    /// Set by any non-null `set`, objects included.
    assigned: bool,
}

/// A lookup result that remembers the requested path even when no node
/// exists there yet.
#[derive(Debug, Clone, Copy)]
pub struct NodeRef<'a> {
    path: &'a str,
    node: Option<&'a ValueNode>,
}

impl ValueNode {
    /// An empty root node (path `""`).
    pub fn root() -> Self {
        Self::default()
    }

    /// A root node populated from `value`.
    pub fn from_value(value: Value) -> Self {
        let mut node = Self::root();
        node.set(value);
        node
    }

    fn child_of(parent: &[String], name: &str) -> Self {
        let mut segments = parent.to_vec();
        segments.push(name.to_string());
        Self {
            segments,
            ..Self::default()
        }
    }

    /// Dotted path of this node relative to the module root.
    pub fn path(&self) -> String {
        self.segments.join(".")
    }

    /// True when this node was never assigned and no descendant holds a
    /// value.
    ///
    /// A stored `0`, `false`, `""` or `{}` is defined; JSON `null` is not.
    pub fn is_undefined(&self) -> bool {
        !self.assigned && self.children.values().all(ValueNode::is_undefined)
    }

    /// Store `value`, replacing whatever was here. Objects are expanded into
    /// child nodes so nested fields keep their own paths.
    pub fn set(&mut self, value: Value) {
        self.unset();
        self.assigned = !value.is_null();
        match value {
            Value::Null => {}
            Value::Object(map) => {
                for (key, value) in map {
                    let mut child = Self::child_of(&self.segments, &key);
                    child.set(value);
                    self.children.insert(key, child);
                }
            }
            other => self.leaf = Some(other),
        }
    }

    /// Clear the stored value.
    pub fn unset(&mut self) {
        self.leaf = None;
        self.children.clear();
        self.assigned = false;
    }

    /// The stored value, or `None` if undefined.
    pub fn value(&self) -> Option<Value> {
        if self.is_undefined() {
            None
        } else {
            Some(self.to_value())
        }
    }

    /// Return the stored value as `T`, or `default` after calling
    /// `on_missing` with this node's path.
    ///
    /// A value of the wrong shape counts as missing.
    pub fn get_or<T, F>(&self, default: T, on_missing: F) -> T
    where
        T: DeserializeOwned,
        F: FnOnce(&str),
    {
        match self.value().and_then(|value| serde_json::from_value(value).ok()) {
            Some(found) => found,
            None => {
                on_missing(&self.path());
                default
            }
        }
    }

    pub fn child(&self, name: &str) -> Option<&ValueNode> {
        self.children.get(name)
    }

    /// Look up a dotted path below this node.
    pub fn at<'a>(&'a self, path: &'a str) -> NodeRef<'a> {
        let mut node = Some(self);
        for segment in path.split('.').filter(|segment| !segment.is_empty()) {
            node = node.and_then(|current| current.child(segment));
        }
        NodeRef { path, node }
    }

    /// Mutable lookup that creates every missing node along `path`.
    ///
    /// A leaf standing where an object is needed is replaced by an object.
    pub fn at_mut(&mut self, path: &str) -> &mut ValueNode {
        let mut node = self;
        for segment in path.split('.').filter(|segment| !segment.is_empty()) {
            node.leaf = None;
            let parent = &node.segments;
            let child = Self::child_of(parent, segment);
            node = node.children.entry(segment.to_string()).or_insert(child);
        }
        node
    }

    /// Set the node at `path`, creating intermediate objects as needed.
    pub fn set_at(&mut self, path: &str, value: Value) {
        self.at_mut(path).set(value);
    }

    /// JSON rendition; undefined children are omitted, an undefined node is `null`.
    pub fn to_value(&self) -> Value {
        if let Some(value) = &self.leaf {
            return value.clone();
        }
        if self.is_undefined() {
            return Value::Null;
        }
        let map: Map<String, Value> = self
            .children
            .iter()
            .filter(|(_, child)| !child.is_undefined())
            .map(|(key, child)| (key.clone(), child.to_value()))
            .collect();
        Value::Object(map)
    }
}

impl Serialize for ValueNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

impl<'a> NodeRef<'a> {
    pub fn path(&self) -> &'a str {
        self.path
    }

    pub fn node(&self) -> Option<&'a ValueNode> {
        self.node
    }

    pub fn is_undefined(&self) -> bool {
        self.node.is_none_or(ValueNode::is_undefined)
    }

    pub fn value(&self) -> Option<Value> {
        self.node.and_then(ValueNode::value)
    }

    pub fn get_or<T, F>(&self, default: T, on_missing: F) -> T
    where
        T: DeserializeOwned,
        F: FnOnce(&str),
    {
        match self.node {
            Some(node) => node.get_or(default, on_missing),
            None => {
                on_missing(self.path);
                default
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unset_node_returns_default_and_reports_path_once() {
        let mut root = ValueNode::root();
        let node = root.at_mut("sender.mac");
        let mut calls = Vec::new();
        let got: String = node.get_or("00:00:00:00:00:00".to_string(), |path| {
            calls.push(path.to_string())
        });
        assert_eq!(got, "00:00:00:00:00:00");
        assert_eq!(calls, vec!["sender.mac".to_string()]);
    }

    #[test]
    fn set_then_get_returns_value() {
        let mut root = ValueNode::root();
        root.set_at("ttl", json!(64));
        let node = root.at("ttl");
        assert!(!node.is_undefined());
        let got: u64 = node.get_or(0, |_| panic!("value should be present"));
        assert_eq!(got, 64);
    }

    #[test]
    fn zero_and_false_are_defined() {
        let root = ValueNode::from_value(json!({"opcode": 0, "flags": {"df": false}}));
        assert!(!root.at("opcode").is_undefined());
        assert!(!root.at("flags.df").is_undefined());
        assert!(root.at("flags.mf").is_undefined());
    }

    #[test]
    fn paths_follow_tree_position() {
        let root = ValueNode::from_value(json!({"dsfield": {"dscp": 10, "ecn": 1}}));
        let dscp = root.at("dsfield.dscp").node().unwrap();
        assert_eq!(dscp.path(), "dsfield.dscp");
        assert_eq!(root.child("dsfield").unwrap().path(), "dsfield");
    }

    #[test]
    fn missing_lookup_still_reports_requested_path() {
        let root = ValueNode::root();
        let mut seen = None;
        let got: u64 = root.at("flags.syn").get_or(7, |path| seen = Some(path.to_string()));
        assert_eq!(got, 7);
        assert_eq!(seen.as_deref(), Some("flags.syn"));
    }

    #[test]
    fn wrong_shape_counts_as_missing() {
        let root = ValueNode::from_value(json!({"ttl": "sixty-four"}));
        let mut missing = 0;
        let got: u64 = root.at("ttl").get_or(1, |_| missing += 1);
        assert_eq!((got, missing), (1, 1));
    }

    #[test]
    fn set_at_replaces_leaf_with_object() {
        let mut root = ValueNode::from_value(json!({"flags": 3}));
        root.set_at("flags.syn", json!(true));
        assert_eq!(root.to_value(), json!({"flags": {"syn": true}}));
    }

    #[test]
    fn to_value_omits_undefined_children() {
        let mut root = ValueNode::root();
        root.at_mut("tclass.dscp");
        root.set_at("hlim", json!(64));
        assert_eq!(root.to_value(), json!({"hlim": 64}));
        assert_eq!(serde_json::to_value(&root).unwrap(), json!({"hlim": 64}));
    }

    #[test]
    fn empty_object_counts_as_set() {
        let mut node = ValueNode::root();
        node.set(json!({}));
        assert!(!node.is_undefined());
        assert_eq!(node.value(), Some(json!({})));

        let mut root = ValueNode::root();
        root.set_at("dsfield", json!({"dscp": null}));
        assert!(!root.at("dsfield").is_undefined());
        assert!(root.at("dsfield.dscp").is_undefined());
        assert_eq!(root.to_value(), json!({"dsfield": {}}));
    }

    #[test]
    fn null_clears_a_value() {
        let mut root = ValueNode::from_value(json!({"ttl": 64}));
        root.set_at("ttl", Value::Null);
        assert!(root.at("ttl").is_undefined());
    }
}
