//! Serialized bank node structures
//!
//! `RawNode` is the owned, nested form produced by a bank parser (or read
//! from JSON). It gets flattened into a [`NodeTree`](super::NodeTree) before
//! rebuilding.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::document::NodeValue;

/// A bank file: bank name plus its parsed node tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankFile {
    /// Bank name, used for bank-local media lookups.
    pub bank: String,
    /// Root node of the parsed bank.
    pub root: RawNode,
}

/// An owned generic node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawNode {
    /// Field or object name.
    pub name: String,
    /// Field type ("sid", "tid", "u32", ...), empty for objects and lists.
    #[serde(rename = "type", default, skip_serializing_if = "String::is_empty")]
    pub type_name: String,
    /// Scalar value for leaf fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<NodeValue>,
    /// Extra attributes (e.g. `valuefmt`).
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub attrs: IndexMap<String, String>,
    /// Ordered children.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<RawNode>,
}

impl RawNode {
    /// An object or list node with no value.
    #[must_use]
    pub fn object(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// A typed leaf field.
    #[must_use]
    pub fn field(
        name: impl Into<String>,
        type_name: impl Into<String>,
        value: impl Into<NodeValue>,
    ) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            value: Some(value.into()),
            ..Self::default()
        }
    }

    /// The object's own stable id field.
    #[must_use]
    pub fn sid(sid: u32) -> Self {
        Self::field("ulID", "sid", sid)
    }

    /// A reference to another object's stable id.
    #[must_use]
    pub fn tid(name: impl Into<String>, tid: u32) -> Self {
        Self::field(name, "tid", tid)
    }

    /// Append a child.
    #[must_use]
    pub fn with_child(mut self, child: RawNode) -> Self {
        self.children.push(child);
        self
    }

    /// Append several children.
    #[must_use]
    pub fn with_children(mut self, children: impl IntoIterator<Item = RawNode>) -> Self {
        self.children.extend(children);
        self
    }

    /// Set an attribute.
    #[must_use]
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_node_json_shape() {
        let node = RawNode::object("CAkEvent")
            .with_child(RawNode::sid(5))
            .with_child(RawNode::field("pID", "u8", 6).with_attr("valuefmt", "0x06 [Volume]"));
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["name"], "CAkEvent");
        assert!(json.get("type").is_none());
        assert_eq!(json["children"][0]["type"], "sid");
        assert_eq!(json["children"][1]["attrs"]["valuefmt"], "0x06 [Volume]");

        let back: RawNode = serde_json::from_value(json).unwrap();
        assert_eq!(back, node);
    }

    #[test]
    fn test_untagged_values() {
        let node: RawNode =
            serde_json::from_str(r#"{"name":"fDuration","type":"d64","value":1500.5}"#).unwrap();
        assert_eq!(node.value, Some(NodeValue::Float(1500.5)));
        let node: RawNode =
            serde_json::from_str(r#"{"name":"ulID","type":"sid","value":12}"#).unwrap();
        assert_eq!(node.value, Some(NodeValue::Int(12)));
    }
}
