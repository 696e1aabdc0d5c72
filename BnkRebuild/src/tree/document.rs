//! Generic node arena
//!
//! Parsed banks are flattened into one arena. Every node gets a small
//! [`NodeId`] at load time, and all side tables in the rebuilder are keyed by
//! that index instead of by object identity.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::raw::RawNode;
use crate::error::{Error, Result};

/// Arena index of a generic node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(u32);

impl NodeId {
    /// Position of the node in its arena.
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Scalar value stored on a leaf node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeValue {
    /// Integer field (ids, counts, enums, flags).
    Int(i64),
    /// Floating point field (volumes, times, positions).
    Float(f64),
    /// Text field.
    Text(String),
}

impl NodeValue {
    /// Value as a signed integer (floats are truncated, text is parsed).
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            NodeValue::Int(v) => Some(*v),
            NodeValue::Float(v) => Some(*v as i64),
            NodeValue::Text(s) => s.trim().parse().ok(),
        }
    }

    /// Value as an unsigned 32-bit id.
    #[must_use]
    pub fn as_u32(&self) -> Option<u32> {
        self.as_i64().and_then(|v| u32::try_from(v).ok())
    }

    /// Value as a float.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            NodeValue::Int(v) => Some(*v as f64),
            NodeValue::Float(v) => Some(*v),
            NodeValue::Text(s) => s.trim().parse().ok(),
        }
    }
}

impl fmt::Display for NodeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeValue::Int(v) => write!(f, "{v}"),
            NodeValue::Float(v) => write!(f, "{v}"),
            NodeValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for NodeValue {
    fn from(v: i64) -> Self {
        NodeValue::Int(v)
    }
}

impl From<i32> for NodeValue {
    fn from(v: i32) -> Self {
        NodeValue::Int(i64::from(v))
    }
}

impl From<u32> for NodeValue {
    fn from(v: u32) -> Self {
        NodeValue::Int(i64::from(v))
    }
}

impl From<f64> for NodeValue {
    fn from(v: f64) -> Self {
        NodeValue::Float(v)
    }
}

impl From<&str> for NodeValue {
    fn from(v: &str) -> Self {
        NodeValue::Text(v.to_string())
    }
}

#[derive(Debug, Clone)]
struct NodeData {
    name: String,
    type_name: String,
    value: Option<NodeValue>,
    attrs: IndexMap<String, String>,
    parent: Option<NodeId>,
    index: usize,
    children: Vec<NodeId>,
    bank: usize,
}

/// A loaded bank: its name and root node.
#[derive(Debug, Clone)]
pub struct Bank {
    /// Bank name (e.g. "BGM.bnk"), used for bank-local media lookups.
    pub name: String,
    /// Root node of the bank.
    pub root: NodeId,
}

/// Arena holding the generic nodes of one or more banks.
///
/// The tree is immutable once loaded and can be shared between rebuilder
/// sessions running on different threads.
#[derive(Debug, Clone, Default)]
pub struct NodeTree {
    nodes: Vec<NodeData>,
    banks: Vec<Bank>,
}

impl NodeTree {
    /// Create an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes across all banks.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if no bank has been loaded.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Loaded banks, in load order.
    pub fn banks(&self) -> &[Bank] {
        &self.banks
    }

    /// Flatten a parsed bank into the arena and return its root id.
    pub fn add_bank(&mut self, name: impl Into<String>, root: RawNode) -> NodeId {
        let bank = self.banks.len();
        let root_id = NodeId(self.nodes.len() as u32);

        // (node, parent, sibling index); children pushed reversed so ids follow document order
        let mut stack: Vec<(RawNode, Option<NodeId>, usize)> = vec![(root, None, 0)];
        while let Some((raw, parent, index)) = stack.pop() {
            let id = NodeId(self.nodes.len() as u32);
            let RawNode {
                name,
                type_name,
                value,
                attrs,
                children,
            } = raw;

            self.nodes.push(NodeData {
                name,
                type_name,
                value,
                attrs,
                parent,
                index,
                children: Vec::with_capacity(children.len()),
                bank,
            });
            if let Some(parent) = parent {
                self.nodes[parent.index()].children.push(id);
            }

            for (child_index, child) in children.into_iter().enumerate().rev() {
                stack.push((child, Some(id), child_index));
            }
        }

        self.banks.push(Bank {
            name: name.into(),
            root: root_id,
        });
        root_id
    }

    /// Get a handle to a node.
    pub fn get(&self, id: NodeId) -> Option<NodeRef<'_>> {
        (id.index() < self.nodes.len()).then_some(NodeRef { tree: self, id })
    }

    /// Get a handle to a node, failing on an id from another tree.
    pub fn node(&self, id: NodeId) -> Result<NodeRef<'_>> {
        self.get(id)
            .ok_or_else(|| Error::InvalidTree(format!("unknown node {id}")))
    }

    fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.index()]
    }
}

/// Borrowed handle to one generic node, exposing the query API.
#[derive(Clone, Copy)]
pub struct NodeRef<'a> {
    tree: &'a NodeTree,
    id: NodeId,
}

impl fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("id", &self.id)
            .field("name", &self.name())
            .field("value", &self.value())
            .finish()
    }
}

impl<'a> NodeRef<'a> {
    /// Arena id of this node.
    pub fn id(self) -> NodeId {
        self.id
    }

    /// The tree this node belongs to.
    pub fn tree(self) -> &'a NodeTree {
        self.tree
    }

    /// Field or object name (e.g. `CAkSound`, `ulActionID`).
    pub fn name(self) -> &'a str {
        &self.tree.data(self.id).name
    }

    /// Field type (e.g. "sid", "tid", "u32"); empty for objects and lists.
    pub fn type_name(self) -> &'a str {
        &self.tree.data(self.id).type_name
    }

    /// Scalar value, if this is a leaf field.
    pub fn value(self) -> Option<&'a NodeValue> {
        self.tree.data(self.id).value.as_ref()
    }

    /// Scalar value as an id.
    pub fn value_u32(self) -> Option<u32> {
        self.value().and_then(NodeValue::as_u32)
    }

    /// Scalar value as a signed integer.
    pub fn value_i64(self) -> Option<i64> {
        self.value().and_then(NodeValue::as_i64)
    }

    /// Scalar value as a float.
    pub fn value_f64(self) -> Option<f64> {
        self.value().and_then(NodeValue::as_f64)
    }

    /// Named attribute (e.g. `valuefmt` on property keys).
    pub fn attr(self, key: &str) -> Option<&'a str> {
        self.tree.data(self.id).attrs.get(key).map(String::as_str)
    }

    /// Parent node, `None` for bank roots.
    pub fn parent(self) -> Option<NodeRef<'a>> {
        self.tree.data(self.id).parent.map(|id| NodeRef {
            tree: self.tree,
            id,
        })
    }

    /// Position of this node among its parent's children.
    pub fn index(self) -> usize {
        self.tree.data(self.id).index
    }

    /// Name of the bank this node was loaded from.
    pub fn bank_name(self) -> &'a str {
        &self.tree.banks[self.tree.data(self.id).bank].name
    }

    /// Ordered direct children.
    pub fn children(self) -> impl Iterator<Item = NodeRef<'a>> + 'a {
        let tree = self.tree;
        tree.data(self.id)
            .children
            .iter()
            .map(move |&id| NodeRef { tree, id })
    }

    /// Whether this node has any children.
    pub fn has_children(self) -> bool {
        !self.tree.data(self.id).children.is_empty()
    }

    /// First direct child with the given name.
    pub fn child(self, name: &str) -> Option<NodeRef<'a>> {
        self.children().find(|c| c.name() == name)
    }

    /// All descendants in document (pre-)order, excluding this node.
    pub fn descendants(self) -> Descendants<'a> {
        let mut stack: Vec<NodeId> = self.tree.data(self.id).children.clone();
        stack.reverse();
        Descendants {
            tree: self.tree,
            stack,
        }
    }

    /// First descendant with the given name.
    pub fn find_name(self, name: &str) -> Option<NodeRef<'a>> {
        self.descendants().find(|n| n.name() == name)
    }

    /// First descendant with the given field type.
    pub fn find_type(self, type_name: &str) -> Option<NodeRef<'a>> {
        self.descendants().find(|n| n.type_name() == type_name)
    }

    /// All descendants with the given name, in document order.
    pub fn finds_name(self, name: &str) -> Vec<NodeRef<'a>> {
        self.descendants().filter(|n| n.name() == name).collect()
    }

    /// All descendants with the given field type, in document order.
    pub fn finds_type(self, type_name: &str) -> Vec<NodeRef<'a>> {
        self.descendants()
            .filter(|n| n.type_name() == type_name)
            .collect()
    }
}

/// Pre-order descendant iterator (explicit stack, no recursion).
pub struct Descendants<'a> {
    tree: &'a NodeTree,
    stack: Vec<NodeId>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = NodeRef<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        let children = &self.tree.data(id).children;
        self.stack.extend(children.iter().rev());
        Some(NodeRef {
            tree: self.tree,
            id,
        })
    }
}
