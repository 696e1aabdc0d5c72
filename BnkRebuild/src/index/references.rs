//! Stable id ↔ generic node bookkeeping
//!
//! Objects can be repeated when saved to different banks. Repeats should be
//! clones, so the first registered node is the one that gets rebuilt; later
//! copies only keep their node → sid entry.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;

use crate::tree::{NodeId, NodeRef};

/// Reference index for hierarchy objects, plus usage tracking.
#[derive(Debug, Clone, Default)]
pub struct ReferenceIndex {
    /// sid → first registered node
    node_refs: HashMap<u32, NodeId>,
    /// node → sid, for every registered copy
    sid_refs: HashMap<NodeId, u32>,
    /// object name → first-registered instances, in registration order
    name_refs: IndexMap<String, Vec<NodeId>>,
    /// nodes whose rebuilt object was reached by normal traversal
    used: HashSet<NodeId>,
}

impl ReferenceIndex {
    /// Create an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct stable ids.
    pub fn len(&self) -> usize {
        self.node_refs.len()
    }

    /// Check if nothing was registered.
    pub fn is_empty(&self) -> bool {
        self.node_refs.is_empty()
    }

    /// Register a node under its stable id.
    ///
    /// Returns `true` if this is the first node seen for `sid`.
    pub fn add_node_ref(&mut self, sid: u32, node: NodeRef<'_>) -> bool {
        self.sid_refs.insert(node.id(), sid);
        if self.node_refs.contains_key(&sid) {
            tracing::trace!("Repeated id {sid} (node {})", node.id());
            return false;
        }
        self.node_refs.insert(sid, node.id());
        self.name_refs
            .entry(node.name().to_string())
            .or_default()
            .push(node.id());
        true
    }

    /// Node registered for a stable id.
    pub fn get_node_ref(&self, sid: u32) -> Option<NodeId> {
        self.node_refs.get(&sid).copied()
    }

    /// Stable id a node was registered with (any copy).
    pub fn sid_of(&self, node: NodeId) -> Option<u32> {
        self.sid_refs.get(&node).copied()
    }

    /// First-registered instances of an object name.
    pub fn instances(&self, name: &str) -> &[NodeId] {
        self.name_refs.get(name).map_or(&[], Vec::as_slice)
    }

    /// Registered object names with their instance counts.
    pub fn counts(&self) -> impl Iterator<Item = (&str, usize)> {
        self.name_refs
            .iter()
            .map(|(name, nodes)| (name.as_str(), nodes.len()))
    }

    /// Mark a node as used. Returns `true` the first time.
    pub fn mark_used(&mut self, node: NodeId) -> bool {
        self.used.insert(node)
    }

    /// Whether a node has been used.
    pub fn is_used(&self, node: NodeId) -> bool {
        self.used.contains(&node)
    }

    /// Copy of the registrations without any usage marks.
    #[must_use]
    pub fn without_usage(&self) -> Self {
        Self {
            node_refs: self.node_refs.clone(),
            sid_refs: self.sid_refs.clone(),
            name_refs: self.name_refs.clone(),
            used: HashSet::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{NodeTree, RawNode};

    #[test]
    fn test_first_registration_wins() {
        let mut tree = NodeTree::new();
        let a = tree.add_bank("A.bnk", RawNode::object("CAkSound").with_child(RawNode::sid(5)));
        let b = tree.add_bank("B.bnk", RawNode::object("CAkSound").with_child(RawNode::sid(5)));

        let mut index = ReferenceIndex::new();
        assert!(index.add_node_ref(5, tree.node(a).unwrap()));
        assert!(!index.add_node_ref(5, tree.node(b).unwrap()));

        assert_eq!(index.get_node_ref(5), Some(a));
        assert_eq!(index.sid_of(b), Some(5));
        assert_eq!(index.instances("CAkSound"), &[a]);
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_usage_marks() {
        let mut tree = NodeTree::new();
        let a = tree.add_bank("A.bnk", RawNode::object("CAkSound").with_child(RawNode::sid(5)));
        let mut index = ReferenceIndex::new();
        index.add_node_ref(5, tree.node(a).unwrap());

        assert!(!index.is_used(a));
        assert!(index.mark_used(a));
        assert!(!index.mark_used(a));
        assert!(index.is_used(a));
        assert!(!index.without_usage().is_used(a));
    }
}
