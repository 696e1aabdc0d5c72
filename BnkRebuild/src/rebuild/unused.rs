//! Unused-node scan
//!
//! Objects no event reaches are still worth rendering (cut content, objects
//! played by code). A node counts as unused if normal traversal never marked
//! it; transition segments are built without marking.

use indexmap::IndexMap;

use super::kind::NodeKind;
use super::session::Rebuilder;
use crate::tree::NodeId;

impl Rebuilder<'_> {
    /// Registered nodes of `kind` that were never used, in registration order.
    ///
    /// Music segments without tracks are skipped: they only make sense as
    /// silence inside a playlist.
    pub fn unused_nodes(&mut self, kind: NodeKind) -> Vec<NodeId> {
        let candidates: Vec<NodeId> = self
            .references()
            .instances(kind.object_name())
            .iter()
            .copied()
            .filter(|&node| !self.references().is_used(node))
            .collect();

        if kind != NodeKind::MusicSegment {
            return candidates;
        }
        candidates
            .into_iter()
            .filter(|&node| !self.is_empty_segment(node))
            .collect()
    }

    /// Whether any interesting kind has unused nodes.
    pub fn has_unused(&mut self) -> bool {
        NodeKind::UNUSED_PRIORITY
            .iter()
            .any(|&kind| !self.unused_nodes(kind).is_empty())
    }

    /// Unused sids per kind, in priority order. Kinds without unused nodes are
    /// left out.
    pub fn unused_report(&mut self) -> IndexMap<NodeKind, Vec<u32>> {
        let mut report = IndexMap::new();
        for kind in NodeKind::UNUSED_PRIORITY {
            let sids: Vec<u32> = self
                .unused_nodes(kind)
                .into_iter()
                .filter_map(|node| self.references().sid_of(node))
                .collect();
            if !sids.is_empty() {
                report.insert(kind, sids);
            }
        }
        report
    }

    fn is_empty_segment(&mut self, node: NodeId) -> bool {
        match self.get(node, None, false) {
            Ok(Some(bnode)) => bnode.is_empty_segment(),
            Ok(None) => false,
            Err(err) => {
                // reported when the segment itself is rendered
                tracing::debug!("Cannot check segment {node}: {err}");
                false
            }
        }
    }
}
