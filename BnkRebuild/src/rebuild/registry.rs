//! Out-of-band targets: transition segments and stingers
//!
//! Music containers can play segments that normal traversal never reaches:
//! transition segments (played between two switch children) and stingers
//! (segments played over the music when a trigger action fires). Both are
//! collected while building so callers can render them afterwards.

use indexmap::{IndexMap, IndexSet};
use serde::Serialize;

use super::builders::BuildCtx;
use crate::error::Result;
use crate::tree::{NodeId, NodeRef};

/// A `CAkStinger`: trigger id → segment.
///
/// Stingers have no sid of their own; the same trigger may point to
/// different segments in different containers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Stinger {
    /// `CAkStinger` node.
    pub node: NodeId,
    /// Trigger fired by trigger actions.
    pub trigger_id: u32,
    /// Segment to play.
    pub segment_id: u32,
}

/// Transition segments and stingers found during a session.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    transitions: IndexSet<NodeId>,
    stingers: IndexMap<u32, Vec<Stinger>>,
}

impl Registry {
    pub fn add_transition(&mut self, node: NodeId) {
        self.transitions.insert(node);
    }

    /// Transition segment nodes, in discovery order.
    pub fn transitions(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.transitions.iter().copied()
    }

    /// Remove and return pending transition segments.
    pub fn take_transitions(&mut self) -> Vec<NodeId> {
        std::mem::take(&mut self.transitions).into_iter().collect()
    }

    pub fn add_stingers(&mut self, stingers: &[Stinger]) {
        for stinger in stingers {
            let entry = self.stingers.entry(stinger.trigger_id).or_default();
            if !entry.contains(stinger) {
                entry.push(stinger.clone());
            }
        }
    }

    /// Stingers a trigger may start.
    pub fn stingers_for(&self, trigger_id: u32) -> &[Stinger] {
        self.stingers.get(&trigger_id).map_or(&[], Vec::as_slice)
    }

    /// All stingers, grouped by trigger in discovery order.
    pub fn stingers(&self) -> impl Iterator<Item = &Stinger> {
        self.stingers.values().flatten()
    }
}

impl BuildCtx<'_, '_> {
    /// Register transition segments of a music container.
    ///
    /// Only switches register them; playlists rarely have any and they are
    /// just counted.
    pub(crate) fn build_transitions(&mut self, is_switch: bool) -> Result<()> {
        // older versions flag use with bIsTransObjectEnabled, but segmentID is 0 then
        for nobject in self.node.finds_name("AkMusicTransitionObject") {
            let tid = nobject
                .find_name("segmentID")
                .and_then(NodeRef::value_u32)
                .unwrap_or_default();
            if tid == 0 {
                continue;
            }
            if is_switch {
                self.session.add_transition_segment(tid)?;
            } else {
                tracing::debug!("Transition object {tid} in playlist {}", self.sid);
                self.session.diagnostics_mut().record_transition_object();
            }
        }
        Ok(())
    }

    /// Collect stingers of a music container.
    pub(crate) fn build_stingers(&mut self) {
        for nstinger in self.node.finds_name("CAkStinger") {
            let trigger_id = nstinger
                .find_name("TriggerID")
                .and_then(NodeRef::value_u32)
                .unwrap_or_default();
            let segment_id = nstinger
                .find_name("SegmentID")
                .and_then(NodeRef::value_u32)
                .unwrap_or_default();
            // segment may be 0
            if segment_id == 0 {
                continue;
            }
            self.stingers.push(Stinger {
                node: nstinger.id(),
                trigger_id,
                segment_id,
            });
        }
        self.session.register_stingers(&self.stingers);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{NodeTree, RawNode};

    #[test]
    fn test_stingers_grouped_by_trigger() {
        let mut tree = NodeTree::new();
        let a = tree.add_bank("a.bnk", RawNode::object("CAkStinger"));
        let b = tree.add_bank("b.bnk", RawNode::object("CAkStinger"));

        let mut registry = Registry::default();
        let first = Stinger {
            node: a,
            trigger_id: 7,
            segment_id: 100,
        };
        let second = Stinger {
            node: b,
            trigger_id: 7,
            segment_id: 200,
        };
        registry.add_stingers(&[first.clone(), second.clone()]);
        registry.add_stingers(std::slice::from_ref(&first));

        assert_eq!(registry.stingers_for(7), &[first, second]);
        assert!(registry.stingers_for(8).is_empty());
        assert_eq!(registry.stingers().count(), 2);
    }

    #[test]
    fn test_take_transitions_drains() {
        let mut tree = NodeTree::new();
        let a = tree.add_bank("a.bnk", RawNode::object("CAkMusicSegment"));
        let mut registry = Registry::default();
        registry.add_transition(a);
        registry.add_transition(a);
        assert_eq!(registry.take_transitions(), vec![a]);
        assert_eq!(registry.transitions().count(), 0);
    }
}
