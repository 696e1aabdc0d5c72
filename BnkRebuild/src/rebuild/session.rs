//! Rebuilder session
//!
//! A session owns every mutable table used while rebuilding: the sid → node
//! cache, usage marks, the media index, registries and diagnostics. The
//! generic tree is only borrowed, so several sessions can work over the same
//! tree (one per thread in parallel mode).

use std::collections::HashMap;
use std::rc::Rc;

use super::builders::build_node;
use super::config::NodeConfig;
use super::diagnostics::Diagnostics;
use super::node::RebuiltNode;
use super::registry::{Registry, Stinger};
use crate::error::{Error, Result};
use crate::index::{MediaIndex, MediaLocation, ReferenceIndex};
use crate::output::PlaylistWriter;
use crate::tree::{NodeId, NodeRef, NodeTree};

/// Registered objects and media of a set of banks, without usage marks.
///
/// Cloned into each parallel session.
#[derive(Debug, Clone, Default)]
pub struct Registrations {
    pub references: ReferenceIndex,
    pub media: MediaIndex,
}

/// Rebuilding session over a loaded [`NodeTree`].
pub struct Rebuilder<'a> {
    tree: &'a NodeTree,
    references: ReferenceIndex,
    media: MediaIndex,
    nodes: HashMap<u32, Rc<RebuiltNode>>,
    registry: Registry,
    diagnostics: Diagnostics,
    /// sids being built, to stop runaway build recursion
    building: Vec<u32>,
    /// sids in the current render chain
    rendering: Vec<u32>,
    builds: usize,
}

impl<'a> Rebuilder<'a> {
    /// Create a session with nothing registered.
    #[must_use]
    pub fn new(tree: &'a NodeTree) -> Self {
        Self::with_registrations(tree, Registrations::default())
    }

    /// Create a session reusing registrations made by another session.
    #[must_use]
    pub fn with_registrations(tree: &'a NodeTree, registrations: Registrations) -> Self {
        Self {
            tree,
            references: registrations.references,
            media: registrations.media,
            nodes: HashMap::new(),
            registry: Registry::default(),
            diagnostics: Diagnostics::default(),
            building: Vec::new(),
            rendering: Vec::new(),
            builds: 0,
        }
    }

    /// Create a session with every loaded bank registered.
    ///
    /// # Errors
    /// Fails if a bank root doesn't belong to the tree.
    pub fn with_banks(tree: &'a NodeTree) -> Result<Self> {
        let mut session = Self::new(tree);
        session.register_all()?;
        Ok(session)
    }

    pub fn tree(&self) -> &'a NodeTree {
        self.tree
    }

    // ==================== Registration ====================

    /// Register the hierarchy objects and media of every loaded bank.
    pub fn register_all(&mut self) -> Result<()> {
        for bank in self.tree.banks() {
            self.register_bank(bank.root)?;
        }
        Ok(())
    }

    /// Register one bank: `CAk*` objects with a sid, and `MediaHeader` entries
    /// by position.
    pub fn register_bank(&mut self, root: NodeId) -> Result<()> {
        let root = self.tree.node(root)?;
        let bank = root.bank_name();
        let mut media_index = 0;
        let mut objects = 0;

        for node in std::iter::once(root).chain(root.descendants()) {
            if node.name() == "MediaHeader" {
                if let Some(sid) = node.child("id").and_then(NodeRef::value_u32) {
                    self.media.add_media_index(bank, sid, media_index);
                }
                media_index += 1;
                continue;
            }
            if !node.name().starts_with("CAk") {
                continue;
            }
            let sid = node
                .children()
                .find(|c| c.type_name() == "sid")
                .and_then(NodeRef::value_u32);
            if let Some(sid) = sid {
                self.references.add_node_ref(sid, node);
                objects += 1;
            }
        }

        tracing::debug!("Registered {objects} objects and {media_index} media from {bank}");
        Ok(())
    }

    /// Register a node under its stable id (first registration wins).
    pub fn add_node_ref(&mut self, sid: u32, node: NodeId) -> Result<()> {
        let node = self.tree.node(node)?;
        self.references.add_node_ref(sid, node);
        Ok(())
    }

    /// Node registered for a stable id.
    pub fn get_node_ref(&self, sid: u32) -> Option<NodeRef<'a>> {
        self.references
            .get_node_ref(sid)
            .and_then(|id| self.tree.get(id))
    }

    pub fn add_media_index(&mut self, bank: &str, sid: u32, index: u32) {
        self.media.add_media_index(bank, sid, index);
    }

    /// Locate media, preferring `bank`. Unresolved sids are recorded as missing.
    pub fn get_media_index(&mut self, bank: &str, sid: u32) -> Option<MediaLocation> {
        if sid == 0 {
            return None;
        }
        let found = self.media.lookup(bank, sid);
        if found.is_none() {
            tracing::debug!("Media {sid} not found (requested by {bank})");
            self.diagnostics.record_missing_media(sid);
        }
        found
    }

    pub fn references(&self) -> &ReferenceIndex {
        &self.references
    }

    pub fn media(&self) -> &MediaIndex {
        &self.media
    }

    /// Registrations without usage marks, to start more sessions.
    #[must_use]
    pub fn registrations(&self) -> Registrations {
        Registrations {
            references: self.references.without_usage(),
            media: self.media.clone(),
        }
    }

    // ==================== Rebuilt nodes ====================

    /// Get the rebuilt node for `node`, building it on first access.
    ///
    /// The sid is `sid` if given (and non-zero), else the one the node was
    /// registered with, else the node's own sid field. Nodes without any sid
    /// yield `None`. Unless `mark_used` is false the node counts as used.
    ///
    /// # Errors
    /// Fails if building the node fails.
    pub fn get(
        &mut self,
        node: NodeId,
        sid: Option<u32>,
        mark_used: bool,
    ) -> Result<Option<Rc<RebuiltNode>>> {
        let noderef = self.tree.node(node)?;

        let sid = sid
            .filter(|&sid| sid != 0)
            .or_else(|| self.references.sid_of(node))
            .or_else(|| {
                let sid = noderef
                    .children()
                    .find(|c| c.type_name() == "sid")
                    .and_then(NodeRef::value_u32)?;
                // not registered by the loader, can be ignored
                tracing::debug!("Unregistered sid {sid} ({})", noderef.name());
                Some(sid)
            })
            .filter(|&sid| sid != 0);
        let Some(sid) = sid else {
            tracing::debug!("Node {node} ({}) has no sid", noderef.name());
            self.diagnostics.record_unidentified_node();
            return Ok(None);
        };

        if let Some(bnode) = self.nodes.get(&sid) {
            let bnode = Rc::clone(bnode);
            if mark_used {
                self.references.mark_used(node);
            }
            return Ok(Some(bnode));
        }

        if self.building.contains(&sid) {
            return Err(Error::CyclicReference { sid });
        }
        self.building.push(sid);
        let built = build_node(self, noderef, sid);
        self.building.pop();

        let bnode = Rc::new(built?);
        self.builds += 1;
        self.nodes.insert(sid, Rc::clone(&bnode));
        if mark_used {
            self.references.mark_used(node);
        }
        Ok(Some(bnode))
    }

    /// Get the rebuilt node registered for `sid`, if any.
    pub fn get_by_sid(&mut self, sid: u32) -> Result<Option<Rc<RebuiltNode>>> {
        match self.references.get_node_ref(sid) {
            Some(node) => self.get(node, Some(sid), true),
            None => Ok(None),
        }
    }

    /// Like [`get_by_sid`](Self::get_by_sid) but unknown ids count as missing.
    pub(crate) fn get_by_tid(&mut self, tid: u32) -> Result<Option<Rc<RebuiltNode>>> {
        let Some(node) = self.references.get_node_ref(tid) else {
            tracing::debug!("Missing node {tid}");
            self.diagnostics.record_missing_node(tid);
            return Ok(None);
        };
        self.get(node, Some(tid), true)
    }

    /// Number of rebuilt nodes cached.
    pub fn cached(&self) -> usize {
        self.nodes.len()
    }

    /// Number of builds run (each sid builds once).
    pub fn builds(&self) -> usize {
        self.builds
    }

    // ==================== Rendering ====================

    /// Render a root object (event, dialogue event or any hierarchy object).
    ///
    /// # Errors
    /// Fails on structural problems anywhere under the root; the error carries
    /// the innermost failing sid.
    pub fn begin_render(&mut self, writer: &mut dyn PlaylistWriter, root: NodeId) -> Result<()> {
        let Some(bnode) = self.get(root, None, true)? else {
            return Ok(());
        };

        self.rendering.clear();
        writer.begin(self.tree.node(root)?, &NodeConfig::default(), None);
        self.render(&bnode, writer)
    }

    /// Render the segment a stinger plays.
    ///
    /// Stingers have no sid, so the node is rebuilt under its trigger id and
    /// not cached (the same trigger may play different segments).
    pub fn begin_render_stinger(
        &mut self,
        writer: &mut dyn PlaylistWriter,
        stinger: &Stinger,
    ) -> Result<()> {
        let node = self.tree.node(stinger.node)?;
        let bnode = build_node(self, node, stinger.trigger_id)?;

        self.rendering.clear();
        writer.begin(node, &NodeConfig::default(), Some(stinger));
        self.render(&bnode, writer)
    }

    /// Render the object `tid` points to. Id 0 and missing ids are skipped.
    pub(crate) fn process_next(&mut self, tid: u32, writer: &mut dyn PlaylistWriter) -> Result<()> {
        // common in switches that define all combos but some point to nothing
        if tid == 0 {
            return Ok(());
        }
        let Some(bnode) = self.get_by_tid(tid)? else {
            return Ok(());
        };
        self.render(&bnode, writer)
    }

    fn render(&mut self, bnode: &RebuiltNode, writer: &mut dyn PlaylistWriter) -> Result<()> {
        if bnode.is_silent_kind() {
            return Ok(());
        }
        if self.rendering.contains(&bnode.sid) {
            return Err(Error::CyclicReference { sid: bnode.sid });
        }

        let node = self.tree.node(bnode.node)?;
        self.rendering.push(bnode.sid);
        writer.info_next(node, &bnode.fields);
        if bnode.silenced {
            writer.set_silenced();
        }
        let result = bnode.render_body(self, writer);
        writer.info_done();
        self.rendering.pop();

        result.map_err(|e| e.rendering(bnode.sid))
    }

    // ==================== Registries ====================

    /// Register a transition segment and build it right away.
    ///
    /// The segment isn't marked used, so it still shows up in unused scans
    /// unless normal traversal reaches it.
    pub(crate) fn add_transition_segment(&mut self, tid: u32) -> Result<()> {
        let Some(node) = self.references.get_node_ref(tid) else {
            tracing::debug!("Missing transition segment {tid}");
            return Ok(());
        };
        self.registry.add_transition(node);
        self.get(node, Some(tid), false)?;
        Ok(())
    }

    /// Transition segments registered so far.
    pub fn transition_segments(&self) -> Vec<NodeId> {
        self.registry.transitions().collect()
    }

    /// Remove and return the registered transition segments.
    pub fn take_transition_segments(&mut self) -> Vec<NodeId> {
        self.registry.take_transitions()
    }

    pub(crate) fn register_stingers(&mut self, stingers: &[Stinger]) {
        self.registry.add_stingers(stingers);
    }

    /// Stingers a trigger may start.
    pub fn stingers_for(&self, trigger_id: u32) -> &[Stinger] {
        self.registry.stingers_for(trigger_id)
    }

    /// Every stinger found so far.
    pub fn stingers(&self) -> impl Iterator<Item = &Stinger> {
        self.registry.stingers()
    }

    // ==================== Diagnostics ====================

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub(crate) fn diagnostics_mut(&mut self) -> &mut Diagnostics {
        &mut self.diagnostics
    }
}
