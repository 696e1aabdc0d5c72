//! Events and dialogue events

use super::{BuildCtx, render_tree};
use crate::error::Result;
use crate::output::PlaylistWriter;
use crate::rebuild::decision_tree::DecisionTree;
use crate::rebuild::node::RebuiltNode;
use crate::rebuild::session::Rebuilder;
use crate::tree::NodeRef;

/// Event: a list of actions played together.
#[derive(Debug, Clone)]
pub struct EventBody {
    pub actions: Vec<u32>,
}

pub(super) fn build_event(ctx: &mut BuildCtx<'_, '_>) -> EventBody {
    let actions = ctx
        .node
        .finds_name("ulActionID")
        .into_iter()
        .filter_map(NodeRef::value_u32)
        .collect();
    EventBody { actions }
}

impl EventBody {
    pub(crate) fn render(
        &self,
        bnode: &RebuiltNode,
        session: &mut Rebuilder<'_>,
        writer: &mut dyn PlaylistWriter,
    ) -> Result<()> {
        // N play actions are layered (each may set a delay)
        writer.group_layer(self.actions.len(), &bnode.config);
        for &tid in &self.actions {
            session.process_next(tid, writer)?;
        }
        writer.group_done();
        Ok(())
    }
}

/// Dialogue event: a decision tree of game syncs to audio objects.
#[derive(Debug, Clone)]
pub struct DialogueEventBody {
    /// Missing in events without any path.
    pub tree: Option<DecisionTree>,
}

pub(super) fn build_dialogue_event(ctx: &mut BuildCtx<'_, '_>) -> Result<DialogueEventBody> {
    ctx.build_audio_config()?;
    ctx.forbid_loop()?;

    let tree = match ctx.node.find_name("AkDecisionTree") {
        Some(ntree) => Some(DecisionTree::build(ctx.kind, ctx.sid, ctx.node, ntree)?),
        None => None,
    };
    // keep the dimensions visible in info output
    if let Some(ndepth) = ctx.node.find_name("uTreeDepth") {
        ctx.field(ndepth);
    }
    Ok(DialogueEventBody { tree })
}

impl DialogueEventBody {
    pub(crate) fn render(
        &self,
        session: &mut Rebuilder<'_>,
        writer: &mut dyn PlaylistWriter,
    ) -> Result<()> {
        match &self.tree {
            Some(tree) => render_tree(tree, &[], session, writer),
            None => Ok(()),
        }
    }
}
