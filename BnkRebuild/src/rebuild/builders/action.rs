//! Play-type actions

use super::BuildCtx;
use crate::error::Result;
use crate::output::PlaylistWriter;
use crate::rebuild::node::RebuiltNode;
use crate::rebuild::session::Rebuilder;
use crate::tree::NodeRef;

/// Action pointing at a single object (or event, for play-event actions).
#[derive(Debug, Clone)]
pub struct ActionBody {
    pub target: u32,
}

pub(super) fn build_action(ctx: &mut BuildCtx<'_, '_>) -> ActionBody {
    ctx.build_action_config();

    // older banks name the target differently
    let target = ctx
        .node
        .find_name("idExt")
        .or_else(|| ctx.node.find_name("ulTargetID"))
        .and_then(NodeRef::value_u32)
        .unwrap_or_default();
    ActionBody { target }
}

impl ActionBody {
    pub(crate) fn render(
        &self,
        bnode: &RebuiltNode,
        session: &mut Rebuilder<'_>,
        writer: &mut dyn PlaylistWriter,
    ) -> Result<()> {
        // rare but may contain a delay
        writer.group_single(&bnode.config);
        session.process_next(self.target, writer)?;
        writer.group_done();
        Ok(())
    }
}
