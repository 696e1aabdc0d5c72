//! Music switch containers

use indexmap::IndexMap;

use super::{BuildCtx, render_tree};
use crate::error::Result;
use crate::output::{GameSync, GameSyncType, PlaylistWriter};
use crate::rebuild::decision_tree::DecisionTree;
use crate::rebuild::node::RebuiltNode;
use crate::rebuild::session::Rebuilder;
use crate::tree::NodeRef;

/// How a music switch picks its child.
#[derive(Debug, Clone)]
pub enum MusicSwitchSelector {
    /// Later versions: multi game sync decision tree.
    Tree(DecisionTree),
    /// Earlier versions: one game sync, value → child.
    Legacy {
        gtype: GameSyncType,
        group: u32,
        values: IndexMap<u32, u32>,
    },
}

#[derive(Debug, Clone)]
pub struct MusicSwitchBody {
    pub selector: MusicSwitchSelector,
}

pub(super) fn build_music_switch(ctx: &mut BuildCtx<'_, '_>) -> Result<MusicSwitchBody> {
    ctx.build_audio_config()?;
    ctx.build_transitions(true)?;
    ctx.build_stingers();

    if let Some(ntree) = ctx.node.find_name("AkDecisionTree") {
        let tree = DecisionTree::build(ctx.kind, ctx.sid, ctx.node, ntree)?;
        return Ok(MusicSwitchBody {
            selector: MusicSwitchSelector::Tree(tree),
        });
    }

    let gtype = ctx
        .require("eGroupType")?
        .value_i64()
        .and_then(GameSyncType::from_raw)
        .ok_or_else(|| ctx.structural("unknown game sync type"))?;
    let group = ctx
        .require("ulGroupID")?
        .value_u32()
        .ok_or_else(|| ctx.structural("invalid group id"))?;

    let mut values = IndexMap::new();
    let nassocs = ctx.require("pAssocs")?;
    for nvalue in nassocs.finds_name("switchID") {
        let Some(value) = nvalue.value_u32() else {
            continue;
        };
        let target = nvalue
            .parent()
            .and_then(|p| p.find_name("nodeID"))
            .and_then(NodeRef::value_u32)
            .unwrap_or_default();
        values.insert(value, target);
    }

    Ok(MusicSwitchBody {
        selector: MusicSwitchSelector::Legacy {
            gtype,
            group,
            values,
        },
    })
}

impl MusicSwitchBody {
    pub(crate) fn render(
        &self,
        bnode: &RebuiltNode,
        session: &mut Rebuilder<'_>,
        writer: &mut dyn PlaylistWriter,
    ) -> Result<()> {
        let (gtype, group, values) = match &self.selector {
            MusicSwitchSelector::Tree(tree) => {
                return render_tree(tree, &bnode.stingers, session, writer);
            }
            MusicSwitchSelector::Legacy {
                gtype,
                group,
                values,
            } => (*gtype, *group, values),
        };

        if writer.params().is_empty() {
            writer.paths().add_stingers(&bnode.stingers);
            for (&value, &target) in values {
                writer.paths().add(GameSync::new(gtype, group, value));
                session.process_next(target, writer)?;
                writer.paths().done();
            }
            return Ok(());
        }

        let Some(value) = writer.params().value(gtype, group) else {
            return Ok(());
        };
        let Some(&target) = values.get(&value) else {
            return Ok(());
        };
        writer.info_gamesync(GameSync::new(gtype, group, value));
        session.process_next(target, writer)
    }
}
