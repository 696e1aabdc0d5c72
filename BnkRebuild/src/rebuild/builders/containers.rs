//! Sound engine containers: switch, random/sequence and layer

use indexmap::IndexMap;
use serde::Serialize;

use super::{BuildCtx, tids};
use crate::error::Result;
use crate::output::{GameSync, GameSyncType, PlaylistWriter};
use crate::rebuild::node::RebuiltNode;
use crate::rebuild::session::Rebuilder;
use crate::tree::{NodeId, NodeRef};

/// Objects played for one switch value.
#[derive(Debug, Clone)]
pub struct SwitchValue {
    /// `ulSwitchID` node, for info output.
    pub node: NodeId,
    pub targets: Vec<u32>,
}

/// Switch container: one game sync selects a set of children.
#[derive(Debug, Clone)]
pub struct SwitchBody {
    pub gtype: GameSyncType,
    pub group: u32,
    /// Value → targets, in bank order.
    pub values: IndexMap<u32, SwitchValue>,
}

pub(super) fn build_switch(ctx: &mut BuildCtx<'_, '_>) -> Result<SwitchBody> {
    ctx.build_audio_config()?;
    ctx.forbid_loop()?;

    let ntype = ctx.require("eGroupType")?;
    let gtype = ntype
        .value_i64()
        .and_then(GameSyncType::from_raw)
        .ok_or_else(|| ctx.structural("unknown game sync type"))?;
    let group = ctx
        .require("ulGroupID")?
        .value_u32()
        .ok_or_else(|| ctx.structural("invalid group id"))?;

    // ulDefaultSwitch isn't needed since every value is generated
    let mut values = IndexMap::new();
    let nlist = ctx.require("SwitchList")?;
    for nvalue in nlist.finds_name("ulSwitchID") {
        let Some(value) = nvalue.value_u32() else {
            continue;
        };
        let targets = tids(nvalue.parent().and_then(|p| p.find_name("NodeList")));
        // may define an empty path
        if targets.is_empty() {
            continue;
        }
        values.insert(
            value,
            SwitchValue {
                node: nvalue.id(),
                targets,
            },
        );
    }

    if let Some(nmode) = ctx.node.find_name("bIsContinuousValidation") {
        ctx.field(nmode);
    }
    Ok(SwitchBody {
        gtype,
        group,
        values,
    })
}

impl SwitchBody {
    pub(crate) fn render(
        &self,
        bnode: &RebuiltNode,
        session: &mut Rebuilder<'_>,
        writer: &mut dyn PlaylistWriter,
    ) -> Result<()> {
        if writer.params().is_empty() {
            for (&value, entry) in &self.values {
                writer
                    .paths()
                    .add(GameSync::new(self.gtype, self.group, value));
                for &tid in &entry.targets {
                    session.process_next(tid, writer)?;
                }
                writer.paths().done();
            }
            return Ok(());
        }

        let Some(value) = writer.params().value(self.gtype, self.group) else {
            return Ok(());
        };
        let Some(entry) = self.values.get(&value) else {
            return Ok(());
        };

        writer.info_gamesync(GameSync::new(self.gtype, self.group, value));
        // several ids per value are possible but rare
        writer.group_layer(entry.targets.len(), &bnode.config);
        for &tid in &entry.targets {
            session.process_next(tid, writer)?;
        }
        writer.group_done();
        Ok(())
    }
}

/// Random/sequence container playback mode (`eMode`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RanSeqMode {
    Random,
    Sequence,
}

/// Random/sequence container.
#[derive(Debug, Clone)]
pub struct RanSeqBody {
    pub mode: RanSeqMode,
    /// Shuffle (no repeats) instead of normal random.
    pub shuffle: bool,
    /// Play one child per trigger instead of all of them.
    pub continuous: bool,
    pub children: Vec<u32>,
}

pub(super) fn build_ranseq(ctx: &mut BuildCtx<'_, '_>) -> Result<RanSeqBody> {
    ctx.build_audio_config()?;
    ctx.forbid_loop()?;

    let nmode = ctx.require("eMode")?;
    let nrandom = ctx.require("eRandomMode")?;
    let nloop = ctx.require("sLoopCount")?;
    let ncontinuous = ctx.require("bIsContinuous")?;

    let mode = match nmode.value_i64() {
        Some(0) => RanSeqMode::Random,
        Some(1) => RanSeqMode::Sequence,
        other => {
            return Err(ctx.structural(format!("unknown ranseq mode {other:?}")));
        }
    };
    // 1 = once, 0 = infinite, N = N times
    ctx.config.loop_count = nloop.value_i64();

    let children = match mode {
        // playlist items carry the proper order
        RanSeqMode::Random => ctx
            .node
            .finds_name("AkPlaylistItem")
            .into_iter()
            .filter_map(|nitem| nitem.find_type("tid").and_then(NodeRef::value_u32))
            .collect(),
        RanSeqMode::Sequence => tids(ctx.node.find_name("Children")),
    };

    for n in [nmode, nrandom, nloop, ncontinuous] {
        ctx.field(n);
    }
    Ok(RanSeqBody {
        mode,
        shuffle: nrandom.value_i64() == Some(1),
        continuous: ncontinuous.value_i64().is_some_and(|v| v != 0),
        children,
    })
}

impl RanSeqBody {
    pub(crate) fn render(
        &self,
        bnode: &RebuiltNode,
        session: &mut Rebuilder<'_>,
        writer: &mut dyn PlaylistWriter,
    ) -> Result<()> {
        match self.mode {
            RanSeqMode::Random => writer.group_random(self.children.len(), &bnode.config),
            RanSeqMode::Sequence => writer.group_sequence(self.children.len(), &bnode.config),
        }
        for &tid in &self.children {
            session.process_next(tid, writer)?;
        }
        writer.group_done();
        Ok(())
    }
}

/// Layer container: every child plays at once.
#[derive(Debug, Clone)]
pub struct LayerBody {
    pub children: Vec<u32>,
}

pub(super) fn build_layer(ctx: &mut BuildCtx<'_, '_>) -> Result<LayerBody> {
    ctx.build_audio_config()?;
    ctx.forbid_loop()?;

    // step/continuous validation: informational
    if let Some(nmode) = ctx.node.find_name("bIsContinuousValidation") {
        ctx.field(nmode);
    }
    Ok(LayerBody {
        children: tids(ctx.node.find_name("Children")),
    })
}

impl LayerBody {
    pub(crate) fn render(
        &self,
        bnode: &RebuiltNode,
        session: &mut Rebuilder<'_>,
        writer: &mut dyn PlaylistWriter,
    ) -> Result<()> {
        writer.group_layer(self.children.len(), &bnode.config);
        for &tid in &self.children {
            session.process_next(tid, writer)?;
        }
        writer.group_done();
        Ok(())
    }
}
