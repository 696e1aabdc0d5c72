//! Music playlist containers
//!
//! Playlists are groups holding segments or other groups:
//!
//! ```text
//! item: playlist (sequence)
//!   item: segment A
//!   item: segment B
//!   item: playlist (random)
//!     item: segment C
//!     item: segment D
//! ```
//!
//! which may play on loop as ABC ABD ABC... (each group has its own loop).

use serde::Serialize;

use super::BuildCtx;
use crate::error::Result;
use crate::output::{GroupKind, PlaylistWriter, SegmentTransition};
use crate::rebuild::config::NodeConfig;
use crate::rebuild::node::{FieldRef, RebuiltNode};
use crate::rebuild::session::Rebuilder;
use crate::tree::{NodeId, NodeRef};

/// Playlist group mode (`eRSType`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PlaylistMode {
    /// Plays all items, one after another.
    ContinuousSequence,
    /// Plays one item, the next one on the following loop.
    StepSequence,
    /// Plays random items until all are covered.
    ContinuousRandom,
    /// Plays one random item.
    StepRandom,
}

impl PlaylistMode {
    fn from_raw(value: i64) -> Option<Self> {
        match value {
            0 => Some(PlaylistMode::ContinuousSequence),
            1 => Some(PlaylistMode::StepSequence),
            2 => Some(PlaylistMode::ContinuousRandom),
            3 => Some(PlaylistMode::StepRandom),
            _ => None,
        }
    }

    /// Label of modes rendered with an approximation.
    fn approximation(self) -> Option<&'static str> {
        match self {
            PlaylistMode::StepSequence => Some("step-sequence as random"),
            PlaylistMode::ContinuousRandom => Some("continuous-random as sequence"),
            PlaylistMode::ContinuousSequence | PlaylistMode::StepRandom => None,
        }
    }
}

/// One playlist entry.
#[derive(Debug, Clone)]
pub enum PlaylistItem {
    Segment {
        node: NodeId,
        fields: Vec<FieldRef>,
        config: NodeConfig,
        /// 0 when unset.
        target: u32,
    },
    Group {
        node: NodeId,
        fields: Vec<FieldRef>,
        config: NodeConfig,
        mode: PlaylistMode,
        items: Vec<PlaylistItem>,
    },
}

#[derive(Debug, Clone)]
pub struct MusicRanSeqBody {
    pub items: Vec<PlaylistItem>,
}

pub(super) fn build_music_ranseq(ctx: &mut BuildCtx<'_, '_>) -> Result<MusicRanSeqBody> {
    ctx.build_audio_config()?;
    ctx.forbid_loop()?;
    ctx.build_transitions(false)?;
    ctx.build_stingers();

    let nplaylist = ctx.require("pPlayList")?;
    let items = build_playlist(ctx, nplaylist)?;
    Ok(MusicRanSeqBody { items })
}

fn build_playlist<'a>(
    ctx: &mut BuildCtx<'_, 'a>,
    nplaylist: NodeRef<'a>,
) -> Result<Vec<PlaylistItem>> {
    let mut items = Vec::new();
    for nitem in nplaylist.children() {
        let ntype = nitem.child("eRSType");
        // older versions have no type, only leaves are known
        let mode = match ntype.and_then(NodeRef::value_i64) {
            Some(-1) => None,
            Some(raw) => Some(
                PlaylistMode::from_raw(raw)
                    .ok_or_else(|| ctx.structural(format!("unknown playlist type {raw}")))?,
            ),
            None => {
                let nchildren = nitem.child("NumChildren").and_then(NodeRef::value_i64);
                if nchildren != Some(0) {
                    return Err(ctx.structural("unknown playlist type (old version?)"));
                }
                None
            }
        };

        let nloop = nitem.child("Loop");
        let config = NodeConfig {
            loop_count: nloop.and_then(NodeRef::value_i64),
            ..NodeConfig::default()
        };
        let fields: Vec<FieldRef> = [ntype, nloop]
            .into_iter()
            .flatten()
            .map(|n| FieldRef::Single(n.id()))
            .collect();

        let nsubplaylist = nitem.child("pPlayList").filter(|n| n.has_children());
        let nsegment = nitem.child("SegmentID");
        let item = match (mode, nsubplaylist, nsegment) {
            // groups without items and without a segment id stay (empty) groups
            (Some(mode), Some(_), _) | (Some(mode), None, None) => {
                if let Some(label) = mode.approximation() {
                    tracing::debug!("Playlist item in {} approximated ({label})", ctx.sid);
                    ctx.session.diagnostics_mut().record_approximation(label);
                }
                let items = match nsubplaylist {
                    Some(nsubplaylist) => build_playlist(ctx, nsubplaylist)?,
                    None => Vec::new(),
                };
                PlaylistItem::Group {
                    node: nitem.id(),
                    fields,
                    config,
                    mode,
                    items,
                }
            }
            _ => PlaylistItem::Segment {
                node: nitem.id(),
                fields,
                config,
                target: nsegment.and_then(NodeRef::value_u32).unwrap_or_default(),
            },
        };
        items.push(item);
    }
    Ok(items)
}

impl MusicRanSeqBody {
    pub(crate) fn render(
        &self,
        bnode: &RebuiltNode,
        session: &mut Rebuilder<'_>,
        writer: &mut dyn PlaylistWriter,
    ) -> Result<()> {
        if writer.params().is_empty() {
            writer.paths().add_stingers(&bnode.stingers);
        }

        // typically useless but may have volumes
        writer.group_single(&bnode.config);
        render_items(&self.items, session, writer)?;
        writer.group_done();
        Ok(())
    }
}

fn render_items(
    items: &[PlaylistItem],
    session: &mut Rebuilder<'_>,
    writer: &mut dyn PlaylistWriter,
) -> Result<()> {
    let tree = session.tree();
    for item in items {
        match item {
            PlaylistItem::Segment {
                node,
                fields,
                config,
                target,
            } => {
                writer.info_next(tree.node(*node)?, fields);
                let transition = SegmentTransition { play_before: false };
                writer.group(GroupKind::Single, 1, config, Some(&transition));
                session.process_next(*target, writer)?;
                writer.group_done();
            }
            PlaylistItem::Group {
                node,
                fields,
                config,
                mode,
                items,
            } => {
                writer.info_next(tree.node(*node)?, fields);
                // step-sequence and continuous-random are approximated
                match mode {
                    PlaylistMode::ContinuousSequence | PlaylistMode::ContinuousRandom => {
                        writer.group_sequence(items.len(), config);
                    }
                    PlaylistMode::StepSequence | PlaylistMode::StepRandom => {
                        writer.group_random(items.len(), config);
                    }
                }
                render_items(items, session, writer)?;
                writer.group_done();
            }
        }
        writer.info_done();
    }
    Ok(())
}
