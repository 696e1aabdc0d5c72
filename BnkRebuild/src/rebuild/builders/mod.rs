//! Per-kind build and render logic
//!
//! Building parses a generic node once into a [`NodeBody`]; rendering walks
//! the body with the writer's current game sync context.

mod action;
mod containers;
mod event;
mod music_ranseq;
mod music_segment;
mod music_switch;
mod music_track;
mod sound;

pub use action::ActionBody;
pub use containers::{LayerBody, RanSeqBody, RanSeqMode, SwitchBody, SwitchValue};
pub use event::{DialogueEventBody, EventBody};
pub use music_ranseq::{MusicRanSeqBody, PlaylistItem, PlaylistMode};
pub use music_segment::{ENTRY_MARKER_ID, EXIT_MARKER_ID, MusicSegmentBody};
pub use music_switch::{MusicSwitchBody, MusicSwitchSelector};
pub use music_track::{Clip, MusicTrackBody, TrackSwitch, TrackType};
pub use sound::SoundBody;

use super::config::NodeConfig;
use super::decision_tree::DecisionTree;
use super::kind::NodeKind;
use super::node::{FieldRef, NodeBody, RebuiltNode};
use super::registry::Stinger;
use super::session::Rebuilder;
use crate::error::{Error, Result};
use crate::output::PlaylistWriter;
use crate::tree::NodeRef;

/// Stinger pseudo-node: plays a segment when a trigger fires.
#[derive(Debug, Clone)]
pub struct StingerBody {
    /// Segment to play.
    pub target: u32,
}

/// State of a node being built.
pub(crate) struct BuildCtx<'s, 'a> {
    pub(crate) session: &'s mut Rebuilder<'a>,
    pub(crate) node: NodeRef<'a>,
    pub(crate) kind: NodeKind,
    pub(crate) sid: u32,
    pub(crate) config: NodeConfig,
    pub(crate) silenced: bool,
    pub(crate) fields: Vec<FieldRef>,
    pub(crate) stingers: Vec<Stinger>,
}

impl<'a> BuildCtx<'_, 'a> {
    pub(crate) fn structural(&self, message: impl Into<String>) -> Error {
        Error::structural(self.kind, self.sid, message)
    }

    /// First descendant named `name`, failing if absent.
    pub(crate) fn require(&self, name: &str) -> Result<NodeRef<'a>> {
        self.require_in(self.node, name)
    }

    pub(crate) fn require_in(&self, parent: NodeRef<'a>, name: &str) -> Result<NodeRef<'a>> {
        parent
            .find_name(name)
            .ok_or_else(|| self.structural(format!("missing {name}")))
    }

    pub(crate) fn field(&mut self, node: NodeRef<'a>) {
        self.fields.push(FieldRef::Single(node.id()));
    }

    /// Older banks keep the loop count as a plain field.
    pub(crate) fn read_loop(&mut self) {
        if let Some(nloop) = self.node.find_name("Loop") {
            self.config.loop_count = nloop.value_i64();
            self.field(nloop);
        }
    }

    /// Containers that can't loop by themselves.
    pub(crate) fn forbid_loop(&self) -> Result<()> {
        if self.config.loop_count.is_some() {
            return Err(self.structural("loop flag"));
        }
        Ok(())
    }

    fn build_body(&mut self) -> Result<NodeBody> {
        let body = match self.kind {
            NodeKind::Event => NodeBody::Event(event::build_event(self)),
            NodeKind::DialogueEvent => NodeBody::DialogueEvent(event::build_dialogue_event(self)?),
            NodeKind::ActionPlay | NodeKind::ActionPlayEvent => {
                NodeBody::Play(action::build_action(self))
            }
            NodeKind::ActionTrigger => NodeBody::Trigger(action::build_action(self)),
            NodeKind::ActionPlayAndContinue => {
                return Err(Error::unimplemented(self.kind, self.sid, "play and continue"));
            }
            NodeKind::SwitchContainer => NodeBody::Switch(containers::build_switch(self)?),
            NodeKind::RanSeqContainer => NodeBody::RanSeq(containers::build_ranseq(self)?),
            NodeKind::LayerContainer => NodeBody::Layer(containers::build_layer(self)?),
            NodeKind::Sound => NodeBody::Sound(sound::build_sound(self)?),
            NodeKind::MusicSwitchContainer => {
                NodeBody::MusicSwitch(music_switch::build_music_switch(self)?)
            }
            NodeKind::MusicRanSeqContainer => {
                NodeBody::MusicRanSeq(music_ranseq::build_music_ranseq(self)?)
            }
            NodeKind::MusicSegment => NodeBody::MusicSegment(music_segment::build_segment(self)?),
            NodeKind::MusicTrack => NodeBody::MusicTrack(music_track::build_track(self)?),
            NodeKind::State => {
                self.build_audio_config()?;
                NodeBody::State
            }
            NodeKind::Stinger => {
                let target = self
                    .node
                    .find_name("SegmentID")
                    .and_then(NodeRef::value_u32)
                    .unwrap_or_default();
                NodeBody::Stinger(StingerBody { target })
            }
            NodeKind::Ignored => NodeBody::Empty,
        };
        Ok(body)
    }
}

/// Build the typed node for `node`.
pub(crate) fn build_node<'a>(
    session: &mut Rebuilder<'a>,
    node: NodeRef<'a>,
    sid: u32,
) -> Result<RebuiltNode> {
    let kind = NodeKind::from_name(node.name());
    let mut ctx = BuildCtx {
        session,
        node,
        kind,
        sid,
        config: NodeConfig::default(),
        silenced: false,
        fields: Vec::new(),
        stingers: Vec::new(),
    };
    let body = ctx.build_body()?;

    Ok(RebuiltNode {
        sid,
        node: node.id(),
        kind,
        config: ctx.config,
        silenced: ctx.silenced,
        fields: ctx.fields,
        stingers: ctx.stingers,
        body,
    })
}

/// Target ids under a list node, in order.
pub(crate) fn tids(list: Option<NodeRef<'_>>) -> Vec<u32> {
    list.map(|list| {
        list.finds_type("tid")
            .into_iter()
            .filter_map(NodeRef::value_u32)
            .collect()
    })
    .unwrap_or_default()
}

/// Render a decision tree: every path as an alternative, or the matching one.
pub(crate) fn render_tree(
    tree: &DecisionTree,
    stingers: &[Stinger],
    session: &mut Rebuilder<'_>,
    writer: &mut dyn PlaylistWriter,
) -> Result<()> {
    if writer.params().is_empty() {
        writer.paths().add_stingers(stingers);
        for path in &tree.paths {
            writer.paths().add_all(&path.gamesyncs);
            session.process_next(path.target, writer)?;
            writer.paths().done();
        }
        return Ok(());
    }

    if let Some(path) = tree.resolve(writer.params()) {
        writer.info_gamesyncs(&path.gamesyncs);
        session.process_next(path.target, writer)?;
    }
    Ok(())
}
