//! Rebuilt nodes
//!
//! One [`RebuiltNode`] exists per stable id. Its structure is parsed once and
//! never changes; rendering only depends on the writer's game sync context.

use serde::Serialize;

use super::builders::{
    ActionBody, DialogueEventBody, EventBody, LayerBody, MusicRanSeqBody, MusicSegmentBody,
    MusicSwitchBody, MusicTrackBody, RanSeqBody, SoundBody, StingerBody, SwitchBody,
};
use super::config::NodeConfig;
use super::kind::NodeKind;
use super::registry::Stinger;
use super::session::Rebuilder;
use crate::error::Result;
use crate::output::PlaylistWriter;
use crate::tree::NodeId;

/// Interesting generic fields of a node, kept for info output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FieldRef {
    /// A plain field.
    Single(NodeId),
    /// A property key and its value.
    Keyed { key: NodeId, value: NodeId },
    /// A ranged property key with its limits.
    Ranged {
        key: NodeId,
        min: Option<NodeId>,
        max: Option<NodeId>,
    },
}

/// Kind-specific structure.
#[derive(Debug, Clone)]
pub enum NodeBody {
    /// Builds and renders nothing.
    Empty,
    /// Config only, read by silence checks.
    State,
    Event(EventBody),
    DialogueEvent(DialogueEventBody),
    Play(ActionBody),
    /// Resolved through stingers, never rendered directly.
    Trigger(ActionBody),
    Switch(SwitchBody),
    RanSeq(RanSeqBody),
    Layer(LayerBody),
    Sound(SoundBody),
    MusicSwitch(MusicSwitchBody),
    MusicRanSeq(MusicRanSeqBody),
    MusicSegment(MusicSegmentBody),
    MusicTrack(MusicTrackBody),
    Stinger(StingerBody),
}

/// Typed playback object rebuilt from a generic node.
#[derive(Debug, Clone)]
pub struct RebuiltNode {
    /// Stable id.
    pub sid: u32,
    /// Generic node it was built from.
    pub node: NodeId,
    pub kind: NodeKind,
    pub config: NodeConfig,
    /// Muted by a state or volume RTPC.
    pub silenced: bool,
    /// Fields shown in info output.
    pub fields: Vec<FieldRef>,
    /// Stingers defined by music containers.
    pub stingers: Vec<Stinger>,
    pub body: NodeBody,
}

impl RebuiltNode {
    /// Whether rendering never emits anything (ignored kinds and states).
    pub fn is_silent_kind(&self) -> bool {
        matches!(self.body, NodeBody::Empty | NodeBody::State)
    }

    /// Music segment without tracks.
    pub fn is_empty_segment(&self) -> bool {
        matches!(&self.body, NodeBody::MusicSegment(segment) if segment.children.is_empty())
    }

    /// Render the kind-specific part. Info and silence are handled by the session.
    pub(crate) fn render_body(
        &self,
        session: &mut Rebuilder<'_>,
        writer: &mut dyn PlaylistWriter,
    ) -> Result<()> {
        match &self.body {
            NodeBody::Empty | NodeBody::State | NodeBody::Trigger(_) => Ok(()),
            NodeBody::Event(body) => body.render(self, session, writer),
            NodeBody::DialogueEvent(body) => body.render(session, writer),
            NodeBody::Play(body) => body.render(self, session, writer),
            NodeBody::Switch(body) => body.render(self, session, writer),
            NodeBody::RanSeq(body) => body.render(self, session, writer),
            NodeBody::Layer(body) => body.render(self, session, writer),
            NodeBody::Sound(body) => {
                body.render(self, writer);
                Ok(())
            }
            NodeBody::MusicSwitch(body) => body.render(self, session, writer),
            NodeBody::MusicRanSeq(body) => body.render(self, session, writer),
            NodeBody::MusicSegment(body) => body.render(self, session, writer),
            NodeBody::MusicTrack(body) => body.render(self, session, writer),
            NodeBody::Stinger(body) => session.process_next(body.target, writer),
        }
    }
}
