//! Playlist output
//!
//! Rebuilt nodes render by calling a [`PlaylistWriter`]: groups are opened
//! and closed around their children, sources are emitted as leaves, and
//! `info_*` calls annotate what was traversed. Writers also expose the
//! current game sync context and the alternative-path sink.
//!
//! [`PlaylistRecorder`] is the bundled writer, producing a serialisable
//! [`PlaylistNode`] tree.

mod params;
mod paths;
mod recorder;

use serde::{Deserialize, Serialize};

pub use params::{GameSync, GameSyncParams, GameSyncType};
pub use paths::PathCollector;
pub use recorder::{PlaylistNode, PlaylistRecorder, Recording};

use crate::rebuild::{FieldRef, NodeConfig, Sound, Stinger};
use crate::tree::NodeRef;

/// How the children of a group play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupKind {
    /// One child.
    Single,
    /// All children at once.
    Layer,
    /// One child picked at random.
    Random,
    /// Children one after another.
    Sequence,
}

/// Transition settings attached to a music playlist item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SegmentTransition {
    /// Whether the segment's pre-entry plays before the entry marker.
    pub play_before: bool,
}

/// Sink for rendered playlists.
pub trait PlaylistWriter {
    /// Start a root. `stinger` is set when rendering a stinger's target.
    fn begin(&mut self, root: NodeRef<'_>, config: &NodeConfig, stinger: Option<&Stinger>);

    /// Open a group with `children` expected items.
    fn group(
        &mut self,
        kind: GroupKind,
        children: usize,
        config: &NodeConfig,
        transition: Option<&SegmentTransition>,
    );

    /// Close the last open group.
    fn group_done(&mut self);

    /// Emit a playable leaf.
    fn source_sound(&mut self, sound: &Sound, config: &NodeConfig);

    /// Mark the next emitted item as silenced.
    fn set_silenced(&mut self);

    /// Annotate entering a node, with its interesting fields.
    fn info_next(&mut self, node: NodeRef<'_>, fields: &[FieldRef]);

    /// Annotate leaving the last entered node.
    fn info_done(&mut self);

    /// Annotate the game sync that selected the current branch.
    fn info_gamesync(&mut self, gamesync: GameSync);

    /// Annotate the media behind a source.
    fn info_source(&mut self, sound: &Sound);

    /// Current game sync context.
    fn params(&self) -> &GameSyncParams;

    /// Alternative-path sink.
    fn paths(&mut self) -> &mut PathCollector;

    fn info_gamesyncs(&mut self, gamesyncs: &[GameSync]) {
        for gamesync in gamesyncs {
            self.info_gamesync(*gamesync);
        }
    }

    fn group_single(&mut self, config: &NodeConfig) {
        self.group(GroupKind::Single, 1, config, None);
    }

    fn group_layer(&mut self, children: usize, config: &NodeConfig) {
        self.group(GroupKind::Layer, children, config, None);
    }

    fn group_random(&mut self, children: usize, config: &NodeConfig) {
        self.group(GroupKind::Random, children, config, None);
    }

    fn group_sequence(&mut self, children: usize, config: &NodeConfig) {
        self.group(GroupKind::Sequence, children, config, None);
    }
}
