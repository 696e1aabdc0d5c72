//! Recording writer
//!
//! Builds the playlist as a tree of [`PlaylistNode`] values plus an indented
//! info log of the traversal.

use serde::Serialize;

use super::{
    GameSync, GameSyncParams, GroupKind, PathCollector, PlaylistWriter, SegmentTransition,
};
use crate::rebuild::{FieldRef, NodeConfig, Sound, Stinger};
use crate::tree::{NodeId, NodeRef, NodeTree};

/// A rendered playlist item.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PlaylistNode {
    Group {
        kind: GroupKind,
        #[serde(skip_serializing_if = "NodeConfig::is_default")]
        config: NodeConfig,
        #[serde(skip_serializing_if = "Option::is_none")]
        transition: Option<SegmentTransition>,
        #[serde(skip_serializing_if = "std::ops::Not::not")]
        silenced: bool,
        children: Vec<PlaylistNode>,
    },
    Sound {
        sound: Sound,
        #[serde(skip_serializing_if = "NodeConfig::is_default")]
        config: NodeConfig,
        #[serde(skip_serializing_if = "std::ops::Not::not")]
        silenced: bool,
    },
}

impl PlaylistNode {
    /// Group kind, `None` for sounds.
    pub fn kind(&self) -> Option<GroupKind> {
        match self {
            PlaylistNode::Group { kind, .. } => Some(*kind),
            PlaylistNode::Sound { .. } => None,
        }
    }

    pub fn children(&self) -> &[PlaylistNode] {
        match self {
            PlaylistNode::Group { children, .. } => children,
            PlaylistNode::Sound { .. } => &[],
        }
    }

    pub fn config(&self) -> &NodeConfig {
        match self {
            PlaylistNode::Group { config, .. } | PlaylistNode::Sound { config, .. } => config,
        }
    }

    pub fn is_silenced(&self) -> bool {
        match self {
            PlaylistNode::Group { silenced, .. } | PlaylistNode::Sound { silenced, .. } => {
                *silenced
            }
        }
    }

    /// All sounds under this item, in playlist order.
    pub fn sounds(&self) -> Vec<&Sound> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(item) = stack.pop() {
            match item {
                PlaylistNode::Group { children, .. } => stack.extend(children.iter().rev()),
                PlaylistNode::Sound { sound, .. } => out.push(sound),
            }
        }
        out
    }
}

/// One finished render of a root.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Recording {
    /// Root node rendered.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<NodeId>,
    /// Root object name.
    pub name: String,
    /// Stable id of the root (the trigger id for stingers).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sid: Option<u32>,
    /// Stinger being rendered, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stinger: Option<Stinger>,
    /// Root-level config.
    #[serde(skip_serializing_if = "NodeConfig::is_default")]
    pub config: NodeConfig,
    /// Game sync context used.
    pub params: GameSyncParams,
    /// Game syncs that selected branches along the way.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub gamesyncs: Vec<GameSync>,
    /// Top-level playlist items.
    pub items: Vec<PlaylistNode>,
    /// Indented traversal log.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub info: Vec<String>,
}

impl Recording {
    /// All sounds in the playlist.
    pub fn sounds(&self) -> Vec<&Sound> {
        self.items.iter().flat_map(PlaylistNode::sounds).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Writer that records everything it's given.
#[derive(Debug, Default)]
pub struct PlaylistRecorder {
    recording: Recording,
    paths: PathCollector,
    stack: Vec<PlaylistNode>,
    pending_silence: bool,
    depth: usize,
}

impl PlaylistRecorder {
    /// Recorder rendering under `params` (empty to collect alternatives).
    #[must_use]
    pub fn new(params: GameSyncParams) -> Self {
        Self {
            recording: Recording {
                params,
                ..Recording::default()
            },
            ..Self::default()
        }
    }

    /// Finish and split into the playlist and collected alternatives.
    #[must_use]
    pub fn finish(mut self) -> (Recording, PathCollector) {
        while !self.stack.is_empty() {
            self.group_done();
        }
        (self.recording, self.paths)
    }

    fn attach(&mut self, item: PlaylistNode) {
        match self.stack.last_mut() {
            Some(PlaylistNode::Group { children, .. }) => children.push(item),
            _ => self.recording.items.push(item),
        }
    }

    fn log(&mut self, line: &str) {
        let indent = "  ".repeat(self.depth);
        self.recording.info.push(format!("{indent}{line}"));
    }
}

fn own_sid(node: NodeRef<'_>) -> Option<u32> {
    node.children()
        .find(|c| c.type_name() == "sid")
        .and_then(NodeRef::value_u32)
}

fn describe_field(tree: &NodeTree, field: &FieldRef) -> Option<String> {
    let show = |id: NodeId| -> Option<String> {
        let node = tree.get(id)?;
        let value = node.value().map(ToString::to_string).unwrap_or_default();
        Some(format!("{}={value}", node.name()))
    };
    let value_of = |id: Option<NodeId>| -> String {
        id.and_then(|id| tree.get(id))
            .and_then(NodeRef::value)
            .map(ToString::to_string)
            .unwrap_or_default()
    };
    let label = |id: NodeId| -> Option<String> {
        let node = tree.get(id)?;
        Some(node.attr("valuefmt").map_or_else(
            || value_of(Some(id)),
            str::to_string,
        ))
    };

    match *field {
        FieldRef::Single(id) => show(id),
        FieldRef::Keyed { key, value } => Some(format!("{}={}", label(key)?, value_of(Some(value)))),
        FieldRef::Ranged { key, min, max } => Some(format!(
            "{}={}..{}",
            label(key)?,
            value_of(min),
            value_of(max)
        )),
    }
}

impl PlaylistWriter for PlaylistRecorder {
    fn begin(&mut self, root: NodeRef<'_>, config: &NodeConfig, stinger: Option<&Stinger>) {
        self.recording.root = Some(root.id());
        self.recording.name = root.name().to_string();
        self.recording.sid = stinger.map(|s| s.trigger_id).or_else(|| own_sid(root));
        self.recording.stinger = stinger.cloned();
        self.recording.config = config.clone();
    }

    fn group(
        &mut self,
        kind: GroupKind,
        _children: usize,
        config: &NodeConfig,
        transition: Option<&SegmentTransition>,
    ) {
        let silenced = std::mem::take(&mut self.pending_silence);
        self.stack.push(PlaylistNode::Group {
            kind,
            config: config.clone(),
            transition: transition.copied(),
            silenced,
            children: Vec::new(),
        });
    }

    fn group_done(&mut self) {
        let Some(group) = self.stack.pop() else {
            tracing::debug!("Closing group without an open one");
            return;
        };
        self.attach(group);
    }

    fn source_sound(&mut self, sound: &Sound, config: &NodeConfig) {
        let silenced = std::mem::take(&mut self.pending_silence);
        self.attach(PlaylistNode::Sound {
            sound: sound.clone(),
            config: config.clone(),
            silenced,
        });
    }

    fn set_silenced(&mut self) {
        self.pending_silence = true;
    }

    fn info_next(&mut self, node: NodeRef<'_>, fields: &[FieldRef]) {
        let mut line = node.name().to_string();
        if let Some(sid) = own_sid(node) {
            line.push_str(&format!(" {sid}"));
        }
        let described: Vec<String> = fields
            .iter()
            .filter_map(|f| describe_field(node.tree(), f))
            .collect();
        if !described.is_empty() {
            line.push_str(&format!(" ({})", described.join(", ")));
        }
        self.log(&line);
        self.depth += 1;
    }

    fn info_done(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    fn info_gamesync(&mut self, gamesync: GameSync) {
        self.recording.gamesyncs.push(gamesync);
        self.log(&format!("* {gamesync}"));
    }

    fn info_source(&mut self, sound: &Sound) {
        let line = match &sound.source {
            None => "source: silence".to_string(),
            Some(source) => match &source.media {
                Some(media) => format!(
                    "source: {} ({} #{})",
                    source.source_id, media.bank, media.index
                ),
                None if source.is_in_bank() => format!("source: {} (not found)", source.source_id),
                None => format!("source: {} (streamed)", source.source_id),
            },
        };
        self.log(&line);
    }

    fn params(&self) -> &GameSyncParams {
        &self.recording.params
    }

    fn paths(&mut self) -> &mut PathCollector {
        &mut self.paths
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::RawNode;
    use pretty_assertions::assert_eq;

    fn silence() -> Sound {
        let mut tree = NodeTree::new();
        let node = tree.add_bank("a.bnk", RawNode::object("CAkSound"));
        Sound::silence(node, false)
    }

    #[test]
    fn test_groups_nest() {
        let mut rec = PlaylistRecorder::new(GameSyncParams::new());
        let config = NodeConfig::default();
        rec.group_layer(2, &config);
        rec.group_single(&config);
        rec.source_sound(&silence(), &config);
        rec.group_done();
        rec.source_sound(&silence(), &config);
        rec.group_done();

        let (recording, paths) = rec.finish();
        assert!(paths.is_empty());
        assert_eq!(recording.items.len(), 1);
        let layer = &recording.items[0];
        assert_eq!(layer.kind(), Some(GroupKind::Layer));
        assert_eq!(layer.children().len(), 2);
        assert_eq!(layer.children()[0].kind(), Some(GroupKind::Single));
        assert_eq!(recording.sounds().len(), 2);
    }

    #[test]
    fn test_silence_applies_to_next_item_only() {
        let mut rec = PlaylistRecorder::new(GameSyncParams::new());
        let config = NodeConfig::default();
        rec.set_silenced();
        rec.group_layer(1, &config);
        rec.source_sound(&silence(), &config);
        rec.group_done();

        let (recording, _) = rec.finish();
        assert!(recording.items[0].is_silenced());
        assert!(!recording.items[0].children()[0].is_silenced());
    }

    #[test]
    fn test_finish_closes_open_groups() {
        let mut rec = PlaylistRecorder::new(GameSyncParams::new());
        rec.group_sequence(3, &NodeConfig::default());
        rec.group_random(3, &NodeConfig::default());
        let (recording, _) = rec.finish();
        assert_eq!(recording.items.len(), 1);
        assert_eq!(recording.items[0].children().len(), 1);
    }

    #[test]
    fn test_info_log_is_indented() {
        let mut tree = NodeTree::new();
        let root = tree.add_bank(
            "a.bnk",
            RawNode::object("CAkSound")
                .with_child(RawNode::sid(42))
                .with_child(RawNode::field("Loop", "u16", 0)),
        );
        let node = tree.node(root).unwrap();
        let nloop = node.child("Loop").unwrap();

        let mut rec = PlaylistRecorder::new(GameSyncParams::new());
        rec.info_next(node, &[FieldRef::Single(nloop.id())]);
        rec.info_source(&silence());
        rec.info_done();

        let (recording, _) = rec.finish();
        assert_eq!(
            recording.info,
            vec!["CAkSound 42 (Loop=0)".to_string(), "  source: silence".to_string()]
        );
    }
}
