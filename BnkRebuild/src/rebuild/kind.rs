//! Hierarchy object kinds
//!
//! Only objects that contribute to playlists are rebuilt; everything else
//! (buses, actor-mixers, attenuations, FX, modulators, other actions) maps to
//! [`NodeKind::Ignored`] and builds nothing.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of a rebuilt hierarchy object, resolved once from the object name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NodeKind {
    // base
    Event,
    DialogueEvent,
    ActionPlay,
    ActionTrigger,
    ActionPlayAndContinue,
    ActionPlayEvent,

    // sound engine
    LayerContainer,
    SwitchContainer,
    RanSeqContainer,
    Sound,

    // music engine
    MusicSwitchContainer,
    MusicRanSeqContainer,
    MusicSegment,
    MusicTrack,

    // pseudo objects
    Stinger,
    State,

    /// Any object that doesn't contribute to playlists.
    Ignored,
}

impl NodeKind {
    /// Kinds that are entry points for playlist generation.
    pub const GENERATED: [NodeKind; 2] = [NodeKind::Event, NodeKind::DialogueEvent];

    /// Kinds checked for unused instances, in generation priority order.
    ///
    /// Containers come before the objects they reference, so rendering an
    /// unused container marks its children used before their kind is scanned.
    pub const UNUSED_PRIORITY: [NodeKind; 12] = [
        NodeKind::ActionPlay,
        NodeKind::ActionTrigger,
        NodeKind::ActionPlayAndContinue,
        NodeKind::ActionPlayEvent,
        NodeKind::LayerContainer,
        NodeKind::SwitchContainer,
        NodeKind::RanSeqContainer,
        NodeKind::Sound,
        NodeKind::MusicSwitchContainer,
        NodeKind::MusicRanSeqContainer,
        NodeKind::MusicSegment,
        NodeKind::MusicTrack,
    ];

    /// Resolve a kind from a bank object name.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name {
            "CAkEvent" => NodeKind::Event,
            "CAkDialogueEvent" => NodeKind::DialogueEvent,
            "CAkActionPlay" => NodeKind::ActionPlay,
            "CAkActionTrigger" => NodeKind::ActionTrigger,
            "CAkActionPlayAndContinue" => NodeKind::ActionPlayAndContinue,
            "CAkActionPlayEvent" => NodeKind::ActionPlayEvent,
            "CAkLayerCntr" => NodeKind::LayerContainer,
            "CAkSwitchCntr" => NodeKind::SwitchContainer,
            "CAkRanSeqCntr" => NodeKind::RanSeqContainer,
            "CAkSound" => NodeKind::Sound,
            "CAkMusicSwitchCntr" => NodeKind::MusicSwitchContainer,
            "CAkMusicRanSeqCntr" => NodeKind::MusicRanSeqContainer,
            "CAkMusicSegment" => NodeKind::MusicSegment,
            "CAkMusicTrack" => NodeKind::MusicTrack,
            "CAkStinger" => NodeKind::Stinger,
            "CAkState" => NodeKind::State,
            _ => NodeKind::Ignored,
        }
    }

    /// Bank object name for this kind (empty for [`NodeKind::Ignored`]).
    #[must_use]
    pub fn object_name(self) -> &'static str {
        match self {
            NodeKind::Event => "CAkEvent",
            NodeKind::DialogueEvent => "CAkDialogueEvent",
            NodeKind::ActionPlay => "CAkActionPlay",
            NodeKind::ActionTrigger => "CAkActionTrigger",
            NodeKind::ActionPlayAndContinue => "CAkActionPlayAndContinue",
            NodeKind::ActionPlayEvent => "CAkActionPlayEvent",
            NodeKind::LayerContainer => "CAkLayerCntr",
            NodeKind::SwitchContainer => "CAkSwitchCntr",
            NodeKind::RanSeqContainer => "CAkRanSeqCntr",
            NodeKind::Sound => "CAkSound",
            NodeKind::MusicSwitchContainer => "CAkMusicSwitchCntr",
            NodeKind::MusicRanSeqContainer => "CAkMusicRanSeqCntr",
            NodeKind::MusicSegment => "CAkMusicSegment",
            NodeKind::MusicTrack => "CAkMusicTrack",
            NodeKind::Stinger => "CAkStinger",
            NodeKind::State => "CAkState",
            NodeKind::Ignored => "",
        }
    }

    /// Whether silence-linked states and volume RTPCs are checked for this kind.
    ///
    /// Only useful on segment/track level: games that silence whole switches
    /// or playlists usually just mute the song.
    #[must_use]
    pub fn checks_silence(self) -> bool {
        matches!(self, NodeKind::MusicTrack | NodeKind::MusicSegment)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Ignored => f.write_str("(ignored)"),
            other => f.write_str(other.object_name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_round_trip_for_known_kinds() {
        for kind in NodeKind::UNUSED_PRIORITY
            .iter()
            .chain(NodeKind::GENERATED.iter())
            .chain([NodeKind::Stinger, NodeKind::State].iter())
        {
            assert_eq!(NodeKind::from_name(kind.object_name()), *kind);
        }
    }

    #[test]
    fn test_unknown_names_are_ignored() {
        assert_eq!(NodeKind::from_name("CAkBus"), NodeKind::Ignored);
        assert_eq!(NodeKind::from_name("CAkActionSetState"), NodeKind::Ignored);
        assert_eq!(NodeKind::Ignored.to_string(), "(ignored)");
    }

    #[test]
    fn test_unused_priority_lists_containers_before_leaves() {
        let pos = |k: NodeKind| NodeKind::UNUSED_PRIORITY.iter().position(|x| *x == k).unwrap();
        assert!(pos(NodeKind::RanSeqContainer) < pos(NodeKind::Sound));
        assert!(pos(NodeKind::MusicRanSeqContainer) < pos(NodeKind::MusicSegment));
        assert!(pos(NodeKind::MusicSegment) < pos(NodeKind::MusicTrack));
    }
}
