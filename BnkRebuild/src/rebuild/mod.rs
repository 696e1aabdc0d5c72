//! Object rebuilding
//!
//! Generic bank nodes are rebuilt into typed playback objects
//! ([`RebuiltNode`]) on first access and cached per stable id. Rendering a
//! rebuilt object walks its children through a
//! [`PlaylistWriter`](crate::output::PlaylistWriter), resolving game-sync
//! dependent branches against the writer's current parameters.
//!
//! # Example
//!
//! ```no_run
//! use bnkrebuild::output::{GameSyncParams, PlaylistRecorder};
//! use bnkrebuild::rebuild::{NodeKind, Rebuilder};
//! use bnkrebuild::tree::load_banks;
//!
//! let tree = load_banks(&["Init.json", "BGM.json"])?;
//! let mut session = Rebuilder::with_banks(&tree)?;
//!
//! let events = session.references().instances(NodeKind::Event.object_name()).to_vec();
//! for event in events {
//!     let mut recorder = PlaylistRecorder::new(GameSyncParams::new());
//!     session.begin_render(&mut recorder, event)?;
//!     let (recording, paths) = recorder.finish();
//!     println!("{:?}: {} sounds, {} paths", recording.sid, recording.sounds().len(), paths.len());
//! }
//! # Ok::<(), bnkrebuild::Error>(())
//! ```

mod builders;
mod config;
mod decision_tree;
mod diagnostics;
mod kind;
mod node;
mod registry;
mod session;
mod source;
mod unused;

pub use builders::{
    ActionBody, Clip, DialogueEventBody, ENTRY_MARKER_ID, EXIT_MARKER_ID, EventBody, LayerBody,
    MusicRanSeqBody, MusicSegmentBody, MusicSwitchBody, MusicSwitchSelector, MusicTrackBody,
    PlaylistItem, PlaylistMode, RanSeqBody, RanSeqMode, SoundBody, StingerBody, SwitchBody,
    SwitchValue, TrackSwitch, TrackType,
};
pub use config::{NodeConfig, SILENCE_VOLUME};
pub use decision_tree::{DecisionPath, DecisionTree};
pub use diagnostics::{Diagnostics, DiagnosticsSummary};
pub use kind::NodeKind;
pub use node::{FieldRef, NodeBody, RebuiltNode};
pub use registry::{Registry, Stinger};
pub use session::{Rebuilder, Registrations};
pub use source::{ClipTiming, MediaSource, Sound};
