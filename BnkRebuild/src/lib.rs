//! # `bnkrebuild`
//!
//! A pure-Rust library for rebuilding Wwise soundbank objects into playable
//! virtual playlists.
//!
//! Banks are consumed as generic node trees (produced by an external bank
//! parser, stored as JSON). Hierarchy objects (events, actions, containers,
//! sounds, music objects) are rebuilt into typed nodes once per stable id,
//! and rendering an event walks its object graph into a tree of layered,
//! random, sequence and single groups over media sources.
//!
//! ## Quick Start
//!
//! ### Generating Playlists
//!
//! ```no_run
//! use bnkrebuild::generator::{Generator, GeneratorOptions};
//! use bnkrebuild::tree::load_banks;
//!
//! let tree = load_banks(&["Init.json", "BGM.json"])?;
//! let report = Generator::new(&tree, GeneratorOptions::default()).run()?;
//!
//! for playlist in &report.playlists {
//!     println!("{} {:?}: {} sounds", playlist.name, playlist.sid, playlist.sounds().len());
//! }
//! # Ok::<(), bnkrebuild::Error>(())
//! ```
//!
//! ### Rendering One Event Under Fixed Game Syncs
//!
//! ```no_run
//! use bnkrebuild::prelude::*;
//!
//! let tree = load_banks(&["BGM.json"])?;
//! let mut session = Rebuilder::with_banks(&tree)?;
//!
//! let params = GameSyncParams::from_combo(&[GameSync::new(GameSyncType::State, 1234, 5678)]);
//! if let Some(event) = session.get_node_ref(1000) {
//!     let mut recorder = PlaylistRecorder::new(params);
//!     session.begin_render(&mut recorder, event.id())?;
//!     let (recording, _) = recorder.finish();
//!     println!("{}", recording.info.join("\n"));
//! }
//! # Ok::<(), bnkrebuild::Error>(())
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` - Enables the `bnkrebuild` command-line binary

pub mod error;
pub mod generator;
pub mod index;
pub mod output;
pub mod rebuild;
pub mod tree;

// Re-exports for convenience
pub use error::{Error, Result};

/// Prelude module for common imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::generator::{GenerationReport, Generator, GeneratorOptions, RootFailure};
    pub use crate::output::{
        GameSync, GameSyncParams, GameSyncType, GroupKind, PathCollector, PlaylistNode,
        PlaylistRecorder, PlaylistWriter, Recording,
    };
    pub use crate::rebuild::{Diagnostics, NodeConfig, NodeKind, Rebuilder, RebuiltNode, Sound};
    pub use crate::tree::{NodeId, NodeRef, NodeTree, RawNode, load_banks};
}

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// CLI module (feature-gated)
#[cfg(feature = "cli")]
pub mod cli;
