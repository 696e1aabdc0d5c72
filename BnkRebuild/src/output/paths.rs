//! Alternative game-sync combinations
//!
//! When a root is rendered without game syncs, branching nodes announce each
//! of their alternatives here (`add`, recurse, `done`). Alternatives nested
//! inside another alternative extend the outer one, so only innermost
//! branches produce a combination. The generator then renders the root once
//! per combination.

use indexmap::IndexSet;

use super::params::GameSync;
use crate::rebuild::Stinger;

#[derive(Debug, Clone, Default)]
struct Branch {
    gamesyncs: Vec<GameSync>,
    nested: bool,
}

/// Collects alternative combinations and stingers seen during a render.
#[derive(Debug, Clone, Default)]
pub struct PathCollector {
    open: Vec<Branch>,
    combos: IndexSet<Vec<GameSync>>,
    stingers: Vec<Stinger>,
}

impl PathCollector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Open an alternative with a single game sync.
    pub fn add(&mut self, gamesync: GameSync) {
        self.add_all(&[gamesync]);
    }

    /// Open an alternative with several game syncs (a decision tree path).
    pub fn add_all(&mut self, gamesyncs: &[GameSync]) {
        if let Some(parent) = self.open.last_mut() {
            parent.nested = true;
        }
        self.open.push(Branch {
            gamesyncs: gamesyncs.to_vec(),
            nested: false,
        });
    }

    /// Close the current alternative.
    pub fn done(&mut self) {
        let Some(branch) = self.open.pop() else {
            tracing::debug!("Closing alternative without an open one");
            return;
        };
        if branch.nested {
            return;
        }

        let combo: Vec<GameSync> = self
            .open
            .iter()
            .flat_map(|b| b.gamesyncs.iter().copied())
            .chain(branch.gamesyncs)
            .collect();
        self.combos.insert(combo);
    }

    /// Register stingers of a music container (duplicates are kept once).
    pub fn add_stingers(&mut self, stingers: &[Stinger]) {
        for stinger in stingers {
            if !self.stingers.contains(stinger) {
                self.stingers.push(stinger.clone());
            }
        }
    }

    /// Complete combinations, in discovery order.
    pub fn combinations(&self) -> impl Iterator<Item = &[GameSync]> {
        self.combos.iter().map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.combos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.combos.is_empty()
    }

    pub fn stingers(&self) -> &[Stinger] {
        &self.stingers
    }
}
