//! Streamed/in-memory media locator
//!
//! A game could load bgm.bnk + media1.bnk, with bgm.bnk pointing to sid 123
//! in media1.bnk. If media2.bnk is loaded too, both media banks may contain
//! sid 123, so lookups try the requesting bank first (repeats allowed) and
//! then fall back to the first bank that ever registered the sid.

use std::collections::HashMap;

use serde::Serialize;

/// Where a media sid lives: bank name and index inside that bank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaLocation {
    /// Bank holding the media.
    pub bank: String,
    /// Index of the media inside the bank's media table.
    pub index: u32,
}

/// Bank-scoped media index with a global fallback.
#[derive(Debug, Clone, Default)]
pub struct MediaIndex {
    /// (bank, sid) → media index
    banks: HashMap<(String, u32), u32>,
    /// sid → first (bank, index) ever registered
    sids: HashMap<u32, MediaLocation>,
}

impl MediaIndex {
    /// Create an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of (bank, sid) entries.
    pub fn len(&self) -> usize {
        self.banks.len()
    }

    /// Check if no media was registered.
    pub fn is_empty(&self) -> bool {
        self.banks.is_empty()
    }

    /// Register media `sid` at `index` inside `bank`.
    pub fn add_media_index(&mut self, bank: &str, sid: u32, index: u32) {
        self.banks.insert((bank.to_string(), sid), index);
        self.sids.entry(sid).or_insert_with(|| MediaLocation {
            bank: bank.to_string(),
            index,
        });
    }

    /// Locate media, preferring `bank` and falling back to any bank.
    ///
    /// Sid 0 never resolves (seen in some test banks as "no media").
    pub fn lookup(&self, bank: &str, sid: u32) -> Option<MediaLocation> {
        if sid == 0 {
            return None;
        }

        if let Some(&index) = self.banks.get(&(bank.to_string(), sid)) {
            return Some(MediaLocation {
                bank: bank.to_string(),
                index,
            });
        }

        self.sids.get(&sid).cloned()
    }
}
