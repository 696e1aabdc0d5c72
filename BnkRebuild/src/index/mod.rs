//! Lookup tables filled while banks are loaded
//!
//! - [`ReferenceIndex`]: stable id ↔ generic node, per-name instance lists
//!   and usage marks for the unused-node scan
//! - [`MediaIndex`]: (bank, media sid) → index inside the bank

mod media;
mod references;

pub use media::{MediaIndex, MediaLocation};
pub use references::ReferenceIndex;
