//! Generic bank node tree
//!
//! The binary bank parser is an external collaborator: it produces a labeled
//! tree of objects, lists and typed fields. This module holds that tree in an
//! arena and exposes the query API the rebuilder needs (`find`/`finds` by
//! name or type, values, parent, children, sibling index).

mod document;
mod raw;
mod reader;

pub use document::{Bank, Descendants, NodeId, NodeRef, NodeTree, NodeValue};
pub use raw::{BankFile, RawNode};
pub use reader::{load_banks, parse_bank, read_bank};
