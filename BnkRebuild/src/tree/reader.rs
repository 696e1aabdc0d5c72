//! Bank file reading
//!
//! Banks are stored as JSON node trees (see [`BankFile`]).

use std::fs;
use std::path::Path;

use super::document::NodeTree;
use super::raw::BankFile;
use crate::error::{Error, Result};

/// Read a bank JSON file from disk
///
/// # Errors
/// Returns an error if the file cannot be read or has invalid JSON.
pub fn read_bank<P: AsRef<Path>>(path: P) -> Result<BankFile> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(Error::BankNotFound {
            path: path.to_path_buf(),
        });
    }
    let content = fs::read_to_string(path)?;
    parse_bank(&content)
}

/// Parse a bank from a JSON string
///
/// # Errors
/// Returns an error if the JSON is malformed.
pub fn parse_bank(content: &str) -> Result<BankFile> {
    let bank: BankFile = serde_json::from_str(content)?;
    Ok(bank)
}

/// Read several bank files into one tree, in the given order
///
/// # Errors
/// Returns an error if any file cannot be read or parsed.
pub fn load_banks<P: AsRef<Path>>(paths: &[P]) -> Result<NodeTree> {
    let mut tree = NodeTree::new();
    for path in paths {
        let bank = read_bank(path)?;
        tracing::debug!("Loaded bank {} from {}", bank.bank, path.as_ref().display());
        tree.add_bank(bank.bank, bank.root);
    }
    Ok(tree)
}
