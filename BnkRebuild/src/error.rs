//! Error types for `BnkRebuild`
//!
//! Only conditions that stop a root from rendering are errors. Recoverable
//! findings (missing references, missing media, unhandled properties) are
//! counted in [`Diagnostics`](crate::rebuild::Diagnostics) instead.

use std::path::PathBuf;

use thiserror::Error;

use crate::rebuild::NodeKind;

/// The error type for `BnkRebuild` operations.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum Error {
    // ==================== IO Errors ====================
    /// IO error from file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A bank file could not be found.
    #[error("bank file not found: {path}")]
    BankNotFound {
        /// The path that was requested.
        path: PathBuf,
    },

    // ==================== Parsing Errors ====================
    /// JSON parsing or serialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// TOML options could not be parsed.
    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// The generic node tree is malformed (bad node id, bad bank layout).
    #[error("invalid node tree: {0}")]
    InvalidTree(String),

    // ==================== Rebuild Errors ====================
    /// A required field or marker is missing, or a structural invariant of
    /// the object is violated.
    #[error("structural mismatch in {kind} {sid}: {message}")]
    StructuralMismatch {
        /// Kind of the object being rebuilt.
        kind: NodeKind,
        /// Stable id of the object.
        sid: u32,
        /// What was wrong.
        message: String,
    },

    /// A known subtype that the rebuilder does not handle.
    #[error("unimplemented feature in {kind} {sid}: {feature}")]
    UnimplementedFeature {
        /// Kind of the object being rebuilt.
        kind: NodeKind,
        /// Stable id of the object.
        sid: u32,
        /// The unhandled feature.
        feature: String,
    },

    /// A node was reached again while it was still being rendered.
    #[error("cyclic reference: node {sid} is already being rendered")]
    CyclicReference {
        /// Stable id of the re-entered node.
        sid: u32,
    },

    /// Rendering failed; `sid` is the innermost node that failed.
    #[error("error rendering node {sid}: {source}")]
    Render {
        /// Stable id of the failing node.
        sid: u32,
        /// The underlying failure.
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Build a [`Error::StructuralMismatch`] value.
    pub fn structural(kind: NodeKind, sid: u32, message: impl Into<String>) -> Self {
        Self::StructuralMismatch {
            kind,
            sid,
            message: message.into(),
        }
    }

    /// Build a [`Error::UnimplementedFeature`] value.
    pub fn unimplemented(kind: NodeKind, sid: u32, feature: impl Into<String>) -> Self {
        Self::UnimplementedFeature {
            kind,
            sid,
            feature: feature.into(),
        }
    }

    /// Tag an error with the node that was rendering when it happened.
    ///
    /// Errors that already carry a node id keep the innermost one.
    #[must_use]
    pub fn rendering(self, sid: u32) -> Self {
        match self {
            Self::Render { .. } => self,
            other => Self::Render {
                sid: other.failing_sid().unwrap_or(sid),
                source: Box::new(other),
            },
        }
    }

    /// Stable id of the node that failed, if the error carries one.
    #[must_use]
    pub fn failing_sid(&self) -> Option<u32> {
        match self {
            Self::Render { sid, .. }
            | Self::StructuralMismatch { sid, .. }
            | Self::UnimplementedFeature { sid, .. }
            | Self::CyclicReference { sid } => Some(*sid),
            _ => None,
        }
    }
}

/// A specialized Result type for `BnkRebuild` operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rendering_keeps_innermost_sid() {
        let err = Error::structural(NodeKind::MusicTrack, 7, "more than 1 subtrack");
        let err = err.rendering(7).rendering(3).rendering(1);
        assert_eq!(err.failing_sid(), Some(7));
        assert!(err.to_string().contains("more than 1 subtrack"));
    }

    #[test]
    fn test_failing_sid_of_io_error() {
        let err = Error::Io(std::io::Error::other("boom"));
        assert_eq!(err.failing_sid(), None);
    }
}
