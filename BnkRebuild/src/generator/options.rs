//! Generator options
//!
//! Options can be built in code or read from a TOML file:
//!
//! ```toml
//! generate_unused = false
//! parallel = true
//!
//! [[params]]
//! type = "state"
//! group = 1234
//! value = 5678
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::output::{GameSync, GameSyncParams};

/// What the [`Generator`](super::Generator) renders and how.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorOptions {
    /// Render objects no event reaches.
    pub generate_unused: bool,

    /// Render transition segments of music switches.
    pub generate_transitions: bool,

    /// Render the segments of stingers found under each root.
    pub generate_stingers: bool,

    /// Render once per alternative game sync combination.
    /// When false only the first, unresolved render is kept.
    pub expand_alternatives: bool,

    /// Fixed game sync context. When set only this context is rendered.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Vec<GameSync>>,

    /// One session per root on the rayon pool.
    /// Unused and transition passes need a shared session and are skipped.
    pub parallel: bool,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            generate_unused: true,
            generate_transitions: true,
            generate_stingers: true,
            expand_alternatives: true,
            params: None,
            parallel: false,
        }
    }
}

impl GeneratorOptions {
    /// Options with every pass enabled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_unused(mut self, enabled: bool) -> Self {
        self.generate_unused = enabled;
        self
    }

    #[must_use]
    pub fn with_transitions(mut self, enabled: bool) -> Self {
        self.generate_transitions = enabled;
        self
    }

    #[must_use]
    pub fn with_stingers(mut self, enabled: bool) -> Self {
        self.generate_stingers = enabled;
        self
    }

    #[must_use]
    pub fn with_expand_alternatives(mut self, enabled: bool) -> Self {
        self.expand_alternatives = enabled;
        self
    }

    #[must_use]
    pub fn with_params(mut self, params: Vec<GameSync>) -> Self {
        self.params = Some(params);
        self
    }

    #[must_use]
    pub fn with_parallel(mut self, enabled: bool) -> Self {
        self.parallel = enabled;
        self
    }

    /// Parse options from TOML text. Missing keys keep their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load options from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Context of the first render of each root.
    pub(crate) fn base_params(&self) -> GameSyncParams {
        self.params
            .as_deref()
            .map(GameSyncParams::from_combo)
            .unwrap_or_default()
    }
}
