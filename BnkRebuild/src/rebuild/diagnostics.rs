//! Recoverable findings collected while rebuilding
//!
//! None of these stop processing; they are reported once all roots are done.

use indexmap::{IndexMap, IndexSet};
use serde::Serialize;

/// Counters for recovered conditions.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Diagnostics {
    /// Target ids that didn't resolve to a registered object.
    missing_nodes: IndexSet<u32>,
    /// Media ids not found in any loaded bank.
    missing_media: IndexSet<u32>,
    /// Recognized but unhandled property labels.
    unknown_props: IndexSet<String>,
    /// Transition objects inside music playlists (not rendered).
    transition_objects: usize,
    /// Playlist modes rendered with an approximation, by label.
    approximations: IndexMap<String, usize>,
    /// Nodes requested without any discoverable sid.
    unidentified_nodes: usize,
}

/// Aggregate counts for end-of-run reporting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiagnosticsSummary {
    pub missing_nodes: usize,
    pub missing_media: usize,
    pub unknown_props: Vec<String>,
    pub transition_objects: usize,
    pub approximations: usize,
    pub unidentified_nodes: usize,
}

impl Diagnostics {
    pub fn record_missing_node(&mut self, tid: u32) {
        self.missing_nodes.insert(tid);
    }

    pub fn record_missing_media(&mut self, sid: u32) {
        self.missing_media.insert(sid);
    }

    pub fn record_unknown_prop(&mut self, label: &str) {
        if !self.unknown_props.contains(label) {
            self.unknown_props.insert(label.to_string());
        }
    }

    pub fn record_transition_object(&mut self) {
        self.transition_objects += 1;
    }

    pub fn record_approximation(&mut self, label: &str) {
        *self.approximations.entry(label.to_string()).or_default() += 1;
    }

    pub fn record_unidentified_node(&mut self) {
        self.unidentified_nodes += 1;
    }

    pub fn missing_nodes(&self) -> &IndexSet<u32> {
        &self.missing_nodes
    }

    pub fn missing_media(&self) -> &IndexSet<u32> {
        &self.missing_media
    }

    pub fn unknown_props(&self) -> &IndexSet<String> {
        &self.unknown_props
    }

    pub fn transition_objects(&self) -> usize {
        self.transition_objects
    }

    pub fn approximations(&self) -> &IndexMap<String, usize> {
        &self.approximations
    }

    /// Fold another session's findings into this one.
    pub fn merge(&mut self, other: &Diagnostics) {
        self.missing_nodes.extend(other.missing_nodes.iter().copied());
        self.missing_media.extend(other.missing_media.iter().copied());
        for label in &other.unknown_props {
            self.record_unknown_prop(label);
        }
        self.transition_objects += other.transition_objects;
        for (label, count) in &other.approximations {
            *self.approximations.entry(label.clone()).or_default() += count;
        }
        self.unidentified_nodes += other.unidentified_nodes;
    }

    #[must_use]
    pub fn summary(&self) -> DiagnosticsSummary {
        DiagnosticsSummary {
            missing_nodes: self.missing_nodes.len(),
            missing_media: self.missing_media.len(),
            unknown_props: self.unknown_props.iter().cloned().collect(),
            transition_objects: self.transition_objects,
            approximations: self.approximations.values().sum(),
            unidentified_nodes: self.unidentified_nodes,
        }
    }
}
