//! Playlist generation over loaded banks
//!
//! The generator drives a [`Rebuilder`] over every root (events and dialogue
//! events), expands game sync alternatives into one playlist each, then
//! renders what normal traversal can't reach: stinger segments, transition
//! segments and unused objects.
//!
//! A root that fails to render is reported and skipped; the rest of the run
//! continues.

mod options;

pub use options::GeneratorOptions;

use indexmap::{IndexMap, IndexSet};
use rayon::prelude::*;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::output::{GameSyncParams, PlaylistRecorder, PlaylistWriter, Recording};
use crate::rebuild::{Diagnostics, DiagnosticsSummary, NodeKind, Rebuilder, Stinger};
use crate::tree::{NodeId, NodeTree};

/// A root that failed to render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RootFailure {
    /// Stable id of the root (trigger id for stingers).
    pub sid: Option<u32>,
    /// Innermost node that failed, if known.
    pub failing_sid: Option<u32>,
    pub error: String,
}

impl RootFailure {
    fn new(sid: Option<u32>, error: &Error) -> Self {
        Self {
            sid,
            failing_sid: error.failing_sid(),
            error: error.to_string(),
        }
    }
}

/// Everything a run produced.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GenerationReport {
    /// Rendered playlists, in generation order.
    pub playlists: Vec<Recording>,
    pub failures: Vec<RootFailure>,
    /// Sids rendered by the unused pass, per kind.
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub unused: IndexMap<NodeKind, Vec<u32>>,
    pub diagnostics: DiagnosticsSummary,
}

impl GenerationReport {
    /// Playlists rendered from a given root sid.
    pub fn playlists_for(&self, sid: u32) -> impl Iterator<Item = &Recording> {
        self.playlists
            .iter()
            .filter(move |r| r.sid == Some(sid) && r.stinger.is_none())
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    /// Append a partial report. Stinger playlists already present are dropped.
    fn absorb(&mut self, other: GenerationReport, stingers_done: &mut IndexSet<NodeId>) {
        let mut fresh = IndexSet::new();
        for playlist in other.playlists {
            if let Some(stinger) = &playlist.stinger {
                if stingers_done.contains(&stinger.node) {
                    continue;
                }
                fresh.insert(stinger.node);
            }
            self.playlists.push(playlist);
        }
        stingers_done.extend(fresh);
        self.failures.extend(other.failures);
    }
}

#[derive(Clone, Copy)]
enum Target<'s> {
    Root(NodeId),
    Stinger(&'s Stinger),
}

impl Target<'_> {
    fn begin(self, session: &mut Rebuilder<'_>, writer: &mut dyn PlaylistWriter) -> Result<()> {
        match self {
            Target::Root(node) => session.begin_render(writer, node),
            Target::Stinger(stinger) => session.begin_render_stinger(writer, stinger),
        }
    }

    fn sid(self, session: &Rebuilder<'_>) -> Option<u32> {
        match self {
            Target::Root(node) => session.references().sid_of(node),
            Target::Stinger(stinger) => Some(stinger.trigger_id),
        }
    }
}

struct Rendered {
    recordings: Vec<Recording>,
    stingers: Vec<Stinger>,
}

/// Generates playlists for every root of a loaded tree.
pub struct Generator<'a> {
    tree: &'a NodeTree,
    options: GeneratorOptions,
}

impl<'a> Generator<'a> {
    #[must_use]
    pub fn new(tree: &'a NodeTree, options: GeneratorOptions) -> Self {
        Self { tree, options }
    }

    pub fn options(&self) -> &GeneratorOptions {
        &self.options
    }

    /// Register every bank and generate.
    ///
    /// # Errors
    /// Only registration failures are errors; render failures are reported.
    pub fn run(&self) -> Result<GenerationReport> {
        let mut session = Rebuilder::with_banks(self.tree)?;
        if self.options.parallel {
            return Ok(self.run_parallel(&session));
        }
        Ok(self.run_session(&mut session))
    }

    /// Generate with an already prepared session.
    pub fn run_session(&self, session: &mut Rebuilder<'a>) -> GenerationReport {
        let mut report = GenerationReport::default();
        let mut stingers_done = IndexSet::new();

        let roots = self.roots(session);
        tracing::info!("Generating {} roots", roots.len());
        for root in roots {
            self.process(session, Target::Root(root), &mut stingers_done, &mut report);
        }

        if self.options.generate_transitions {
            self.process_transitions(session, &mut stingers_done, &mut report);
        }

        if self.options.generate_unused {
            for kind in NodeKind::UNUSED_PRIORITY {
                // nodes reached by a previous unused root are no longer unused
                let nodes = session.unused_nodes(kind);
                if nodes.is_empty() {
                    continue;
                }
                tracing::info!("Generating {} unused {kind}", nodes.len());
                for node in nodes {
                    if session.references().is_used(node) {
                        continue;
                    }
                    if let Some(sid) = session.references().sid_of(node) {
                        report.unused.entry(kind).or_default().push(sid);
                    }
                    self.process(session, Target::Root(node), &mut stingers_done, &mut report);
                }
            }

            // unused music switches may register more transitions
            if self.options.generate_transitions {
                self.process_transitions(session, &mut stingers_done, &mut report);
            }
        }

        report.diagnostics = session.diagnostics().summary();
        tracing::info!(
            "Generated {} playlists ({} failures)",
            report.playlists.len(),
            report.failures.len()
        );
        report
    }

    /// Roots rendered in parallel, one session each.
    fn run_parallel(&self, session: &Rebuilder<'a>) -> GenerationReport {
        let registrations = session.registrations();
        let roots = self.roots(session);
        tracing::info!("Generating {} roots in parallel", roots.len());

        let partials: Vec<(GenerationReport, Diagnostics)> = roots
            .par_iter()
            .map(|&root| {
                let mut session = Rebuilder::with_registrations(self.tree, registrations.clone());
                let mut report = GenerationReport::default();
                let mut stingers_done = IndexSet::new();
                self.process(&mut session, Target::Root(root), &mut stingers_done, &mut report);
                (report, session.diagnostics().clone())
            })
            .collect();

        let mut report = GenerationReport::default();
        let mut diagnostics = Diagnostics::default();
        let mut stingers_done = IndexSet::new();
        for (partial, partial_diagnostics) in partials {
            report.absorb(partial, &mut stingers_done);
            diagnostics.merge(&partial_diagnostics);
        }
        report.diagnostics = diagnostics.summary();
        tracing::info!(
            "Generated {} playlists ({} failures)",
            report.playlists.len(),
            report.failures.len()
        );
        report
    }

    fn roots(&self, session: &Rebuilder<'a>) -> Vec<NodeId> {
        NodeKind::GENERATED
            .iter()
            .flat_map(|kind| session.references().instances(kind.object_name()))
            .copied()
            .collect()
    }

    fn process_transitions(
        &self,
        session: &mut Rebuilder<'a>,
        stingers_done: &mut IndexSet<NodeId>,
        report: &mut GenerationReport,
    ) {
        loop {
            let segments = session.take_transition_segments();
            if segments.is_empty() {
                break;
            }
            tracing::debug!("Generating {} transition segments", segments.len());
            for segment in segments {
                self.process(session, Target::Root(segment), stingers_done, report);
            }
        }
    }

    /// Render a target and the stingers it announced.
    fn process(
        &self,
        session: &mut Rebuilder<'a>,
        target: Target<'_>,
        stingers_done: &mut IndexSet<NodeId>,
        report: &mut GenerationReport,
    ) {
        let stingers = match self.render(session, target) {
            Ok(rendered) => {
                report.playlists.extend(rendered.recordings);
                rendered.stingers
            }
            Err(err) => {
                let sid = target.sid(session);
                tracing::warn!("Failed to render {sid:?}: {err}");
                report.failures.push(RootFailure::new(sid, &err));
                return;
            }
        };

        if !self.options.generate_stingers {
            return;
        }
        for stinger in &stingers {
            // the same stinger is shared by every root reaching its container
            if !stingers_done.insert(stinger.node) {
                continue;
            }
            match self.render(session, Target::Stinger(stinger)) {
                Ok(rendered) => report.playlists.extend(rendered.recordings),
                Err(err) => {
                    tracing::warn!("Failed to render stinger {}: {err}", stinger.trigger_id);
                    report
                        .failures
                        .push(RootFailure::new(Some(stinger.trigger_id), &err));
                }
            }
        }
    }

    /// Render a target once, then once per alternative it announced.
    fn render(&self, session: &mut Rebuilder<'a>, target: Target<'_>) -> Result<Rendered> {
        let params = self.options.base_params();
        let fixed = !params.is_empty();

        let mut recorder = PlaylistRecorder::new(params);
        target.begin(session, &mut recorder)?;
        let (recording, paths) = recorder.finish();
        let stingers = paths.stingers().to_vec();

        // nodes without an id don't render
        if recording.root.is_none() {
            return Ok(Rendered {
                recordings: Vec::new(),
                stingers,
            });
        }
        if fixed || paths.is_empty() || !self.options.expand_alternatives {
            return Ok(Rendered {
                recordings: vec![recording],
                stingers,
            });
        }

        let mut recordings = Vec::with_capacity(paths.len());
        for combo in paths.combinations() {
            let mut recorder = PlaylistRecorder::new(GameSyncParams::from_combo(combo));
            target.begin(session, &mut recorder)?;
            recordings.push(recorder.finish().0);
        }
        Ok(Rendered {
            recordings,
            stingers,
        })
    }
}
