//! CLI command for inspecting registered objects

use std::path::PathBuf;

use anyhow::Context;

use crate::output::{GameSyncParams, PlaylistRecorder};
use crate::rebuild::{NodeKind, Rebuilder};
use crate::tree::load_banks;

pub fn execute(banks: &[PathBuf]) -> anyhow::Result<()> {
    let tree = load_banks(banks).context("Failed to load banks")?;
    let mut session = Rebuilder::with_banks(&tree)?;

    println!("Banks:");
    for bank in tree.banks() {
        println!("  {}", bank.name);
    }

    println!("Objects:");
    for (name, count) in session.references().counts() {
        println!("  {name:<28} {count}");
    }
    println!("Media: {}", session.media().len());

    // traverse every root so usage marks are set, discarding the playlists
    let roots: Vec<_> = NodeKind::GENERATED
        .iter()
        .flat_map(|kind| session.references().instances(kind.object_name()).to_vec())
        .collect();
    let mut failures = 0;
    for root in roots {
        let mut recorder = PlaylistRecorder::new(GameSyncParams::new());
        if let Err(err) = session.begin_render(&mut recorder, root) {
            tracing::warn!("{err}");
            failures += 1;
        }
    }
    if failures > 0 {
        println!("Roots failing to render: {failures}");
    }

    let report = session.unused_report();
    if report.is_empty() {
        println!("No unused objects");
        return Ok(());
    }
    println!("Unused:");
    for (kind, sids) in &report {
        let sids: Vec<String> = sids.iter().map(ToString::to_string).collect();
        println!("  {:<28} {}", kind.to_string(), sids.join(" "));
    }

    Ok(())
}
