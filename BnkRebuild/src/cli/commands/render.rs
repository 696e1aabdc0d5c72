//! CLI command for rendering playlists

use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::generator::{Generator, GeneratorOptions};
use crate::output::GameSync;
use crate::tree::load_banks;

/// Flags that override the options file.
pub struct Overrides {
    pub params: Vec<GameSync>,
    pub no_unused: bool,
    pub no_transitions: bool,
    pub no_stingers: bool,
    pub no_expand: bool,
    pub parallel: bool,
}

impl Overrides {
    fn apply(&self, mut options: GeneratorOptions) -> GeneratorOptions {
        if !self.params.is_empty() {
            options.params = Some(self.params.clone());
        }
        options.generate_unused &= !self.no_unused;
        options.generate_transitions &= !self.no_transitions;
        options.generate_stingers &= !self.no_stingers;
        options.expand_alternatives &= !self.no_expand;
        options.parallel |= self.parallel;
        options
    }
}

pub fn execute(
    banks: &[PathBuf],
    config: Option<&Path>,
    overrides: &Overrides,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let options = match config {
        Some(path) => GeneratorOptions::load(path)
            .with_context(|| format!("Failed to read options from {}", path.display()))?,
        None => GeneratorOptions::default(),
    };
    let options = overrides.apply(options);

    let tree = load_banks(banks).context("Failed to load banks")?;
    tracing::info!("Loaded {} banks ({} nodes)", tree.banks().len(), tree.len());

    let report = Generator::new(&tree, options).run()?;
    for failure in &report.failures {
        eprintln!(
            "Failed: {} ({})",
            failure.sid.map_or_else(|| "?".to_string(), |sid| sid.to_string()),
            failure.error
        );
    }

    let json = serde_json::to_string_pretty(&report)?;
    match output {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!(
                "Wrote {} playlists to {}",
                report.playlists.len(),
                path.display()
            );
        }
        None => println!("{json}"),
    }

    let summary = &report.diagnostics;
    if summary.missing_nodes > 0 || summary.missing_media > 0 {
        eprintln!(
            "Missing: {} objects, {} media",
            summary.missing_nodes, summary.missing_media
        );
    }
    if !summary.unknown_props.is_empty() {
        eprintln!("Unhandled properties: {}", summary.unknown_props.join(" "));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::GameSyncType;

    #[test]
    fn test_flags_override_options_file() {
        let overrides = Overrides {
            params: vec![GameSync::new(GameSyncType::State, 1, 2)],
            no_unused: true,
            no_transitions: false,
            no_stingers: false,
            no_expand: false,
            parallel: true,
        };
        let options = overrides.apply(GeneratorOptions::default().with_transitions(false));

        assert!(!options.generate_unused);
        assert!(!options.generate_transitions);
        assert!(options.generate_stingers);
        assert!(options.parallel);
        assert_eq!(options.params.as_ref().map(Vec::len), Some(1));
    }
}
