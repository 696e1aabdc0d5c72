use clap::Subcommand;
use std::path::PathBuf;

use crate::output::GameSync;

pub mod inspect;
pub mod render;

#[derive(Subcommand)]
pub enum Commands {
    /// Render playlists for every event in the given banks
    Render {
        /// Bank files (JSON node trees)
        #[arg(required = true)]
        banks: Vec<PathBuf>,

        /// Generator options file (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Fixed game sync, as type:group:value (repeatable)
        #[arg(short, long = "param")]
        params: Vec<GameSync>,

        /// Skip objects no event reaches
        #[arg(long)]
        no_unused: bool,

        /// Skip music switch transition segments
        #[arg(long)]
        no_transitions: bool,

        /// Skip stinger segments
        #[arg(long)]
        no_stingers: bool,

        /// Keep only the unresolved render of each root
        #[arg(long)]
        no_expand: bool,

        /// Render roots in parallel (skips unused and transitions)
        #[arg(long)]
        parallel: bool,

        /// Write the JSON report here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show registered objects and the ones no event reaches
    Inspect {
        /// Bank files (JSON node trees)
        #[arg(required = true)]
        banks: Vec<PathBuf>,
    },
}

impl Commands {
    /// Execute the selected command.
    ///
    /// # Errors
    /// Returns an error if banks can't be loaded or the report can't be written.
    pub fn execute(&self) -> anyhow::Result<()> {
        match self {
            Commands::Render {
                banks,
                config,
                params,
                no_unused,
                no_transitions,
                no_stingers,
                no_expand,
                parallel,
                output,
            } => render::execute(
                banks,
                config.as_deref(),
                &render::Overrides {
                    params: params.clone(),
                    no_unused: *no_unused,
                    no_transitions: *no_transitions,
                    no_stingers: *no_stingers,
                    no_expand: *no_expand,
                    parallel: *parallel,
                },
                output.as_deref(),
            ),
            Commands::Inspect { banks } => inspect::execute(banks),
        }
    }
}
