pub mod completions;
pub mod cut;
pub mod fuse;
pub mod normalize;
pub mod stats;

use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rankfuse_core::Ranking;
use tracing::info;

/// Load a run file, naming the path in any error.
pub fn load_run(path: &Path) -> Result<Ranking> {
    Ranking::from_file(path).with_context(|| format!("Failed to load {}", path.display()))
}

/// Write a ranking as a TREC run to `output`, or to stdout when absent.
pub fn emit_run(ranking: &Ranking, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            ranking
                .to_file(path)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!(path = %path.display(), "wrote run file");
        }
        None => {
            let stdout = io::stdout();
            ranking
                .write_trec(stdout.lock())
                .context("Failed to write run to stdout")?;
        }
    }
    Ok(())
}

/// Render an optional output path for summaries.
pub fn display_path(path: Option<&PathBuf>) -> String {
    path.map_or_else(|| "-".to_string(), |p| p.display().to_string())
}
