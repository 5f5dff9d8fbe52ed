//! `rankfuse normalize`: min-max rescale a run.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use rankfuse_core::config::FusionConfig;
use rankfuse_core::{DegeneratePolicy, Normalization};

use super::{emit_run, load_run};

/// Arguments for `rankfuse normalize`.
#[derive(Args, Debug)]
pub struct NormalizeArgs {
    /// Run file to normalize.
    pub input: PathBuf,

    /// local (per query) or global.
    #[arg(long, short = 'm', default_value = "local")]
    pub mode: Normalization,

    /// Zero-range handling: zero or fail.
    #[arg(long, value_name = "POLICY")]
    pub on_degenerate: Option<DegeneratePolicy>,

    /// Write the normalized run here instead of stdout.
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

/// Execute `rankfuse normalize`.
pub fn run_normalize(args: &NormalizeArgs, config: &FusionConfig) -> Result<()> {
    let ranking = load_run(&args.input)?;
    let policy = args.on_degenerate.unwrap_or(config.on_degenerate);

    let normalized = args
        .mode
        .apply(&ranking, policy)
        .with_context(|| format!("Failed to normalize {}", args.input.display()))?;
    emit_run(&normalized, args.output.as_deref())
}
