//! `rankfuse cut`: keep the top `k` documents per query.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use super::{emit_run, load_run};

/// Arguments for `rankfuse cut`.
#[derive(Args, Debug)]
pub struct CutArgs {
    /// Run file to truncate.
    pub input: PathBuf,

    /// Documents to keep per query.
    #[arg(short = 'k', long)]
    pub k: usize,

    /// Write the truncated run here instead of stdout.
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

/// Execute `rankfuse cut`.
pub fn run_cut(args: &CutArgs) -> Result<()> {
    let mut ranking = load_run(&args.input)?;
    ranking.cut(args.k);
    emit_run(&ranking, args.output.as_deref())
}
