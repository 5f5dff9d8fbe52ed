//! `rankfuse interpolate`, `rankfuse sweep`, `rankfuse rrf`.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use rankfuse_core::config::FusionConfig;
use rankfuse_core::{
    DegeneratePolicy, Normalization, Ranking, interpolate_sweep, interpolate_with,
    reciprocal_rank_fusion_with,
};
use serde::Serialize;
use tracing::info;

use super::{display_path, emit_run, load_run};
use crate::output::{OutputMode, pretty_kv, pretty_section, render};

/// Inputs and options shared by every fusion subcommand.
#[derive(Args, Debug, Clone)]
pub struct FuseArgs {
    /// First run (the one weighted by alpha).
    pub left: PathBuf,

    /// Second run.
    pub right: PathBuf,

    /// Normalize both runs first: off, local (per query) or global.
    #[arg(long, short = 'n')]
    pub normalization: Option<Normalization>,

    /// Zero-range normalization handling: zero or fail.
    #[arg(long, value_name = "POLICY")]
    pub on_degenerate: Option<DegeneratePolicy>,

    /// Cut both runs to this many documents per query before fusing.
    #[arg(long)]
    pub depth: Option<usize>,

    /// Keep this many documents per query in the fused run.
    #[arg(long)]
    pub cutoff: Option<usize>,

    /// Run tag written in the fused run.
    #[arg(long)]
    pub name: Option<String>,

    /// Keep the first run's order instead of sorting by fused score.
    /// `--cutoff` then keeps the first documents in that order.
    #[arg(long)]
    pub no_sort: bool,
}

impl FuseArgs {
    /// Overlay flags on top of file/default configuration.
    pub fn resolve(&self, base: &FusionConfig) -> FusionConfig {
        let mut config = base.clone();
        if let Some(n) = self.normalization {
            config.normalization = n;
        }
        if let Some(p) = self.on_degenerate {
            config.on_degenerate = p;
        }
        if self.depth.is_some() {
            config.depth = self.depth;
        }
        if self.cutoff.is_some() {
            config.cutoff = self.cutoff;
        }
        if self.name.is_some() {
            config.name.clone_from(&self.name);
        }
        if self.no_sort {
            config.sort = false;
        }
        config
    }

    fn load(&self, config: &FusionConfig) -> Result<(Ranking, Ranking)> {
        let mut left = load_run(&self.left)?;
        let mut right = load_run(&self.right)?;
        if let Some(depth) = config.depth {
            left.cut(depth);
            right.cut(depth);
        }
        Ok((left, right))
    }
}

/// Arguments for `rankfuse interpolate`.
#[derive(Args, Debug)]
pub struct InterpolateArgs {
    #[command(flatten)]
    pub fuse: FuseArgs,

    /// Weight of the first run; the second gets `1 - alpha`.
    #[arg(long, short = 'a', allow_negative_numbers = true)]
    pub alpha: Option<f64>,

    /// Write the fused run here instead of stdout.
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

/// Arguments for `rankfuse sweep`.
#[derive(Args, Debug)]
pub struct SweepArgs {
    #[command(flatten)]
    pub fuse: FuseArgs,

    /// Comma-separated alpha values.
    #[arg(long, value_delimiter = ',', required = true, allow_negative_numbers = true)]
    pub alphas: Vec<f64>,

    /// Directory receiving one run file per alpha.
    #[arg(long)]
    pub output_dir: PathBuf,
}

/// Arguments for `rankfuse rrf`.
#[derive(Args, Debug)]
pub struct RrfArgs {
    #[command(flatten)]
    pub fuse: FuseArgs,

    /// Write the fused run here instead of stdout.
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

/// Summary of one fused run, rendered when the run itself went to a file.
#[derive(Debug, Serialize)]
pub struct FuseSummary {
    pub method: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alpha: Option<f64>,
    pub normalization: String,
    pub queries: usize,
    pub entries: usize,
    pub output: String,
}

impl FuseSummary {
    fn new(
        method: &'static str,
        alpha: Option<f64>,
        config: &FusionConfig,
        ranking: &Ranking,
        output: String,
    ) -> Self {
        Self {
            method,
            alpha,
            normalization: config.normalization.to_string(),
            queries: ranking.len(),
            entries: ranking.num_entries(),
            output,
        }
    }
}

/// Apply `--cutoff`. Unsorted output keeps the first run's order, so it is
/// truncated as stored rather than by score.
fn finish(mut ranking: Ranking, config: &FusionConfig) -> Ranking {
    if let Some(cutoff) = config.cutoff {
        if config.sort {
            ranking.cut(cutoff);
        } else {
            ranking.truncate(cutoff);
        }
    }
    ranking
}

/// Execute `rankfuse interpolate`.
pub fn run_interpolate(
    args: &InterpolateArgs,
    base: &FusionConfig,
    mode: OutputMode,
) -> Result<()> {
    let mut config = args.fuse.resolve(base);
    if let Some(alpha) = args.alpha {
        config.alpha = alpha;
    }
    let (left, right) = args.fuse.load(&config)?;

    let fused = interpolate_with(&left, &right, config.alpha, &config.fuse_options())
        .context("Interpolation failed")?;
    let fused = finish(fused, &config);
    emit_run(&fused, args.output.as_deref())?;

    if args.output.is_some() {
        let summary = FuseSummary::new(
            "interpolate",
            Some(config.alpha),
            &config,
            &fused,
            display_path(args.output.as_ref()),
        );
        render(mode, &summary, render_summary)?;
    }
    Ok(())
}

/// Execute `rankfuse sweep`.
pub fn run_sweep(args: &SweepArgs, base: &FusionConfig, mode: OutputMode) -> Result<()> {
    let config = args.fuse.resolve(base);
    let (left, right) = args.fuse.load(&config)?;

    std::fs::create_dir_all(&args.output_dir)
        .with_context(|| format!("Failed to create {}", args.output_dir.display()))?;

    let stem = config.name.clone().unwrap_or_else(|| "interpolate".to_string());
    let results = interpolate_sweep(&left, &right, &args.alphas, &config.fuse_options())
        .context("Interpolation failed")?;

    let mut summaries = Vec::with_capacity(results.len());
    for (alpha, fused) in results {
        let fused = finish(fused, &config);
        let path = sweep_path(&args.output_dir, &stem, alpha);
        emit_run(&fused, Some(&path))?;
        info!(alpha, path = %path.display(), "wrote sweep run");
        summaries.push(FuseSummary::new(
            "interpolate",
            Some(alpha),
            &config,
            &fused,
            path.display().to_string(),
        ));
    }

    render(mode, &summaries, |rows, mode, w| {
        if mode == OutputMode::Pretty {
            pretty_section(w, &format!("sweep: {} alphas", rows.len()))?;
        }
        for row in rows {
            render_summary(row, OutputMode::Text, w)?;
        }
        Ok(())
    })
}

/// Execute `rankfuse rrf`.
pub fn run_rrf(args: &RrfArgs, base: &FusionConfig, mode: OutputMode) -> Result<()> {
    let config = args.fuse.resolve(base);
    let (left, right) = args.fuse.load(&config)?;

    let fused = reciprocal_rank_fusion_with(&left, &right, &config.fuse_options())
        .context("Reciprocal rank fusion failed")?;
    let fused = finish(fused, &config);
    emit_run(&fused, args.output.as_deref())?;

    if args.output.is_some() {
        let summary = FuseSummary::new(
            "rrf",
            None,
            &config,
            &fused,
            display_path(args.output.as_ref()),
        );
        render(mode, &summary, render_summary)?;
    }
    Ok(())
}

fn sweep_path(dir: &Path, stem: &str, alpha: f64) -> PathBuf {
    dir.join(format!("{stem}-alpha{alpha}.run"))
}

fn render_summary(s: &FuseSummary, mode: OutputMode, w: &mut dyn Write) -> io::Result<()> {
    let alpha = s.alpha.map_or_else(|| "-".to_string(), |a| a.to_string());
    match mode {
        OutputMode::Pretty => {
            pretty_section(w, &format!("{} -> {}", s.method, s.output))?;
            if s.alpha.is_some() {
                pretty_kv(w, "alpha", &alpha)?;
            }
            pretty_kv(w, "normalization", &s.normalization)?;
            pretty_kv(w, "queries", s.queries.to_string())?;
            pretty_kv(w, "entries", s.entries.to_string())
        }
        OutputMode::Text | OutputMode::Json => writeln!(
            w,
            "{}\t{}\t{}\t{}\t{}\t{}",
            s.method, alpha, s.normalization, s.queries, s.entries, s.output
        ),
    }
}
