//! `rankfuse stats`: shape and score range of a run.

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use rankfuse_core::Ranking;
use serde::Serialize;

use super::load_run;
use crate::output::{OutputMode, pretty_kv, pretty_section, render};

/// Arguments for `rankfuse stats`.
#[derive(Args, Debug)]
pub struct StatsArgs {
    /// Run file to describe.
    pub input: PathBuf,
}

/// Report payload for `rankfuse stats`.
#[derive(Debug, Serialize, PartialEq)]
pub struct RunStats {
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub queries: usize,
    pub entries: usize,
    pub min_docs_per_query: usize,
    pub max_docs_per_query: usize,
    pub min_score: Option<f64>,
    pub max_score: Option<f64>,
    pub sorted: bool,
}

impl RunStats {
    #[must_use]
    pub fn from_ranking(path: String, ranking: &Ranking) -> Self {
        let sizes = ranking.queries().map(|(_, scores)| scores.len());
        let (min_docs, max_docs) = sizes.fold(None, |acc: Option<(usize, usize)>, n| {
            Some(acc.map_or((n, n), |(lo, hi)| (lo.min(n), hi.max(n))))
        })
        .unwrap_or((0, 0));
        let range = ranking.min_max();

        Self {
            path,
            name: ranking.name().map(str::to_string),
            queries: ranking.len(),
            entries: ranking.num_entries(),
            min_docs_per_query: min_docs,
            max_docs_per_query: max_docs,
            min_score: range.map(|(lo, _)| lo),
            max_score: range.map(|(_, hi)| hi),
            sorted: ranking.is_sorted(),
        }
    }
}

/// Execute `rankfuse stats`.
pub fn run_stats(args: &StatsArgs, mode: OutputMode) -> Result<()> {
    let ranking = load_run(&args.input)?;
    let stats = RunStats::from_ranking(args.input.display().to_string(), &ranking);
    render(mode, &stats, render_stats_human)
}

fn render_stats_human(s: &RunStats, mode: OutputMode, w: &mut dyn Write) -> io::Result<()> {
    let score = |v: Option<f64>| v.map_or_else(|| "-".to_string(), |x| x.to_string());
    if mode == OutputMode::Text {
        return writeln!(
            w,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}",
            s.path,
            s.queries,
            s.entries,
            s.min_docs_per_query,
            s.max_docs_per_query,
            score(s.min_score),
            score(s.max_score)
        );
    }

    pretty_section(w, &s.path)?;
    if let Some(name) = &s.name {
        pretty_kv(w, "name", name)?;
    }
    pretty_kv(w, "queries", s.queries.to_string())?;
    pretty_kv(w, "entries", s.entries.to_string())?;
    pretty_kv(
        w,
        "docs/query",
        format!("{}..={}", s.min_docs_per_query, s.max_docs_per_query),
    )?;
    pretty_kv(
        w,
        "scores",
        format!("{}..={}", score(s.min_score), score(s.max_score)),
    )?;
    pretty_kv(w, "sorted", s.sorted.to_string())
}
