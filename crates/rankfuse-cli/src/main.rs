#![forbid(unsafe_code)]

mod cmd;
mod output;

use clap::{CommandFactory, Parser, Subcommand};
use output::{CliError, OutputMode, render_error, resolve_output_mode};
use rankfuse_core::config::resolve_config;
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "rankfuse: fuse sparse and dense retrieval runs",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format for summaries and errors.
    #[arg(long, value_enum, global = true)]
    format: Option<OutputMode>,

    /// Shorthand for `--format json`.
    #[arg(long, global = true, hide = true)]
    json: bool,

    /// Configuration file (defaults to ./rankfuse.toml, then the user config).
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn output_mode(&self) -> OutputMode {
        resolve_output_mode(self.format, self.json)
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Fuse",
        about = "Interpolate two runs",
        long_about = "Fuse two runs with alpha * s1 + (1 - alpha) * s2 over the documents both runs retrieved.",
        after_help = "EXAMPLES:\n    # Equal weights, fused run to stdout\n    rankfuse interpolate bm25.run tct.run\n\n    # Per-query normalization, top 10 per query\n    rankfuse interpolate bm25.run tct.run -a 0.3 -n local --cutoff 10 -o fused.run"
    )]
    Interpolate(cmd::fuse::InterpolateArgs),

    #[command(
        next_help_heading = "Fuse",
        about = "Interpolate over several alphas",
        long_about = "Interpolate two runs once per alpha, writing one run file per value.",
        after_help = "EXAMPLES:\n    # Sweep alpha in tenths\n    rankfuse sweep bm25.run tct.run --alphas 0,0.1,0.2,0.3,0.4,0.5,0.6,0.7,0.8,0.9,1 --output-dir sweep/\n\n    # Emit machine-readable summaries\n    rankfuse sweep bm25.run tct.run --alphas 0.2,0.5 --output-dir sweep/ --json"
    )]
    Sweep(cmd::fuse::SweepArgs),

    #[command(
        next_help_heading = "Fuse",
        about = "Reciprocal rank fusion of two runs",
        long_about = "Fuse two sorted runs with 1/(p1 + 1) + 1/(p2 + 1) over zero-based positions.",
        after_help = "EXAMPLES:\n    # Fused run to stdout\n    rankfuse rrf bm25.run tct.run\n\n    # Cut inputs to 1000 first\n    rankfuse rrf bm25.run tct.run --depth 1000 -o rrf.run"
    )]
    Rrf(cmd::fuse::RrfArgs),

    #[command(
        next_help_heading = "Runs",
        about = "Min-max normalize a run",
        long_about = "Rescale the scores of a run to [0, 1], per query or globally.",
        after_help = "EXAMPLES:\n    # Per-query normalization\n    rankfuse normalize bm25.run\n\n    # One range over the whole run, failing on constant scores\n    rankfuse normalize bm25.run -m global --on-degenerate fail"
    )]
    Normalize(cmd::normalize::NormalizeArgs),

    #[command(
        next_help_heading = "Runs",
        about = "Keep the top k documents per query",
        long_about = "Sort a run by score and keep the k best documents of every query.",
        after_help = "EXAMPLES:\n    # Cut a sparse run to 5000\n    rankfuse cut bm25.run -k 5000 -o bm25.5k.run"
    )]
    Cut(cmd::cut::CutArgs),

    #[command(
        next_help_heading = "Runs",
        about = "Describe a run",
        long_about = "Show query count, entries, docs per query and score range of a run.",
        after_help = "EXAMPLES:\n    # Human-readable\n    rankfuse stats bm25.run\n\n    # Emit machine-readable output\n    rankfuse stats bm25.run --json"
    )]
    Stats(cmd::stats::StatsArgs),

    #[command(
        next_help_heading = "Shell",
        about = "Generate shell completions",
        long_about = "Generate shell completion scripts for rankfuse.",
        after_help = "EXAMPLES:\n    # Generate zsh completions\n    rankfuse completions zsh > ~/.zfunc/_rankfuse"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("RANKFUSE_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "rankfuse=debug,rankfuse_core=debug,info"
        } else {
            "rankfuse=info,rankfuse_core=info,warn"
        })
    });

    let format = env::var("RANKFUSE_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    // stdout carries run files
    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn run(cli: &Cli, output: OutputMode) -> anyhow::Result<()> {
    let project_root = env::current_dir()?;
    let config = resolve_config(cli.config.as_deref(), &project_root)?;
    debug!(?config, "resolved configuration");

    match &cli.command {
        Commands::Interpolate(args) => cmd::fuse::run_interpolate(args, &config, output),
        Commands::Sweep(args) => cmd::fuse::run_sweep(args, &config, output),
        Commands::Rrf(args) => cmd::fuse::run_rrf(args, &config, output),
        Commands::Normalize(args) => cmd::normalize::run_normalize(args, &config),
        Commands::Cut(args) => cmd::cut::run_cut(args),
        Commands::Stats(args) => cmd::stats::run_stats(args, output),
        Commands::Completions(args) => {
            let mut command = Cli::command();
            cmd::completions::run_completions(args.shell, &mut command)
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let output = cli.output_mode();
    match run(&cli, output) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let cli_err = CliError::from(&err);
            if render_error(output, &cli_err).is_err() {
                eprintln!("error: {err:#}");
            }
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rankfuse_core::Normalization;

    #[test]
    fn json_flag_sets_output_mode() {
        let cli = Cli::parse_from(["rankfuse", "--json", "stats", "a.run"]);
        assert!(cli.json);
        assert!(cli.output_mode().is_json());
    }

    #[test]
    fn json_flag_after_subcommand() {
        let cli = Cli::parse_from(["rankfuse", "stats", "a.run", "--json"]);
        assert!(cli.output_mode().is_json());
    }

    #[test]
    fn format_flag_wins() {
        let cli = Cli::parse_from(["rankfuse", "--format", "text", "--json", "stats", "a.run"]);
        assert_eq!(cli.output_mode(), OutputMode::Text);
    }

    #[test]
    fn interpolate_parses_shared_flags() {
        let cli = Cli::parse_from([
            "rankfuse",
            "interpolate",
            "a.run",
            "b.run",
            "-a",
            "0.2",
            "-n",
            "per-query",
            "--cutoff",
            "10",
        ]);
        let Commands::Interpolate(args) = cli.command else {
            panic!("expected interpolate");
        };
        assert_eq!(args.alpha, Some(0.2));
        assert_eq!(args.fuse.normalization, Some(Normalization::Local));
        assert_eq!(args.fuse.cutoff, Some(10));
        assert_eq!(args.fuse.left, PathBuf::from("a.run"));
    }

    #[test]
    fn sweep_splits_alphas_on_commas() {
        let cli = Cli::parse_from([
            "rankfuse",
            "sweep",
            "a.run",
            "b.run",
            "--alphas",
            "0,0.5,1",
            "--output-dir",
            "out",
        ]);
        let Commands::Sweep(args) = cli.command else {
            panic!("expected sweep");
        };
        assert_eq!(args.alphas, vec![0.0, 0.5, 1.0]);
    }

    #[test]
    fn sweep_requires_alphas() {
        let res = Cli::try_parse_from(["rankfuse", "sweep", "a.run", "b.run", "--output-dir", "o"]);
        assert!(res.is_err());
    }

    #[test]
    fn unknown_normalization_is_rejected() {
        let res = Cli::try_parse_from(["rankfuse", "rrf", "a.run", "b.run", "-n", "zscore"]);
        assert!(res.is_err());
    }

    #[test]
    fn cut_requires_k() {
        assert!(Cli::try_parse_from(["rankfuse", "cut", "a.run"]).is_err());
        let cli = Cli::parse_from(["rankfuse", "cut", "a.run", "-k", "5000"]);
        assert!(matches!(cli.command, Commands::Cut(ref a) if a.k == 5000));
    }

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }
}
