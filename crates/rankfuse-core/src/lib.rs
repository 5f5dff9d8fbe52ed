#![forbid(unsafe_code)]
//! rankfuse-core library.
//!
//! Fuses two rankings of the same queries (typically a sparse and a dense
//! retrieval run) into one, for hybrid retrieval evaluation.
//!
//! # Conventions
//!
//! - **Errors**: ranking and fusion operations return [`FusionError`];
//!   configuration loading uses `anyhow::Result`.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).

pub mod config;
pub mod error;
pub mod fusion;
pub mod normalize;
pub mod ranking;
pub mod run_file;

pub use error::{ErrorCode, FusionError, Result};
pub use fusion::{
    FuseOptions, Normalization, interpolate, interpolate_sweep, interpolate_with,
    reciprocal_rank_fusion, reciprocal_rank_fusion_with,
};
pub use normalize::{DegeneratePolicy, normalise_global, normalise_per_query};
pub use ranking::{Ranking, ScoreList};
