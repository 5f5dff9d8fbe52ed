//! Fusion of two rankings into one.
//!
//! Two entry points, each optionally preceded by normalization of both
//! inputs:
//!
//! - [`interpolate`]: weighted linear combination of scores,
//!   `alpha * s1 + (1 - alpha) * s2`.
//! - [`reciprocal_rank_fusion`]: `1/(p1 + 1) + 1/(p2 + 1)` over zero-based
//!   positions; absolute scores are ignored.
//!
//! Both only score documents present in *both* rankings for a query;
//! documents retrieved by one side alone are dropped. Both require the two
//! rankings to cover the same query ids.
//!
//! # Example
//!
//! ```
//! use rankfuse_core::fusion::{Normalization, interpolate};
//! use rankfuse_core::Ranking;
//!
//! let sparse = Ranking::from_triples([("q1", "d1", 12.5), ("q1", "d2", 11.0)], true);
//! let dense = Ranking::from_triples([("q1", "d2", 0.9), ("q1", "d1", 0.1)], true);
//!
//! let fused = interpolate(&sparse, &dense, 0.3, Normalization::Local).unwrap();
//! let top: Vec<_> = fused.get("q1").unwrap().doc_ids().collect();
//! assert_eq!(top, ["d2", "d1"]);
//! ```

pub mod interpolate;
pub mod rrf;

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::normalize::{DegeneratePolicy, normalise_global, normalise_per_query};
use crate::ranking::Ranking;

pub use interpolate::{interpolate, interpolate_sweep, interpolate_with};
pub use rrf::{reciprocal_rank_fusion, reciprocal_rank_fusion_with};

/// Normalization applied to both inputs before fusing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Normalization {
    /// Use scores as given.
    #[default]
    Off,
    /// Min-max per query.
    Local,
    /// Min-max across all queries.
    Global,
}

impl Normalization {
    /// Apply this normalization, borrowing the input unchanged for `Off`.
    ///
    /// # Errors
    ///
    /// Propagates [`crate::FusionError::DegenerateNormalization`].
    pub fn apply<'a>(self, ranking: &'a Ranking, policy: DegeneratePolicy) -> Result<Cow<'a, Ranking>> {
        match self {
            Self::Off => Ok(Cow::Borrowed(ranking)),
            Self::Local => normalise_per_query(ranking, policy).map(Cow::Owned),
            Self::Global => normalise_global(ranking, policy).map(Cow::Owned),
        }
    }
}

impl fmt::Display for Normalization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Off => "off",
            Self::Local => "local",
            Self::Global => "global",
        })
    }
}

impl std::str::FromStr for Normalization {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" | "none" => Ok(Self::Off),
            "local" | "per-query" | "per_query" => Ok(Self::Local),
            "global" => Ok(Self::Global),
            other => Err(format!(
                "unknown normalization {other:?} (expected off|local|global)"
            )),
        }
    }
}

/// Options shared by every fusion entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuseOptions {
    pub normalization: Normalization,
    pub on_degenerate: DegeneratePolicy,
    /// Sort each query of the output by fused score.
    pub sort: bool,
    /// Name (run tag) of the output ranking.
    pub name: Option<String>,
}

impl Default for FuseOptions {
    fn default() -> Self {
        Self {
            normalization: Normalization::Off,
            on_degenerate: DegeneratePolicy::Zero,
            sort: true,
            name: None,
        }
    }
}

impl FuseOptions {
    #[must_use]
    pub fn new(normalization: Normalization) -> Self {
        Self {
            normalization,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn with_degenerate_policy(mut self, policy: DegeneratePolicy) -> Self {
        self.on_degenerate = policy;
        self
    }

    #[must_use]
    pub const fn with_sort(mut self, sort: bool) -> Self {
        self.sort = sort;
        self
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    fn finish(&self, ranking: Ranking) -> Ranking {
        match &self.name {
            Some(name) => ranking.with_name(name.clone()),
            None => ranking,
        }
    }
}

/// Check compatibility, then normalize both sides.
fn prepare<'a>(
    r1: &'a Ranking,
    r2: &'a Ranking,
    options: &FuseOptions,
) -> Result<(Cow<'a, Ranking>, Cow<'a, Ranking>)> {
    r1.ensure_compatible(r2)?;
    let left = options.normalization.apply(r1, options.on_degenerate)?;
    let right = options.normalization.apply(r2, options.on_degenerate)?;
    Ok((left, right))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_round_trips_through_str() {
        for n in [Normalization::Off, Normalization::Local, Normalization::Global] {
            assert_eq!(n.to_string().parse::<Normalization>(), Ok(n));
        }
        assert_eq!("per-query".parse::<Normalization>(), Ok(Normalization::Local));
        assert!("zscore".parse::<Normalization>().is_err());
    }

    #[test]
    fn off_borrows_input() {
        let r = Ranking::from_triples([("q", "d", 1.0)], true);
        let out = Normalization::Off
            .apply(&r, DegeneratePolicy::Fail)
            .expect("off never fails");
        assert!(matches!(out, Cow::Borrowed(_)));
    }

    #[test]
    fn prepare_checks_compatibility_before_normalizing() {
        // Every query is degenerate, but the q_id mismatch must win.
        let a = Ranking::from_triples([("1", "d", 1.0)], true);
        let b = Ranking::from_triples([("2", "d", 1.0)], true);
        let options = FuseOptions::new(Normalization::Local)
            .with_degenerate_policy(DegeneratePolicy::Fail);
        let err = prepare(&a, &b, &options).expect_err("incompatible");
        assert!(matches!(
            err,
            crate::FusionError::IncompatibleRankings { .. }
        ));
    }

    #[test]
    fn options_default_sorts_without_name() {
        let options = FuseOptions::default();
        assert!(options.sort);
        assert_eq!(options.name, None);
        assert_eq!(options.normalization, Normalization::Off);
    }
}
