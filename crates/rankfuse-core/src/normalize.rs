//! Min-max score normalization.
//!
//! Both strategies rescale scores to `(s - min) / (max - min)` and return a
//! new [`Ranking`]; the input is never touched. They differ in the scope of
//! `min`/`max`:
//!
//! - [`normalise_per_query`]: each query on its own.
//! - [`normalise_global`]: one range over every score in the ranking.
//!
//! Min-max is monotonic, so per-query order (and therefore sortedness) is
//! preserved. A zero range (all scores in scope equal, including the
//! single-document query) is handled by [`DegeneratePolicy`].

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::{FusionError, Result};
use crate::ranking::{Ranking, ScoreList};

/// What to do when `max == min` in the normalization scope.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DegeneratePolicy {
    /// Every score in the scope becomes `0.0`.
    #[default]
    Zero,
    /// Fail with [`FusionError::DegenerateNormalization`].
    Fail,
}

impl std::str::FromStr for DegeneratePolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "zero" => Ok(Self::Zero),
            "fail" | "error" => Ok(Self::Fail),
            other => Err(format!("unknown degenerate policy {other:?} (expected zero|fail)")),
        }
    }
}

/// Normalize every query independently.
///
/// # Errors
///
/// Returns [`FusionError::DegenerateNormalization`] naming the first
/// degenerate query when `policy` is [`DegeneratePolicy::Fail`].
#[instrument(skip(ranking), fields(queries = ranking.len()))]
pub fn normalise_per_query(ranking: &Ranking, policy: DegeneratePolicy) -> Result<Ranking> {
    ranking.try_map_queries(|q_id, scores| {
        let Some((min, max)) = scores.min_max() else {
            return Ok(scores.clone());
        };
        if max - min <= 0.0 {
            debug!(q_id, score = max, "query score range is zero");
        }
        rescale(scores, min, max, policy).ok_or_else(|| FusionError::DegenerateNormalization {
            q_id: Some(q_id.to_string()),
        })
    })
}

/// Normalize with one range shared by all queries.
///
/// # Errors
///
/// Returns [`FusionError::DegenerateNormalization`] (with no query id) when
/// every score in the ranking is equal and `policy` is
/// [`DegeneratePolicy::Fail`].
#[instrument(skip(ranking), fields(queries = ranking.len()))]
pub fn normalise_global(ranking: &Ranking, policy: DegeneratePolicy) -> Result<Ranking> {
    let Some((min, max)) = ranking.min_max() else {
        return Ok(ranking.clone());
    };
    if max - min <= 0.0 {
        debug!(min, max, "global score range is zero");
        if policy == DegeneratePolicy::Fail {
            return Err(FusionError::DegenerateNormalization { q_id: None });
        }
    }
    ranking.try_map_queries(|_, scores| {
        rescale(scores, min, max, DegeneratePolicy::Zero)
            .ok_or(FusionError::DegenerateNormalization { q_id: None })
    })
}

/// `None` means the range is zero and `policy` says to fail.
fn rescale(scores: &ScoreList, min: f64, max: f64, policy: DegeneratePolicy) -> Option<ScoreList> {
    let range = max - min;
    if range <= 0.0 {
        return match policy {
            DegeneratePolicy::Zero => Some(scores.map_scores(|_| 0.0)),
            DegeneratePolicy::Fail => None,
        };
    }
    if range.is_finite() {
        return Some(scores.map_scores(|s| (s - min) / range));
    }
    // max - min overflowed; halving keeps every term finite
    let (half_min, half_range) = (min / 2.0, max / 2.0 - min / 2.0);
    Some(scores.map_scores(|s| (s / 2.0 - half_min) / half_range))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranking() -> Ranking {
        Ranking::from_triples(
            [
                ("q1", "a", 10.0),
                ("q1", "b", 5.0),
                ("q1", "c", 0.0),
                ("q2", "x", 2.0),
                ("q2", "y", 1.0),
            ],
            true,
        )
    }

    fn score(r: &Ranking, q: &str, d: &str) -> f64 {
        r.get(q).expect("query").get(d).expect("doc")
    }

    #[test]
    fn per_query_rescales_each_query_to_unit_range() {
        let n = normalise_per_query(&ranking(), DegeneratePolicy::Zero).expect("normalize");
        assert!((score(&n, "q1", "a") - 1.0).abs() < 1e-12);
        assert!((score(&n, "q1", "b") - 0.5).abs() < 1e-12);
        assert!(score(&n, "q1", "c").abs() < 1e-12);
        assert!((score(&n, "q2", "x") - 1.0).abs() < 1e-12);
        assert!(score(&n, "q2", "y").abs() < 1e-12);
    }

    #[test]
    fn global_uses_one_range_for_all_queries() {
        let n = normalise_global(&ranking(), DegeneratePolicy::Zero).expect("normalize");
        assert!((score(&n, "q1", "a") - 1.0).abs() < 1e-12);
        assert!((score(&n, "q2", "x") - 0.2).abs() < 1e-12);
        assert!((score(&n, "q2", "y") - 0.1).abs() < 1e-12);
    }

    #[test]
    fn input_is_not_mutated_and_order_is_kept() {
        let r = ranking();
        let before = r.clone();
        let n = normalise_per_query(&r, DegeneratePolicy::Zero).expect("normalize");
        assert_eq!(r, before);
        assert!(n.is_sorted());
        let order: Vec<_> = n.get("q1").expect("q1").doc_ids().collect();
        assert_eq!(order, ["a", "b", "c"]);
    }

    #[test]
    fn equal_scores_become_zero_by_default() {
        let r = Ranking::from_triples([("q", "a", 5.0), ("q", "b", 5.0)], true);
        let n = normalise_per_query(&r, DegeneratePolicy::Zero).expect("normalize");
        assert!(score(&n, "q", "a").abs() < f64::EPSILON);
        assert!(score(&n, "q", "b").abs() < f64::EPSILON);
    }

    #[test]
    fn equal_scores_fail_under_fail_policy() {
        let r = Ranking::from_triples([("ok", "a", 1.0), ("ok", "b", 2.0), ("q", "a", 5.0)], true);
        let err = normalise_per_query(&r, DegeneratePolicy::Fail).expect_err("degenerate");
        assert!(matches!(
            err,
            FusionError::DegenerateNormalization { q_id: Some(ref q) } if q == "q"
        ));
    }

    #[test]
    fn single_document_queries_are_preserved() {
        let r = Ranking::from_triples([("q1", "a", 3.0), ("q1", "b", 1.0), ("q2", "z", 7.0)], true);
        let n = normalise_per_query(&r, DegeneratePolicy::Zero).expect("normalize");
        assert_eq!(n.q_ids(), r.q_ids());
        assert_eq!(n.get("q2").expect("q2").len(), 1);

        let g = normalise_global(&r, DegeneratePolicy::Fail).expect("normalize");
        assert_eq!(g.q_ids(), r.q_ids());
        assert!((score(&g, "q2", "z") - 1.0).abs() < 1e-12);
    }

    #[test]
    fn global_degenerate_follows_policy() {
        let r = Ranking::from_triples([("q1", "a", 2.0), ("q2", "b", 2.0)], true);
        let n = normalise_global(&r, DegeneratePolicy::Zero).expect("zero policy");
        assert!(score(&n, "q2", "b").abs() < f64::EPSILON);

        let err = normalise_global(&r, DegeneratePolicy::Fail).expect_err("fail policy");
        assert!(matches!(err, FusionError::DegenerateNormalization { q_id: None }));
    }

    #[test]
    fn empty_queries_pass_through() {
        let mut queries = std::collections::BTreeMap::new();
        queries.insert("empty".to_string(), ScoreList::new());
        let r = Ranking::new(queries, true);
        let n = normalise_per_query(&r, DegeneratePolicy::Fail).expect("empty is fine");
        assert!(n.get("empty").expect("kept").is_empty());
        let g = normalise_global(&r, DegeneratePolicy::Fail).expect("empty is fine");
        assert_eq!(g.len(), 1);
    }

    #[test]
    fn policy_parses_from_str() {
        assert_eq!("zero".parse::<DegeneratePolicy>(), Ok(DegeneratePolicy::Zero));
        assert_eq!("FAIL".parse::<DegeneratePolicy>(), Ok(DegeneratePolicy::Fail));
        assert!("maybe".parse::<DegeneratePolicy>().is_err());
    }

    #[test]
    fn overflowing_range_still_maps_to_unit_interval() {
        let r = Ranking::from_triples(
            [("q", "a", f64::MAX), ("q", "b", 0.0), ("q", "c", -f64::MAX)],
            true,
        );
        for n in [
            normalise_per_query(&r, DegeneratePolicy::Zero).expect("per query"),
            normalise_global(&r, DegeneratePolicy::Zero).expect("global"),
        ] {
            assert!((score(&n, "q", "a") - 1.0).abs() < 1e-12);
            assert!((score(&n, "q", "b") - 0.5).abs() < 1e-12);
            assert!(score(&n, "q", "c").abs() < 1e-12);
            let order: Vec<_> = n.get("q").expect("q").doc_ids().collect();
            assert_eq!(order, ["a", "b", "c"]);
        }
    }
}
