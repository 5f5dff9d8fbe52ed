//! Linear score interpolation.

use std::collections::BTreeMap;

use tracing::{debug, instrument};

use super::{FuseOptions, Normalization, prepare};
use crate::error::Result;
use crate::ranking::{Ranking, ScoreList};

/// Interpolate with default options: sorted output, zero for degenerate
/// normalization ranges.
///
/// # Errors
///
/// See [`interpolate_with`].
pub fn interpolate(
    r1: &Ranking,
    r2: &Ranking,
    alpha: f64,
    normalization: Normalization,
) -> Result<Ranking> {
    interpolate_with(r1, r2, alpha, &FuseOptions::new(normalization))
}

/// Combine `alpha * s1 + (1 - alpha) * s2` for every document scored by both
/// rankings. `alpha` is not range-checked; values outside `[0, 1]`
/// extrapolate.
///
/// Unsorted output keeps `r1`'s per-query order.
///
/// # Errors
///
/// Returns [`crate::FusionError::IncompatibleRankings`] when the query sets
/// differ, or a normalization error.
#[instrument(skip_all, fields(alpha, normalization = %options.normalization))]
pub fn interpolate_with(
    r1: &Ranking,
    r2: &Ranking,
    alpha: f64,
    options: &FuseOptions,
) -> Result<Ranking> {
    let (left, right) = prepare(r1, r2, options)?;
    combine(&left, &right, alpha, options)
}

/// Interpolate once per alpha, normalizing the inputs only once.
///
/// Returns `(alpha, ranking)` pairs in the order given.
///
/// # Errors
///
/// Same as [`interpolate_with`].
#[instrument(skip_all, fields(alphas = alphas.len(), normalization = %options.normalization))]
pub fn interpolate_sweep(
    r1: &Ranking,
    r2: &Ranking,
    alphas: &[f64],
    options: &FuseOptions,
) -> Result<Vec<(f64, Ranking)>> {
    let (left, right) = prepare(r1, r2, options)?;
    alphas
        .iter()
        .map(|&alpha| combine(&left, &right, alpha, options).map(|r| (alpha, r)))
        .collect()
}

fn combine(r1: &Ranking, r2: &Ranking, alpha: f64, options: &FuseOptions) -> Result<Ranking> {
    let mut queries = BTreeMap::new();
    for (q_id, left) in r1.queries() {
        let right = r2.get(q_id)?;
        let mut fused = ScoreList::with_capacity(left.len().min(right.len()));
        for (doc_id, s1) in left.iter() {
            if let Some(s2) = right.get(doc_id) {
                fused.insert(doc_id, alpha.mul_add(s1, (1.0 - alpha) * s2));
            }
        }
        queries.insert(q_id.to_string(), fused);
    }

    let ranking = options.finish(Ranking::new(queries, options.sort));
    debug!(
        alpha,
        queries = ranking.len(),
        entries = ranking.num_entries(),
        "interpolated rankings"
    );
    Ok(ranking)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FusionError;

    fn sparse() -> Ranking {
        Ranking::from_triples(
            [
                ("q1", "d1", 10.0),
                ("q1", "d2", 8.0),
                ("q1", "d3", 6.0),
                ("q2", "d4", 3.0),
            ],
            true,
        )
    }

    fn dense() -> Ranking {
        Ranking::from_triples(
            [
                ("q1", "d2", 0.9),
                ("q1", "d1", 0.2),
                ("q1", "d9", 0.8),
                ("q2", "d4", 0.5),
            ],
            true,
        )
    }

    fn score(r: &Ranking, q: &str, d: &str) -> f64 {
        r.get(q).expect("query").get(d).expect("doc")
    }

    #[test]
    fn keeps_only_shared_documents() {
        let fused = interpolate(&sparse(), &dense(), 0.5, Normalization::Off).expect("fuse");
        let q1 = fused.get("q1").expect("q1");
        assert_eq!(q1.len(), 2);
        assert!(!q1.contains("d3"));
        assert!(!q1.contains("d9"));
    }

    #[test]
    fn half_alpha_is_the_mean() {
        let fused = interpolate(&sparse(), &dense(), 0.5, Normalization::Off).expect("fuse");
        assert!((score(&fused, "q1", "d1") - 5.1).abs() < 1e-12);
        assert!((score(&fused, "q1", "d2") - 4.45).abs() < 1e-12);
        assert!((score(&fused, "q2", "d4") - 1.75).abs() < 1e-12);
    }

    #[test]
    fn alpha_extremes_select_one_side() {
        let only_left = interpolate(&sparse(), &dense(), 1.0, Normalization::Off).expect("fuse");
        assert!((score(&only_left, "q1", "d2") - 8.0).abs() < f64::EPSILON);

        let only_right = interpolate(&sparse(), &dense(), 0.0, Normalization::Off).expect("fuse");
        assert!((score(&only_right, "q1", "d2") - 0.9).abs() < f64::EPSILON);
    }

    #[test]
    fn out_of_range_alpha_extrapolates() {
        let fused = interpolate(&sparse(), &dense(), 2.0, Normalization::Off).expect("fuse");
        // 2 * 10 - 1 * 0.2
        assert!((score(&fused, "q1", "d1") - 19.8).abs() < 1e-12);
    }

    #[test]
    fn output_is_sorted_by_default() {
        let fused = interpolate(&sparse(), &dense(), 0.0, Normalization::Off).expect("fuse");
        assert!(fused.is_sorted());
        let order: Vec<_> = fused.get("q1").expect("q1").doc_ids().collect();
        assert_eq!(order, ["d2", "d1"]);
    }

    #[test]
    fn unsorted_output_follows_left_order() {
        let options = FuseOptions::default().with_sort(false);
        let fused = interpolate_with(&sparse(), &dense(), 0.0, &options).expect("fuse");
        let order: Vec<_> = fused.get("q1").expect("q1").doc_ids().collect();
        assert_eq!(order, ["d1", "d2"]);
    }

    #[test]
    fn local_normalization_rescales_before_combining() {
        let fused = interpolate(&sparse(), &dense(), 0.5, Normalization::Local).expect("fuse");
        // sparse q1: d1=1.0, d2=0.5; dense q1: d2=1.0, d1=0.0
        assert!((score(&fused, "q1", "d1") - 0.5).abs() < 1e-12);
        assert!((score(&fused, "q1", "d2") - 0.75).abs() < 1e-12);
        // single-document query degenerates to zero on both sides
        assert!(score(&fused, "q2", "d4").abs() < 1e-12);
    }

    #[test]
    fn mismatched_queries_fail_without_output() {
        let a = Ranking::from_triples([("1", "d", 1.0)], true);
        let b = Ranking::from_triples([("2", "d", 1.0)], true);
        let err = interpolate(&a, &b, 0.5, Normalization::Off).expect_err("incompatible");
        assert!(matches!(err, FusionError::IncompatibleRankings { .. }));
    }

    #[test]
    fn inputs_are_left_untouched() {
        let (a, b) = (sparse(), dense());
        let (a0, b0) = (a.clone(), b.clone());
        let _ = interpolate(&a, &b, 0.3, Normalization::Global).expect("fuse");
        assert_eq!(a, a0);
        assert_eq!(b, b0);
    }

    #[test]
    fn sweep_matches_individual_calls() {
        let options = FuseOptions::new(Normalization::Local).with_name("cc");
        let sweep = interpolate_sweep(&sparse(), &dense(), &[0.0, 0.2, 1.0], &options)
            .expect("sweep");
        assert_eq!(sweep.len(), 3);
        for (alpha, ranking) in &sweep {
            let single = interpolate_with(&sparse(), &dense(), *alpha, &options).expect("fuse");
            assert_eq!(ranking, &single);
            assert_eq!(ranking.name(), Some("cc"));
        }
    }
}
