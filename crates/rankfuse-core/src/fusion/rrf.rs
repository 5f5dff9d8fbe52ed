//! Reciprocal rank fusion without a smoothing constant.

use std::collections::BTreeMap;

use tracing::{debug, instrument};

use super::{FuseOptions, Normalization, prepare};
use crate::error::{FusionError, Result, Side};
use crate::ranking::{Ranking, ScoreList};

/// Rank fusion with default options.
///
/// # Errors
///
/// See [`reciprocal_rank_fusion_with`].
pub fn reciprocal_rank_fusion(
    r1: &Ranking,
    r2: &Ranking,
    normalization: Normalization,
) -> Result<Ranking> {
    reciprocal_rank_fusion_with(r1, r2, &FuseOptions::new(normalization))
}

/// Score each document present in both rankings as
/// `1/(p1 + 1) + 1/(p2 + 1)`, where `p` is its zero-based position in that
/// ranking's stored order.
///
/// Positions only mean something in score order, so both rankings must be
/// sorted. Normalization is accepted for parity with [`super::interpolate`];
/// min-max is monotonic and does not change positions.
///
/// # Errors
///
/// Returns [`FusionError::IncompatibleRankings`] when the query sets differ,
/// [`FusionError::UnsortedRanking`] when either input is unsorted, or a
/// normalization error.
#[instrument(skip_all, fields(normalization = %options.normalization))]
pub fn reciprocal_rank_fusion_with(
    r1: &Ranking,
    r2: &Ranking,
    options: &FuseOptions,
) -> Result<Ranking> {
    r1.ensure_compatible(r2)?;
    if !r1.is_sorted() {
        return Err(FusionError::UnsortedRanking { side: Side::Left });
    }
    if !r2.is_sorted() {
        return Err(FusionError::UnsortedRanking { side: Side::Right });
    }
    let (left, right) = prepare(r1, r2, options)?;

    let mut queries = BTreeMap::new();
    for (q_id, first) in left.queries() {
        let second = right.get(q_id)?;
        let mut fused = ScoreList::with_capacity(first.len().min(second.len()));
        for (p1, doc_id) in first.doc_ids().enumerate() {
            if let Some(p2) = second.position(doc_id) {
                fused.insert(doc_id, reciprocal(p1) + reciprocal(p2));
            }
        }
        queries.insert(q_id.to_string(), fused);
    }

    let ranking = options.finish(Ranking::new(queries, options.sort));
    debug!(
        queries = ranking.len(),
        entries = ranking.num_entries(),
        "fused rankings by reciprocal rank"
    );
    Ok(ranking)
}

#[allow(clippy::cast_precision_loss)]
fn reciprocal(position: usize) -> f64 {
    1.0 / (position as f64 + 1.0)
}
