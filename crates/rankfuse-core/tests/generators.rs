#![allow(dead_code)]

use proptest::prelude::*;
use rankfuse_core::Ranking;
use std::collections::BTreeMap;

type Run = BTreeMap<String, BTreeMap<String, f64>>;

pub fn arb_scores() -> impl Strategy<Value = BTreeMap<String, f64>> {
    prop::collection::btree_map("d[0-9]{1,2}", -50.0f64..50.0, 1..25)
}

pub fn to_ranking(run: &Run, sort: bool) -> Ranking {
    Ranking::from_triples(
        run.iter().flat_map(|(q, docs)| {
            docs.iter()
                .map(move |(d, s)| (q.clone(), d.clone(), *s))
        }),
        sort,
    )
}

/// A sorted ranking over 1..6 queries.
pub fn arb_ranking() -> impl Strategy<Value = Ranking> {
    prop::collection::btree_map("q[0-9]{1,3}", arb_scores(), 1..6)
        .prop_map(|run| to_ranking(&run, true))
}

/// Two sorted rankings over the same query ids with overlapping documents.
pub fn arb_compatible_pair() -> impl Strategy<Value = (Ranking, Ranking)> {
    prop::collection::btree_map("q[0-9]{1,3}", (arb_scores(), arb_scores()), 1..6).prop_map(
        |pairs| {
            let left: Run = pairs.iter().map(|(q, (a, _))| (q.clone(), a.clone())).collect();
            let right: Run = pairs.iter().map(|(q, (_, b))| (q.clone(), b.clone())).collect();
            (to_ranking(&left, true), to_ranking(&right, true))
        },
    )
}
