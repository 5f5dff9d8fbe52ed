//! Per-query document scores.
//!
//! A [`Ranking`] maps query ids to a [`ScoreList`]: the ordered
//! `doc_id → score` mapping for one query. A `ScoreList` keeps its entries in
//! a flat vector (iteration order) next to a hash index from document id to
//! position, so both score lookups and rank lookups are O(1).
//!
//! Rankings are immutable by convention. Fusion and normalization always
//! build new instances; only [`Ranking::cut`] and [`Ranking::sort`] change a
//! ranking in place.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::error::{FusionError, Result};

// ---------------------------------------------------------------------------
// ScoreList
// ---------------------------------------------------------------------------

/// Ordered `doc_id → score` mapping for a single query.
///
/// Document ids are unique. Inserting an existing id replaces its score and
/// keeps its position.
#[derive(Debug, Clone, Default)]
pub struct ScoreList {
    entries: Vec<(String, f64)>,
    index: HashMap<String, usize>,
}

impl ScoreList {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
        }
    }

    /// Insert or overwrite a document score.
    ///
    /// Returns the previous score when `doc_id` was already present.
    pub fn insert(&mut self, doc_id: impl Into<String>, score: f64) -> Option<f64> {
        let doc_id = doc_id.into();
        if let Some(&pos) = self.index.get(&doc_id) {
            let old = std::mem::replace(&mut self.entries[pos].1, score);
            return Some(old);
        }
        self.index.insert(doc_id.clone(), self.entries.len());
        self.entries.push((doc_id, score));
        None
    }

    #[must_use]
    pub fn get(&self, doc_id: &str) -> Option<f64> {
        self.index.get(doc_id).map(|&pos| self.entries[pos].1)
    }

    /// Zero-based position of `doc_id` in the current iteration order.
    #[must_use]
    pub fn position(&self, doc_id: &str) -> Option<usize> {
        self.index.get(doc_id).copied()
    }

    #[must_use]
    pub fn contains(&self, doc_id: &str) -> bool {
        self.index.contains_key(doc_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate `(doc_id, score)` pairs in stored order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (&str, f64)> + '_ {
        self.entries.iter().map(|(d, s)| (d.as_str(), *s))
    }

    pub fn doc_ids(&self) -> impl ExactSizeIterator<Item = &str> + '_ {
        self.entries.iter().map(|(d, _)| d.as_str())
    }

    /// Smallest and largest score, or `None` for an empty list.
    #[must_use]
    pub fn min_max(&self) -> Option<(f64, f64)> {
        self.entries.iter().fold(None, |acc, &(_, s)| match acc {
            None => Some((s, s)),
            Some((lo, hi)) => Some((lo.min(s), hi.max(s))),
        })
    }

    /// True when scores never increase along the stored order.
    #[must_use]
    pub fn is_descending(&self) -> bool {
        self.entries.windows(2).all(|w| w[0].1 >= w[1].1)
    }

    /// Sort by score descending. Ties are broken by document id ascending.
    pub fn sort_descending(&mut self) {
        self.entries.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        self.reindex();
    }

    /// Keep only the first `k` entries in stored order.
    pub fn truncate(&mut self, k: usize) {
        if self.entries.len() <= k {
            return;
        }
        for (doc_id, _) in self.entries.drain(k..) {
            self.index.remove(&doc_id);
        }
    }

    /// Build a new list with every score passed through `f`, same order.
    #[must_use]
    pub fn map_scores(&self, mut f: impl FnMut(f64) -> f64) -> Self {
        Self {
            entries: self.entries.iter().map(|(d, s)| (d.clone(), f(*s))).collect(),
            index: self.index.clone(),
        }
    }

    fn reindex(&mut self) {
        self.index.clear();
        for (pos, (doc_id, _)) in self.entries.iter().enumerate() {
            self.index.insert(doc_id.clone(), pos);
        }
    }
}

impl PartialEq for ScoreList {
    /// Order-sensitive: two lists are equal when they hold the same pairs in
    /// the same order.
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for ScoreList {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        let mut list = Self::new();
        for (doc_id, score) in iter {
            list.insert(doc_id, score);
        }
        list
    }
}

impl Serialize for ScoreList {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (doc_id, score) in &self.entries {
            map.serialize_entry(doc_id, score)?;
        }
        map.end()
    }
}

// ---------------------------------------------------------------------------
// Ranking
// ---------------------------------------------------------------------------

/// Document scores for a set of queries.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Ranking {
    name: Option<String>,
    queries: BTreeMap<String, ScoreList>,
    sorted: bool,
}

impl Ranking {
    /// Build a ranking from per-query score lists.
    ///
    /// With `sort = true` every query is put in descending-score order.
    /// Otherwise the given order is kept and the ranking only counts as
    /// sorted when every query already happens to be descending.
    #[must_use]
    pub fn new(queries: BTreeMap<String, ScoreList>, sort: bool) -> Self {
        let mut ranking = Self {
            name: None,
            queries,
            sorted: false,
        };
        if sort {
            ranking.sort();
        } else {
            ranking.sorted = ranking.queries.values().all(ScoreList::is_descending);
        }
        ranking
    }

    /// Build a ranking from `(q_id, doc_id, score)` triples.
    ///
    /// A repeated `(q_id, doc_id)` pair keeps the last score.
    #[must_use]
    pub fn from_triples<Q, D, I>(triples: I, sort: bool) -> Self
    where
        Q: Into<String>,
        D: Into<String>,
        I: IntoIterator<Item = (Q, D, f64)>,
    {
        let mut queries: BTreeMap<String, ScoreList> = BTreeMap::new();
        for (q_id, doc_id, score) in triples {
            queries.entry(q_id.into()).or_default().insert(doc_id, score);
        }
        Self::new(queries, sort)
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub(crate) fn set_name(&mut self, name: Option<String>) {
        self.name = name;
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// True when every query is stored in descending-score order.
    #[must_use]
    pub const fn is_sorted(&self) -> bool {
        self.sorted
    }

    /// Number of queries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }

    /// Total number of `(query, document)` pairs.
    #[must_use]
    pub fn num_entries(&self) -> usize {
        self.queries.values().map(ScoreList::len).sum()
    }

    /// The set of query ids.
    #[must_use]
    pub fn q_ids(&self) -> BTreeSet<&str> {
        self.queries.keys().map(String::as_str).collect()
    }

    /// Iterate query ids in ascending order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &str> + '_ {
        self.queries.keys().map(String::as_str)
    }

    /// Iterate `(q_id, scores)` pairs, the shape consumed by metric tools.
    pub fn queries(&self) -> impl ExactSizeIterator<Item = (&str, &ScoreList)> + '_ {
        self.queries.iter().map(|(q, s)| (q.as_str(), s))
    }

    #[must_use]
    pub fn contains_query(&self, q_id: &str) -> bool {
        self.queries.contains_key(q_id)
    }

    /// Scores for one query.
    ///
    /// # Errors
    ///
    /// Returns [`FusionError::MissingQuery`] if `q_id` is absent.
    pub fn get(&self, q_id: &str) -> Result<&ScoreList> {
        self.queries
            .get(q_id)
            .ok_or_else(|| FusionError::MissingQuery {
                q_id: q_id.to_string(),
            })
    }

    /// Check that both rankings cover exactly the same queries.
    ///
    /// # Errors
    ///
    /// Returns [`FusionError::IncompatibleRankings`] when the query id sets
    /// differ.
    pub fn ensure_compatible(&self, other: &Self) -> Result<()> {
        let left_only: Vec<&String> = self
            .queries
            .keys()
            .filter(|q| !other.contains_query(q))
            .collect();
        let right_only: Vec<&String> = other
            .queries
            .keys()
            .filter(|q| !self.contains_query(q))
            .collect();
        if left_only.is_empty() && right_only.is_empty() {
            return Ok(());
        }
        Err(FusionError::IncompatibleRankings {
            left_only: left_only.len(),
            right_only: right_only.len(),
            sample: left_only
                .first()
                .or_else(|| right_only.first())
                .map(|q| (*q).clone()),
        })
    }

    /// Put every query in descending-score order.
    pub fn sort(&mut self) {
        for scores in self.queries.values_mut() {
            scores.sort_descending();
        }
        self.sorted = true;
    }

    /// Keep the `k` highest-scoring documents of every query.
    ///
    /// Sorts first when the ranking is not already sorted.
    pub fn cut(&mut self, k: usize) {
        if !self.sorted {
            self.sort();
        }
        self.truncate(k);
    }

    /// Keep the first `k` documents of every query in stored order, sorted
    /// or not.
    pub fn truncate(&mut self, k: usize) {
        for scores in self.queries.values_mut() {
            scores.truncate(k);
        }
    }

    /// Smallest and largest score over all queries.
    #[must_use]
    pub fn min_max(&self) -> Option<(f64, f64)> {
        self.queries
            .values()
            .filter_map(ScoreList::min_max)
            .reduce(|(lo, hi), (l, h)| (lo.min(l), hi.max(h)))
    }

    /// Rebuild with every query passed through `f`, keeping name and
    /// sortedness. `f` must not reorder the list.
    pub(crate) fn try_map_queries(
        &self,
        mut f: impl FnMut(&str, &ScoreList) -> Result<ScoreList>,
    ) -> Result<Self> {
        let queries = self
            .queries
            .iter()
            .map(|(q_id, scores)| Ok((q_id.clone(), f(q_id, scores)?)))
            .collect::<Result<BTreeMap<_, _>>>()?;
        Ok(Self {
            name: self.name.clone(),
            queries,
            sorted: self.sorted,
        })
    }
}

impl<'a> IntoIterator for &'a Ranking {
    type Item = &'a str;
    type IntoIter = std::iter::Map<
        std::collections::btree_map::Keys<'a, String, ScoreList>,
        fn(&'a String) -> &'a str,
    >;

    fn into_iter(self) -> Self::IntoIter {
        self.queries
            .keys()
            .map(String::as_str as fn(&'a String) -> &'a str)
    }
}

impl Serialize for Ranking {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.queries.len()))?;
        for (q_id, scores) in &self.queries {
            map.serialize_entry(q_id, scores)?;
        }
        map.end()
    }
}
