//! Run file parsing and serialization.
//!
//! Two line layouts are accepted, separated by any whitespace:
//!
//! ```text
//! q_id doc_id score                 (3 fields)
//! q_id Q0 doc_id rank score tag     (6 fields, TREC)
//! ```
//!
//! Blank lines and lines starting with `#` are ignored. Output is always
//! written in the TREC layout, with ranks taken from the stored order.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use tracing::{debug, info, instrument};

use crate::error::{FusionError, Result};
use crate::ranking::{Ranking, ScoreList};

/// Run tag written when a ranking has no name.
pub const DEFAULT_RUN_TAG: &str = "rankfuse";

/// One parsed run file line.
#[derive(Debug, Clone, PartialEq)]
pub struct RunLine<'a> {
    pub q_id: &'a str,
    pub doc_id: &'a str,
    pub score: f64,
    pub tag: Option<&'a str>,
}

/// Parse a single non-comment line. `line_no` is 1-based and only used for
/// error messages.
///
/// # Errors
///
/// Returns [`FusionError::MalformedRunLine`] when the field count is wrong or
/// the score is not a finite number.
pub fn parse_line(line: &str, line_no: usize) -> Result<RunLine<'_>> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    let (q_id, doc_id, raw_score, tag) = match fields.as_slice() {
        [q_id, doc_id, score] => (*q_id, *doc_id, *score, None),
        [q_id, _q0, doc_id, rank, score, tag] => {
            rank.parse::<u64>().map_err(|_| {
                FusionError::malformed(line_no, format!("rank {rank:?} is not an integer"))
            })?;
            (*q_id, *doc_id, *score, Some(*tag))
        }
        other => {
            return Err(FusionError::malformed(
                line_no,
                format!("expected 3 or 6 fields, got {}", other.len()),
            ));
        }
    };

    let score: f64 = raw_score.parse().map_err(|_| {
        FusionError::malformed(line_no, format!("score {raw_score:?} is not a number"))
    })?;
    if !score.is_finite() {
        return Err(FusionError::malformed(
            line_no,
            format!("score {raw_score:?} is not finite"),
        ));
    }

    Ok(RunLine {
        q_id,
        doc_id,
        score,
        tag,
    })
}

/// Read a ranking from any buffered reader. The result is sorted and named
/// after the first TREC run tag seen.
///
/// # Errors
///
/// Returns [`FusionError::MalformedRunLine`] or
/// [`FusionError::DuplicateDocument`] for bad input, [`FusionError::Io`] when
/// reading fails.
pub fn read_ranking(reader: impl BufRead) -> Result<Ranking> {
    let mut queries: BTreeMap<String, ScoreList> = BTreeMap::new();
    let mut name: Option<String> = None;

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let line_no = idx + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let parsed = parse_line(trimmed, line_no)?;
        if name.is_none() {
            name = parsed.tag.map(str::to_string);
        }
        let scores = queries.entry(parsed.q_id.to_string()).or_default();
        if scores.contains(parsed.doc_id) {
            return Err(FusionError::DuplicateDocument {
                line: line_no,
                q_id: parsed.q_id.to_string(),
                doc_id: parsed.doc_id.to_string(),
            });
        }
        scores.insert(parsed.doc_id, parsed.score);
    }

    let mut ranking = Ranking::new(queries, true);
    ranking.set_name(name);
    Ok(ranking)
}

/// Write a ranking in TREC layout: `q_id Q0 doc_id rank score tag`.
///
/// Scores use the shortest representation that parses back to the same
/// `f64`.
///
/// Nothing is written unless every id and the run tag can be read back.
///
/// # Errors
///
/// Returns [`FusionError::InvalidRunId`] for an id or tag that is empty or
/// contains whitespace, or a query id that would read back as a comment.
/// Returns [`FusionError::Io`] when writing fails.
pub fn write_ranking(ranking: &Ranking, mut writer: impl Write) -> Result<()> {
    check_writable(ranking)?;
    let tag = ranking.name().unwrap_or(DEFAULT_RUN_TAG);
    for (q_id, scores) in ranking.queries() {
        for (rank, (doc_id, score)) in scores.iter().enumerate() {
            writeln!(writer, "{q_id} Q0 {doc_id} {} {score:?} {tag}", rank + 1)?;
        }
    }
    writer.flush()?;
    Ok(())
}

fn check_writable(ranking: &Ranking) -> Result<()> {
    if let Some(name) = ranking.name() {
        check_field("run tag", name)?;
    }
    for (q_id, scores) in ranking.queries() {
        check_field("query id", q_id)?;
        if q_id.starts_with('#') {
            return Err(invalid("query id", q_id, "starts with `#`"));
        }
        for doc_id in scores.doc_ids() {
            check_field("document id", doc_id)?;
        }
    }
    Ok(())
}

fn check_field(field: &'static str, id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(invalid(field, id, "empty"));
    }
    if id.chars().any(char::is_whitespace) {
        return Err(invalid(field, id, "contains whitespace"));
    }
    Ok(())
}

fn invalid(field: &'static str, id: &str, reason: &'static str) -> FusionError {
    FusionError::InvalidRunId {
        field,
        id: id.to_string(),
        reason,
    }
}

impl Ranking {
    /// Load a ranking from a run file on disk.
    ///
    /// # Errors
    ///
    /// See [`read_ranking`].
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        let ranking = read_ranking(BufReader::new(file))?;
        info!(
            queries = ranking.len(),
            entries = ranking.num_entries(),
            "loaded run file"
        );
        Ok(ranking)
    }

    /// Write the ranking to `path` in TREC layout, replacing any existing
    /// file.
    ///
    /// # Errors
    ///
    /// Returns [`FusionError::InvalidRunId`] before touching `path` when the
    /// ranking cannot be represented, [`FusionError::Io`] when the file
    /// cannot be written.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        check_writable(self)?;
        let file = File::create(path.as_ref())?;
        write_ranking(self, BufWriter::new(file))?;
        debug!(entries = self.num_entries(), "wrote run file");
        Ok(())
    }

    /// Serialize to a writer in TREC layout.
    ///
    /// # Errors
    ///
    /// See [`write_ranking`].
    pub fn write_trec(&self, writer: impl Write) -> Result<()> {
        write_ranking(self, writer)
    }
}
