use std::fmt;

/// Machine-readable error codes for callers that branch on failure kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    IncompatibleRankings,
    MissingQuery,
    DegenerateNormalization,
    MalformedRunLine,
    DuplicateDocument,
    InvalidRunId,
    UnsortedRanking,
    RunFileIo,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::MalformedRunLine => "E1001",
            Self::DuplicateDocument => "E1002",
            Self::RunFileIo => "E1003",
            Self::InvalidRunId => "E1004",
            Self::MissingQuery => "E2001",
            Self::IncompatibleRankings => "E3001",
            Self::UnsortedRanking => "E3002",
            Self::DegenerateNormalization => "E4001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::IncompatibleRankings => "Rankings cover different queries",
            Self::MissingQuery => "Query not found in ranking",
            Self::DegenerateNormalization => "Score range is zero",
            Self::MalformedRunLine => "Malformed run file line",
            Self::DuplicateDocument => "Duplicate document in query",
            Self::InvalidRunId => "Identifier cannot be written to a run file",
            Self::UnsortedRanking => "Ranking is not sorted by score",
            Self::RunFileIo => "Run file I/O failed",
        }
    }

    /// Optional remediation hint surfaced by the CLI.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::IncompatibleRankings => {
                Some("Fuse runs produced for the same query set, or filter both runs first.")
            }
            Self::MissingQuery => None,
            Self::DegenerateNormalization => {
                Some("Use `on_degenerate = \"zero\"` or skip normalization for this run.")
            }
            Self::MalformedRunLine => {
                Some("Expected `q_id doc_id score` or `q_id Q0 doc_id rank score tag`.")
            }
            Self::DuplicateDocument => Some("Deduplicate the run file before fusing."),
            Self::InvalidRunId => {
                Some("Ids and run tags must be non-empty, contain no whitespace, and query ids must not start with `#`.")
            }
            Self::UnsortedRanking => Some("Sort the ranking by score before rank fusion."),
            Self::RunFileIo => Some("Check the path and read/write permissions."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Which input of a two-ranking operation an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Left => f.write_str("left"),
            Self::Right => f.write_str("right"),
        }
    }
}

/// Errors returned by ranking, normalization and fusion operations.
#[derive(Debug, thiserror::Error)]
pub enum FusionError {
    /// The two rankings do not share the same query id set.
    #[error(
        "rankings cover different queries: {left_only} only in left (e.g. {sample:?}), {right_only} only in right"
    )]
    IncompatibleRankings {
        left_only: usize,
        right_only: usize,
        sample: Option<String>,
    },

    #[error("query {q_id:?} not found in ranking")]
    MissingQuery { q_id: String },

    /// Min equals max in the normalization scope. `q_id` is `None` for
    /// global normalization.
    #[error("cannot normalize {}: all scores are equal", scope(.q_id.as_deref()))]
    DegenerateNormalization { q_id: Option<String> },

    #[error("malformed run file line {line}: {reason}")]
    MalformedRunLine { line: usize, reason: String },

    #[error("line {line}: document {doc_id:?} appears twice in query {q_id:?}")]
    DuplicateDocument {
        line: usize,
        q_id: String,
        doc_id: String,
    },

    /// An id or run tag would not survive a write/read round trip.
    #[error("{field} {id:?} cannot be written to a run file: {reason}")]
    InvalidRunId {
        field: &'static str,
        id: String,
        reason: &'static str,
    },

    #[error("{side} ranking is not sorted by score; rank fusion needs score order")]
    UnsortedRanking { side: Side },

    #[error("run file I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

fn scope(q_id: Option<&str>) -> String {
    q_id.map_or_else(|| "ranking".to_string(), |q| format!("query {q:?}"))
}

impl FusionError {
    /// The machine-readable code for this error.
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::IncompatibleRankings { .. } => ErrorCode::IncompatibleRankings,
            Self::MissingQuery { .. } => ErrorCode::MissingQuery,
            Self::DegenerateNormalization { .. } => ErrorCode::DegenerateNormalization,
            Self::MalformedRunLine { .. } => ErrorCode::MalformedRunLine,
            Self::DuplicateDocument { .. } => ErrorCode::DuplicateDocument,
            Self::InvalidRunId { .. } => ErrorCode::InvalidRunId,
            Self::UnsortedRanking { .. } => ErrorCode::UnsortedRanking,
            Self::Io(_) => ErrorCode::RunFileIo,
        }
    }

    pub(crate) fn malformed(line: usize, reason: impl Into<String>) -> Self {
        Self::MalformedRunLine {
            line,
            reason: reason.into(),
        }
    }
}

/// Result type for rankfuse-core operations.
pub type Result<T> = std::result::Result<T, FusionError>;
