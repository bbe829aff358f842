use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

/// Malformed or oversized input. Raised before any search runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidSequenceError {
    #[error("sequence is empty")]
    Empty,
    #[error("sequence is {length} bp; the maximum is {max} bp")]
    TooLong { length: usize, max: usize },
    #[error("invalid character '{character}' at position {position}")]
    InvalidCharacter { character: char, position: usize },
}

/// Failure of a single database search. Never fatal to a run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SearchError {
    #[error("search unavailable: {0}")]
    Unavailable(String),
    #[error("search against '{database}' timed out after {elapsed:?}")]
    TimedOut { database: String, elapsed: Duration },
    #[error("search cancelled")]
    Cancelled,
    #[error("database '{0}' cannot be searched by this backend")]
    UnsupportedDatabase(String),
}

/// A raw hit that cannot be placed on the query sequence.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HitError {
    #[error("empty query range {start}..{end}")]
    EmptyQueryRange { start: usize, end: usize },
    #[error("reference feature length is zero")]
    EmptyReference,
    #[error("reference range {start}..{end} outside a {length} bp feature")]
    ReferenceOutOfRange { start: usize, end: usize, length: usize },
    #[error("percent identity {0} outside 0..=100")]
    IdentityOutOfRange(f64),
    #[error("hit ends at {end}, past the {length} bp sequence")]
    BeyondSequenceEnd { end: usize, length: usize },
    #[error("hit spans {span} bp, longer than the {length} bp sequence")]
    LongerThanSequence { span: usize, length: usize },
}

#[derive(Debug, Error)]
pub enum AnnotateError {
    #[error("invalid sequence: {0}")]
    InvalidSequence(#[from] InvalidSequenceError),
    #[error("annotation cancelled")]
    Cancelled,
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("catalog error: {0}")]
    Catalog(#[from] rusqlite::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("input parse error: {0}")]
    Parse(#[from] plasnote_formats::ParseError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Non-fatal degradations, attached to the final report.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    DatabaseSearchDegraded { database: String, reason: String },
    EnrichmentLookupMiss { feature_id: String },
    MalformedHit { database: String, feature_id: String, reason: String },
    RefinementFailed { feature_id: String, reason: String },
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Warning::DatabaseSearchDegraded { database, reason } => {
                write!(f, "search of '{database}' degraded: {reason}")
            }
            Warning::EnrichmentLookupMiss { feature_id } => {
                write!(f, "no description for feature '{feature_id}'")
            }
            Warning::MalformedHit { database, feature_id, reason } => {
                write!(f, "dropped hit {database}/{feature_id}: {reason}")
            }
            Warning::RefinementFailed { feature_id, reason } => {
                write!(f, "could not refine fragment '{feature_id}': {reason}")
            }
        }
    }
}
