use plasnote_core::{FeatureType, Strand};
use serde::{Deserialize, Serialize};

use crate::catalog::FeatureDescription;

/// One alignment of a reference feature against the working sequence, as
/// reported by a search backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawHit {
    pub database: String,
    pub feature_id: String,
    /// Query range in the working frame (0-based, half-open).
    pub query_start: usize,
    pub query_end: usize,
    /// Aligned range of the reference feature (0-based, half-open).
    pub reference_start: usize,
    pub reference_end: usize,
    pub reference_length: usize,
    pub strand: Strand,
    pub percent_identity: f64,
    /// Backend score, when it reports one.
    pub bit_score: Option<f64>,
}

impl RawHit {
    /// Aligned reference length over total reference length, as a percentage.
    pub fn percent_coverage(&self) -> f64 {
        if self.reference_length == 0 {
            return 0.0;
        }
        let aligned = self.reference_end.saturating_sub(self.reference_start);
        (aligned as f64 / self.reference_length as f64 * 100.0).min(100.0)
    }

    /// The backend score, or identity x coverage when there is none.
    pub fn score(&self) -> f64 {
        self.bit_score
            .unwrap_or_else(|| self.percent_identity * self.percent_coverage() / 100.0)
    }

    pub fn query_span(&self) -> usize {
        self.query_end.saturating_sub(self.query_start)
    }
}

/// A raw hit placed on the original sequence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedHit {
    pub database: String,
    pub feature_id: String,
    pub category: FeatureType,
    pub start: usize,
    /// Unwrapped: exceeds the sequence length when `origin_spanning`.
    pub end: usize,
    pub strand: Strand,
    pub reference_start: usize,
    pub reference_end: usize,
    pub reference_length: usize,
    pub percent_identity: f64,
    pub percent_coverage: f64,
    pub score: f64,
    pub origin_spanning: bool,
}

impl NormalizedHit {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    pub fn same_reference(&self, other: &NormalizedHit) -> bool {
        self.database == other.database && self.feature_id == other.feature_id
    }
}

/// One feature of the final annotation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedFeature {
    pub start: usize,
    /// `start + length`; may exceed the sequence length for a feature that
    /// crosses the origin.
    pub end: usize,
    pub strand: Strand,
    pub database: String,
    pub feature_id: String,
    pub category: FeatureType,
    pub percent_identity: f64,
    pub percent_coverage: f64,
    pub score: f64,
    /// Covers less of its reference than the complete-coverage threshold.
    pub fragment: bool,
    /// Filled by the enricher.
    pub details: Option<FeatureDescription>,
}

impl ResolvedFeature {
    pub fn from_hit(hit: &NormalizedHit, fragment: bool) -> Self {
        Self {
            start: hit.start,
            end: hit.end,
            strand: hit.strand,
            database: hit.database.clone(),
            feature_id: hit.feature_id.clone(),
            category: hit.category,
            percent_identity: hit.percent_identity,
            percent_coverage: hit.percent_coverage,
            score: hit.score,
            fragment,
            details: None,
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    pub fn name(&self) -> &str {
        self.details
            .as_ref()
            .map(|d| d.name.as_str())
            .unwrap_or(&self.feature_id)
    }
}

/// Bases shared by the half-open ranges `a` and `b`.
///
/// With `circular_len`, ranges are unwrapped intervals on a circle of that
/// length and the copies of each shifted by one turn are also compared. The
/// result never exceeds the shorter range.
pub fn shared_length(a: (usize, usize), b: (usize, usize), circular_len: Option<usize>) -> usize {
    let intersect = |x: (usize, usize), y: (usize, usize)| -> usize {
        x.1.min(y.1).saturating_sub(x.0.max(y.0))
    };
    let shorter = (a.1 - a.0).min(b.1 - b.0);
    let shared = match circular_len {
        Some(n) if n > 0 => {
            intersect(a, b) + intersect(a, (b.0 + n, b.1 + n)) + intersect((a.0 + n, a.1 + n), b)
        }
        _ => intersect(a, b),
    };
    shared.min(shorter)
}

/// Shared length over the shorter length; 0 when either range is empty.
pub fn overlap_fraction(a: (usize, usize), b: (usize, usize), circular_len: Option<usize>) -> f64 {
    let shorter = (a.1 - a.0).min(b.1 - b.0);
    if shorter == 0 {
        return 0.0;
    }
    shared_length(a, b, circular_len) as f64 / shorter as f64
}
