//! Search backends. A backend takes the working sequence and one feature
//! database and returns every raw hit it finds; everything downstream only
//! sees [`RawHit`]s, so any aligner can be plugged in behind [`FeatureSearch`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use plasnote_core::alignment::{LocalAligner, ScoringParams};
use plasnote_core::operations::is_dna_sequence;
use plasnote_core::search::find_pattern;

use crate::catalog::{FeatureDatabase, ReferenceFeature, SearchMethod};
use crate::error::SearchError;
use crate::hit::RawHit;

/// Upper bound on alignments reported for one reference feature.
const MAX_HITS_PER_ENTRY: usize = 8;

/// Shared flag for cooperative cancellation of a run.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Limits a single database search runs under.
#[derive(Debug, Clone)]
pub struct SearchContext {
    started: Instant,
    deadline: Option<Instant>,
    token: CancellationToken,
}

impl SearchContext {
    pub fn new(timeout: Option<Duration>, token: CancellationToken) -> Self {
        let started = Instant::now();
        Self {
            started,
            deadline: timeout.map(|t| started + t),
            token,
        }
    }

    /// No deadline and a token nobody else holds.
    pub fn unbounded() -> Self {
        Self::new(None, CancellationToken::new())
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn is_expired(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Backends call this between units of work.
    pub fn check(&self, database: &str) -> Result<(), SearchError> {
        if self.is_cancelled() {
            return Err(SearchError::Cancelled);
        }
        if self.is_expired() {
            return Err(SearchError::TimedOut {
                database: database.to_string(),
                elapsed: self.elapsed(),
            });
        }
        Ok(())
    }
}

/// Search sensitivity. `Detailed` finds shorter and more divergent matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Sensitivity {
    #[default]
    Standard,
    Detailed,
    /// Targeted re-search of a known fragment.
    Strict,
}

impl Sensitivity {
    pub fn from_detailed(detailed: bool) -> Self {
        if detailed {
            Sensitivity::Detailed
        } else {
            Sensitivity::Standard
        }
    }

    /// Shortest exact-match-equivalent an alignment must score.
    pub fn min_match_length(&self) -> usize {
        match self {
            Sensitivity::Standard => 12,
            Sensitivity::Detailed => 8,
            Sensitivity::Strict => 12,
        }
    }

    /// Alignments below this identity are not reported.
    pub fn min_identity(&self) -> f64 {
        match self {
            Sensitivity::Standard => 70.0,
            Sensitivity::Detailed => 60.0,
            Sensitivity::Strict => 90.0,
        }
    }
}

pub struct SearchRequest<'a> {
    /// The working sequence.
    pub sequence: &'a str,
    pub database: &'a FeatureDatabase,
    pub sensitivity: Sensitivity,
    pub context: &'a SearchContext,
}

/// The search capability injected into the annotator.
pub trait FeatureSearch: Send + Sync {
    fn search(&self, request: &SearchRequest<'_>) -> Result<Vec<RawHit>, SearchError>;
}

/// Smith-Waterman search of every entry against both strands.
#[derive(Debug, Clone, Default)]
pub struct AlignmentSearch {
    pub scoring: ScoringParams,
}

impl AlignmentSearch {
    pub fn new(scoring: ScoringParams) -> Self {
        Self { scoring }
    }

    fn scan_entry(
        &self,
        aligner: &LocalAligner,
        entry: &ReferenceFeature,
        request: &SearchRequest<'_>,
    ) -> Vec<RawHit> {
        let query = entry.sequence.as_bytes();
        let mut target = request.sequence.as_bytes().to_vec();
        let mut hits = Vec::new();

        // Each round masks what it found so the next finds the next-best copy.
        while hits.len() < MAX_HITS_PER_ENTRY {
            let found = aligner.align_both_strands(query, &target);
            if found.is_empty() {
                break;
            }
            for stranded in found {
                let aln = stranded.alignment;
                target[aln.target_start..aln.target_end].fill(b'N');
                if aln.percent_identity() < request.sensitivity.min_identity() {
                    continue;
                }
                hits.push(RawHit {
                    database: request.database.name.clone(),
                    feature_id: entry.id.clone(),
                    query_start: aln.target_start,
                    query_end: aln.target_end,
                    reference_start: aln.query_start,
                    reference_end: aln.query_end,
                    reference_length: entry.length,
                    strand: stranded.strand,
                    percent_identity: aln.percent_identity(),
                    bit_score: Some(aln.score as f64),
                });
            }
        }
        hits
    }
}

impl FeatureSearch for AlignmentSearch {
    fn search(&self, request: &SearchRequest<'_>) -> Result<Vec<RawHit>, SearchError> {
        let min_len = request.sensitivity.min_match_length() as i32;
        let aligner = LocalAligner::new(self.scoring.clone(), None, min_len * self.scoring.match_score);

        let mut hits = Vec::new();
        for entry in &request.database.entries {
            request.context.check(&request.database.name)?;
            if !is_dna_sequence(&entry.sequence) {
                log::debug!("skipping non-DNA entry {}/{}", request.database.name, entry.id);
                continue;
            }
            hits.extend(self.scan_entry(&aligner, entry, request));
        }
        Ok(hits)
    }
}

/// Exact matches on both strands; full identity and coverage by construction.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactSearch;

impl FeatureSearch for ExactSearch {
    fn search(&self, request: &SearchRequest<'_>) -> Result<Vec<RawHit>, SearchError> {
        let mut hits = Vec::new();
        for entry in &request.database.entries {
            request.context.check(&request.database.name)?;
            if entry.sequence.is_empty() {
                continue;
            }
            // The working sequence already carries the origin padding.
            for m in find_pattern(request.sequence, &entry.sequence, false) {
                hits.push(RawHit {
                    database: request.database.name.clone(),
                    feature_id: entry.id.clone(),
                    query_start: m.start,
                    query_end: m.end,
                    reference_start: 0,
                    reference_end: entry.length,
                    reference_length: entry.length,
                    strand: m.strand,
                    percent_identity: 100.0,
                    bit_score: None,
                });
            }
        }
        Ok(hits)
    }
}

/// Picks the backend named by each database's [`SearchMethod`].
#[derive(Debug, Clone, Default)]
pub struct CatalogSearch {
    pub alignment: AlignmentSearch,
    pub exact: ExactSearch,
}

impl CatalogSearch {
    pub fn new(scoring: ScoringParams) -> Self {
        Self {
            alignment: AlignmentSearch::new(scoring),
            exact: ExactSearch,
        }
    }
}

impl FeatureSearch for CatalogSearch {
    fn search(&self, request: &SearchRequest<'_>) -> Result<Vec<RawHit>, SearchError> {
        match request.database.method {
            SearchMethod::Alignment => self.alignment.search(request),
            SearchMethod::Exact => self.exact.search(request),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plasnote_core::{FeatureType, Strand};

    const FILLER: &str = "TTTTTTTTTTTTTTTTTTTTTTTTTTTTTTTTTTTTTTTT";

    fn lac_db(method: SearchMethod) -> FeatureDatabase {
        FeatureDatabase::new("elements", method).with_entry(ReferenceFeature::new_builtin(
            "lac_operator",
            "lac operator",
            FeatureType::ProteinBind,
            "TTGTGAGCGGATAACAA",
        ))
    }

    fn run(searcher: &dyn FeatureSearch, sequence: &str, db: &FeatureDatabase) -> Vec<RawHit> {
        let ctx = SearchContext::unbounded();
        searcher
            .search(&SearchRequest {
                sequence,
                database: db,
                sensitivity: Sensitivity::Standard,
                context: &ctx,
            })
            .unwrap()
    }

    #[test]
    fn test_exact_search_forward() {
        let seq = format!("{FILLER}TTGTGAGCGGATAACAA{FILLER}");
        let hits = run(&ExactSearch, &seq, &lac_db(SearchMethod::Exact));
        assert_eq!(hits.len(), 1);
        assert_eq!((hits[0].query_start, hits[0].query_end), (40, 57));
        assert_eq!(hits[0].strand, Strand::Forward);
        assert_eq!(hits[0].percent_coverage(), 100.0);
    }

    #[test]
    fn test_exact_search_reverse() {
        // reverse complement of the lac operator
        let seq = format!("{FILLER}TTGTTATCCGCTCACAA{FILLER}");
        let hits = run(&ExactSearch, &seq, &lac_db(SearchMethod::Exact));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].strand, Strand::Reverse);
        assert_eq!(hits[0].query_start, 40);
    }

    #[test]
    fn test_alignment_search_finds_both_copies() {
        let seq = format!("{FILLER}TTGTGAGCGGATAACAA{FILLER}TTGTTATCCGCTCACAA{FILLER}");
        let mut hits = run(&AlignmentSearch::default(), &seq, &lac_db(SearchMethod::Alignment));
        hits.sort_by_key(|h| h.query_start);
        assert_eq!(hits.len(), 2);
        assert_eq!((hits[0].query_start, hits[0].query_end), (40, 57));
        assert_eq!(hits[0].strand, Strand::Forward);
        assert_eq!((hits[1].query_start, hits[1].query_end), (97, 114));
        assert_eq!(hits[1].strand, Strand::Reverse);
        assert!(hits.iter().all(|h| h.percent_identity == 100.0));
        assert!(hits.iter().all(|h| h.bit_score == Some(34.0)));
    }

    #[test]
    fn test_alignment_search_tolerates_mismatch() {
        let seq = format!("{FILLER}TTGTGAGCGCATAACAA{FILLER}");
        let hits = run(&AlignmentSearch::default(), &seq, &lac_db(SearchMethod::Alignment));
        assert_eq!(hits.len(), 1);
        assert!(hits[0].percent_identity < 100.0);
        assert!(hits[0].percent_identity > 90.0);
    }

    #[test]
    fn test_no_hits_in_unrelated_sequence() {
        let seq = FILLER.repeat(3);
        assert!(run(&AlignmentSearch::default(), &seq, &lac_db(SearchMethod::Alignment)).is_empty());
        assert!(run(&ExactSearch, &seq, &lac_db(SearchMethod::Exact)).is_empty());
    }

    #[test]
    fn test_catalog_search_dispatch() {
        let seq = format!("{FILLER}TTGTGAGCGCATAACAA{FILLER}");
        // One mismatch: only the alignment backend reports it
        assert_eq!(run(&CatalogSearch::default(), &seq, &lac_db(SearchMethod::Alignment)).len(), 1);
        assert!(run(&CatalogSearch::default(), &seq, &lac_db(SearchMethod::Exact)).is_empty());
    }

    #[test]
    fn test_context_cancelled() {
        let token = CancellationToken::new();
        let ctx = SearchContext::new(None, token.clone());
        assert!(ctx.check("db").is_ok());
        token.cancel();
        assert_eq!(ctx.check("db"), Err(SearchError::Cancelled));
    }

    #[test]
    fn test_context_deadline() {
        let ctx = SearchContext::new(Some(Duration::ZERO), CancellationToken::new());
        assert!(matches!(ctx.check("db"), Err(SearchError::TimedOut { .. })));
    }

    #[test]
    fn test_sensitivity_ordering() {
        assert!(Sensitivity::Detailed.min_match_length() < Sensitivity::Standard.min_match_length());
        assert_eq!(Sensitivity::from_detailed(true), Sensitivity::Detailed);
    }
}
