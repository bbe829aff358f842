use crate::feature::Strand;
use crate::operations::reverse_complement_bytes;

/// Scoring parameters for Smith-Waterman alignment with affine gap penalties.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ScoringParams {
    /// Score awarded for a matching base pair.
    pub match_score: i32,
    /// Penalty for a mismatching base pair (should be negative).
    pub mismatch_score: i32,
    /// Penalty for opening a new gap (should be negative).
    pub gap_open: i32,
    /// Penalty for extending an existing gap (should be negative).
    pub gap_extend: i32,
}

impl Default for ScoringParams {
    fn default() -> Self {
        Self {
            match_score: 2,
            mismatch_score: -3,
            gap_open: -5,
            gap_extend: -2,
        }
    }
}

/// Result of a Smith-Waterman local alignment.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AlignmentResult {
    /// Alignment score.
    pub score: i32,
    /// Start position in the target (0-based, inclusive).
    pub target_start: usize,
    /// End position in the target (0-based, exclusive).
    pub target_end: usize,
    /// Start position in the query (0-based, inclusive).
    pub query_start: usize,
    /// End position in the query (0-based, exclusive).
    pub query_end: usize,
    /// Number of matching positions in the alignment.
    pub matches: usize,
    /// Number of mismatching positions in the alignment.
    pub mismatches: usize,
    /// Number of gap positions in the alignment.
    pub gaps: usize,
    /// Total alignment length (matches + mismatches + gaps).
    pub alignment_length: usize,
}

impl AlignmentResult {
    /// Percent identity: fraction of aligned columns that are matches.
    pub fn percent_identity(&self) -> f64 {
        if self.alignment_length == 0 {
            return 0.0;
        }
        self.matches as f64 / self.alignment_length as f64 * 100.0
    }
}

/// An alignment against one strand of the target. For `Strand::Reverse`
/// the target coordinates have already been mapped back onto the forward
/// strand.
#[derive(Debug, Clone)]
pub struct StrandedAlignment {
    pub alignment: AlignmentResult,
    pub strand: Strand,
}

/// Traceback direction stored per cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TraceOp {
    /// Local alignment starts here (H clamped to zero).
    None,
    /// Diagonal move: match or mismatch.
    Match,
    /// Gap in the query: consumes target only.
    GapInQuery,
    /// Gap in the target: consumes query only.
    GapInTarget,
}

/// Local aligner of a short reference (query) against a long target.
///
/// Scores are kept in rolling rows; only the one-byte traceback matrix is
/// stored in full.
#[derive(Debug, Clone)]
pub struct LocalAligner {
    pub params: ScoringParams,
    /// Band half-width around the main diagonal. `None` computes the full
    /// matrix, which is what a search for a short query anywhere in a long
    /// target needs.
    pub band_width: Option<usize>,
    /// Alignments scoring below this are not reported.
    pub min_score: i32,
}

impl Default for LocalAligner {
    fn default() -> Self {
        Self {
            params: ScoringParams::default(),
            band_width: None,
            min_score: 20,
        }
    }
}

impl LocalAligner {
    pub fn new(params: ScoringParams, band_width: Option<usize>, min_score: i32) -> Self {
        Self {
            params,
            band_width,
            min_score,
        }
    }

    /// Best local alignment of `query` within `target`, or `None` when the
    /// best score is below `min_score`.
    pub fn align(&self, query: &[u8], target: &[u8]) -> Option<AlignmentResult> {
        let n = query.len();
        let m = target.len();
        if n == 0 || m == 0 {
            return None;
        }

        let p = &self.params;
        let cols = m + 1;
        let neg_inf = i32::MIN / 2;

        let mut h_prev = vec![0i32; cols];
        let mut h_cur = vec![0i32; cols];
        let mut f_prev = vec![neg_inf; cols];
        let mut f_cur = vec![neg_inf; cols];
        let mut trace = vec![TraceOp::None; (n + 1) * cols];

        let mut max_score = 0i32;
        let mut max_i = 0usize;
        let mut max_j = 0usize;

        for i in 1..=n {
            let (j_start, j_end) = self.column_range(i, n, m);
            h_cur.fill(0);
            f_cur.fill(neg_inf);
            let mut e = neg_inf;
            let q_base = query[i - 1].to_ascii_uppercase();

            for j in j_start..j_end {
                let t_base = target[j - 1].to_ascii_uppercase();
                let sub = if q_base == t_base {
                    p.match_score
                } else {
                    p.mismatch_score
                };

                e = (h_cur[j - 1] + p.gap_open + p.gap_extend).max(e + p.gap_extend);
                let f = (h_prev[j] + p.gap_open + p.gap_extend).max(f_prev[j] + p.gap_extend);
                f_cur[j] = f;

                let diag = h_prev[j - 1] + sub;
                let h_val = diag.max(e).max(f).max(0);
                h_cur[j] = h_val;

                trace[i * cols + j] = if h_val == 0 {
                    TraceOp::None
                } else if h_val == diag {
                    TraceOp::Match
                } else if h_val == f {
                    TraceOp::GapInTarget
                } else {
                    TraceOp::GapInQuery
                };

                if h_val > max_score {
                    max_score = h_val;
                    max_i = i;
                    max_j = j;
                }
            }

            std::mem::swap(&mut h_prev, &mut h_cur);
            std::mem::swap(&mut f_prev, &mut f_cur);
        }

        if max_score == 0 || max_score < self.min_score {
            return None;
        }

        let mut matches = 0usize;
        let mut mismatches = 0usize;
        let mut gaps = 0usize;
        let mut ci = max_i;
        let mut cj = max_j;

        while ci > 0 && cj > 0 {
            match trace[ci * cols + cj] {
                TraceOp::Match => {
                    if query[ci - 1].eq_ignore_ascii_case(&target[cj - 1]) {
                        matches += 1;
                    } else {
                        mismatches += 1;
                    }
                    ci -= 1;
                    cj -= 1;
                }
                TraceOp::GapInTarget => {
                    gaps += 1;
                    ci -= 1;
                }
                TraceOp::GapInQuery => {
                    gaps += 1;
                    cj -= 1;
                }
                TraceOp::None => break,
            }
        }

        Some(AlignmentResult {
            score: max_score,
            query_start: ci,
            query_end: max_i,
            target_start: cj,
            target_end: max_j,
            matches,
            mismatches,
            gaps,
            alignment_length: matches + mismatches + gaps,
        })
    }

    /// Align against both strands of `target` and report every strand that
    /// clears `min_score`, forward first. Reverse-strand coordinates are
    /// mapped back onto the forward strand.
    pub fn align_both_strands(&self, query: &[u8], target: &[u8]) -> Vec<StrandedAlignment> {
        let mut out = Vec::with_capacity(2);
        if let Some(fwd) = self.align(query, target) {
            out.push(StrandedAlignment {
                alignment: fwd,
                strand: Strand::Forward,
            });
        }

        let rc = reverse_complement_bytes(target);
        if let Some(mut rev) = self.align(query, &rc) {
            let len = target.len();
            let (start, end) = (len - rev.target_end, len - rev.target_start);
            rev.target_start = start;
            rev.target_end = end;
            out.push(StrandedAlignment {
                alignment: rev,
                strand: Strand::Reverse,
            });
        }
        out
    }

    fn column_range(&self, i: usize, n: usize, m: usize) -> (usize, usize) {
        match self.band_width {
            Some(w) => {
                let center = if m >= n {
                    (i as isize * m as isize) / n as isize
                } else {
                    i as isize
                };
                let lo = (center - w as isize).max(1) as usize;
                let hi = (center + w as isize + 1).min(m as isize + 1) as usize;
                (lo, hi.max(lo))
            }
            None => (1, m + 1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aligner(min_score: i32) -> LocalAligner {
        LocalAligner::new(ScoringParams::default(), None, min_score)
    }

    #[test]
    fn test_exact_match() {
        let seq = b"ACGTACGTACGT";
        let params = ScoringParams::default();
        let result = aligner(0).align(seq, seq).unwrap();

        assert_eq!(result.score, seq.len() as i32 * params.match_score);
        assert_eq!(result.matches, seq.len());
        assert_eq!(result.mismatches, 0);
        assert_eq!(result.gaps, 0);
        assert_eq!(result.query_start, 0);
        assert_eq!(result.query_end, seq.len());
        assert_eq!(result.target_start, 0);
        assert_eq!(result.target_end, seq.len());
        assert!((result.percent_identity() - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_partial_match_with_mismatches() {
        let query = b"ACGTACGT";
        let target = b"ACGTXXGT";
        // "ACGT" (score 8) beats the full span with two mismatches (score 6).
        let result = aligner(0).align(query, target).unwrap();
        assert_eq!(result.score, 8);
        assert_eq!(result.matches, 4);
    }

    #[test]
    fn test_match_with_insertion() {
        let query = b"ACGTACGTACGTACGT";
        let target = b"ACGTACGTAACGTACGT";
        let result = aligner(0).align(query, target).unwrap();
        assert!(result.score > 0);
        assert_eq!(result.query_end, query.len());
    }

    #[test]
    fn test_no_match_unrelated_sequences() {
        let result = aligner(1).align(b"AAAAAAAAAA", b"CCCCCCCCCC");
        assert!(result.is_none());
    }

    #[test]
    fn test_both_strands_reverse_hit() {
        let query = b"AAACCCGGG";
        // RC of AAACCCGGG = CCCGGGTTT
        let target = b"TTTTTTCCCGGGTTTTTTTTT";
        let hits = aligner(10).align_both_strands(query, target);
        let rev = hits.iter().find(|h| h.strand == Strand::Reverse).unwrap();
        assert_eq!(rev.alignment.matches, query.len());
        assert_eq!(rev.alignment.target_start, 6);
        assert_eq!(rev.alignment.target_end, 15);
    }

    #[test]
    fn test_both_strands_forward_hit() {
        let query = b"AAACCCGGG";
        let target = b"TTTTTTAAACCCGGGTTTTTT";
        let hits = aligner(10).align_both_strands(query, target);
        assert_eq!(hits[0].strand, Strand::Forward);
        assert_eq!(hits[0].alignment.target_start, 6);
        assert_eq!(hits[0].alignment.target_end, 15);
    }

    #[test]
    fn test_short_query_long_target() {
        let query = b"GATTACA";
        let target = b"AAAAAAAAAAAAGATTACAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";
        let result = aligner(1).align(query, target).unwrap();
        assert_eq!(result.matches, query.len());
        assert_eq!(result.target_start, 12);
        assert_eq!(result.target_end, 19);
    }

    #[test]
    fn test_banded_vs_unbanded_identical() {
        let query = b"ACGTACGTACGTACGTACGT";
        let target = b"ACGTACGTAXGTACGTACGT";
        let unbanded = aligner(0).align(query, target).unwrap();
        let banded = LocalAligner::new(ScoringParams::default(), Some(5), 0)
            .align(query, target)
            .unwrap();
        assert_eq!(unbanded.score, banded.score);
        assert_eq!(unbanded.matches, banded.matches);
        assert_eq!(unbanded.mismatches, banded.mismatches);
    }

    #[test]
    fn test_empty_inputs() {
        assert!(aligner(0).align(b"", b"ACGT").is_none());
        assert!(aligner(0).align(b"ACGT", b"").is_none());
    }

    #[test]
    fn test_case_insensitive() {
        let result = aligner(0).align(b"acgt", b"ACGT").unwrap();
        assert_eq!(result.matches, 4);
        assert_eq!(result.mismatches, 0);
    }

    #[test]
    fn test_min_score_filter() {
        // Score is 4 * 2 = 8
        assert!(aligner(8).align(b"ACGT", b"ACGT").is_some());
        assert!(aligner(9).align(b"ACGT", b"ACGT").is_none());
    }

    #[test]
    fn test_alignment_result_methods() {
        let aln = AlignmentResult {
            score: 10,
            target_start: 5,
            target_end: 15,
            query_start: 0,
            query_end: 10,
            matches: 8,
            mismatches: 1,
            gaps: 1,
            alignment_length: 10,
        };
        assert!((aln.percent_identity() - 80.0).abs() < f64::EPSILON);
    }
}
