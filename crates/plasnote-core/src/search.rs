use crate::feature::Strand;
use crate::operations::reverse_complement;

/// An exact occurrence of a pattern in a sequence.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PatternMatch {
    pub start: usize,
    /// Exclusive end, unwrapped: on a circular sequence it may exceed the
    /// sequence length when the match crosses the origin.
    pub end: usize,
    pub strand: Strand,
}

/// Find exact pattern matches on both strands (case-insensitive).
///
/// Circular sequences are searched with a wraparound extension of
/// `pattern.len() - 1` bases so matches crossing the origin are reported once,
/// anchored at their start position.
pub fn find_pattern(sequence: &str, pattern: &str, is_circular: bool) -> Vec<PatternMatch> {
    let upper_seq = sequence.to_uppercase();
    let upper_pat = pattern.to_uppercase();
    let seq_len = upper_seq.len();

    if upper_pat.is_empty() || seq_len == 0 {
        return Vec::new();
    }

    let search_seq = if is_circular {
        let extend = upper_pat.len().min(seq_len).saturating_sub(1);
        format!("{}{}", upper_seq, &upper_seq[..extend])
    } else {
        upper_seq
    };

    let mut matches = scan(&search_seq, &upper_pat, seq_len, Strand::Forward);

    let rc_pat = reverse_complement(&upper_pat);
    if rc_pat != upper_pat {
        matches.extend(scan(&search_seq, &rc_pat, seq_len, Strand::Reverse));
    }

    matches.sort_by_key(|m| (m.start, m.strand.as_i8()));
    matches
}

fn scan(haystack: &str, needle: &str, seq_len: usize, strand: Strand) -> Vec<PatternMatch> {
    let mut found = Vec::new();
    let mut pos = 0;
    while let Some(idx) = haystack[pos..].find(needle) {
        let abs_pos = pos + idx;
        if abs_pos < seq_len {
            found.push(PatternMatch {
                start: abs_pos,
                end: abs_pos + needle.len(),
                strand,
            });
        }
        pos = abs_pos + 1;
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_pattern() {
        let matches = find_pattern("ATCGATCGATCG", "ATCG", false);
        // fwd: ATCG at 0, 4, 8; RC (CGAT) at 2, 6
        assert_eq!(matches.len(), 5);
        let fwd = matches.iter().filter(|m| m.strand == Strand::Forward).count();
        let rev = matches.iter().filter(|m| m.strand == Strand::Reverse).count();
        assert_eq!(fwd, 3);
        assert_eq!(rev, 2);
    }

    #[test]
    fn test_find_pattern_circular() {
        // "GGATCC" + "GGA" -> CCGG at position 4, crossing the origin
        let matches = find_pattern("GGATCC", "CCGG", true);
        let hit = matches.iter().find(|m| m.start == 4).unwrap();
        assert_eq!(hit.end, 8);
    }

    #[test]
    fn test_find_pattern_linear_does_not_wrap() {
        let matches = find_pattern("GGATCC", "CCGG", false);
        assert!(matches.is_empty());
    }

    #[test]
    fn test_palindrome_reported_once() {
        let matches = find_pattern("TTGAATTCTT", "GAATTC", false);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].start, 2);
    }
}
