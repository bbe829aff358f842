use plasnote_core::sequence::{Sequence, Topology};

use crate::ParseError;

/// Parse a FASTA format string into one or more Sequences.
///
/// FASTA has no topology field; records come back linear and callers set
/// the topology they were told to use.
pub fn parse(input: &str) -> Result<Vec<Sequence>, ParseError> {
    let mut sequences = Vec::new();
    let mut current_name: Option<String> = None;
    let mut current_desc: Option<String> = None;
    let mut current_seq = String::new();

    for line in input.lines() {
        let trimmed = line.trim();

        if trimmed.is_empty() {
            continue;
        }

        if trimmed.starts_with('>') {
            // Save previous sequence if exists
            if let Some(name) = current_name.take() {
                if !current_seq.is_empty() {
                    let mut seq = Sequence::new(
                        name,
                        std::mem::take(&mut current_seq),
                        Topology::Linear,
                    );
                    if let Some(desc) = current_desc.take() {
                        seq.description = desc;
                    }
                    sequences.push(seq);
                }
            }

            // Parse header
            let header = &trimmed[1..];
            let parts: Vec<&str> = header.splitn(2, |c: char| c.is_whitespace()).collect();
            current_name = Some(parts[0].to_string());
            current_desc = parts.get(1).map(|s| s.to_string());
            current_seq = String::new();
        } else if trimmed.starts_with(';') {
            // Comment line, skip
            continue;
        } else {
            current_seq.extend(
                trimmed
                    .chars()
                    .filter(|c| c.is_ascii_alphabetic())
                    .map(|c| c.to_ascii_uppercase()),
            );
        }
    }

    // Don't forget the last sequence
    if let Some(name) = current_name {
        if !current_seq.is_empty() {
            let mut seq = Sequence::new(name, current_seq, Topology::Linear);
            if let Some(desc) = current_desc {
                seq.description = desc;
            }
            sequences.push(seq);
        }
    }

    if sequences.is_empty() {
        return Err(ParseError::InvalidFormat(
            "No sequences found in FASTA input".to_string(),
        ));
    }

    Ok(sequences)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_sequence() {
        let input = ">seq1 A test sequence\nATCGATCG\nGGCCTTAA\n";
        let seqs = parse(input).unwrap();
        assert_eq!(seqs.len(), 1);
        assert_eq!(seqs[0].name, "seq1");
        assert_eq!(seqs[0].description, "A test sequence");
        assert_eq!(seqs[0].sequence, "ATCGATCGGGCCTTAA");
    }

    #[test]
    fn test_parse_multi_sequence() {
        let input = ">seq1\nATCG\n>seq2\nGGCC\n>seq3\nTTAA\n";
        let seqs = parse(input).unwrap();
        assert_eq!(seqs.len(), 3);
        assert_eq!(seqs[0].sequence, "ATCG");
        assert_eq!(seqs[1].sequence, "GGCC");
        assert_eq!(seqs[2].sequence, "TTAA");
    }

    #[test]
    fn test_comment_lines_skipped() {
        let seqs = parse(">p\n; exported by hand\nACGT\n").unwrap();
        assert_eq!(seqs[0].sequence, "ACGT");
    }

    #[test]
    fn test_strips_digits_and_whitespace() {
        let seqs = parse(">p\n  1 acgt acgt\n 9 ggcc\r\n").unwrap();
        assert_eq!(seqs[0].sequence, "ACGTACGTGGCC");
    }

    #[test]
    fn test_empty_input() {
        assert!(parse("").is_err());
        assert!(parse("> \n").is_err());
    }
}
