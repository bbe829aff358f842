use std::sync::LazyLock;

use plasnote_core::operations::is_iupac_nucleotide;
use plasnote_core::{Sequence, Topology};
use regex::Regex;

use crate::error::InvalidSequenceError;

/// Line breaks, spaces and the position numbers of pasted GenBank ORIGIN blocks.
static NON_SEQUENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s\d]+").expect("static regex"));

/// A validated query and the linear text that is actually searched.
#[derive(Debug, Clone)]
pub struct PreparedSequence {
    pub sequence: Sequence,
    /// The sequence itself, followed on a circular molecule by `padding` bases
    /// copied from its start so a feature crossing the origin is contiguous.
    pub working: String,
    pub padding: usize,
}

impl PreparedSequence {
    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    pub fn topology(&self) -> Topology {
        self.sequence.topology
    }
}

/// Clean raw text into an uppercase nucleotide string and check it.
pub fn clean(raw: &str, max_length: usize) -> Result<String, InvalidSequenceError> {
    let cleaned = NON_SEQUENCE.replace_all(raw, "").to_ascii_uppercase();
    if cleaned.is_empty() {
        return Err(InvalidSequenceError::Empty);
    }
    if let Some((position, character)) = cleaned.chars().enumerate().find(|(_, c)| !is_iupac_nucleotide(*c)) {
        return Err(InvalidSequenceError::InvalidCharacter { character, position });
    }
    if cleaned.len() > max_length {
        return Err(InvalidSequenceError::TooLong {
            length: cleaned.len(),
            max: max_length,
        });
    }
    Ok(cleaned)
}

/// Validate `raw` and build its working sequence.
///
/// `longest_reference` is the longest feature any database can report; the
/// circular padding is that long, capped at the sequence length.
pub fn prepare(
    name: &str,
    raw: &str,
    topology: Topology,
    longest_reference: usize,
    max_length: usize,
) -> Result<PreparedSequence, InvalidSequenceError> {
    let cleaned = clean(raw, max_length)?;
    let sequence = Sequence::new(name, cleaned, topology);

    let padding = match topology {
        Topology::Circular => longest_reference.min(sequence.len()),
        Topology::Linear => 0,
    };
    let mut working = String::with_capacity(sequence.len() + padding);
    working.push_str(&sequence.sequence);
    working.push_str(&sequence.sequence[..padding]);

    Ok(PreparedSequence {
        sequence,
        working,
        padding,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_strips_whitespace_and_numbers() {
        let raw = "        1 acgtacgtac gtacgt\n       17 nnRY\r\n";
        assert_eq!(clean(raw, 100).unwrap(), "ACGTACGTACGTACGTNNRY");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(clean("  \n 12 ", 100), Err(InvalidSequenceError::Empty));
    }

    #[test]
    fn test_invalid_character_position() {
        assert_eq!(
            clean("ACGT ACXT", 100),
            Err(InvalidSequenceError::InvalidCharacter {
                character: 'X',
                position: 6
            })
        );
    }

    #[test]
    fn test_non_ascii_rejected() {
        // 'ß' would uppercase to "SS" under full Unicode case mapping
        assert_eq!(
            clean("ACGTß", 100),
            Err(InvalidSequenceError::InvalidCharacter {
                character: 'ß',
                position: 4
            })
        );
        assert!(matches!(
            clean("acgtµ", 100),
            Err(InvalidSequenceError::InvalidCharacter { position: 4, .. })
        ));
    }

    #[test]
    fn test_too_long() {
        assert_eq!(
            clean("ACGTACGTACGT", 10),
            Err(InvalidSequenceError::TooLong { length: 12, max: 10 })
        );
        assert!(clean("ACGTACGTAC", 10).is_ok());
    }

    #[test]
    fn test_linear_working_is_unchanged() {
        let p = prepare("q", "acgtacgt", Topology::Linear, 5, 100).unwrap();
        assert_eq!(p.working, "ACGTACGT");
        assert_eq!(p.padding, 0);
        assert_eq!(p.len(), 8);
    }

    #[test]
    fn test_circular_working_is_padded() {
        let p = prepare("q", "AACCGGTT", Topology::Circular, 3, 100).unwrap();
        assert_eq!(p.working, "AACCGGTTAAC");
        assert_eq!(p.padding, 3);
        assert_eq!(p.topology(), Topology::Circular);
    }

    #[test]
    fn test_padding_capped_at_length() {
        let p = prepare("q", "ACGT", Topology::Circular, 40, 100).unwrap();
        assert_eq!(p.working, "ACGTACGT");
        assert_eq!(p.padding, 4);
    }
}
