/// IUPAC nucleotide codes accepted in an input sequence.
pub const IUPAC_NUCLEOTIDES: &str = "ACGTURYSWKMBDHVN";

/// Complement a single DNA base
pub fn complement_base(base: char) -> char {
    match base.to_ascii_uppercase() {
        'A' => 'T',
        'T' | 'U' => 'A',
        'G' => 'C',
        'C' => 'G',
        'R' => 'Y',
        'Y' => 'R',
        'S' => 'S',
        'W' => 'W',
        'K' => 'M',
        'M' => 'K',
        'B' => 'V',
        'V' => 'B',
        'D' => 'H',
        'H' => 'D',
        'N' => 'N',
        other => other,
    }
}

/// Reverse complement of a DNA sequence
pub fn reverse_complement(seq: &str) -> String {
    seq.chars().rev().map(complement_base).collect()
}

/// Byte-level reverse complement, for the aligner.
pub fn reverse_complement_bytes(seq: &[u8]) -> Vec<u8> {
    seq.iter()
        .rev()
        .map(|&b| complement_base(b as char) as u8)
        .collect()
}

pub fn is_iupac_nucleotide(base: char) -> bool {
    IUPAC_NUCLEOTIDES.contains(base.to_ascii_uppercase())
}

/// True when every base is unambiguous A/C/G/T.
pub fn is_dna_sequence(seq: &str) -> bool {
    !seq.is_empty()
        && seq
            .chars()
            .all(|c| matches!(c.to_ascii_uppercase(), 'A' | 'C' | 'G' | 'T'))
}
