pub mod fasta;
pub mod genbank;

use plasnote_core::{Sequence, Topology};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
    #[error("Unexpected end of input")]
    UnexpectedEnd,
    #[error("Invalid location: {0}")]
    InvalidLocation(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    GenBank,
    Fasta,
}

impl FileFormat {
    /// Identify the format from the first non-blank line.
    pub fn sniff(content: &str) -> Option<Self> {
        let first = content.lines().map(str::trim_start).find(|l| !l.is_empty())?;
        if first.starts_with("LOCUS") {
            Some(Self::GenBank)
        } else if first.starts_with('>') {
            Some(Self::Fasta)
        } else {
            None
        }
    }
}

/// Parse every record of a GenBank or FASTA file.
pub fn parse_file(content: &str) -> Result<Vec<Sequence>, ParseError> {
    match FileFormat::sniff(content) {
        Some(FileFormat::GenBank) => genbank::parse(content).map(|s| vec![s]),
        Some(FileFormat::Fasta) => fasta::parse(content),
        None => Err(ParseError::InvalidFormat(
            "expected a GenBank or FASTA file".to_string(),
        )),
    }
}

/// Read the first record of a FASTA or GenBank file.
///
/// GenBank records keep the topology from their LOCUS line. FASTA carries no
/// topology, so `fasta_topology` is applied.
pub fn read_first_record(content: &str, fasta_topology: Topology) -> Result<Sequence, ParseError> {
    let format = FileFormat::sniff(content);
    let mut seq = parse_file(content)?
        .into_iter()
        .next()
        .ok_or(ParseError::UnexpectedEnd)?;
    if format == Some(FileFormat::Fasta) {
        seq.topology = fasta_topology;
    }
    Ok(seq)
}
