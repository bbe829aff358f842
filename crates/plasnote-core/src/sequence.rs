use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::feature::Feature;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Topology {
    Linear,
    Circular,
}

impl Topology {
    pub fn from_linear_flag(linear: bool) -> Self {
        if linear {
            Topology::Linear
        } else {
            Topology::Circular
        }
    }
}

impl std::fmt::Display for Topology {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Topology::Linear => write!(f, "linear"),
            Topology::Circular => write!(f, "circular"),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SequenceMetadata {
    #[serde(default)]
    pub accession: Option<String>,
    #[serde(default)]
    pub organism: Option<String>,
    #[serde(default)]
    pub molecule_type: Option<String>,
    #[serde(default)]
    pub division: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub definition: Option<String>,
    #[serde(default)]
    pub keywords: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub comments: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sequence {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub topology: Topology,
    pub sequence: String,
    #[serde(default)]
    pub features: Vec<Feature>,
    #[serde(default)]
    pub metadata: SequenceMetadata,
}

impl Sequence {
    pub fn new(name: impl Into<String>, sequence: impl Into<String>, topology: Topology) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            description: String::new(),
            topology,
            sequence: sequence.into().to_uppercase(),
            features: Vec::new(),
            metadata: SequenceMetadata::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    pub fn is_circular(&self) -> bool {
        self.topology == Topology::Circular
    }

    /// Get a subsequence, handling circular wrapping
    pub fn subsequence(&self, start: usize, end: usize) -> String {
        if start <= end {
            self.sequence[start..end].to_string()
        } else if self.is_circular() {
            // Wraps around origin
            let mut result = self.sequence[start..].to_string();
            result.push_str(&self.sequence[..end]);
            result
        } else {
            String::new()
        }
    }

    /// `len` bases starting at `start`. On a circular molecule the window may
    /// run past the end and continue from position 0; on a linear one it is
    /// clipped at the end.
    pub fn window(&self, start: usize, len: usize) -> String {
        let total = self.len();
        if total == 0 || len == 0 {
            return String::new();
        }
        if !self.is_circular() {
            let start = start.min(total);
            return self.sequence[start..(start + len).min(total)].to_string();
        }
        let len = len.min(total);
        let start = start % total;
        let end = start + len;
        if end <= total {
            self.sequence[start..end].to_string()
        } else {
            self.subsequence(start, end - total)
        }
    }

    pub fn add_feature(&mut self, feature: Feature) {
        self.features.push(feature);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_sequence() {
        let seq = Sequence::new("test", "atcgatcg", Topology::Linear);
        assert_eq!(seq.name, "test");
        assert_eq!(seq.sequence, "ATCGATCG");
        assert_eq!(seq.len(), 8);
        assert!(!seq.is_circular());
    }

    #[test]
    fn test_circular_subsequence() {
        let seq = Sequence::new("circ", "AABBCCDD", Topology::Circular);
        assert_eq!(seq.subsequence(2, 6), "BBCC");
        assert_eq!(seq.subsequence(6, 2), "DDAA");
    }

    #[test]
    fn test_linear_no_wrap() {
        let seq = Sequence::new("lin", "AABBCCDD", Topology::Linear);
        assert_eq!(seq.subsequence(6, 2), "");
    }

    #[test]
    fn test_window() {
        let circ = Sequence::new("circ", "AACCGGTT", Topology::Circular);
        assert_eq!(circ.window(6, 4), "TTAA");
        assert_eq!(circ.window(10, 2), "CC");
        assert_eq!(circ.window(0, 20), "AACCGGTT");

        let lin = Sequence::new("lin", "AACCGGTT", Topology::Linear);
        assert_eq!(lin.window(6, 4), "TT");
        assert_eq!(lin.window(9, 4), "");
    }

    #[test]
    fn test_topology_flag() {
        assert_eq!(Topology::from_linear_flag(true), Topology::Linear);
        assert_eq!(Topology::from_linear_flag(false), Topology::Circular);
    }
}
