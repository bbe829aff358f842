use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Category of an annotated element. Doubles as the category key for
/// per-category identity/coverage thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureType {
    Promoter,
    Cds,
    Terminator,
    RepOrigin,
    Marker,
    Tag,
    Rbs,
    Enhancer,
    PrimerBind,
    ProteinBind,
    Ncrna,
    PolyA,
    Ltr,
    Intron,
    Misc,
    Source,
    #[serde(other)]
    Other,
}

impl FeatureType {
    pub const ALL: [FeatureType; 17] = [
        FeatureType::Promoter,
        FeatureType::Cds,
        FeatureType::Terminator,
        FeatureType::RepOrigin,
        FeatureType::Marker,
        FeatureType::Tag,
        FeatureType::Rbs,
        FeatureType::Enhancer,
        FeatureType::PrimerBind,
        FeatureType::ProteinBind,
        FeatureType::Ncrna,
        FeatureType::PolyA,
        FeatureType::Ltr,
        FeatureType::Intron,
        FeatureType::Misc,
        FeatureType::Source,
        FeatureType::Other,
    ];

    /// Parse either a GenBank feature key or one of the catalog's category
    /// labels. Unrecognised keys map to `Other`.
    pub fn from_genbank_key(key: &str) -> Self {
        match key.trim().to_lowercase().as_str() {
            "promoter" => FeatureType::Promoter,
            "cds" | "gene" => FeatureType::Cds,
            "terminator" => FeatureType::Terminator,
            "rep_origin" | "ori" | "origin" => FeatureType::RepOrigin,
            "marker" | "resistance" => FeatureType::Marker,
            "tag" => FeatureType::Tag,
            "rbs" | "ribosome_binding_site" => FeatureType::Rbs,
            "enhancer" => FeatureType::Enhancer,
            "primer_bind" | "primer" => FeatureType::PrimerBind,
            "protein_bind" | "operator" => FeatureType::ProteinBind,
            "ncrna" | "misc_rna" => FeatureType::Ncrna,
            "polya_signal" | "polya" => FeatureType::PolyA,
            "ltr" => FeatureType::Ltr,
            "intron" => FeatureType::Intron,
            "source" => FeatureType::Source,
            "misc" | "misc_feature" | "misc_binding" | "misc_difference" | "misc_recomb"
            | "misc_structure" | "misc_signal" | "regulatory" => FeatureType::Misc,
            _ => FeatureType::Other,
        }
    }

    pub fn to_genbank_key(&self) -> &'static str {
        match self {
            FeatureType::Promoter => "promoter",
            FeatureType::Cds | FeatureType::Marker => "CDS",
            FeatureType::Terminator => "terminator",
            FeatureType::RepOrigin => "rep_origin",
            FeatureType::Tag => "misc_feature",
            FeatureType::Rbs => "RBS",
            FeatureType::Enhancer => "enhancer",
            FeatureType::PrimerBind => "primer_bind",
            FeatureType::ProteinBind => "protein_bind",
            FeatureType::Ncrna => "ncRNA",
            FeatureType::PolyA => "polyA_signal",
            FeatureType::Ltr => "LTR",
            FeatureType::Intron => "intron",
            FeatureType::Source => "source",
            FeatureType::Misc | FeatureType::Other => "misc_feature",
        }
    }

    /// Short lowercase label, as stored in the catalog and emitted in CSV.
    pub fn label(&self) -> &'static str {
        match self {
            FeatureType::Promoter => "promoter",
            FeatureType::Cds => "cds",
            FeatureType::Terminator => "terminator",
            FeatureType::RepOrigin => "rep_origin",
            FeatureType::Marker => "marker",
            FeatureType::Tag => "tag",
            FeatureType::Rbs => "rbs",
            FeatureType::Enhancer => "enhancer",
            FeatureType::PrimerBind => "primer_bind",
            FeatureType::ProteinBind => "protein_bind",
            FeatureType::Ncrna => "ncrna",
            FeatureType::PolyA => "polya",
            FeatureType::Ltr => "ltr",
            FeatureType::Intron => "intron",
            FeatureType::Misc => "misc",
            FeatureType::Source => "source",
            FeatureType::Other => "unknown",
        }
    }

    pub fn default_color(&self) -> &'static str {
        match self {
            FeatureType::Promoter => "#2dd4a8",
            FeatureType::Cds => "#5b9cf5",
            FeatureType::Terminator => "#ef6b6b",
            FeatureType::RepOrigin => "#f0b429",
            FeatureType::Marker => "#a78bfa",
            FeatureType::Tag => "#f472b6",
            FeatureType::Rbs => "#67e8f9",
            FeatureType::PrimerBind => "#c8e6a0",
            FeatureType::ProteinBind => "#fdba74",
            _ => "#9a9ba3",
        }
    }
}

impl std::fmt::Display for FeatureType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strand {
    Forward,
    Reverse,
    None,
}

impl Strand {
    pub fn as_i8(&self) -> i8 {
        match self {
            Strand::Forward => 1,
            Strand::Reverse => -1,
            Strand::None => 0,
        }
    }

    pub fn from_i8(v: i8) -> Self {
        match v {
            1 => Strand::Forward,
            -1 => Strand::Reverse,
            _ => Strand::None,
        }
    }
}

/// Location of a feature on the sequence. Coordinates are 0-based, half-open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Location {
    /// Simple range: start..end
    Simple { start: usize, end: usize },
    /// Join of multiple ranges: join(1..100, 200..300)
    Join { ranges: Vec<(usize, usize)> },
}

impl Location {
    pub fn simple(start: usize, end: usize) -> Self {
        Location::Simple { start, end }
    }

    /// Location of a feature given in unwrapped coordinates, where `end` may
    /// run past `seq_len` on a circular molecule. Crossing the origin yields
    /// a two-part join.
    pub fn wrapped(start: usize, end: usize, seq_len: usize) -> Self {
        if seq_len == 0 || end <= seq_len {
            return Location::simple(start, end);
        }
        Location::Join {
            ranges: vec![(start, seq_len), (0, end - seq_len)],
        }
    }

    pub fn start(&self) -> usize {
        match self {
            Location::Simple { start, .. } => *start,
            Location::Join { ranges } => ranges.first().map(|r| r.0).unwrap_or(0),
        }
    }

    pub fn end(&self) -> usize {
        match self {
            Location::Simple { end, .. } => *end,
            Location::Join { ranges } => ranges.last().map(|r| r.1).unwrap_or(0),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Location::Simple { start, end } => end.saturating_sub(*start),
            Location::Join { ranges } => ranges.iter().map(|(s, e)| e.saturating_sub(*s)).sum(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Qualifier {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feature {
    pub id: Uuid,
    pub name: String,
    pub feature_type: FeatureType,
    pub location: Location,
    pub strand: Strand,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub qualifiers: Vec<Qualifier>,
}

impl Feature {
    pub fn new(
        name: impl Into<String>,
        feature_type: FeatureType,
        location: Location,
        strand: Strand,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            feature_type,
            location,
            strand,
            color: None,
            qualifiers: Vec::new(),
        }
    }

    pub fn start(&self) -> usize {
        self.location.start()
    }

    pub fn end(&self) -> usize {
        self.location.end()
    }

    pub fn get_qualifier(&self, key: &str) -> Option<&str> {
        self.qualifiers
            .iter()
            .find(|q| q.key == key)
            .map(|q| q.value.as_str())
    }

    pub fn add_qualifier(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.qualifiers.push(Qualifier {
            key: key.into(),
            value: value.into(),
        });
    }
}
