use plasnote_core::{Feature, FeatureType, Location, Sequence, Strand, Topology};
use serde::{Deserialize, Serialize};

use crate::catalog::FeatureDescription;
use crate::hit::ResolvedFeature;

/// Name written into the `note` qualifier of every exported feature.
pub const TOOL_NAME: &str = "plasnote";

/// One row of the feature table. The column set and order are fixed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    pub start: usize,
    /// Unwrapped end; past the sequence length for a feature crossing the origin.
    pub end: usize,
    pub length: usize,
    /// 1, -1 or 0.
    pub strand: i8,
    pub feature_id: String,
    pub name: String,
    pub category: String,
    pub database: String,
    pub percent_identity: f64,
    pub percent_coverage: f64,
    pub fragment: bool,
    pub score: f64,
    pub description: Option<String>,
    pub color: String,
}

impl FeatureRow {
    pub fn from_feature(feature: &ResolvedFeature) -> Self {
        let details = feature
            .details
            .clone()
            .unwrap_or_else(|| FeatureDescription::unknown(&feature.feature_id));
        Self {
            start: feature.start,
            end: feature.end,
            length: feature.len(),
            strand: feature.strand.as_i8(),
            feature_id: feature.feature_id.clone(),
            name: details.name,
            category: details.category.label().to_string(),
            database: feature.database.clone(),
            percent_identity: round2(feature.percent_identity),
            percent_coverage: round2(feature.percent_coverage),
            fragment: feature.fragment,
            score: round2(feature.score),
            description: details.description,
            color: details.color,
        }
    }

    fn key(&self) -> (usize, usize, &str) {
        (self.start, self.end, &self.feature_id)
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// The annotation of one sequence, read by every exporter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureTable {
    pub name: String,
    pub sequence: String,
    pub topology: Topology,
    pub rows: Vec<FeatureRow>,
}

impl FeatureTable {
    /// Build the table from enriched features: rows by start, best score
    /// first, one row per (start, end, feature id).
    pub fn assemble(features: &[ResolvedFeature], sequence: &Sequence) -> Self {
        let mut rows: Vec<FeatureRow> = features.iter().map(FeatureRow::from_feature).collect();
        rows.sort_by(|a, b| {
            a.start
                .cmp(&b.start)
                .then(b.score.total_cmp(&a.score))
                .then_with(|| a.feature_id.cmp(&b.feature_id))
                .then(a.end.cmp(&b.end))
        });

        let mut kept: Vec<FeatureRow> = Vec::with_capacity(rows.len());
        for row in rows {
            if !kept.iter().any(|k| k.key() == row.key()) {
                kept.push(row);
            }
        }

        Self {
            name: sequence.name.clone(),
            sequence: sequence.sequence.clone(),
            topology: sequence.topology,
            rows: kept,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn sequence_length(&self) -> usize {
        self.sequence.len()
    }

    /// The annotated sequence as a [`Sequence`] carrying one feature per row.
    pub fn to_sequence(&self) -> Sequence {
        let mut seq = Sequence::new(&self.name, &self.sequence, self.topology);
        let n = self.sequence_length();
        for row in &self.rows {
            let mut feature = Feature::new(
                &row.name,
                FeatureType::from_genbank_key(&row.category),
                Location::wrapped(row.start, row.end, n),
                Strand::from_i8(row.strand),
            );
            feature.color = Some(row.color.clone());
            feature.add_qualifier("label", &row.name);
            feature.add_qualifier("note", format!("{}: {}/{}", TOOL_NAME, row.database, row.feature_id));
            if let Some(description) = &row.description {
                feature.add_qualifier("note", description);
            }
            feature.add_qualifier("identity", format!("{:.1}", row.percent_identity));
            feature.add_qualifier("match_length", format!("{:.1}", row.percent_coverage));
            if row.fragment {
                feature.add_qualifier("fragment", "");
            }
            feature.add_qualifier("color", &row.color);
            seq.add_feature(feature);
        }
        seq
    }
}
