use plasnote_core::FeatureType;
use serde::Deserialize;

use crate::catalog::{FeatureCatalog, FeatureDatabase, ReferenceFeature, SearchMethod};

/// The built-in feature databases, one row per reference feature.
const FEATURES_CSV: &str = include_str!("../data/features.csv");

/// One row of the embedded CSV.
#[derive(Debug, Clone, Deserialize)]
pub struct SeedRow {
    pub database: String,
    pub method: SearchMethod,
    pub feature_id: String,
    pub name: String,
    pub category: FeatureType,
    pub sequence: String,
    pub description: Option<String>,
    pub color: Option<String>,
}

impl SeedRow {
    pub fn to_reference(&self) -> ReferenceFeature {
        let mut feature =
            ReferenceFeature::new_builtin(&self.feature_id, &self.name, self.category, &self.sequence);
        feature.description = self.description.clone().filter(|d| !d.is_empty());
        feature.color = self.color.clone().filter(|c| !c.is_empty());
        feature
    }
}

/// Parse the embedded CSV.
pub fn builtin_rows() -> Result<Vec<SeedRow>, csv::Error> {
    let mut reader = csv::Reader::from_reader(FEATURES_CSV.as_bytes());
    reader.deserialize().collect()
}

/// The built-in catalog, databases in order of first appearance.
pub fn builtin_catalog() -> Result<FeatureCatalog, csv::Error> {
    let mut databases: Vec<FeatureDatabase> = Vec::new();
    for row in builtin_rows()? {
        let reference = row.to_reference();
        match databases.iter_mut().find(|d| d.name == row.database) {
            Some(db) => db.entries.push(reference),
            None => databases.push(FeatureDatabase::new(row.database, row.method).with_entry(reference)),
        }
    }
    Ok(FeatureCatalog::new(databases))
}
