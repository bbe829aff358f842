use std::collections::HashMap;

use plasnote_core::FeatureType;
use serde::{Deserialize, Serialize};

/// How a database's entries are located in a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMethod {
    /// Local alignment; tolerates mismatches, gaps and partial matches.
    Alignment,
    /// Exact match on either strand; suited to short primer sites.
    Exact,
}

impl SearchMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchMethod::Alignment => "alignment",
            SearchMethod::Exact => "exact",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "alignment" => Some(SearchMethod::Alignment),
            "exact" => Some(SearchMethod::Exact),
            _ => None,
        }
    }
}

/// A curated reference element that can be located in a query sequence.
///
/// Reference features are well-characterised elements such as origins of
/// replication, promoters, resistance markers and primer binding sites.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceFeature {
    /// Stable identifier, unique within its database.
    pub id: String,
    /// Human-readable name (e.g. "AmpR", "T7 promoter").
    pub name: String,
    pub category: FeatureType,
    /// Uppercase DNA sequence.
    pub sequence: String,
    /// Length of the sequence in base pairs.
    pub length: usize,
    pub description: Option<String>,
    /// Hex colour used when rendering the feature on a map.
    pub color: Option<String>,
    /// Shipped with the application (true) or added by the user (false).
    pub is_builtin: bool,
}

impl ReferenceFeature {
    pub fn new_builtin(
        id: impl Into<String>,
        name: impl Into<String>,
        category: FeatureType,
        sequence: impl Into<String>,
    ) -> Self {
        let seq: String = sequence.into().to_uppercase();
        let len = seq.len();
        Self {
            id: id.into(),
            name: name.into(),
            category,
            sequence: seq,
            length: len,
            description: None,
            color: None,
            is_builtin: true,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }
}

/// A named collection of reference features searched as one unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureDatabase {
    pub name: String,
    pub method: SearchMethod,
    pub entries: Vec<ReferenceFeature>,
}

impl FeatureDatabase {
    pub fn new(name: impl Into<String>, method: SearchMethod) -> Self {
        Self {
            name: name.into(),
            method,
            entries: Vec::new(),
        }
    }

    pub fn with_entry(mut self, entry: ReferenceFeature) -> Self {
        self.entries.push(entry);
        self
    }

    pub fn entry(&self, id: &str) -> Option<&ReferenceFeature> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn longest_entry(&self) -> usize {
        self.entries.iter().map(|e| e.length).max().unwrap_or(0)
    }

    /// A copy of this database holding only `id`, for a targeted re-search.
    pub fn restricted_to(&self, id: &str) -> Option<FeatureDatabase> {
        self.entry(id).map(|entry| FeatureDatabase {
            name: self.name.clone(),
            method: self.method,
            entries: vec![entry.clone()],
        })
    }
}

/// Every database available to a run. Read-only once built.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureCatalog {
    databases: Vec<FeatureDatabase>,
}

impl FeatureCatalog {
    pub fn new(databases: Vec<FeatureDatabase>) -> Self {
        Self { databases }
    }

    pub fn databases(&self) -> &[FeatureDatabase] {
        &self.databases
    }

    pub fn database(&self, name: &str) -> Option<&FeatureDatabase> {
        self.databases.iter().find(|d| d.name == name)
    }

    pub fn reference(&self, database: &str, id: &str) -> Option<&ReferenceFeature> {
        self.database(database).and_then(|d| d.entry(id))
    }

    /// Longest reference across all databases; the circular padding length.
    pub fn longest_reference(&self) -> usize {
        self.databases
            .iter()
            .map(FeatureDatabase::longest_entry)
            .max()
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.databases.iter().all(|d| d.entries.is_empty())
    }
}

/// Display metadata attached to a resolved feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureDescription {
    pub name: String,
    pub category: FeatureType,
    pub description: Option<String>,
    pub color: String,
}

impl FeatureDescription {
    /// Placeholder for a feature id missing from the description table.
    pub fn unknown(feature_id: &str) -> Self {
        Self {
            name: feature_id.to_string(),
            category: FeatureType::Other,
            description: None,
            color: FeatureType::Other.default_color().to_string(),
        }
    }
}

/// Feature id -> display metadata.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DescriptionTable {
    entries: HashMap<String, FeatureDescription>,
}

impl DescriptionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, feature_id: impl Into<String>, description: FeatureDescription) {
        self.entries.insert(feature_id.into(), description);
    }

    pub fn get(&self, feature_id: &str) -> Option<&FeatureDescription> {
        self.entries.get(feature_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Describe every catalog entry by its own name, category and colour.
    pub fn from_catalog(catalog: &FeatureCatalog) -> Self {
        let mut table = Self::new();
        for entry in catalog.databases().iter().flat_map(|d| &d.entries) {
            table.insert(
                entry.id.clone(),
                FeatureDescription {
                    name: entry.name.clone(),
                    category: entry.category,
                    description: entry.description.clone(),
                    color: entry
                        .color
                        .clone()
                        .unwrap_or_else(|| entry.category.default_color().to_string()),
                },
            );
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_catalog() -> FeatureCatalog {
        FeatureCatalog::new(vec![
            FeatureDatabase::new("primers", SearchMethod::Exact).with_entry(
                ReferenceFeature::new_builtin("m13_fwd", "M13 fwd", FeatureType::PrimerBind, "gtaaaacgacggccagt"),
            ),
            FeatureDatabase::new("elements", SearchMethod::Alignment)
                .with_entry(
                    ReferenceFeature::new_builtin("t7_prom", "T7 promoter", FeatureType::Promoter, "TAATACGACTCACTATAGG")
                        .with_color("#00ff00"),
                )
                .with_entry(ReferenceFeature::new_builtin(
                    "lac_op",
                    "lac operator",
                    FeatureType::ProteinBind,
                    "TTGTGAGCGGATAACAA",
                )),
        ])
    }

    #[test]
    fn test_new_builtin_uppercases() {
        let f = ReferenceFeature::new_builtin("x", "X", FeatureType::Misc, "acgt");
        assert_eq!(f.sequence, "ACGT");
        assert_eq!(f.length, 4);
        assert!(f.is_builtin);
    }

    #[test]
    fn test_lookup() {
        let catalog = sample_catalog();
        assert_eq!(catalog.reference("elements", "lac_op").unwrap().length, 17);
        assert!(catalog.reference("primers", "lac_op").is_none());
        assert_eq!(catalog.longest_reference(), 19);
    }

    #[test]
    fn test_restricted_to() {
        let catalog = sample_catalog();
        let single = catalog
            .database("elements")
            .unwrap()
            .restricted_to("t7_prom")
            .unwrap();
        assert_eq!(single.entries.len(), 1);
        assert_eq!(single.method, SearchMethod::Alignment);
        assert!(catalog.database("elements").unwrap().restricted_to("nope").is_none());
    }

    #[test]
    fn test_description_table_from_catalog() {
        let table = DescriptionTable::from_catalog(&sample_catalog());
        assert_eq!(table.len(), 3);
        assert_eq!(table.get("t7_prom").unwrap().color, "#00ff00");
        assert_eq!(
            table.get("lac_op").unwrap().color,
            FeatureType::ProteinBind.default_color()
        );
        assert!(table.get("missing").is_none());
    }

    #[test]
    fn test_search_method_parse() {
        assert_eq!(SearchMethod::parse("Exact"), Some(SearchMethod::Exact));
        assert_eq!(SearchMethod::parse("alignment"), Some(SearchMethod::Alignment));
        assert_eq!(SearchMethod::parse("blast"), None);
    }
}
