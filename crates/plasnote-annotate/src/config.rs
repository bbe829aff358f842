use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use plasnote_core::alignment::ScoringParams;
use plasnote_core::FeatureType;
use serde::{Deserialize, Serialize};

use crate::error::AnnotateError;

/// A percentage threshold with per-category overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryThresholds {
    /// Applies to every category without an override (0-100).
    pub default: f64,
    pub overrides: HashMap<FeatureType, f64>,
}

impl CategoryThresholds {
    pub fn uniform(value: f64) -> Self {
        Self {
            default: value,
            overrides: HashMap::new(),
        }
    }

    pub fn with(mut self, category: FeatureType, value: f64) -> Self {
        self.overrides.insert(category, value);
        self
    }

    pub fn get(&self, category: FeatureType) -> f64 {
        self.overrides.get(&category).copied().unwrap_or(self.default)
    }

    fn values(&self) -> impl Iterator<Item = f64> + '_ {
        std::iter::once(self.default).chain(self.overrides.values().copied())
    }
}

impl Default for CategoryThresholds {
    fn default() -> Self {
        Self::uniform(0.0)
    }
}

/// Policy for one annotation run, threaded explicitly through the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotationConfig {
    /// Minimum percent identity per category (0-100).
    pub min_identity: CategoryThresholds,
    /// Minimum percent coverage of the reference feature per category (0-100).
    pub min_coverage: CategoryThresholds,
    /// Two hits of one category conflict when their shared length divided by
    /// the shorter length reaches this fraction.
    pub overlap_tolerance: f64,
    /// Database names, most specific first. Unlisted databases rank last.
    pub database_priority: Vec<String>,
    /// A hit rejected by the overlap sweep survives as a fragment only at or
    /// above this coverage.
    pub fragment_coverage: f64,
    /// Hits below this coverage are flagged as fragments.
    pub complete_coverage: f64,
    /// Largest accepted input sequence, in bp.
    pub max_sequence_length: usize,
    /// Per-database search timeout.
    pub search_timeout_secs: u64,
    /// Bases either side of a fragment searched again in detailed mode.
    pub refine_flank: usize,
    /// Scoring for the built-in alignment search.
    pub scoring: ScoringParams,
}

impl Default for AnnotationConfig {
    fn default() -> Self {
        Self {
            min_identity: CategoryThresholds::uniform(90.0).with(FeatureType::PrimerBind, 95.0),
            min_coverage: CategoryThresholds::uniform(5.0).with(FeatureType::PrimerBind, 100.0),
            overlap_tolerance: 0.5,
            database_priority: vec!["primers".to_string(), "elements".to_string()],
            fragment_coverage: 50.0,
            complete_coverage: 95.0,
            max_sequence_length: 50_000,
            search_timeout_secs: 60,
            refine_flank: 50,
            scoring: ScoringParams::default(),
        }
    }
}

impl AnnotationConfig {
    pub fn from_json_str(json: &str) -> Result<Self, AnnotateError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, AnnotateError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<(), AnnotateError> {
        let percent = |v: f64| (0.0..=100.0).contains(&v);

        if !self.min_identity.values().all(percent) {
            return Err(AnnotateError::InvalidConfig(
                "min_identity values must lie in 0..=100".to_string(),
            ));
        }
        if !self.min_coverage.values().all(percent) {
            return Err(AnnotateError::InvalidConfig(
                "min_coverage values must lie in 0..=100".to_string(),
            ));
        }
        if !(self.overlap_tolerance > 0.0 && self.overlap_tolerance <= 1.0) {
            return Err(AnnotateError::InvalidConfig(format!(
                "overlap_tolerance {} must lie in (0, 1]",
                self.overlap_tolerance
            )));
        }
        if !percent(self.fragment_coverage)
            || !percent(self.complete_coverage)
            || self.fragment_coverage > self.complete_coverage
        {
            return Err(AnnotateError::InvalidConfig(
                "need 0 <= fragment_coverage <= complete_coverage <= 100".to_string(),
            ));
        }
        if self.max_sequence_length == 0 {
            return Err(AnnotateError::InvalidConfig(
                "max_sequence_length must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn search_timeout(&self) -> Duration {
        Duration::from_secs(self.search_timeout_secs)
    }

    /// Rank of a database; lower is more trusted.
    pub fn priority_of(&self, database: &str) -> usize {
        self.database_priority
            .iter()
            .position(|name| name == database)
            .unwrap_or(self.database_priority.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        AnnotationConfig::default().validate().unwrap();
    }

    #[test]
    fn test_category_lookup() {
        let config = AnnotationConfig::default();
        assert_eq!(config.min_identity.get(FeatureType::PrimerBind), 95.0);
        assert_eq!(config.min_identity.get(FeatureType::Promoter), 90.0);
        assert_eq!(config.min_coverage.get(FeatureType::PrimerBind), 100.0);
    }

    #[test]
    fn test_priority_order() {
        let config = AnnotationConfig::default();
        assert_eq!(config.priority_of("primers"), 0);
        assert_eq!(config.priority_of("elements"), 1);
        assert_eq!(config.priority_of("somewhere_else"), 2);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = AnnotationConfig::from_json_str(
            r#"{
                "overlap_tolerance": 0.2,
                "min_identity": { "default": 80.0, "overrides": { "promoter": 99.0 } },
                "database_priority": ["mine"]
            }"#,
        )
        .unwrap();
        assert_eq!(config.overlap_tolerance, 0.2);
        assert_eq!(config.min_identity.get(FeatureType::Promoter), 99.0);
        assert_eq!(config.min_identity.get(FeatureType::Cds), 80.0);
        assert_eq!(config.database_priority, vec!["mine".to_string()]);
        assert_eq!(config.max_sequence_length, 50_000);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = AnnotationConfig::from_json_str(r#"{ "overlap_tolerance": 0.0 }"#);
        assert!(matches!(err, Err(AnnotateError::InvalidConfig(_))));

        let err = AnnotationConfig::from_json_str(
            r#"{ "fragment_coverage": 90.0, "complete_coverage": 80.0 }"#,
        );
        assert!(matches!(err, Err(AnnotateError::InvalidConfig(_))));

        let err = AnnotationConfig::from_json_str(r#"{ "min_coverage": { "default": 120.0 } }"#);
        assert!(matches!(err, Err(AnnotateError::InvalidConfig(_))));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            AnnotationConfig::from_json_str("{ nope"),
            Err(AnnotateError::Json(_))
        ));
    }
}
