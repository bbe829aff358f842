use plasnote_core::Sequence;

use crate::catalog::{DescriptionTable, FeatureCatalog, FeatureDescription};
use crate::config::AnnotationConfig;
use crate::error::Warning;
use crate::hit::{overlap_fraction, RawHit, ResolvedFeature};
use crate::resolve::sort_features;
use crate::search::{CancellationToken, FeatureSearch, SearchContext, SearchRequest, Sensitivity};

/// Attach display metadata to every feature.
///
/// Details are replaced, never appended, so enriching twice gives the same
/// result. Ids missing from `table` get the "unknown" description.
pub fn enrich(features: &mut [ResolvedFeature], table: &DescriptionTable) -> Vec<Warning> {
    let mut warnings = Vec::new();
    for feature in features.iter_mut() {
        feature.details = Some(match table.get(&feature.feature_id) {
            Some(description) => description.clone(),
            None => {
                log::warn!("no description for '{}'", feature.feature_id);
                warnings.push(Warning::EnrichmentLookupMiss {
                    feature_id: feature.feature_id.clone(),
                });
                FeatureDescription::unknown(&feature.feature_id)
            }
        });
    }
    warnings
}

/// Search once more around each fragment for a fuller copy of its reference.
///
/// The search is restricted to the fragment's own reference feature and to
/// the fragment plus `refine_flank` bases either side (more if the reference
/// would not fit). A better hit replaces the fragment's boundaries unless the
/// new span would overlap a complete feature of the same category; otherwise
/// the fragment is left as it was.
pub fn refine_fragments(
    features: &mut [ResolvedFeature],
    sequence: &Sequence,
    catalog: &FeatureCatalog,
    searcher: &dyn FeatureSearch,
    config: &AnnotationConfig,
    token: &CancellationToken,
) -> Vec<Warning> {
    let mut warnings = Vec::new();
    let n = sequence.len();
    let circular_len = sequence.is_circular().then_some(n);

    for index in 0..features.len() {
        if !features[index].fragment {
            continue;
        }
        if token.is_cancelled() {
            break;
        }
        let feature = &features[index];
        let Some(db) = catalog
            .database(&feature.database)
            .and_then(|d| d.restricted_to(&feature.feature_id))
        else {
            warnings.push(Warning::RefinementFailed {
                feature_id: feature.feature_id.clone(),
                reason: format!("not in database '{}'", feature.database),
            });
            continue;
        };

        let reference_len = db.longest_entry();
        let extend = config.refine_flank.max(reference_len.saturating_sub(feature.len()));
        let (window_start, window) = if sequence.is_circular() {
            let back = extend.min(n);
            let start = (feature.start + n - back) % n;
            (start, sequence.window(start, feature.len() + back + extend))
        } else {
            let start = feature.start.saturating_sub(extend);
            let end = (feature.end + extend).min(n);
            (start, sequence.window(start, end - start))
        };

        let ctx = SearchContext::new(Some(config.search_timeout()), token.clone());
        let request = SearchRequest {
            sequence: &window,
            database: &db,
            sensitivity: Sensitivity::Strict,
            context: &ctx,
        };
        let hits = match searcher.search(&request) {
            Ok(hits) => hits,
            Err(err) => {
                log::warn!("refinement of '{}' failed: {}", feature.feature_id, err);
                warnings.push(Warning::RefinementFailed {
                    feature_id: feature.feature_id.clone(),
                    reason: err.to_string(),
                });
                continue;
            }
        };

        let min_identity = config.min_identity.get(feature.category);
        let best = hits
            .iter()
            .filter(|h| h.query_end > h.query_start && h.query_end <= window.len())
            .filter(|h| h.percent_identity >= min_identity)
            .filter(|h| h.percent_coverage() > feature.percent_coverage)
            .max_by(|a, b| {
                a.percent_coverage()
                    .total_cmp(&b.percent_coverage())
                    .then(a.score().total_cmp(&b.score()))
            });

        let Some(hit) = best else {
            log::debug!("no fuller copy of '{}' near {}", feature.feature_id, feature.start);
            continue;
        };

        let mut start = window_start + hit.query_start;
        if sequence.is_circular() {
            start %= n;
        }
        let span = (start, start + hit.query_span());
        let blocker = features.iter().enumerate().find(|(other, f)| {
            *other != index
                && !f.fragment
                && f.category == feature.category
                && overlap_fraction((f.start, f.end), span, circular_len) >= config.overlap_tolerance
        });
        if let Some((_, f)) = blocker {
            log::warn!(
                "refined '{}' at {}..{} would overlap '{}'",
                feature.feature_id,
                span.0,
                span.1,
                f.feature_id
            );
            warnings.push(Warning::RefinementFailed {
                feature_id: feature.feature_id.clone(),
                reason: format!("refined copy overlaps '{}'", f.feature_id),
            });
            continue;
        }

        apply(&mut features[index], hit, span, config);
    }

    sort_features(features);
    warnings
}

fn apply(feature: &mut ResolvedFeature, hit: &RawHit, span: (usize, usize), config: &AnnotationConfig) {
    log::debug!(
        "refined '{}' {}..{} -> {}..{}",
        feature.feature_id,
        feature.start,
        feature.end,
        span.0,
        span.1
    );
    feature.start = span.0;
    feature.end = span.1;
    feature.strand = hit.strand;
    feature.percent_identity = hit.percent_identity;
    feature.percent_coverage = hit.percent_coverage();
    feature.score = hit.score();
    feature.fragment = feature.percent_coverage < config.complete_coverage;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{FeatureDatabase, ReferenceFeature, SearchMethod};
    use crate::error::SearchError;
    use crate::search::CatalogSearch;
    use plasnote_core::{FeatureType, Strand, Topology};

    fn feature(id: &str, start: usize, end: usize, coverage: f64) -> ResolvedFeature {
        ResolvedFeature {
            start,
            end,
            strand: Strand::Forward,
            database: "elements".to_string(),
            feature_id: id.to_string(),
            category: FeatureType::ProteinBind,
            percent_identity: 100.0,
            percent_coverage: coverage,
            score: coverage,
            fragment: coverage < 95.0,
            details: None,
        }
    }

    fn catalog() -> FeatureCatalog {
        FeatureCatalog::new(vec![FeatureDatabase::new("elements", SearchMethod::Alignment)
            .with_entry(ReferenceFeature::new_builtin(
                "loxp",
                "loxP",
                FeatureType::ProteinBind,
                "ATAACTTCGTATAGCATACATTATACGAAGTTAT",
            ))])
    }

    struct Broken;

    impl FeatureSearch for Broken {
        fn search(&self, _request: &SearchRequest<'_>) -> Result<Vec<RawHit>, SearchError> {
            Err(SearchError::Unavailable("offline".to_string()))
        }
    }

    #[test]
    fn test_enrich_attaches_details() {
        let table = DescriptionTable::from_catalog(&catalog());
        let mut features = vec![feature("loxp", 0, 34, 100.0)];
        let warnings = enrich(&mut features, &table);
        assert!(warnings.is_empty());
        assert_eq!(features[0].name(), "loxP");
        assert_eq!(features[0].details.as_ref().unwrap().category, FeatureType::ProteinBind);
    }

    #[test]
    fn test_enrich_miss_is_unknown() {
        let mut features = vec![feature("mystery", 0, 34, 100.0)];
        let warnings = enrich(&mut features, &DescriptionTable::new());
        assert_eq!(
            warnings,
            vec![Warning::EnrichmentLookupMiss {
                feature_id: "mystery".to_string()
            }]
        );
        let details = features[0].details.as_ref().unwrap();
        assert_eq!(details.category, FeatureType::Other);
        assert_eq!(details.name, "mystery");
        assert_eq!((features[0].start, features[0].end), (0, 34));
    }

    #[test]
    fn test_enrich_twice_is_stable() {
        let table = DescriptionTable::from_catalog(&catalog());
        let mut features = vec![feature("loxp", 0, 34, 100.0), feature("mystery", 50, 60, 100.0)];
        enrich(&mut features, &table);
        let once = features.clone();
        enrich(&mut features, &table);
        assert_eq!(features, once);
    }

    #[test]
    fn test_refine_extends_fragment() {
        let filler = "G".repeat(60);
        let loxp = "ATAACTTCGTATAGCATACATTATACGAAGTTAT";
        let sequence = Sequence::new("q", format!("{filler}{loxp}{filler}"), Topology::Linear);
        // the first 20 bases of loxP were reported
        let mut features = vec![feature("loxp", 60, 80, 58.8)];
        let warnings = refine_fragments(
            &mut features,
            &sequence,
            &catalog(),
            &CatalogSearch::default(),
            &AnnotationConfig::default(),
            &CancellationToken::new(),
        );
        assert!(warnings.is_empty());
        assert_eq!((features[0].start, features[0].end), (60, 94));
        assert_eq!(features[0].percent_coverage, 100.0);
        assert!(!features[0].fragment);
    }

    #[test]
    fn test_refine_failure_keeps_boundaries() {
        let sequence = Sequence::new("q", "ACGT".repeat(40), Topology::Circular);
        let mut features = vec![feature("loxp", 10, 30, 58.8)];
        let warnings = refine_fragments(
            &mut features,
            &sequence,
            &catalog(),
            &Broken,
            &AnnotationConfig::default(),
            &CancellationToken::new(),
        );
        assert_eq!(warnings.len(), 1);
        assert!(matches!(&warnings[0], Warning::RefinementFailed { feature_id, .. } if feature_id == "loxp"));
        assert_eq!((features[0].start, features[0].end), (10, 30));
        assert!(features[0].fragment);
    }

    #[test]
    fn test_refine_skips_complete_features() {
        let sequence = Sequence::new("q", "ACGT".repeat(40), Topology::Linear);
        let mut features = vec![feature("loxp", 10, 44, 100.0)];
        let warnings = refine_fragments(
            &mut features,
            &sequence,
            &catalog(),
            &Broken,
            &AnnotationConfig::default(),
            &CancellationToken::new(),
        );
        assert!(warnings.is_empty());
    }
}
