use std::collections::BTreeMap;

use plasnote_core::{FeatureType, Topology};

use crate::catalog::FeatureCatalog;
use crate::config::AnnotationConfig;
use crate::error::{HitError, Warning};
use crate::hit::{shared_length, NormalizedHit, RawHit};

fn validate(raw: &RawHit) -> Result<(), HitError> {
    if raw.query_end <= raw.query_start {
        return Err(HitError::EmptyQueryRange {
            start: raw.query_start,
            end: raw.query_end,
        });
    }
    if raw.reference_length == 0 {
        return Err(HitError::EmptyReference);
    }
    if raw.reference_start >= raw.reference_end || raw.reference_end > raw.reference_length {
        return Err(HitError::ReferenceOutOfRange {
            start: raw.reference_start,
            end: raw.reference_end,
            length: raw.reference_length,
        });
    }
    if !(0.0..=100.0).contains(&raw.percent_identity) {
        return Err(HitError::IdentityOutOfRange(raw.percent_identity));
    }
    Ok(())
}

/// Place a raw hit on a sequence of `length` bases.
///
/// Returns `Ok(None)` for a hit starting inside the circular padding: the same
/// bases were already searched at `start - length`.
pub fn normalize(
    raw: &RawHit,
    category: FeatureType,
    length: usize,
    topology: Topology,
) -> Result<Option<NormalizedHit>, HitError> {
    validate(raw)?;
    let span = raw.query_span();

    let start = match topology {
        Topology::Circular => {
            if span > length {
                return Err(HitError::LongerThanSequence { span, length });
            }
            if raw.query_start >= length {
                return Ok(None);
            }
            raw.query_start % length
        }
        Topology::Linear => {
            if raw.query_end > length {
                return Err(HitError::BeyondSequenceEnd {
                    end: raw.query_end,
                    length,
                });
            }
            raw.query_start
        }
    };
    let end = start + span;

    Ok(Some(NormalizedHit {
        database: raw.database.clone(),
        feature_id: raw.feature_id.clone(),
        category,
        start,
        end,
        strand: raw.strand,
        reference_start: raw.reference_start,
        reference_end: raw.reference_end,
        reference_length: raw.reference_length,
        percent_identity: raw.percent_identity,
        percent_coverage: raw.percent_coverage(),
        score: raw.score(),
        origin_spanning: end > length,
    }))
}

/// Normalize every raw hit and merge duplicate detections of one locus.
///
/// Malformed hits are dropped with a warning. Two hits of the same reference
/// feature on the same strand are the same detection when they share at least
/// `1 - overlap_tolerance` of the longer one; the higher score is kept.
pub fn normalize_all(
    raw: &BTreeMap<String, Vec<RawHit>>,
    catalog: &FeatureCatalog,
    length: usize,
    topology: Topology,
    config: &AnnotationConfig,
) -> (Vec<NormalizedHit>, Vec<Warning>) {
    let mut warnings = Vec::new();
    let mut hits = Vec::new();

    for hit in raw.values().flatten() {
        let category = catalog
            .reference(&hit.database, &hit.feature_id)
            .map(|r| r.category)
            .unwrap_or(FeatureType::Other);
        match normalize(hit, category, length, topology) {
            Ok(Some(n)) => hits.push(n),
            Ok(None) => {}
            Err(err) => {
                log::warn!("dropping hit {}/{}: {}", hit.database, hit.feature_id, err);
                warnings.push(Warning::MalformedHit {
                    database: hit.database.clone(),
                    feature_id: hit.feature_id.clone(),
                    reason: err.to_string(),
                });
            }
        }
    }

    hits.sort_by(|a, b| {
        (a.start, a.end, &a.database, &a.feature_id, a.strand.as_i8())
            .cmp(&(b.start, b.end, &b.database, &b.feature_id, b.strand.as_i8()))
            .then(b.score.total_cmp(&a.score))
    });

    let circular_len = (topology == Topology::Circular).then_some(length);
    let same_locus = 1.0 - config.overlap_tolerance;
    let mut kept: Vec<NormalizedHit> = Vec::with_capacity(hits.len());
    for hit in hits {
        let duplicate = kept.iter_mut().find(|k| {
            k.same_reference(&hit) && k.strand == hit.strand && {
                let longer = k.len().max(hit.len());
                let shared = shared_length((k.start, k.end), (hit.start, hit.end), circular_len);
                shared as f64 / longer as f64 >= same_locus
            }
        });
        match duplicate {
            Some(k) if hit.score > k.score => *k = hit,
            Some(_) => {}
            None => kept.push(hit),
        }
    }
    log::debug!("normalized {} hits ({} malformed)", kept.len(), warnings.len());
    (kept, warnings)
}
