//! Reconciles normalized hits from every database into one feature list.
//!
//! The resolver runs in four passes:
//!
//! 1. Halves of an origin-spanning feature that a backend reported as two
//!    hits abutting at the sequence boundary are joined back together.
//! 2. Hits below their category's identity or coverage minimum are dropped.
//! 3. Survivors are ranked by database priority, then score, and swept
//!    greedily: a hit is accepted unless an accepted hit of the same category
//!    overlaps it by at least the overlap tolerance.
//! 4. Rejected partial matches are kept as fragments unless they lie wholly
//!    inside an accepted hit of the same reference feature.

use std::cmp::Ordering;

use plasnote_core::{Strand, Topology};

use crate::config::AnnotationConfig;
use crate::hit::{overlap_fraction, shared_length, NormalizedHit, ResolvedFeature};

/// Resolve `hits` on a sequence of `length` bases. Deterministic for a given
/// input set, whatever its order.
pub fn resolve(
    hits: Vec<NormalizedHit>,
    length: usize,
    topology: Topology,
    config: &AnnotationConfig,
) -> Vec<ResolvedFeature> {
    let circular_len = (topology == Topology::Circular).then_some(length);

    let hits = match circular_len {
        Some(n) => merge_boundary_halves(hits, n, config.complete_coverage),
        None => hits,
    };

    let mut ranked: Vec<NormalizedHit> = hits.into_iter().filter(|h| passes_thresholds(h, config)).collect();
    ranked.sort_by(|a, b| rank(a, b, config));

    let mut accepted: Vec<NormalizedHit> = Vec::new();
    let mut rejected: Vec<NormalizedHit> = Vec::new();
    for hit in ranked {
        let conflict = accepted.iter().find(|acc| {
            acc.category == hit.category
                && overlap_fraction((acc.start, acc.end), (hit.start, hit.end), circular_len)
                    >= config.overlap_tolerance
        });
        match conflict {
            Some(acc) => {
                log::debug!(
                    "{}/{} at {}..{} overlaps {}/{}",
                    hit.database,
                    hit.feature_id,
                    hit.start,
                    hit.end,
                    acc.database,
                    acc.feature_id
                );
                rejected.push(hit);
            }
            None => accepted.push(hit),
        }
    }

    let mut fragments: Vec<NormalizedHit> = Vec::new();
    for hit in rejected {
        let partial = hit.percent_coverage >= config.fragment_coverage
            && hit.percent_coverage < config.complete_coverage;
        if !partial {
            continue;
        }
        let contained = accepted.iter().any(|acc| {
            acc.same_reference(&hit)
                && shared_length((acc.start, acc.end), (hit.start, hit.end), circular_len) == hit.len()
        });
        if !contained {
            fragments.push(hit);
        }
    }

    let mut resolved: Vec<ResolvedFeature> = accepted
        .iter()
        .map(|h| ResolvedFeature::from_hit(h, h.percent_coverage < config.complete_coverage))
        .chain(fragments.iter().map(|h| ResolvedFeature::from_hit(h, true)))
        .collect();
    sort_features(&mut resolved);

    log::debug!(
        "resolved {} features ({} fragments)",
        resolved.len(),
        resolved.iter().filter(|f| f.fragment).count()
    );
    resolved
}

/// Start ascending, then score descending; ids break remaining ties.
pub fn sort_features(features: &mut [ResolvedFeature]) {
    features.sort_by(|a, b| {
        a.start
            .cmp(&b.start)
            .then(b.score.total_cmp(&a.score))
            .then_with(|| a.feature_id.cmp(&b.feature_id))
            .then_with(|| a.database.cmp(&b.database))
            .then(a.end.cmp(&b.end))
    });
}

fn passes_thresholds(hit: &NormalizedHit, config: &AnnotationConfig) -> bool {
    let identity = config.min_identity.get(hit.category);
    let coverage = config.min_coverage.get(hit.category);
    let ok = hit.percent_identity >= identity && hit.percent_coverage >= coverage;
    if !ok {
        log::debug!(
            "{}/{} below thresholds ({:.1}% identity, {:.1}% coverage)",
            hit.database,
            hit.feature_id,
            hit.percent_identity,
            hit.percent_coverage
        );
    }
    ok
}

fn rank(a: &NormalizedHit, b: &NormalizedHit, config: &AnnotationConfig) -> Ordering {
    config
        .priority_of(&a.database)
        .cmp(&config.priority_of(&b.database))
        .then(b.score.total_cmp(&a.score))
        .then(a.start.cmp(&b.start))
        .then_with(|| a.feature_id.cmp(&b.feature_id))
        .then_with(|| a.database.cmp(&b.database))
        .then(a.strand.as_i8().cmp(&b.strand.as_i8()))
}

/// Join pairs of hits to one reference feature where one ends exactly at the
/// origin and the other starts there, when together they cover at least
/// `complete_coverage` of the reference.
fn merge_boundary_halves(
    mut hits: Vec<NormalizedHit>,
    length: usize,
    complete_coverage: f64,
) -> Vec<NormalizedHit> {
    hits.sort_by(|a, b| {
        (a.start, &a.database, &a.feature_id)
            .cmp(&(b.start, &b.database, &b.feature_id))
            .then(b.score.total_cmp(&a.score))
    });

    let mut used = vec![false; hits.len()];
    let mut merged = Vec::new();
    for i in 0..hits.len() {
        let tail = &hits[i];
        if used[i] || tail.end != length || tail.origin_spanning {
            continue;
        }
        let head = (0..hits.len()).find(|&j| {
            let h = &hits[j];
            !used[j]
                && j != i
                && h.start == 0
                && h.same_reference(tail)
                && h.strand == tail.strand
                && continues_across_origin(tail, h)
                && (h.percent_coverage + tail.percent_coverage).min(100.0) >= complete_coverage
                && h.end + tail.len() <= length
        });
        if let Some(j) = head {
            used[i] = true;
            used[j] = true;
            log::debug!("joining {}/{} across the origin", tail.database, tail.feature_id);
            merged.push(join(tail, &hits[j], length));
        }
    }

    merged.extend(
        hits.into_iter()
            .zip(used)
            .filter(|(_, used)| !used)
            .map(|(h, _)| h),
    );
    merged
}

/// Reference ranges are in reference orientation, so on the reverse strand
/// the half after the origin holds the start of the reference.
fn continues_across_origin(tail: &NormalizedHit, head: &NormalizedHit) -> bool {
    match tail.strand {
        Strand::Reverse => head.reference_end == tail.reference_start,
        _ => tail.reference_end == head.reference_start,
    }
}

fn join(tail: &NormalizedHit, head: &NormalizedHit, length: usize) -> NormalizedHit {
    let (tail_len, head_len) = (tail.len() as f64, head.len() as f64);
    let (first, second) = match tail.strand {
        Strand::Reverse => (head, tail),
        _ => (tail, head),
    };
    NormalizedHit {
        database: tail.database.clone(),
        feature_id: tail.feature_id.clone(),
        category: tail.category,
        start: tail.start,
        end: length + head.end,
        strand: tail.strand,
        reference_start: first.reference_start,
        reference_end: second.reference_end,
        reference_length: tail.reference_length,
        percent_identity: (tail.percent_identity * tail_len + head.percent_identity * head_len)
            / (tail_len + head_len),
        percent_coverage: (tail.percent_coverage + head.percent_coverage).min(100.0),
        score: tail.score + head.score,
        origin_spanning: true,
    }
}
