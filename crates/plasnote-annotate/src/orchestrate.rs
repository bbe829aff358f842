use std::collections::BTreeMap;
use std::time::Duration;

use rayon::prelude::*;

use crate::catalog::FeatureDatabase;
use crate::error::{AnnotateError, SearchError, Warning};
use crate::hit::RawHit;
use crate::search::{CancellationToken, FeatureSearch, SearchContext, SearchRequest, Sensitivity};

/// Raw hits per database name, and the searches that degraded.
#[derive(Debug, Clone, Default)]
pub struct SearchOutcome {
    pub hits: BTreeMap<String, Vec<RawHit>>,
    pub warnings: Vec<Warning>,
}

/// Search every database against `working`, in parallel.
///
/// Each search gets its own deadline. A failed or late search contributes an
/// empty hit list and a warning. Cancellation discards everything.
pub fn search_all(
    searcher: &dyn FeatureSearch,
    working: &str,
    databases: &[FeatureDatabase],
    sensitivity: Sensitivity,
    timeout: Duration,
    token: &CancellationToken,
) -> Result<SearchOutcome, AnnotateError> {
    let results: Vec<(String, Result<Vec<RawHit>, SearchError>)> = databases
        .par_iter()
        .map(|db| {
            let ctx = SearchContext::new(Some(timeout), token.clone());
            log::debug!("searching '{}' ({} entries)", db.name, db.entries.len());
            let result = ctx.check(&db.name).and_then(|_| {
                searcher.search(&SearchRequest {
                    sequence: working,
                    database: db,
                    sensitivity,
                    context: &ctx,
                })
            });
            // A backend that ignores the context still cannot overrun silently.
            let result = match result {
                Ok(_) if ctx.is_expired() => Err(SearchError::TimedOut {
                    database: db.name.clone(),
                    elapsed: ctx.elapsed(),
                }),
                other => other,
            };
            (db.name.clone(), result)
        })
        .collect();

    if token.is_cancelled() {
        log::info!("annotation cancelled during database search");
        return Err(AnnotateError::Cancelled);
    }

    let mut outcome = SearchOutcome::default();
    for (name, result) in results {
        match result {
            Ok(hits) => {
                log::info!("database '{}': {} raw hits", name, hits.len());
                outcome.hits.insert(name, hits);
            }
            Err(SearchError::Cancelled) => return Err(AnnotateError::Cancelled),
            Err(err) => {
                log::warn!("database '{}' degraded: {}", name, err);
                outcome.warnings.push(Warning::DatabaseSearchDegraded {
                    database: name.clone(),
                    reason: err.to_string(),
                });
                outcome.hits.insert(name, Vec::new());
            }
        }
    }
    Ok(outcome)
}
