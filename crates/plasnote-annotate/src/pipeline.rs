use plasnote_core::{Sequence, Topology};
use plasnote_formats::read_first_record;
use rusqlite::Connection;
use serde::Serialize;

use crate::catalog::{DescriptionTable, FeatureCatalog};
use crate::config::AnnotationConfig;
use crate::db;
use crate::enrich::{enrich, refine_fragments};
use crate::error::{AnnotateError, Warning};
use crate::hit::ResolvedFeature;
use crate::normalize::normalize_all;
use crate::orchestrate::search_all;
use crate::prepare::prepare;
use crate::record::FeatureTable;
use crate::resolve::resolve;
use crate::search::{CancellationToken, CatalogSearch, FeatureSearch, Sensitivity};
use crate::seed_data::builtin_catalog;

/// One sequence to annotate.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationRequest {
    pub name: String,
    /// Raw text; whitespace and position numbers are stripped.
    pub sequence: String,
    pub topology: Topology,
    /// Wider search plus a second look at fragments.
    pub detailed: bool,
}

impl AnnotationRequest {
    /// A circular, standard-sensitivity request.
    pub fn new(name: impl Into<String>, sequence: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sequence: sequence.into(),
            topology: Topology::Circular,
            detailed: false,
        }
    }

    pub fn from_sequence(sequence: &Sequence) -> Self {
        Self {
            name: sequence.name.clone(),
            sequence: sequence.sequence.clone(),
            topology: sequence.topology,
            detailed: false,
        }
    }

    pub fn linear(mut self, linear: bool) -> Self {
        self.topology = Topology::from_linear_flag(linear);
        self
    }

    pub fn detailed(mut self, detailed: bool) -> Self {
        self.detailed = detailed;
        self
    }
}

/// Build a request from FASTA or GenBank text, using its first record.
///
/// GenBank input keeps the topology of its LOCUS line; FASTA input is
/// circular unless `linear` is set.
pub fn load_input(content: &str, linear: bool) -> Result<AnnotationRequest, AnnotateError> {
    let sequence = read_first_record(content, Topology::from_linear_flag(linear))?;
    Ok(AnnotationRequest::from_sequence(&sequence))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Annotated,
    /// Nothing matched; not an error.
    NoAnnotationsFound,
}

/// Result of a run: the features, their table and every degradation met.
#[derive(Debug, Clone, Serialize)]
pub struct AnnotationReport {
    pub features: Vec<ResolvedFeature>,
    pub table: FeatureTable,
    pub warnings: Vec<Warning>,
}

impl AnnotationReport {
    pub fn outcome(&self) -> Outcome {
        if self.table.is_empty() {
            Outcome::NoAnnotationsFound
        } else {
            Outcome::Annotated
        }
    }
}

/// Annotates sequences against a fixed catalog with an injected search backend.
pub struct Annotator<S: FeatureSearch = CatalogSearch> {
    catalog: FeatureCatalog,
    descriptions: DescriptionTable,
    config: AnnotationConfig,
    searcher: S,
}

impl Annotator<CatalogSearch> {
    /// The built-in databases with the built-in search backends.
    pub fn builtin(config: AnnotationConfig) -> Result<Self, AnnotateError> {
        let catalog = builtin_catalog()?;
        let descriptions = DescriptionTable::from_catalog(&catalog);
        let searcher = CatalogSearch::new(config.scoring.clone());
        Self::new(catalog, descriptions, config, searcher)
    }

    /// Databases and descriptions stored in a catalog database.
    pub fn from_db(conn: &Connection, config: AnnotationConfig) -> Result<Self, AnnotateError> {
        let catalog = db::load_catalog(conn)?;
        let descriptions = db::load_descriptions(conn)?;
        let searcher = CatalogSearch::new(config.scoring.clone());
        Self::new(catalog, descriptions, config, searcher)
    }
}

impl<S: FeatureSearch> Annotator<S> {
    pub fn new(
        catalog: FeatureCatalog,
        descriptions: DescriptionTable,
        config: AnnotationConfig,
        searcher: S,
    ) -> Result<Self, AnnotateError> {
        config.validate()?;
        Ok(Self {
            catalog,
            descriptions,
            config,
            searcher,
        })
    }

    pub fn catalog(&self) -> &FeatureCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &AnnotationConfig {
        &self.config
    }

    pub fn annotate(&self, request: &AnnotationRequest) -> Result<AnnotationReport, AnnotateError> {
        self.annotate_with_token(request, &CancellationToken::new())
    }

    /// Run the whole pipeline. Cancelling `token` aborts at the next stage
    /// boundary, or inside a search that checks it, and discards all results.
    pub fn annotate_with_token(
        &self,
        request: &AnnotationRequest,
        token: &CancellationToken,
    ) -> Result<AnnotationReport, AnnotateError> {
        let prepared = prepare(
            &request.name,
            &request.sequence,
            request.topology,
            self.catalog.longest_reference(),
            self.config.max_sequence_length,
        )?;
        let length = prepared.len();
        log::info!(
            "annotating '{}' ({} bp, {}{})",
            request.name,
            length,
            request.topology,
            if request.detailed { ", detailed" } else { "" }
        );
        check(token)?;

        let searched = search_all(
            &self.searcher,
            &prepared.working,
            self.catalog.databases(),
            Sensitivity::from_detailed(request.detailed),
            self.config.search_timeout(),
            token,
        )?;
        let mut warnings = searched.warnings;

        let (hits, malformed) =
            normalize_all(&searched.hits, &self.catalog, length, request.topology, &self.config);
        warnings.extend(malformed);
        check(token)?;

        let mut features = resolve(hits, length, request.topology, &self.config);
        if request.detailed {
            warnings.extend(refine_fragments(
                &mut features,
                &prepared.sequence,
                &self.catalog,
                &self.searcher,
                &self.config,
                token,
            ));
        }
        check(token)?;

        warnings.extend(enrich(&mut features, &self.descriptions));
        let table = FeatureTable::assemble(&features, &prepared.sequence);

        log::info!(
            "'{}': {} features, {} warnings",
            request.name,
            table.len(),
            warnings.len()
        );
        Ok(AnnotationReport {
            features,
            table,
            warnings,
        })
    }
}

fn check(token: &CancellationToken) -> Result<(), AnnotateError> {
    if token.is_cancelled() {
        log::info!("annotation cancelled");
        return Err(AnnotateError::Cancelled);
    }
    Ok(())
}
