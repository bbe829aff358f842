//! Plasmid re-annotation engine.
//!
//! Raw alignment hits against curated feature databases are normalized,
//! filtered, ranked and reconciled into one non-redundant feature list, then
//! enriched with descriptions and assembled into a feature table for export.

pub mod catalog;
pub mod config;
pub mod db;
pub mod enrich;
pub mod error;
pub mod export;
pub mod hit;
pub mod normalize;
pub mod orchestrate;
pub mod pipeline;
pub mod prepare;
pub mod record;
pub mod resolve;
pub mod search;
pub mod seed_data;

pub use catalog::{
    DescriptionTable, FeatureCatalog, FeatureDatabase, FeatureDescription, ReferenceFeature,
    SearchMethod,
};
pub use config::{AnnotationConfig, CategoryThresholds};
pub use error::{AnnotateError, InvalidSequenceError, SearchError, Warning};
pub use hit::{NormalizedHit, RawHit, ResolvedFeature};
pub use orchestrate::SearchOutcome;
pub use pipeline::{load_input, AnnotationReport, AnnotationRequest, Annotator, Outcome};
pub use prepare::PreparedSequence;
pub use record::{FeatureRow, FeatureTable};
pub use search::{
    AlignmentSearch, CancellationToken, CatalogSearch, ExactSearch, FeatureSearch, SearchContext,
    SearchRequest, Sensitivity,
};
