use std::io::{self, Write};

use chrono::{DateTime, Utc};
use plasnote_formats::genbank;

use crate::error::AnnotateError;
use crate::record::{FeatureTable, TOOL_NAME};

/// Header of the CSV export, in column order.
pub const CSV_COLUMNS: [&str; 14] = [
    "start",
    "end",
    "length",
    "strand",
    "feature_id",
    "name",
    "category",
    "database",
    "percent_identity",
    "percent_coverage",
    "fragment",
    "score",
    "description",
    "color",
];

/// GenBank record dated today.
pub fn to_genbank(table: &FeatureTable) -> String {
    to_genbank_dated(table, Utc::now())
}

/// GenBank record with an explicit LOCUS date.
pub fn to_genbank_dated(table: &FeatureTable, date: DateTime<Utc>) -> String {
    let mut seq = table.to_sequence();
    seq.metadata.date = Some(date.format("%d-%b-%Y").to_string().to_uppercase());
    seq.metadata.keywords = Some(TOOL_NAME.to_string());
    seq.metadata.source = Some("synthetic DNA construct".to_string());
    seq.metadata.organism = Some("synthetic DNA construct".to_string());
    seq.metadata
        .comments
        .push(format!("Annotated with {} {}", TOOL_NAME, env!("CARGO_PKG_VERSION")));
    genbank::serialize(&seq)
}

/// One CSV row per feature, header always present.
pub fn write_csv<W: Write>(table: &FeatureTable, writer: W) -> Result<(), AnnotateError> {
    let mut out = csv::WriterBuilder::new().has_headers(false).from_writer(writer);
    out.write_record(CSV_COLUMNS)?;
    for row in &table.rows {
        out.serialize(row)?;
    }
    out.flush()?;
    Ok(())
}

pub fn to_csv_string(table: &FeatureTable) -> Result<String, AnnotateError> {
    let mut buf = Vec::new();
    write_csv(table, &mut buf)?;
    String::from_utf8(buf).map_err(|e| AnnotateError::Io(io::Error::new(io::ErrorKind::InvalidData, e)))
}

pub fn to_json(table: &FeatureTable) -> Result<String, AnnotateError> {
    Ok(serde_json::to_string_pretty(table)?)
}
