use rusqlite::types::Type;
use rusqlite::{params, Connection, Result as SqlResult};

use plasnote_core::FeatureType;

use crate::catalog::{
    DescriptionTable, FeatureCatalog, FeatureDatabase, FeatureDescription, ReferenceFeature,
    SearchMethod,
};
use crate::error::AnnotateError;
use crate::seed_data::builtin_rows;

/// Create the catalog tables if they do not exist.
pub fn init_db(conn: &Connection) -> SqlResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS feature_databases (
            name        TEXT PRIMARY KEY,
            method      TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS reference_features (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            database    TEXT NOT NULL REFERENCES feature_databases(name),
            feature_id  TEXT NOT NULL,
            name        TEXT NOT NULL,
            category    TEXT NOT NULL,
            sequence    TEXT NOT NULL,
            length      INTEGER NOT NULL,
            description TEXT,
            color       TEXT,
            is_builtin  INTEGER NOT NULL DEFAULT 1,
            created_at  TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(database, feature_id)
        );
        CREATE INDEX IF NOT EXISTS idx_reference_features_database ON reference_features(database);
        CREATE INDEX IF NOT EXISTS idx_reference_features_name ON reference_features(name);",
    )
}

/// Seed the built-in databases (idempotent via INSERT OR IGNORE).
/// Returns the number of newly inserted features.
pub fn seed_builtins(conn: &Connection) -> Result<usize, AnnotateError> {
    let rows = builtin_rows()?;
    let mut count = 0usize;
    for row in &rows {
        register_database(conn, &row.database, row.method)?;
        let f = row.to_reference();
        count += conn.execute(
            "INSERT OR IGNORE INTO reference_features
                (database, feature_id, name, category, sequence, length, description, color, is_builtin)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 1)",
            params![
                row.database,
                f.id,
                f.name,
                f.category.label(),
                f.sequence,
                f.length,
                f.description,
                f.color,
            ],
        )?;
    }
    Ok(count)
}

/// Add a database if it is not already known. Returns true if it was created.
pub fn register_database(conn: &Connection, name: &str, method: SearchMethod) -> SqlResult<bool> {
    let changed = conn.execute(
        "INSERT OR IGNORE INTO feature_databases (name, method) VALUES (?1, ?2)",
        params![name, method.as_str()],
    )?;
    Ok(changed > 0)
}

/// Load every database with its features, databases by name and features by id.
pub fn load_catalog(conn: &Connection) -> SqlResult<FeatureCatalog> {
    let mut stmt = conn.prepare("SELECT name, method FROM feature_databases ORDER BY name")?;
    let heads = stmt.query_map([], |row| {
        let name: String = row.get(0)?;
        let method = parse_method(row.get(1)?)?;
        Ok((name, method))
    })?;

    let mut databases = Vec::new();
    for head in heads {
        let (name, method) = head?;
        let mut db = FeatureDatabase::new(name, method);
        db.entries = features_in(conn, &db.name)?;
        databases.push(db);
    }
    Ok(FeatureCatalog::new(databases))
}

/// Description table covering every stored feature.
pub fn load_descriptions(conn: &Connection) -> SqlResult<DescriptionTable> {
    let mut stmt = conn.prepare(
        "SELECT feature_id, name, category, description, color
         FROM reference_features ORDER BY database, feature_id",
    )?;
    let rows = stmt.query_map([], |row| {
        let feature_id: String = row.get(0)?;
        let category = FeatureType::from_genbank_key(&row.get::<_, String>(2)?);
        let color: Option<String> = row.get(4)?;
        Ok((
            feature_id,
            FeatureDescription {
                name: row.get(1)?,
                category,
                description: row.get(3)?,
                color: color.unwrap_or_else(|| category.default_color().to_string()),
            },
        ))
    })?;

    let mut table = DescriptionTable::new();
    for row in rows {
        let (id, description) = row?;
        table.insert(id, description);
    }
    Ok(table)
}

/// Get a single feature.
pub fn get_feature(
    conn: &Connection,
    database: &str,
    feature_id: &str,
) -> SqlResult<Option<ReferenceFeature>> {
    let mut stmt = conn.prepare(
        "SELECT feature_id, name, category, sequence, length, description, color, is_builtin
         FROM reference_features WHERE database = ?1 AND feature_id = ?2",
    )?;
    let mut rows = stmt.query_map(params![database, feature_id], row_to_feature)?;
    match rows.next() {
        Some(row) => Ok(Some(row?)),
        None => Ok(None),
    }
}

/// Insert a user-defined feature into an existing database. Returns the new row ID.
pub fn add_user_feature(
    conn: &Connection,
    database: &str,
    feature: &ReferenceFeature,
) -> SqlResult<i64> {
    let sequence = feature.sequence.to_uppercase();
    conn.execute(
        "INSERT INTO reference_features
            (database, feature_id, name, category, sequence, length, description, color, is_builtin)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 0)",
        params![
            database,
            feature.id,
            feature.name,
            feature.category.label(),
            sequence,
            sequence.len(),
            feature.description,
            feature.color,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Delete a user-defined feature. Built-ins cannot be deleted.
/// Returns true if a row was deleted.
pub fn delete_user_feature(conn: &Connection, database: &str, feature_id: &str) -> SqlResult<bool> {
    let changed = conn.execute(
        "DELETE FROM reference_features
         WHERE database = ?1 AND feature_id = ?2 AND is_builtin = 0",
        params![database, feature_id],
    )?;
    Ok(changed > 0)
}

/// Search features by name (case-insensitive LIKE).
pub fn search_features(conn: &Connection, query: &str) -> SqlResult<Vec<ReferenceFeature>> {
    let pattern = format!("%{}%", query);
    let mut stmt = conn.prepare(
        "SELECT feature_id, name, category, sequence, length, description, color, is_builtin
         FROM reference_features WHERE name LIKE ?1 ORDER BY name",
    )?;
    let rows = stmt.query_map(params![pattern], row_to_feature)?;
    let mut results = Vec::new();
    for row in rows {
        results.push(row?);
    }
    Ok(results)
}

fn features_in(conn: &Connection, database: &str) -> SqlResult<Vec<ReferenceFeature>> {
    let mut stmt = conn.prepare(
        "SELECT feature_id, name, category, sequence, length, description, color, is_builtin
         FROM reference_features WHERE database = ?1 ORDER BY feature_id",
    )?;
    let rows = stmt.query_map(params![database], row_to_feature)?;
    let mut features = Vec::new();
    for row in rows {
        features.push(row?);
    }
    Ok(features)
}

fn parse_method(value: String) -> SqlResult<SearchMethod> {
    SearchMethod::parse(&value).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            1,
            Type::Text,
            format!("unknown search method '{value}'").into(),
        )
    })
}

fn row_to_feature(row: &rusqlite::Row) -> SqlResult<ReferenceFeature> {
    Ok(ReferenceFeature {
        id: row.get(0)?,
        name: row.get(1)?,
        category: FeatureType::from_genbank_key(&row.get::<_, String>(2)?),
        sequence: row.get(3)?,
        length: row.get(4)?,
        description: row.get(5)?,
        color: row.get(6)?,
        is_builtin: row.get::<_, i32>(7)? != 0,
    })
}
