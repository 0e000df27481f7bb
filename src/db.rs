//! # Categorization Store
//!
//! rusqlite persistence for product categorizations. Records grow
//! append-only: a product is inserted once and then only updated (usage
//! count incremented, variation set unioned); the core never deletes them.

use anyhow::{Context, Result};
use chrono::Utc;
use log::info;
use rusqlite::{params, Connection, OptionalExtension};

/// A persisted categorization record
///
/// `product_name` is the cleaned canonical name; `variations` collects the
/// original spellings that mapped onto it.
#[derive(Debug, Clone, PartialEq)]
pub struct CategorizationRecord {
    pub product_name: String,
    pub category_id: String,
    pub usage_count: u32,
    pub variations: Vec<String>,
    pub last_used: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Initialize the categorization schema
pub fn init_schema(conn: &Connection) -> Result<()> {
    info!("Initializing categorization schema");

    conn.execute(
        "CREATE TABLE IF NOT EXISTS product_categorizations (
            product_name TEXT PRIMARY KEY,
            category_id TEXT NOT NULL,
            usage_count INTEGER NOT NULL DEFAULT 1,
            variations TEXT NOT NULL DEFAULT '[]',
            last_used DATETIME NOT NULL,
            created_at DATETIME NOT NULL,
            updated_at DATETIME NOT NULL
        )",
        [],
    )
    .context("Failed to create product_categorizations table")?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_categorizations_usage
         ON product_categorizations (usage_count DESC)",
        [],
    )
    .context("Failed to create usage index")?;

    Ok(())
}

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<CategorizationRecord> {
    let variations_json: String = row.get(3)?;
    Ok(CategorizationRecord {
        product_name: row.get(0)?,
        category_id: row.get(1)?,
        usage_count: row.get(2)?,
        variations: serde_json::from_str(&variations_json).unwrap_or_default(),
        last_used: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

const RECORD_COLUMNS: &str =
    "product_name, category_id, usage_count, variations, last_used, created_at, updated_at";

/// Read one record by its canonical product name
pub fn find_by_name(conn: &Connection, product_name: &str) -> Result<Option<CategorizationRecord>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {} FROM product_categorizations WHERE product_name = ?1",
            RECORD_COLUMNS
        ))
        .context("Failed to prepare categorization lookup")?;

    stmt.query_row(params![product_name], row_to_record)
        .optional()
        .context("Failed to read categorization record")
}

/// Most-used records, descending
pub fn top_categorizations(conn: &Connection, limit: usize) -> Result<Vec<CategorizationRecord>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {} FROM product_categorizations ORDER BY usage_count DESC LIMIT ?1",
            RECORD_COLUMNS
        ))
        .context("Failed to prepare top categorizations query")?;

    let records = stmt
        .query_map(params![limit as i64], row_to_record)
        .context("Failed to query top categorizations")?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("Failed to read top categorizations")?;

    Ok(records)
}

/// Insert a new record or update an existing one
///
/// New product: record with usage_count 1 and the original spelling as the
/// first variation. Known product: usage_count incremented in SQL, the new
/// spelling unioned into the variation set, category overwritten with the
/// latest choice.
pub fn upsert_categorization(
    conn: &Connection,
    product_name: &str,
    category_id: &str,
    original: &str,
) -> Result<()> {
    let now = Utc::now().to_rfc3339();

    match find_by_name(conn, product_name)? {
        Some(mut record) => {
            if !record.variations.iter().any(|v| v == original) {
                record.variations.push(original.to_string());
            }
            let variations_json = serde_json::to_string(&record.variations)
                .context("Failed to serialize variations")?;
            conn.execute(
                "UPDATE product_categorizations
                 SET category_id = ?1,
                     usage_count = usage_count + 1,
                     variations = ?2,
                     last_used = ?3,
                     updated_at = ?3
                 WHERE product_name = ?4",
                params![category_id, variations_json, now, product_name],
            )
            .context("Failed to update categorization record")?;
        }
        None => {
            let variations_json = serde_json::to_string(&[original])
                .context("Failed to serialize variations")?;
            conn.execute(
                "INSERT INTO product_categorizations
                 (product_name, category_id, usage_count, variations, last_used, created_at, updated_at)
                 VALUES (?1, ?2, 1, ?3, ?4, ?4, ?4)",
                params![product_name, category_id, variations_json, now],
            )
            .context("Failed to insert categorization record")?;
        }
    }

    Ok(())
}
