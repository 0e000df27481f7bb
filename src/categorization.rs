//! # Product Categorization Service
//!
//! Suggests a shopping category for a parsed product from historical
//! categorizations, and saves new categorizations in bulk. Resolution order
//! for suggestions, first hit wins:
//!
//! 1. Exact match on the cleaned product name (most-used record)
//! 2. Membership in a record's variation set
//! 3. Fuzzy match over the most-used records, accepted at similarity ≥ 0.8
//!
//! Category ids come from a fixed closed set; unknown ids are skipped with a
//! warning during saves, never treated as an error.

use crate::cache::TtlCache;
use crate::db::{self, CategorizationRecord};
use crate::diet_model::ParsedProduct;
use crate::product_parser::{calculate_similarity, clean_product_name};
use anyhow::{Context, Result};
use log::{debug, info, warn};
use rusqlite::Connection;

/// Minimum similarity for a fuzzy suggestion
pub const SIMILARITY_THRESHOLD: f64 = 0.8;
/// How many most-used records the fuzzy scan considers
const FUZZY_SCAN_LIMIT: usize = 50;

/// A shopping category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Category {
    pub id: &'static str,
    pub label: &'static str,
}

/// The fixed closed category set; saved category ids must come from here
pub const CATEGORIES: &[Category] = &[
    Category { id: "vegetables", label: "Warzywa" },
    Category { id: "fruits", label: "Owoce" },
    Category { id: "dairy", label: "Nabiał" },
    Category { id: "meat", label: "Mięso i ryby" },
    Category { id: "grains", label: "Produkty zbożowe" },
    Category { id: "fats", label: "Tłuszcze" },
    Category { id: "spices", label: "Przyprawy" },
    Category { id: "beverages", label: "Napoje" },
    Category { id: "frozen", label: "Mrożonki" },
    Category { id: "other", label: "Inne" },
];

/// Whether a category id belongs to the fixed set
pub fn is_known_category(category_id: &str) -> bool {
    CATEGORIES.iter().any(|c| c.id == category_id)
}

/// A product/category pair queued for saving
#[derive(Debug, Clone, PartialEq)]
pub struct PendingCategorization {
    /// Original product spelling as it appeared in the file
    pub original: String,
    pub category_id: String,
}

/// A resolved suggestion; fuzzy matches carry their similarity score
#[derive(Debug, Clone, PartialEq)]
pub struct CategorySuggestion {
    pub category_id: String,
    /// Present only when the match was fuzzy
    pub similarity: Option<f64>,
}

/// Suggestion engine over the categorization store
///
/// Owns a TTL cache of suggestions so repeated lookups during one
/// categorization session do not re-scan history.
pub struct CategorizationService {
    conn: Connection,
    suggestion_cache: TtlCache<String, Option<CategorySuggestion>>,
}

impl CategorizationService {
    /// Open the service over an existing connection, initializing the schema
    pub fn new(conn: Connection) -> Result<Self> {
        db::init_schema(&conn)?;
        Ok(Self {
            conn,
            suggestion_cache: TtlCache::default(),
        })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Suggest a category id for a product name, or `None` when history
    /// offers nothing close enough
    pub fn suggest_category(&self, product_name: &str) -> Result<Option<String>> {
        Ok(self.lookup(product_name)?.map(|s| s.category_id))
    }

    /// Suggest a category for a parsed product, recording the similarity
    /// score on the product when the match was fuzzy
    pub fn suggest_for_product(&self, product: &mut ParsedProduct) -> Result<Option<String>> {
        let suggestion = self.lookup(&product.name)?;
        if let Some(suggestion) = &suggestion {
            product.similarity = suggestion.similarity;
        }
        Ok(suggestion.map(|s| s.category_id))
    }

    fn lookup(&self, product_name: &str) -> Result<Option<CategorySuggestion>> {
        let key = clean_product_name(product_name);
        if key.is_empty() {
            return Ok(None);
        }

        if let Some(cached) = self.suggestion_cache.get(&key) {
            debug!("Suggestion cache hit for '{}'", key);
            return Ok(cached);
        }

        let suggestion = self.resolve_suggestion(&key)?;
        self.suggestion_cache.insert(key, suggestion.clone());
        Ok(suggestion)
    }

    fn resolve_suggestion(&self, key: &str) -> Result<Option<CategorySuggestion>> {
        // 1. Exact match on the canonical name
        if let Some(record) = db::find_by_name(&self.conn, key)? {
            debug!("Exact categorization match for '{}': {}", key, record.category_id);
            return Ok(Some(CategorySuggestion {
                category_id: record.category_id,
                similarity: None,
            }));
        }

        let history = db::top_categorizations(&self.conn, FUZZY_SCAN_LIMIT)?;

        // 2. Variation membership, most-used record first
        for record in &history {
            if record.variations.iter().any(|v| clean_product_name(v) == key) {
                debug!("Variation match for '{}': {}", key, record.category_id);
                return Ok(Some(CategorySuggestion {
                    category_id: record.category_id.clone(),
                    similarity: None,
                }));
            }
        }

        // 3. Fuzzy match, best similarity wins if it clears the threshold
        let best = history
            .iter()
            .map(|record| (calculate_similarity(key, &record.product_name), record))
            .max_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

        if let Some((similarity, record)) = best {
            if similarity >= SIMILARITY_THRESHOLD {
                debug!(
                    "Fuzzy categorization match for '{}' -> '{}' (similarity {:.2}): {}",
                    key, record.product_name, similarity, record.category_id
                );
                return Ok(Some(CategorySuggestion {
                    category_id: record.category_id.clone(),
                    similarity: Some(similarity),
                }));
            }
        }

        Ok(None)
    }

    /// Save one categorization; unknown category ids are skipped with a
    /// warning
    pub fn save_categorization(&self, original: &str, category_id: &str) -> Result<bool> {
        if !is_known_category(category_id) {
            warn!(
                "Skipping categorization of '{}': unknown category id '{}'",
                original, category_id
            );
            return Ok(false);
        }

        let key = clean_product_name(original);
        db::upsert_categorization(&self.conn, &key, category_id, original)?;
        self.suggestion_cache.invalidate(&key);
        Ok(true)
    }

    /// Save a batch of categorizations in one transaction
    ///
    /// Returns the number of records actually written. Entries with an
    /// unknown category id are skipped with a warning, not an error.
    pub fn bulk_save(&mut self, pending: &[PendingCategorization]) -> Result<usize> {
        let tx = self
            .conn
            .transaction()
            .context("Failed to open categorization transaction")?;

        let mut saved = 0;
        for entry in pending {
            if !is_known_category(&entry.category_id) {
                warn!(
                    "Skipping categorization of '{}': unknown category id '{}'",
                    entry.original, entry.category_id
                );
                continue;
            }
            let key = clean_product_name(&entry.original);
            db::upsert_categorization(&tx, &key, &entry.category_id, &entry.original)?;
            saved += 1;
        }

        tx.commit().context("Failed to commit categorizations")?;
        self.suggestion_cache.clear();

        info!("Saved {} of {} categorizations", saved, pending.len());
        Ok(saved)
    }
}
