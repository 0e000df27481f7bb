//! # Unit Registry
//!
//! Static registry of product units used in diet plans, with base-unit
//! conversion factors, alias normalization and detection of unit tokens
//! inside free text.
//!
//! Weight units convert to grams, volume units to milliliters. Kitchen
//! measures (spoons, glasses) carry approximate milliliter conversions.
//! Piece units ("szt", "opak") have no base conversion and can only be
//! combined with themselves.

use lazy_static::lazy_static;
use log::{debug, trace};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Category of a product unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitType {
    Weight,
    Volume,
    Piece,
    KitchenMeasure,
}

/// A registry entry for a known unit
///
/// Immutable reference data. `base_unit`/`conversion_factor` are `None` for
/// piece-type units, which cannot be converted or combined across kinds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductUnit {
    /// Canonical unit code (e.g. "g", "kg", "szt")
    pub value: &'static str,
    /// Human-readable label
    pub label: &'static str,
    /// Unit category
    pub unit_type: UnitType,
    /// Base unit this unit converts into, if any
    pub base_unit: Option<&'static str>,
    /// Multiplier applied when converting to the base unit
    pub conversion_factor: Option<f64>,
}

/// Outcome of scanning free text for a unit token
#[derive(Debug, Clone, PartialEq)]
pub struct UnitDetection {
    /// Canonical unit code, empty when nothing matched
    pub unit: String,
    /// Unit category, `Piece` when nothing matched
    pub unit_type: UnitType,
    /// Whether a unit token was actually found
    pub matched: bool,
    /// The exact substring that matched, for excision from product names
    pub matched_text: Option<String>,
}

/// The full unit registry
pub const UNITS: &[ProductUnit] = &[
    ProductUnit {
        value: "g",
        label: "gram",
        unit_type: UnitType::Weight,
        base_unit: Some("g"),
        conversion_factor: Some(1.0),
    },
    ProductUnit {
        value: "dag",
        label: "dekagram",
        unit_type: UnitType::Weight,
        base_unit: Some("g"),
        conversion_factor: Some(10.0),
    },
    ProductUnit {
        value: "kg",
        label: "kilogram",
        unit_type: UnitType::Weight,
        base_unit: Some("g"),
        conversion_factor: Some(1000.0),
    },
    ProductUnit {
        value: "ml",
        label: "mililitr",
        unit_type: UnitType::Volume,
        base_unit: Some("ml"),
        conversion_factor: Some(1.0),
    },
    ProductUnit {
        value: "l",
        label: "litr",
        unit_type: UnitType::Volume,
        base_unit: Some("ml"),
        conversion_factor: Some(1000.0),
    },
    ProductUnit {
        value: "szt",
        label: "sztuka",
        unit_type: UnitType::Piece,
        base_unit: None,
        conversion_factor: None,
    },
    ProductUnit {
        value: "opak",
        label: "opakowanie",
        unit_type: UnitType::Piece,
        base_unit: None,
        conversion_factor: None,
    },
    ProductUnit {
        value: "łyżeczka",
        label: "łyżeczka",
        unit_type: UnitType::KitchenMeasure,
        base_unit: Some("ml"),
        conversion_factor: Some(5.0),
    },
    ProductUnit {
        value: "łyżka",
        label: "łyżka",
        unit_type: UnitType::KitchenMeasure,
        base_unit: Some("ml"),
        conversion_factor: Some(15.0),
    },
    ProductUnit {
        value: "szklanka",
        label: "szklanka",
        unit_type: UnitType::KitchenMeasure,
        base_unit: Some("ml"),
        conversion_factor: Some(250.0),
    },
];

lazy_static! {
    /// Alias table mapping inflected/verbose forms to canonical unit codes
    static ref UNIT_ALIASES: HashMap<&'static str, &'static str> = {
        let mut map = HashMap::new();

        // Weight
        map.insert("g", "g");
        map.insert("gram", "g");
        map.insert("gramy", "g");
        map.insert("gramów", "g");
        map.insert("grama", "g");
        map.insert("dag", "dag");
        map.insert("deko", "dag");
        map.insert("dekagram", "dag");
        map.insert("dekagramów", "dag");
        map.insert("kg", "kg");
        map.insert("kilo", "kg");
        map.insert("kilogram", "kg");
        map.insert("kilogramy", "kg");
        map.insert("kilogramów", "kg");
        map.insert("kilograma", "kg");

        // Volume
        map.insert("ml", "ml");
        map.insert("mililitr", "ml");
        map.insert("mililitry", "ml");
        map.insert("mililitrów", "ml");
        map.insert("l", "l");
        map.insert("litr", "l");
        map.insert("litry", "l");
        map.insert("litrów", "l");
        map.insert("litra", "l");

        // Piece
        map.insert("szt", "szt");
        map.insert("szt.", "szt");
        map.insert("sztuka", "szt");
        map.insert("sztuki", "szt");
        map.insert("sztuk", "szt");
        map.insert("opak", "opak");
        map.insert("opak.", "opak");
        map.insert("opakowanie", "opak");
        map.insert("opakowania", "opak");
        map.insert("opakowań", "opak");

        // Kitchen measures
        map.insert("łyżka", "łyżka");
        map.insert("łyżki", "łyżka");
        map.insert("łyżek", "łyżka");
        map.insert("łyżeczka", "łyżeczka");
        map.insert("łyżeczki", "łyżeczka");
        map.insert("łyżeczek", "łyżeczka");
        map.insert("szklanka", "szklanka");
        map.insert("szklanki", "szklanka");
        map.insert("szklanek", "szklanka");

        map
    };

    /// Ordered detection patterns, one per unit family. First match wins,
    /// so weight beats volume beats piece beats kitchen measure.
    static ref DETECTION_PATTERNS: Vec<(UnitType, Regex)> = vec![
        (
            UnitType::Weight,
            Regex::new(r"(?i)\b(kilogramów|kilogramy|kilograma|kilogram|kilo|kg|dekagramów|dekagram|deko|dag|gramów|gramy|grama|gram|g)\b").unwrap(),
        ),
        (
            UnitType::Volume,
            Regex::new(r"(?i)\b(mililitrów|mililitry|mililitr|ml|litrów|litry|litra|litr|l)\b").unwrap(),
        ),
        (
            UnitType::Piece,
            Regex::new(r"(?i)\b(sztuki|sztuka|sztuk|szt|opakowania|opakowanie|opakowań|opak)\b\.?").unwrap(),
        ),
        (
            UnitType::KitchenMeasure,
            Regex::new(r"(?i)\b(łyżeczek|łyżeczki|łyżeczka|łyżek|łyżki|łyżka|szklanek|szklanki|szklanka)\b").unwrap(),
        ),
    ];
}

/// Exact registry lookup by canonical unit code
pub fn get_unit(value: &str) -> Option<&'static ProductUnit> {
    UNITS.iter().find(|u| u.value == value)
}

/// Resolve an alias (any inflected form) to its canonical unit code
pub fn normalize_alias(token: &str) -> Option<&'static str> {
    UNIT_ALIASES.get(token.trim().to_lowercase().as_str()).copied()
}

/// Convert a value in the given unit to the unit's base unit
///
/// Returns `None` if the unit is unknown or has no base conversion (piece
/// units pass through unconverted by the caller).
pub fn normalize_to_base_unit(value: f64, unit: &str) -> Option<(f64, &'static str)> {
    let entry = get_unit(unit)?;
    let base = entry.base_unit?;
    let factor = entry.conversion_factor?;
    Some((value * factor, base))
}

/// Scan free text for a unit token
///
/// Tries each unit-family pattern in order; the captured token is resolved
/// through the alias table and validated against the registry. If no pattern
/// matches, the whole trimmed text is tried as a direct alias. If nothing
/// matches the caller must supply a default unit.
pub fn detect_unit_in_text(text: &str) -> UnitDetection {
    for (unit_type, pattern) in DETECTION_PATTERNS.iter() {
        if let Some(m) = pattern.find(text) {
            if let Some(canonical) = normalize_alias(m.as_str()) {
                if get_unit(canonical).is_some() {
                    trace!("Detected unit '{}' in text '{}'", canonical, text);
                    return UnitDetection {
                        unit: canonical.to_string(),
                        unit_type: *unit_type,
                        matched: true,
                        matched_text: Some(m.as_str().to_string()),
                    };
                }
            }
        }
    }

    // Fallback: the whole text may itself be a unit alias
    if let Some(canonical) = normalize_alias(text) {
        if let Some(entry) = get_unit(canonical) {
            debug!("Whole text '{}' resolved as unit alias '{}'", text, canonical);
            return UnitDetection {
                unit: canonical.to_string(),
                unit_type: entry.unit_type,
                matched: true,
                matched_text: Some(text.trim().to_string()),
            };
        }
    }

    UnitDetection {
        unit: String::new(),
        unit_type: UnitType::Piece,
        matched: false,
        matched_text: None,
    }
}

/// Whether two quantities can be summed
///
/// True when the units are identical, or when both convert to the same base
/// unit. Piece units with no base conversion combine only with themselves.
pub fn can_combine_quantities(unit_a: &str, unit_b: &str) -> bool {
    if unit_a == unit_b {
        return true;
    }
    match (get_unit(unit_a), get_unit(unit_b)) {
        (Some(a), Some(b)) => match (a.base_unit, b.base_unit) {
            (Some(base_a), Some(base_b)) => base_a == base_b,
            _ => false,
        },
        _ => false,
    }
}

/// Sum two quantities, converting both to the common base unit first
///
/// Returns `None` when the units cannot be combined.
pub fn combine_quantities(
    value_a: f64,
    unit_a: &str,
    value_b: f64,
    unit_b: &str,
) -> Option<(f64, String)> {
    if !can_combine_quantities(unit_a, unit_b) {
        return None;
    }
    if unit_a == unit_b {
        return Some((value_a + value_b, unit_a.to_string()));
    }
    let (base_a, base_unit) = normalize_to_base_unit(value_a, unit_a)?;
    let (base_b, _) = normalize_to_base_unit(value_b, unit_b)?;
    Some((base_a + base_b, base_unit.to_string()))
}
