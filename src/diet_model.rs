//! # Diet Plan Data Model
//!
//! Data structures exchanged between the spreadsheet parser, the validators
//! and the upload service: parsed products and meals, the user-configured
//! diet template, assembled plan days and validation verdicts.
//!
//! ## Core Concepts
//!
//! - **ParsedProduct**: one ingredient line, unit-normalized when possible
//! - **DietTemplate**: the trainer's meal schedule (slots, times, dates)
//! - **ParsedMeal / Day**: meals extracted from the file and their placement
//! - **ValidationResult**: a single rule verdict with severity

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single parsed ingredient line
///
/// `quantity` is a non-negative decimal expressed in the product's base unit
/// whenever normalization succeeded; `original` preserves the source text
/// verbatim for display, audit and re-parsing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedProduct {
    /// Product name as extracted (not yet cleaned/lowercased)
    pub name: String,
    /// Normalized quantity
    pub quantity: f64,
    /// Canonical unit code, or the raw token for custom units
    pub unit: String,
    /// The original ingredient line, verbatim
    pub original: String,
    /// True when the unit is neither in the registry nor was detected
    pub has_custom_unit: bool,
    /// Similarity score attached during fuzzy matching, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity: Option<f64>,
}

impl fmt::Display for ParsedProduct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.quantity, self.unit, self.name)
    }
}

/// Meal slot type within a day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MealType {
    Breakfast,
    SecondBreakfast,
    Lunch,
    Snack,
    Dinner,
}

impl MealType {
    /// Form value used in upload requests and stored documents
    pub fn as_str(&self) -> &'static str {
        match self {
            MealType::Breakfast => "BREAKFAST",
            MealType::SecondBreakfast => "SECOND_BREAKFAST",
            MealType::Lunch => "LUNCH",
            MealType::Snack => "SNACK",
            MealType::Dinner => "DINNER",
        }
    }
}

impl fmt::Display for MealType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-meal nutrition, present only when the source row carried exactly
/// four valid numbers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NutritionalValues {
    pub calories: f64,
    pub protein: f64,
    pub fat: f64,
    pub carbs: f64,
}

/// One meal extracted from a spreadsheet row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedMeal {
    /// Meal name (column B)
    pub name: String,
    /// Preparation instructions (column C)
    pub instructions: String,
    /// Parsed ingredient lines (column D, comma separated in the source)
    pub ingredients: Vec<ParsedProduct>,
    /// Optional nutrition (column E)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nutrition: Option<NutritionalValues>,
}

/// A meal placed into a template slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledMeal {
    pub meal_type: MealType,
    pub time: NaiveTime,
    pub meal: ParsedMeal,
}

/// One day of the assembled plan; meals are ordered by slot index and their
/// times are expected to be monotonically increasing (validated, not
/// enforced structurally)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Day {
    pub date: NaiveDate,
    pub meals: Vec<ScheduledMeal>,
}

/// The trainer-owned meal schedule template, edited client-side before each
/// upload. `meal_times` and `meal_types` must both have exactly
/// `meals_per_day` entries, ordered by slot index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DietTemplate {
    pub meals_per_day: usize,
    pub start_date: NaiveDate,
    /// Plan length in days
    pub duration: u32,
    /// Time per slot, ordered by slot index
    pub meal_times: Vec<NaiveTime>,
    /// Type per slot, ordered by slot index; repeats are a validation error
    pub meal_types: Vec<MealType>,
}

/// Result of parsing a whole workbook
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedExcel {
    pub meals: Vec<ParsedMeal>,
    pub total_meals: usize,
    /// Flattened, deduplicated shopping list across all rows
    pub shopping_list: Vec<ParsedProduct>,
}

/// A fully assembled plan ready for preview/save
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DietPlan {
    pub days: Vec<Day>,
    /// Display strings, "{quantity} {unit} {name}"
    pub shopping_list: Vec<String>,
}

/// Severity of a validation verdict; warnings never block submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Success,
}

/// A single rule verdict with a human-readable reason
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    #[serde(rename = "isValid")]
    pub is_valid: bool,
    pub message: String,
    pub severity: Severity,
}

impl ValidationResult {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            is_valid: true,
            message: message.into(),
            severity: Severity::Success,
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            is_valid: true,
            message: message.into(),
            severity: Severity::Warning,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            message: message.into(),
            severity: Severity::Error,
        }
    }

    /// Whether this result blocks submission
    pub fn is_blocking(&self) -> bool {
        self.severity == Severity::Error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meal_type_serde_form() {
        let json = serde_json::to_string(&MealType::SecondBreakfast).unwrap();
        assert_eq!(json, "\"SECOND_BREAKFAST\"");
        let back: MealType = serde_json::from_str("\"DINNER\"").unwrap();
        assert_eq!(back, MealType::Dinner);
    }

    #[test]
    fn test_product_display() {
        let p = ParsedProduct {
            name: "mąka".to_string(),
            quantity: 300.0,
            unit: "g".to_string(),
            original: "300 g mąki".to_string(),
            has_custom_unit: false,
            similarity: None,
        };
        assert_eq!(p.to_string(), "300 g mąka");
    }

    #[test]
    fn test_validation_result_blocking() {
        assert!(ValidationResult::error("x").is_blocking());
        assert!(!ValidationResult::warning("x").is_blocking());
        assert!(!ValidationResult::success("x").is_blocking());
    }
}
