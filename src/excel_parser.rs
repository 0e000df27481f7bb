//! # Diet Spreadsheet Parser
//!
//! Reads a diet-plan spreadsheet (one meal per row) into structured meals
//! and an aggregated shopping list, and maps parsed meals onto a
//! day/meal-type/time template.
//!
//! Expected layout: first sheet, row 0 is a header and is skipped. Columns:
//! A free note (ignored), B meal name (required), C preparation
//! instructions, D comma-separated ingredient lines, E optional nutrition as
//! exactly four comma-separated numbers (calories, protein, fat, carbs).
//!
//! The row-level logic is pure (`parse_rows`/`check_rows`) so it can be
//! exercised without a workbook on disk; `parse_diet_workbook` adds the
//! calamine I/O layer on top.

use crate::diet_model::{
    Day, DietPlan, DietTemplate, NutritionalValues, ParsedExcel, ParsedMeal, ParsedProduct,
    ScheduledMeal,
};
use crate::product_parser::{clean_product_name, parse_product_or_fallback};
use anyhow::{bail, Context, Result};
use calamine::{open_workbook_auto, Reader};
use chrono::Duration;
use log::{debug, info, warn};
use std::collections::HashMap;
use std::path::Path;

/// Column indexes of the expected sheet layout
const COL_NAME: usize = 1;
const COL_INSTRUCTIONS: usize = 2;
const COL_INGREDIENTS: usize = 3;
const COL_NUTRITION: usize = 4;

/// A structural problem found in one spreadsheet row
#[derive(Debug, Clone, PartialEq)]
pub struct RowIssue {
    /// Zero-based row index in the sheet (header included in numbering)
    pub row: usize,
    pub message: String,
}

/// Outcome of the structural check over all rows
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StructureReport {
    /// Number of rows that parsed into meals
    pub meal_count: usize,
    pub issues: Vec<RowIssue>,
}

impl StructureReport {
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty() && self.meal_count > 0
    }
}

fn cell(row: &[String], index: usize) -> &str {
    row.get(index).map(|s| s.trim()).unwrap_or("")
}

/// Parse the optional nutrition cell
///
/// The meal is left without nutrition unless the cell contains exactly four
/// valid numbers.
fn parse_nutrition(raw: &str) -> Option<NutritionalValues> {
    if raw.is_empty() {
        return None;
    }
    let values: Vec<f64> = raw
        .split(',')
        .map(|part| part.trim().parse::<f64>())
        .collect::<std::result::Result<_, _>>()
        .ok()?;
    if values.len() != 4 {
        debug!("Nutrition cell has {} values, expected 4: '{}'", values.len(), raw);
        return None;
    }
    Some(NutritionalValues {
        calories: values[0],
        protein: values[1],
        fat: values[2],
        carbs: values[3],
    })
}

/// Parse one data row into a meal; rows with an empty name cell are skipped
fn parse_meal_row(row: &[String]) -> Option<ParsedMeal> {
    let name = cell(row, COL_NAME);
    if name.is_empty() {
        return None;
    }

    let ingredients = cell(row, COL_INGREDIENTS)
        .split(',')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(parse_product_or_fallback)
        .collect();

    Some(ParsedMeal {
        name: name.to_string(),
        instructions: cell(row, COL_INSTRUCTIONS).to_string(),
        ingredients,
        nutrition: parse_nutrition(cell(row, COL_NUTRITION)),
    })
}

/// Aggregate a flat product list into a deduplicated shopping list
///
/// Entries sharing the same cleaned name AND unit are merged by summing
/// quantities (rounded to two decimals); entries with the same name but a
/// different unit stay separate. Insertion order is preserved.
pub fn aggregate_shopping_list(products: &[ParsedProduct]) -> Vec<ParsedProduct> {
    let mut list: Vec<ParsedProduct> = Vec::new();
    let mut index: HashMap<(String, String), usize> = HashMap::new();

    for product in products {
        let key = (clean_product_name(&product.name), product.unit.clone());
        match index.get(&key) {
            Some(&i) => {
                let merged = list[i].quantity + product.quantity;
                list[i].quantity = (merged * 100.0).round() / 100.0;
            }
            None => {
                index.insert(key, list.len());
                list.push(product.clone());
            }
        }
    }

    list
}

/// Parse already-extracted rows into meals and a shopping list
///
/// Row 0 is treated as the header and skipped.
pub fn parse_rows(rows: &[Vec<String>]) -> ParsedExcel {
    let meals: Vec<ParsedMeal> = rows
        .iter()
        .skip(1)
        .filter_map(|row| parse_meal_row(row))
        .collect();

    let all_products: Vec<ParsedProduct> = meals
        .iter()
        .flat_map(|meal| meal.ingredients.iter().cloned())
        .collect();
    let shopping_list = aggregate_shopping_list(&all_products);

    info!(
        "Parsed {} meals and {} distinct shopping-list entries",
        meals.len(),
        shopping_list.len()
    );

    ParsedExcel {
        total_meals: meals.len(),
        meals,
        shopping_list,
    }
}

/// Structural check over rows, reporting per-row problems
///
/// A row with content but no name cell, or a named row without instructions,
/// is reported with its row number so the trainer can fix the file.
pub fn check_rows(rows: &[Vec<String>]) -> StructureReport {
    let mut report = StructureReport::default();

    for (i, row) in rows.iter().enumerate().skip(1) {
        let name = cell(row, COL_NAME);
        let has_any_content = row.iter().any(|c| !c.trim().is_empty());

        if name.is_empty() {
            if has_any_content {
                report.issues.push(RowIssue {
                    row: i,
                    message: format!("Row {}: missing meal name in column B", i + 1),
                });
            }
            continue;
        }
        if cell(row, COL_INSTRUCTIONS).is_empty() {
            report.issues.push(RowIssue {
                row: i,
                message: format!("Row {}: missing preparation instructions in column C", i + 1),
            });
        }
        report.meal_count += 1;
    }

    if report.meal_count == 0 && report.issues.is_empty() {
        report.issues.push(RowIssue {
            row: 0,
            message: "No meal rows found below the header".to_string(),
        });
    }

    report
}

/// Load all cells of the first sheet as trimmed strings
pub fn load_rows(path: &Path) -> Result<Vec<Vec<String>>> {
    let mut workbook =
        open_workbook_auto(path).with_context(|| format!("Failed to open workbook {:?}", path))?;

    let range = workbook
        .worksheet_range_at(0)
        .context("Workbook has no sheets")?
        .context("Failed to read the first sheet")?;

    let rows = range
        .rows()
        .map(|row| row.iter().map(|cell| cell.to_string()).collect())
        .collect();

    Ok(rows)
}

/// Read a diet spreadsheet from disk
pub fn parse_diet_workbook(path: &Path) -> Result<ParsedExcel> {
    info!("Parsing diet workbook: {:?}", path);
    let rows = load_rows(path)?;
    Ok(parse_rows(&rows))
}

/// Map parsed meals onto the template's day/slot grid
///
/// Meals are assigned cyclically, `(day * meals_per_day + slot) % total`,
/// across `duration` days; each slot carries the template's configured time
/// and meal type. The shopping list is re-aggregated across the whole
/// window and formatted as `"{quantity} {unit} {name}"` display strings.
pub fn apply_template(parsed: &ParsedExcel, template: &DietTemplate) -> Result<DietPlan> {
    if template.meal_times.len() != template.meals_per_day
        || template.meal_types.len() != template.meals_per_day
    {
        bail!(
            "Template slot mismatch: {} meals per day but {} times and {} types configured",
            template.meals_per_day,
            template.meal_times.len(),
            template.meal_types.len()
        );
    }
    if parsed.total_meals == 0 {
        warn!("Applying template over an empty meal list");
        return Ok(DietPlan {
            days: Vec::new(),
            shopping_list: Vec::new(),
        });
    }

    let mut days = Vec::with_capacity(template.duration as usize);
    let mut window_products: Vec<ParsedProduct> = Vec::new();

    for day_index in 0..template.duration {
        let date = template.start_date + Duration::days(day_index as i64);
        let mut meals = Vec::with_capacity(template.meals_per_day);

        for slot in 0..template.meals_per_day {
            let meal_index =
                (day_index as usize * template.meals_per_day + slot) % parsed.total_meals;
            let meal = parsed.meals[meal_index].clone();
            window_products.extend(meal.ingredients.iter().cloned());

            meals.push(ScheduledMeal {
                meal_type: template.meal_types[slot],
                time: template.meal_times[slot],
                meal,
            });
        }

        days.push(Day { date, meals });
    }

    let shopping_list = aggregate_shopping_list(&window_products)
        .into_iter()
        .map(|p| format!("{} {} {}", p.quantity, p.unit, p.name))
        .collect();

    Ok(DietPlan {
        days,
        shopping_list,
    })
}
