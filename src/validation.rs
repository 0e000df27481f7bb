//! # Template and File Validation
//!
//! Independent rule checks over the parsed file and the meal-schedule
//! template. Each validator is a pure function of its inputs producing one
//! or more [`ValidationResult`]s; the overall submit gate is the absence of
//! any error-severity result (warnings never block).
//!
//! A [`ValidationSignature`] guards against redundant re-validation when
//! neither the template nor the file identity actually changed.

use crate::diet_model::{DietTemplate, MealType, Severity, ValidationResult};
use crate::excel_parser::StructureReport;
use chrono::{NaiveDate, NaiveTime, Timelike};
use log::debug;
use serde_json::json;
use std::collections::HashMap;

/// Warning threshold for plan length, in days
const LONG_PLAN_WARNING_DAYS: u32 = 30;
/// Minimum comfortable gap between adjacent meals, in minutes
const MIN_MEAL_GAP_MINUTES: i64 = 120;
/// Default margin for calorie validation
pub const DEFAULT_CALORIE_MARGIN: f64 = 0.05;

/// Valid iff the meal count divides evenly into full days
///
/// The message states how many complete days result, or how many meals are
/// missing to complete the last day.
pub fn validate_meals_per_day(total_meals: usize, meals_per_day: usize) -> ValidationResult {
    if meals_per_day == 0 {
        return ValidationResult::error("Meals per day must be at least 1");
    }
    if total_meals == 0 {
        return ValidationResult::error("The file contains no meals");
    }
    let remainder = total_meals % meals_per_day;
    if remainder == 0 {
        ValidationResult::success(format!(
            "{} meals make {} complete days of {} meals each",
            total_meals,
            total_meals / meals_per_day,
            meals_per_day
        ))
    } else {
        let missing = meals_per_day - remainder;
        ValidationResult::error(format!(
            "{} meals do not divide into days of {}: {} meal{} missing to complete the last day",
            total_meals,
            meals_per_day,
            missing,
            if missing == 1 { "" } else { "s" }
        ))
    }
}

/// Date and duration checks
///
/// Errors: start date before `today` (date-only comparison), or a duration
/// longer than the meals in the file can fill. Warning: plans longer than
/// 30 days.
pub fn validate_dates(
    template: &DietTemplate,
    total_meals: usize,
    today: NaiveDate,
) -> Vec<ValidationResult> {
    let mut results = Vec::new();

    if template.start_date < today {
        results.push(ValidationResult::error(format!(
            "Start date {} is in the past",
            template.start_date
        )));
    }

    if template.meals_per_day > 0 {
        let max_possible_days = (total_meals / template.meals_per_day) as u32;
        if template.duration > max_possible_days {
            results.push(ValidationResult::error(format!(
                "Duration of {} days exceeds the {} day{} the file can fill ({} meals / {} per day)",
                template.duration,
                max_possible_days,
                if max_possible_days == 1 { "" } else { "s" },
                total_meals,
                template.meals_per_day
            )));
        }
    }

    if template.duration > LONG_PLAN_WARNING_DAYS {
        results.push(ValidationResult::warning(format!(
            "Plans longer than {} days are hard to follow ({} days configured)",
            LONG_PLAN_WARNING_DAYS, template.duration
        )));
    }

    if results.is_empty() {
        results.push(ValidationResult::success(format!(
            "{} days starting {}",
            template.duration, template.start_date
        )));
    }

    results
}

fn minutes_of(time: NaiveTime) -> i64 {
    time.hour() as i64 * 60 + time.minute() as i64
}

/// Meal slot configuration checks
///
/// Errors: a slot time not strictly later than the previous slot, or a meal
/// type repeated across slots. Warnings: adjacent meals closer than two
/// hours, breakfast outside 04:00–10:00, dinner at 22:00 or later.
pub fn validate_meal_config(template: &DietTemplate) -> Vec<ValidationResult> {
    let mut results = Vec::new();

    for (i, pair) in template.meal_times.windows(2).enumerate() {
        let (prev, next) = (pair[0], pair[1]);
        if next <= prev {
            results.push(ValidationResult::error(format!(
                "Meal {} at {} is not later than meal {} at {}",
                i + 2,
                next.format("%H:%M"),
                i + 1,
                prev.format("%H:%M")
            )));
        } else if minutes_of(next) - minutes_of(prev) < MIN_MEAL_GAP_MINUTES {
            results.push(ValidationResult::warning(format!(
                "Only {} minutes between meal {} and meal {}",
                minutes_of(next) - minutes_of(prev),
                i + 1,
                i + 2
            )));
        }
    }

    for (slot, (meal_type, time)) in template
        .meal_types
        .iter()
        .zip(template.meal_times.iter())
        .enumerate()
    {
        match meal_type {
            MealType::Breakfast => {
                if time.hour() < 4 || time.hour() >= 10 {
                    results.push(ValidationResult::warning(format!(
                        "Breakfast at {} (slot {}) is outside the typical 04:00-10:00 window",
                        time.format("%H:%M"),
                        slot + 1
                    )));
                }
            }
            MealType::Dinner => {
                if time.hour() >= 22 {
                    results.push(ValidationResult::warning(format!(
                        "Dinner at {} (slot {}) is very late",
                        time.format("%H:%M"),
                        slot + 1
                    )));
                }
            }
            _ => {}
        }
    }

    let mut counts: HashMap<MealType, usize> = HashMap::new();
    for meal_type in &template.meal_types {
        *counts.entry(*meal_type).or_insert(0) += 1;
    }
    for (meal_type, count) in counts {
        if count > 1 {
            results.push(ValidationResult::error(format!(
                "Meal type {} occurs {} times; each type may appear only once per day",
                meal_type, count
            )));
        }
    }

    if results.is_empty() {
        results.push(ValidationResult::success(format!(
            "{} meal slots configured correctly",
            template.meals_per_day
        )));
    }

    results
}

/// Structural verdicts derived from the row check
pub fn validate_structure(report: &StructureReport) -> Vec<ValidationResult> {
    if report.issues.is_empty() {
        vec![ValidationResult::success(format!(
            "Parsed {} meals from the file",
            report.meal_count
        ))]
    } else {
        report
            .issues
            .iter()
            .map(|issue| ValidationResult::error(issue.message.clone()))
            .collect()
    }
}

/// Compare per-day calorie totals against a target within a relative margin
pub fn validate_calories(
    per_day_totals: &[f64],
    target_calories: f64,
    margin: f64,
) -> Vec<ValidationResult> {
    if target_calories <= 0.0 {
        return vec![ValidationResult::error("Target calories must be positive")];
    }

    let mut results = Vec::new();
    for (day, &total) in per_day_totals.iter().enumerate() {
        let deviation = (total - target_calories).abs() / target_calories;
        if deviation > margin {
            results.push(ValidationResult::error(format!(
                "Day {}: {} kcal deviates {:.1}% from the {} kcal target (allowed {:.0}%)",
                day + 1,
                total,
                deviation * 100.0,
                target_calories,
                margin * 100.0
            )));
        }
    }

    if results.is_empty() {
        results.push(ValidationResult::success(format!(
            "All {} days within {:.0}% of the {} kcal target",
            per_day_totals.len(),
            margin * 100.0,
            target_calories
        )));
    }
    results
}

/// Shared record of per-rule outcomes, combined into the submit gate
#[derive(Debug, Clone, Default)]
pub struct ValidationState {
    pub structure: Option<bool>,
    pub meals_per_day: Option<bool>,
    pub dates: Option<bool>,
    pub meal_config: Option<bool>,
    /// Present only when calorie validation is enabled by the user
    pub calories: Option<bool>,
    pub calorie_validation_enabled: bool,
}

impl ValidationState {
    /// Record the outcome of a batch of results for one rule
    pub fn passed(results: &[ValidationResult]) -> bool {
        results.iter().all(|r| r.severity != Severity::Error)
    }

    /// Logical AND of all required rules; warnings never block
    pub fn can_submit(&self) -> bool {
        let base = self.structure.unwrap_or(false)
            && self.meals_per_day.unwrap_or(false)
            && self.dates.unwrap_or(false)
            && self.meal_config.unwrap_or(false);
        if self.calorie_validation_enabled {
            base && self.calories.unwrap_or(false)
        } else {
            base
        }
    }
}

/// Identity of one validation run: relevant template fields + file identity
///
/// Re-running the validators is redundant when the signature is unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationSignature(String);

impl ValidationSignature {
    pub fn new(template: &DietTemplate, file_name: &str, file_size: u64) -> Self {
        let value = json!({
            "mealsPerDay": template.meals_per_day,
            "startDate": template.start_date.to_string(),
            "duration": template.duration,
            "mealTimes": template.meal_times.iter().map(|t| t.format("%H:%M").to_string()).collect::<Vec<_>>(),
            "mealTypes": template.meal_types.iter().map(|t| t.as_str()).collect::<Vec<_>>(),
            "file": { "name": file_name, "size": file_size },
        });
        Self(value.to_string())
    }
}

/// Tracks the last validated signature and reports whether inputs changed
#[derive(Debug, Default)]
pub struct RevalidationGuard {
    last: Option<ValidationSignature>,
}

impl RevalidationGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when the signature differs from the last validated one; records
    /// the new signature in that case.
    pub fn should_revalidate(&mut self, signature: &ValidationSignature) -> bool {
        if self.last.as_ref() == Some(signature) {
            debug!("Validation signature unchanged, skipping re-validation");
            false
        } else {
            self.last = Some(signature.clone());
            true
        }
    }

    /// Forget the last signature so the next check re-validates
    pub fn reset(&mut self) {
        self.last = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diet_model::MealType;
    use chrono::NaiveDate;

    fn template(
        meals_per_day: usize,
        duration: u32,
        times: &[(u32, u32)],
        types: &[MealType],
    ) -> DietTemplate {
        DietTemplate {
            meals_per_day,
            start_date: NaiveDate::from_ymd_opt(2026, 9, 7).unwrap(),
            duration,
            meal_times: times
                .iter()
                .map(|&(h, m)| NaiveTime::from_hms_opt(h, m, 0).unwrap())
                .collect(),
            meal_types: types.to_vec(),
        }
    }

    #[test]
    fn test_meals_per_day_divisible() {
        let result = validate_meals_per_day(15, 5);
        assert!(result.is_valid);
        assert!(result.message.contains("3 complete days"));
    }

    #[test]
    fn test_meals_per_day_missing_meal() {
        let result = validate_meals_per_day(14, 5);
        assert!(!result.is_valid);
        assert_eq!(result.severity, Severity::Error);
        assert!(result.message.contains("1 meal missing"));
    }

    #[test]
    fn test_start_date_in_past_is_error() {
        let t = template(5, 2, &[(8, 0)], &[MealType::Breakfast]);
        let today = NaiveDate::from_ymd_opt(2026, 9, 8).unwrap(); // day after start
        let results = validate_dates(&t, 100, today);
        assert!(results.iter().any(|r| !r.is_valid && r.message.contains("past")));
    }

    #[test]
    fn test_duration_exceeding_available_meals() {
        let t = template(5, 10, &[(8, 0)], &[MealType::Breakfast]);
        let today = NaiveDate::from_ymd_opt(2026, 9, 1).unwrap();
        // 40 meals / 5 per day = 8 possible days < 10 requested
        let results = validate_dates(&t, 40, today);
        assert!(results
            .iter()
            .any(|r| !r.is_valid && r.message.contains("exceeds the 8 days")));
    }

    #[test]
    fn test_long_duration_is_warning_not_error() {
        let t = template(1, 31, &[(8, 0)], &[MealType::Breakfast]);
        let today = NaiveDate::from_ymd_opt(2026, 9, 1).unwrap();
        let results = validate_dates(&t, 31, today);
        assert!(results
            .iter()
            .any(|r| r.severity == Severity::Warning && r.is_valid));
        assert!(results.iter().all(|r| r.severity != Severity::Error));
    }

    #[test]
    fn test_meal_times_must_increase() {
        let t = template(
            2,
            1,
            &[(13, 0), (8, 0)],
            &[MealType::Lunch, MealType::Dinner],
        );
        let results = validate_meal_config(&t);
        assert!(results.iter().any(|r| r.severity == Severity::Error));
    }

    #[test]
    fn test_short_gap_is_warning() {
        let t = template(
            2,
            1,
            &[(8, 0), (9, 0)],
            &[MealType::Breakfast, MealType::Lunch],
        );
        let results = validate_meal_config(&t);
        assert!(results
            .iter()
            .any(|r| r.severity == Severity::Warning && r.message.contains("60 minutes")));
    }

    #[test]
    fn test_duplicate_meal_type_is_error() {
        let t = template(
            2,
            1,
            &[(8, 0), (12, 0)],
            &[MealType::Breakfast, MealType::Breakfast],
        );
        let results = validate_meal_config(&t);
        assert!(results
            .iter()
            .any(|r| !r.is_valid && r.message.contains("occurs 2 times")));
    }

    #[test]
    fn test_atypical_breakfast_and_late_dinner_warnings() {
        let t = template(
            2,
            1,
            &[(11, 0), (22, 30)],
            &[MealType::Breakfast, MealType::Dinner],
        );
        let results = validate_meal_config(&t);
        assert!(results.iter().any(|r| r.message.contains("Breakfast")));
        assert!(results.iter().any(|r| r.message.contains("very late")));
        assert!(results.iter().all(|r| r.severity != Severity::Error));
    }

    #[test]
    fn test_calorie_validation_margin() {
        let results = validate_calories(&[2000.0, 2090.0], 2000.0, DEFAULT_CALORIE_MARGIN);
        assert!(results.iter().all(|r| r.severity != Severity::Error));

        let results = validate_calories(&[2000.0, 2200.0], 2000.0, DEFAULT_CALORIE_MARGIN);
        assert!(results.iter().any(|r| !r.is_valid && r.message.contains("Day 2")));
    }

    #[test]
    fn test_submit_gate() {
        let mut state = ValidationState::default();
        assert!(!state.can_submit());

        state.structure = Some(true);
        state.meals_per_day = Some(true);
        state.dates = Some(true);
        state.meal_config = Some(true);
        assert!(state.can_submit());

        // Calorie rule only gates when enabled
        state.calorie_validation_enabled = true;
        assert!(!state.can_submit());
        state.calories = Some(true);
        assert!(state.can_submit());

        state.dates = Some(false);
        assert!(!state.can_submit());
    }

    #[test]
    fn test_warnings_do_not_block() {
        let results = vec![
            ValidationResult::success("ok"),
            ValidationResult::warning("careful"),
        ];
        assert!(ValidationState::passed(&results));

        let results = vec![ValidationResult::error("nope")];
        assert!(!ValidationState::passed(&results));
    }

    #[test]
    fn test_revalidation_guard() {
        let t = template(1, 1, &[(8, 0)], &[MealType::Breakfast]);
        let mut guard = RevalidationGuard::new();

        let sig = ValidationSignature::new(&t, "plan.xlsx", 1024);
        assert!(guard.should_revalidate(&sig));
        assert!(!guard.should_revalidate(&sig));

        let other = ValidationSignature::new(&t, "plan.xlsx", 2048);
        assert!(guard.should_revalidate(&other));

        guard.reset();
        assert!(guard.should_revalidate(&other));
    }
}
