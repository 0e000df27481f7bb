//! # Diet Upload Service
//!
//! Server round-trips for the upload flow: multipart validation and preview
//! requests, then the final save. The service never retries on its own;
//! failures carry context and the caller decides whether to resubmit.
//!
//! Shopping-list items are serialized as their `original` strings and
//! category ids are drawn only from the fixed category set. Internal parsed
//! structures never cross the wire on save.

use crate::categorization::{is_known_category, PendingCategorization};
use crate::diet_model::{DietPlan, DietTemplate, ParsedProduct, ValidationResult};
use anyhow::{Context, Result};
use log::{info, warn};
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};

/// Optional extras attached to a validation request
#[derive(Debug, Clone, Default)]
pub struct UploadOptions {
    pub skip_columns_count: Option<u32>,
    pub calorie_validation_enabled: bool,
    pub target_calories: Option<f64>,
    pub calorie_error_margin: Option<f64>,
}

/// Server verdict for a validation request
#[derive(Debug, Clone, Deserialize)]
pub struct ValidationResponse {
    pub valid: bool,
    #[serde(rename = "validationResults")]
    pub validation_results: Vec<ValidationResult>,
    #[serde(rename = "additionalData", default)]
    pub additional_data: AdditionalData,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdditionalData {
    #[serde(rename = "totalMeals")]
    pub total_meals: Option<usize>,
    #[serde(rename = "calorieAnalysis")]
    pub calorie_analysis: Option<serde_json::Value>,
}

/// A categorized shopping-list entry in its serializable save form
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SavedShoppingItem {
    /// The original ingredient line, verbatim
    pub original: String,
    #[serde(rename = "categoryId")]
    pub category_id: String,
}

/// Final save payload
#[derive(Debug, Clone, Serialize)]
pub struct SaveDietRequest {
    pub plan: DietPlan,
    #[serde(rename = "shoppingList")]
    pub shopping_list: Vec<SavedShoppingItem>,
}

/// Client for the validate/preview/save endpoints
pub struct DietUploadService {
    client: reqwest::Client,
    base_url: String,
}

impl DietUploadService {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Build the multipart form shared by validation and preview requests
    fn build_form(
        file_name: &str,
        file_bytes: Vec<u8>,
        template: &DietTemplate,
        options: &UploadOptions,
    ) -> Form {
        let mut form = Form::new()
            .part(
                "file",
                Part::bytes(file_bytes).file_name(file_name.to_string()),
            )
            .text("mealsPerDay", template.meals_per_day.to_string())
            .text("startDate", template.start_date.to_string())
            .text("duration", template.duration.to_string());

        for (i, time) in template.meal_times.iter().enumerate() {
            form = form.text(
                format!("mealTimes[meal_{}]", i),
                time.format("%H:%M").to_string(),
            );
        }
        for meal_type in &template.meal_types {
            form = form.text("mealTypes", meal_type.as_str());
        }

        if let Some(skip) = options.skip_columns_count {
            form = form.text("skipColumnsCount", skip.to_string());
        }
        if options.calorie_validation_enabled {
            form = form.text("calorieValidationEnabled", "true");
            if let Some(target) = options.target_calories {
                form = form.text("targetCalories", target.to_string());
            }
            if let Some(margin) = options.calorie_error_margin {
                form = form.text("calorieErrorMargin", margin.to_string());
            }
        }

        form
    }

    /// Submit the file and template for server-side validation
    pub async fn validate(
        &self,
        file_name: &str,
        file_bytes: Vec<u8>,
        template: &DietTemplate,
        options: &UploadOptions,
    ) -> Result<ValidationResponse> {
        let url = format!("{}/diets/validate", self.base_url);
        info!("Validating diet upload against {}", url);

        let form = Self::build_form(file_name, file_bytes, template, options);
        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .context("Validation request failed")?
            .error_for_status()
            .context("Validation request rejected by server")?;

        response
            .json::<ValidationResponse>()
            .await
            .context("Failed to decode validation response")
    }

    /// Request a preview (meals assigned to slots, shopping list aggregated)
    pub async fn preview(
        &self,
        file_name: &str,
        file_bytes: Vec<u8>,
        template: &DietTemplate,
        options: &UploadOptions,
    ) -> Result<serde_json::Value> {
        let url = format!("{}/diets/preview", self.base_url);
        info!("Requesting diet preview from {}", url);

        let form = Self::build_form(file_name, file_bytes, template, options);
        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .context("Preview request failed")?
            .error_for_status()
            .context("Preview request rejected by server")?;

        response
            .json()
            .await
            .context("Failed to decode preview response")
    }

    /// Persist the confirmed plan and its categorized shopping list
    pub async fn save(&self, plan: &DietPlan, categorized: &[PendingCategorization]) -> Result<()> {
        let url = format!("{}/diets", self.base_url);
        let request = SaveDietRequest {
            plan: plan.clone(),
            shopping_list: remap_for_save(categorized),
        };

        info!(
            "Saving diet plan ({} days, {} shopping items) to {}",
            plan.days.len(),
            request.shopping_list.len(),
            url
        );

        self.client
            .post(&url)
            .json(&request)
            .send()
            .await
            .context("Save request failed")?
            .error_for_status()
            .context("Save request rejected by server")?;

        Ok(())
    }
}

/// Remap categorized products into their serializable save form
///
/// Entries with a category id outside the fixed set are dropped with a
/// warning so the persisted document only carries known categories.
pub fn remap_for_save(categorized: &[PendingCategorization]) -> Vec<SavedShoppingItem> {
    categorized
        .iter()
        .filter_map(|entry| {
            if is_known_category(&entry.category_id) {
                Some(SavedShoppingItem {
                    original: entry.original.clone(),
                    category_id: entry.category_id.clone(),
                })
            } else {
                warn!(
                    "Dropping shopping item '{}' with unknown category '{}'",
                    entry.original, entry.category_id
                );
                None
            }
        })
        .collect()
}

/// Convenience: pair parsed products with their chosen categories, keeping
/// the `original` line as the persisted representation
pub fn categorized_items(
    products: &[ParsedProduct],
    category_ids: &[String],
) -> Vec<PendingCategorization> {
    if products.len() != category_ids.len() {
        warn!(
            "Only {} of {} products have a category selected; the rest are left uncategorized",
            category_ids.len().min(products.len()),
            products.len()
        );
    }
    products
        .iter()
        .zip(category_ids.iter())
        .map(|(product, category_id)| PendingCategorization {
            original: product.original.clone(),
            category_id: category_id.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remap_drops_unknown_categories() {
        let items = vec![
            PendingCategorization {
                original: "100 g mąki".to_string(),
                category_id: "grains".to_string(),
            },
            PendingCategorization {
                original: "1 szt tajemnica".to_string(),
                category_id: "mystery".to_string(),
            },
        ];
        let saved = remap_for_save(&items);
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].original, "100 g mąki");
        assert_eq!(saved[0].category_id, "grains");
    }

    #[test]
    fn test_validation_response_decoding() {
        let json = r#"{
            "valid": false,
            "validationResults": [
                {"isValid": false, "message": "Row 3: missing meal name", "severity": "error"}
            ],
            "additionalData": {"totalMeals": 14}
        }"#;
        let response: ValidationResponse = serde_json::from_str(json).unwrap();
        assert!(!response.valid);
        assert_eq!(response.validation_results.len(), 1);
        assert!(!response.validation_results[0].is_valid);
        assert_eq!(response.additional_data.total_meals, Some(14));
        assert!(response.additional_data.calorie_analysis.is_none());
    }

    #[test]
    fn test_categorized_items_pairs_up_to_shorter_side() {
        let products = vec![
            ParsedProduct {
                name: "mąki".to_string(),
                quantity: 2000.0,
                unit: "g".to_string(),
                original: "2 kg mąki".to_string(),
                has_custom_unit: false,
                similarity: None,
            },
            ParsedProduct {
                name: "mleka".to_string(),
                quantity: 500.0,
                unit: "ml".to_string(),
                original: "1/2 l mleka".to_string(),
                has_custom_unit: false,
                similarity: None,
            },
        ];
        let items = categorized_items(&products, &["grains".to_string()]);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].original, "2 kg mąki");
        assert_eq!(items[0].category_id, "grains");
    }

    #[test]
    fn test_validation_result_wire_casing() {
        let result = ValidationResult::error("Start date is in the past");
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("\"isValid\":false"));
        assert!(!json.contains("is_valid"));
    }

    #[test]
    fn test_save_request_serializes_originals_only() {
        let request = SaveDietRequest {
            plan: DietPlan {
                days: vec![],
                shopping_list: vec!["300 g mąka".to_string()],
            },
            shopping_list: vec![SavedShoppingItem {
                original: "- 300g mąki".to_string(),
                category_id: "grains".to_string(),
            }],
        };
        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("\"original\":\"- 300g mąki\""));
        assert!(json.contains("\"categoryId\":\"grains\""));
    }
}
