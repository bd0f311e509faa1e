use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One food as reported by the nutrition-facts API. Missing numbers count
/// as zero because they only ever feed sums.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutritionItem {
    pub name: String,
    #[serde(default)]
    pub calories: f64,
    #[serde(default)]
    pub serving_size_g: f64,
    #[serde(default)]
    pub fat_total_g: f64,
    #[serde(default)]
    pub fat_saturated_g: f64,
    #[serde(default)]
    pub protein_g: f64,
    #[serde(default)]
    pub sodium_mg: f64,
    #[serde(default)]
    pub potassium_mg: f64,
    #[serde(default)]
    pub cholesterol_mg: f64,
    #[serde(default)]
    pub carbohydrates_total_g: f64,
    #[serde(default)]
    pub fiber_g: f64,
    #[serde(default)]
    pub sugar_g: f64,
}

#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub items: Vec<NutritionItem>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub query: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectedIngredient {
    pub id: Uuid,
    #[serde(flatten)]
    pub item: NutritionItem,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MealTotals {
    pub calories: f64,
    pub protein_g: f64,
    pub carbohydrates_g: f64,
    pub fat_g: f64,
}

#[derive(Debug, Serialize)]
pub struct MealResponse {
    pub ingredients: Vec<SelectedIngredient>,
    pub totals: MealTotals,
}
