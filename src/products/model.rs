use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::repo_types::RawProduct;

pub const DEFAULT_SERVING_SIZE: &str = "100g";
pub const UNKNOWN_PRODUCT_NAME: &str = "Unknown product";
pub const KJ_PER_KCAL: f64 = 4.184;

pub fn kj_to_kcal(kj: f64) -> f64 {
    kj / KJ_PER_KCAL
}

/// Label values, already expressed as percentages by the source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Micronutrients {
    pub vitamin_a: Option<String>,
    pub vitamin_c: Option<String>,
    pub calcium: Option<String>,
    pub iron: Option<String>,
}

/// Normalized nutrition record for one barcode.
///
/// `None` means the source did not report the value. It is never the same
/// thing as zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub barcode: String,
    pub name: String,
    pub brand: Option<String>,
    pub serving_size: String,
    pub energy_kj: Option<f64>,
    pub protein_g: Option<f64>,
    pub carbohydrates_g: Option<f64>,
    pub fat_g: Option<f64>,
    pub fiber_g: Option<f64>,
    pub sugar_g: Option<f64>,
    pub salt_g: Option<f64>,
    pub micronutrients: Micronutrients,
    pub ingredients: Option<String>,
    pub allergens: Option<String>,
    pub image_url: Option<String>,
    /// NOVA processing level, 1 to 4.
    pub nova_group: Option<u8>,
    pub eco_score: Option<String>,
}

impl Product {
    pub fn from_raw(barcode: &str, raw: RawProduct) -> Self {
        let nutriments = raw.nutriments.unwrap_or_default();
        let micros = raw.nutrients.unwrap_or_default();
        Self {
            barcode: barcode.to_string(),
            name: raw
                .product_name
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| UNKNOWN_PRODUCT_NAME.to_string()),
            brand: raw.brands,
            serving_size: raw
                .serving_size
                .unwrap_or_else(|| DEFAULT_SERVING_SIZE.to_string()),
            energy_kj: nutriments.energy,
            protein_g: nutriments.proteins,
            carbohydrates_g: nutriments.carbohydrates,
            fat_g: nutriments.fat,
            fiber_g: nutriments.fiber,
            sugar_g: nutriments.sugars,
            salt_g: nutriments.salt,
            micronutrients: Micronutrients {
                vitamin_a: micros.vitamin_a,
                vitamin_c: micros.vitamin_c,
                calcium: micros.calcium,
                iron: micros.iron,
            },
            ingredients: raw.ingredients_text,
            allergens: raw.allergens,
            image_url: raw.image_url,
            nova_group: raw
                .nova_group
                .filter(|g| (1..=4).contains(g))
                .map(|g| g as u8),
            eco_score: raw.ecoscore_grade.map(|g| g.trim().to_ascii_lowercase()),
        }
    }

    pub fn calories_kcal(&self) -> Option<f64> {
        self.energy_kj.map(kj_to_kcal)
    }

    pub fn allergen_list(&self) -> Vec<String> {
        self.allergens.as_deref().map(parse_allergens).unwrap_or_default()
    }
}

/// `"en:milk, en:nuts,"` becomes `["milk", "nuts"]`.
pub fn parse_allergens(text: &str) -> Vec<String> {
    lazy_static! {
        static ref LOCALE_PREFIX: Regex = Regex::new(r"^[a-z]{2,3}:").unwrap();
    }
    text.split(',')
        .map(|part| LOCALE_PREFIX.replace(part.trim(), "").trim().to_string())
        .filter(|part| !part.is_empty())
        .collect()
}
