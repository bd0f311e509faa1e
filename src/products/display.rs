//! Turning a [`Product`] into what the result screen shows.

use serde::{Deserialize, Serialize};

use super::model::Product;

pub const NOT_AVAILABLE: &str = "not available";

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("serving multiplier must be between 0.5 and 3.0, got {0}")]
pub struct InvalidMultiplier(pub f64);

/// Scales every displayed quantity. Snaps to 0.1 steps inside [0.5, 3.0].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ServingMultiplier(f64);

impl ServingMultiplier {
    pub const MIN: f64 = 0.5;
    pub const MAX: f64 = 3.0;
    pub const STEP: f64 = 0.1;

    pub fn new(value: f64) -> Result<Self, InvalidMultiplier> {
        if !value.is_finite() || !(Self::MIN..=Self::MAX).contains(&value) {
            return Err(InvalidMultiplier(value));
        }
        let snapped = (value / Self::STEP).round() * Self::STEP;
        // 10ths keep the float tidy, 2.0000000000000004 would leak into JSON
        Ok(Self((snapped * 10.0).round() / 10.0))
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl Default for ServingMultiplier {
    fn default() -> Self {
        Self(1.0)
    }
}

impl<'de> Deserialize<'de> for ServingMultiplier {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let raw = f64::deserialize(d)?;
        Self::new(raw).map_err(serde::de::Error::custom)
    }
}

/// Ordinal colour classification shared by eco-score and NOVA badges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Favorable,
    Good,
    Moderate,
    Unfavorable,
    Neutral,
}

impl Tone {
    pub fn for_eco_score(grade: Option<&str>) -> Self {
        match grade.map(|g| g.trim().to_ascii_lowercase()).as_deref() {
            Some("a") => Tone::Favorable,
            Some("b") => Tone::Good,
            Some("c") => Tone::Moderate,
            Some("d") | Some("e") => Tone::Unfavorable,
            _ => Tone::Neutral,
        }
    }

    pub fn for_nova_group(group: Option<u8>) -> Self {
        match group {
            Some(1) => Tone::Favorable,
            Some(2) => Tone::Good,
            Some(3) => Tone::Moderate,
            Some(4) => Tone::Unfavorable,
            _ => Tone::Neutral,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Badge {
    pub label: String,
    pub tone: Tone,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MicronutrientDisplay {
    pub vitamin_a: String,
    pub vitamin_c: String,
    pub calcium: String,
    pub iron: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NutritionDisplay {
    pub barcode: String,
    pub name: String,
    pub brand: Option<String>,
    pub serving_size: String,
    pub multiplier: ServingMultiplier,
    pub calories: String,
    pub protein: String,
    pub carbohydrates: String,
    pub fat: String,
    pub fiber: String,
    pub sugar: String,
    pub salt: String,
    pub micronutrients: MicronutrientDisplay,
    pub ingredients: String,
    pub allergens: Vec<String>,
    pub image_url: Option<String>,
    pub eco_score: Badge,
    pub nova: Option<Badge>,
}

/// Rounds to one decimal after scaling; `None` stays "not available".
pub fn format_nutrient(value: Option<f64>, unit: &str, m: ServingMultiplier) -> String {
    match value {
        Some(v) if v.is_finite() => {
            let scaled = (v * m.value() * 10.0).round() / 10.0;
            format!("{scaled}{unit}")
        }
        _ => NOT_AVAILABLE.to_string(),
    }
}

pub fn format_calories(product: &Product, m: ServingMultiplier) -> String {
    match product.calories_kcal() {
        Some(kcal) => format!("{}", (kcal * m.value()).round()),
        None => NOT_AVAILABLE.to_string(),
    }
}

fn or_not_available(value: &Option<String>) -> String {
    value.clone().unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

impl NutritionDisplay {
    pub fn render(product: &Product, m: ServingMultiplier) -> Self {
        let micros = &product.micronutrients;
        Self {
            barcode: product.barcode.clone(),
            name: product.name.clone(),
            brand: product.brand.clone(),
            serving_size: product.serving_size.clone(),
            multiplier: m,
            calories: format_calories(product, m),
            protein: format_nutrient(product.protein_g, "g", m),
            carbohydrates: format_nutrient(product.carbohydrates_g, "g", m),
            fat: format_nutrient(product.fat_g, "g", m),
            fiber: format_nutrient(product.fiber_g, "g", m),
            sugar: format_nutrient(product.sugar_g, "g", m),
            salt: format_nutrient(product.salt_g, "g", m),
            micronutrients: MicronutrientDisplay {
                vitamin_a: or_not_available(&micros.vitamin_a),
                vitamin_c: or_not_available(&micros.vitamin_c),
                calcium: or_not_available(&micros.calcium),
                iron: or_not_available(&micros.iron),
            },
            ingredients: or_not_available(&product.ingredients),
            allergens: product.allergen_list(),
            image_url: product.image_url.clone(),
            eco_score: Badge {
                label: product
                    .eco_score
                    .as_deref()
                    .map(str::to_ascii_uppercase)
                    .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
                tone: Tone::for_eco_score(product.eco_score.as_deref()),
            },
            nova: product.nova_group.map(|g| Badge {
                label: format!("NOVA {g}"),
                tone: Tone::for_nova_group(Some(g)),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::products::repo_types::RawProduct;

    fn product() -> Product {
        let mut p = Product::from_raw("42", RawProduct::default());
        p.energy_kj = Some(1850.0);
        p.protein_g = Some(12.0);
        p
    }

    #[test]
    fn calories_convert_from_kilojoules() {
        assert_eq!(format_calories(&product(), ServingMultiplier::default()), "442");
        let double = ServingMultiplier::new(2.0).unwrap();
        assert_eq!(format_calories(&product(), double), "884");
    }

    #[test]
    fn multiplier_scales_grams() {
        let p = product();
        assert_eq!(format_nutrient(p.protein_g, "g", ServingMultiplier::default()), "12g");
        let m = ServingMultiplier::new(2.0).unwrap();
        assert_eq!(format_nutrient(p.protein_g, "g", m), "24g");
        let m = ServingMultiplier::new(1.5).unwrap();
        assert_eq!(format_nutrient(Some(2.0), "g", m), "3g");
        assert_eq!(format_nutrient(Some(3.4), "g", m), "5.1g");
    }

    #[test]
    fn missing_values_are_not_zero() {
        let display = NutritionDisplay::render(&product(), ServingMultiplier::default());
        assert_eq!(display.fiber, NOT_AVAILABLE);
        assert_ne!(display.fiber, "0g");
        assert_eq!(display.micronutrients.iron, NOT_AVAILABLE);
        assert_eq!(display.serving_size, "100g");
        assert_eq!(display.eco_score.tone, Tone::Neutral);
        assert!(display.nova.is_none());

        let mut zero = product();
        zero.fiber_g = Some(0.0);
        let display = NutritionDisplay::render(&zero, ServingMultiplier::default());
        assert_eq!(display.fiber, "0g");
    }

    #[test]
    fn multiplier_bounds_and_step() {
        assert!(ServingMultiplier::new(0.4).is_err());
        assert!(ServingMultiplier::new(3.1).is_err());
        assert!(ServingMultiplier::new(f64::NAN).is_err());
        assert_eq!(ServingMultiplier::new(0.5).unwrap().value(), 0.5);
        assert_eq!(ServingMultiplier::new(1.26).unwrap().value(), 1.3);
        assert_eq!(ServingMultiplier::new(3.0).unwrap().value(), 3.0);

        let parsed: Result<ServingMultiplier, _> = serde_json::from_str("7.5");
        assert!(parsed.is_err());
    }

    #[test]
    fn grades_map_to_tones() {
        assert_eq!(Tone::for_eco_score(Some("A")), Tone::Favorable);
        assert_eq!(Tone::for_eco_score(Some("b")), Tone::Good);
        assert_eq!(Tone::for_eco_score(Some("c")), Tone::Moderate);
        assert_eq!(Tone::for_eco_score(Some("e")), Tone::Unfavorable);
        assert_eq!(Tone::for_eco_score(Some("unknown")), Tone::Neutral);
        assert_eq!(Tone::for_eco_score(None), Tone::Neutral);

        assert_eq!(Tone::for_nova_group(Some(1)), Tone::Favorable);
        assert_eq!(Tone::for_nova_group(Some(4)), Tone::Unfavorable);
        assert_eq!(Tone::for_nova_group(None), Tone::Neutral);
    }
}
