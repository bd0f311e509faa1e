//! Wire shapes of the food-database product endpoint.
//!
//! Every field is optional and tolerant of the wrong JSON type: a value that
//! cannot be read is treated as missing instead of failing the whole record.

use serde::{de::DeserializeOwned, Deserialize, Deserializer};
use serde_json::Value;

#[derive(Debug, Default, Deserialize)]
pub struct ProductEnvelope {
    #[serde(default, deserialize_with = "lenient::integer")]
    pub status: Option<i64>,
    #[serde(default, deserialize_with = "lenient::object")]
    pub product: Option<RawProduct>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawProduct {
    #[serde(default, deserialize_with = "lenient::text")]
    pub product_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub brands: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub serving_size: Option<String>,
    #[serde(default, deserialize_with = "lenient::object")]
    pub nutriments: Option<RawNutriments>,
    #[serde(default, deserialize_with = "lenient::object")]
    pub nutrients: Option<RawMicronutrients>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub ingredients_text: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub allergens: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub image_url: Option<String>,
    #[serde(default, deserialize_with = "lenient::integer")]
    pub nova_group: Option<i64>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub ecoscore_grade: Option<String>,
}

/// Per-100g values; `energy` is in kJ.
#[derive(Debug, Default, Deserialize)]
pub struct RawNutriments {
    #[serde(default, deserialize_with = "lenient::number")]
    pub energy: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub proteins: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub carbohydrates: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub fat: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub fiber: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub sugars: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub salt: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawMicronutrients {
    #[serde(rename = "vitamin-a", default, deserialize_with = "lenient::text")]
    pub vitamin_a: Option<String>,
    #[serde(rename = "vitamin-c", default, deserialize_with = "lenient::text")]
    pub vitamin_c: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub calcium: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub iron: Option<String>,
}

mod lenient {
    use super::*;

    pub fn number<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
            Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
            _ => None,
        })
    }

    pub fn integer<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Number(n) => n.as_i64().or_else(|| {
                n.as_f64()
                    .filter(|v| v.fract() == 0.0 && v.is_finite())
                    .map(|v| v as i64)
            }),
            Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        })
    }

    pub fn text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::String(s) if !s.trim().is_empty() => Some(s),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
    }

    pub fn object<'de, D, T>(d: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned,
    {
        Ok(match Value::deserialize(d)? {
            v @ Value::Object(_) => serde_json::from_value(v).ok(),
            _ => None,
        })
    }
}
