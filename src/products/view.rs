use serde::Serialize;

use super::display::{NutritionDisplay, ServingMultiplier};
use super::model::Product;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewError {
    pub code: &'static str,
    pub message: String,
}

/// What the scan screen currently shows: the last good product (if any),
/// its serving multiplier and at most one dismissible error.
#[derive(Debug, Clone, Default)]
pub struct ResultView {
    product: Option<Product>,
    multiplier: ServingMultiplier,
    error: Option<ViewError>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResultSnapshot {
    pub nutrition: Option<NutritionDisplay>,
    pub error: Option<ViewError>,
}

impl ResultView {
    pub fn show(&mut self, product: Product) {
        self.product = Some(product);
        self.multiplier = ServingMultiplier::default();
        self.error = None;
    }

    /// Leaves any previously shown product untouched.
    pub fn fail(&mut self, code: &'static str, message: String) {
        self.error = Some(ViewError { code, message });
    }

    pub fn set_multiplier(&mut self, multiplier: ServingMultiplier) {
        self.multiplier = multiplier;
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    /// Back to the scanner view.
    pub fn reset(&mut self) {
        self.product = None;
        self.multiplier = ServingMultiplier::default();
    }

    pub fn product(&self) -> Option<&Product> {
        self.product.as_ref()
    }

    pub fn snapshot(&self) -> ResultSnapshot {
        ResultSnapshot {
            nutrition: self
                .product
                .as_ref()
                .map(|p| NutritionDisplay::render(p, self.multiplier)),
            error: self.error.clone(),
        }
    }
}
