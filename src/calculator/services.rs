use uuid::Uuid;

use super::dto::{MealTotals, NutritionItem, SelectedIngredient};

/// Ingredients picked for the meal being calculated. Lives in memory only.
#[derive(Debug, Clone, Default)]
pub struct MealBuilder {
    ingredients: Vec<SelectedIngredient>,
}

impl MealBuilder {
    pub fn add(&mut self, item: NutritionItem) -> SelectedIngredient {
        let selected = SelectedIngredient {
            id: Uuid::new_v4(),
            item,
        };
        self.ingredients.push(selected.clone());
        selected
    }

    pub fn remove(&mut self, id: Uuid) -> bool {
        let before = self.ingredients.len();
        self.ingredients.retain(|i| i.id != id);
        self.ingredients.len() != before
    }

    pub fn ingredients(&self) -> &[SelectedIngredient] {
        &self.ingredients
    }

    pub fn totals(&self) -> MealTotals {
        self.ingredients
            .iter()
            .fold(MealTotals::default(), |mut acc, i| {
                acc.calories += i.item.calories;
                acc.protein_g += i.item.protein_g;
                acc.carbohydrates_g += i.item.carbohydrates_total_g;
                acc.fat_g += i.item.fat_total_g;
                acc
            })
    }
}
