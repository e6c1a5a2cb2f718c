//! Ingredient model
//!
//! An atomic food item with nutrition per 100 g and purchase pricing.

use serde::{Deserialize, Serialize};

use super::{MealType, Nutrition};

/// An ingredient in the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    pub code: i64,
    pub name: String,
    /// Per 100 grams
    pub nutrition: Nutrition,
    /// Meal types this ingredient suits (advisory only)
    pub types: Vec<MealType>,
    pub cooking: bool,
    pub water: bool,
    /// Price of one purchasable unit; NaN when unknown
    pub price_per_unit: f64,
    /// Grams in one purchasable unit; NaN when unknown
    pub unit_size: f64,
    price_per_gram: f64,
}

/// Data for creating a new ingredient
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngredientCreate {
    pub name: String,
    pub nutrition: Nutrition,
    #[serde(default)]
    pub types: Vec<MealType>,
    #[serde(default)]
    pub cooking: bool,
    #[serde(default)]
    pub water: bool,
    pub price_per_unit: f64,
    pub unit_size: f64,
}

/// Data for updating an ingredient. Every field replaces the stored one.
pub type IngredientUpdate = IngredientCreate;

impl Ingredient {
    pub(crate) fn new(code: i64, data: IngredientCreate) -> Self {
        let mut ingredient = Self {
            code,
            name: data.name,
            nutrition: data.nutrition,
            types: data.types,
            cooking: data.cooking,
            water: data.water,
            price_per_unit: data.price_per_unit,
            unit_size: data.unit_size,
            price_per_gram: f64::NAN,
        };
        ingredient.refresh_price_per_gram();
        ingredient
    }

    /// Replace all mutable fields in place. The code is kept.
    pub fn update(&mut self, data: IngredientUpdate) {
        self.name = data.name;
        self.nutrition = data.nutrition;
        self.types = data.types;
        self.cooking = data.cooking;
        self.water = data.water;
        self.price_per_unit = data.price_per_unit;
        self.unit_size = data.unit_size;
        self.refresh_price_per_gram();
    }

    /// `price_per_unit / unit_size`; NaN if either is unknown
    pub fn price_per_gram(&self) -> f64 {
        self.price_per_gram
    }

    /// Nutrition contributed by `amount` grams
    pub fn nutrition_for(&self, amount: f64) -> Nutrition {
        self.nutrition.for_amount(amount)
    }

    /// Cost of `amount` grams
    pub fn cost_for(&self, amount: f64) -> f64 {
        self.price_per_gram * amount
    }

    fn refresh_price_per_gram(&mut self) {
        self.price_per_gram = self.price_per_unit / self.unit_size;
    }
}

impl From<&Ingredient> for IngredientCreate {
    fn from(item: &Ingredient) -> Self {
        Self {
            name: item.name.clone(),
            nutrition: item.nutrition,
            types: item.types.clone(),
            cooking: item.cooking,
            water: item.water,
            price_per_unit: item.price_per_unit,
            unit_size: item.unit_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rolled_oats() -> IngredientCreate {
        IngredientCreate {
            name: "Rolled Oats".to_string(),
            nutrition: Nutrition::from_array([370.0, 6.9, 1.2, 59.0, 1.3, 10.0, 13.0, 0.0]),
            types: vec![MealType::Breakfast],
            cooking: true,
            water: true,
            price_per_unit: 1.15,
            unit_size: 850.0,
        }
    }

    #[test]
    fn test_price_per_gram() {
        let oats = Ingredient::new(0, rolled_oats());
        assert!((oats.price_per_gram() - 0.001353).abs() < 1e-6);
    }

    #[test]
    fn test_unknown_price_is_nan() {
        let mut data = rolled_oats();
        data.price_per_unit = f64::NAN;
        let oats = Ingredient::new(0, data);
        assert!(oats.price_per_gram().is_nan());
        assert!(oats.cost_for(40.0).is_nan());
    }

    #[test]
    fn test_update_recomputes_price_and_keeps_code() {
        let mut oats = Ingredient::new(7, rolled_oats());
        let mut data = rolled_oats();
        data.name = "Jumbo Oats".to_string();
        data.price_per_unit = 2.0;
        data.unit_size = 500.0;
        oats.update(data);

        assert_eq!(oats.code, 7);
        assert_eq!(oats.name, "Jumbo Oats");
        assert!((oats.price_per_gram() - 0.004).abs() < 1e-12);
    }
}
