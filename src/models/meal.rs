//! Meal model
//!
//! A named set of ingredient amounts with cached totals. Ingredients are held
//! by code and resolved through an [`IngredientSource`] whenever totals are
//! rebuilt, so edits to the catalog reach every meal on recalculation.

use serde::{Deserialize, Serialize};

use crate::db::{DbError, DbResult};
use super::{Ingredient, MealType, Nutrition};

/// Anything that can resolve an ingredient code to the live ingredient
pub trait IngredientSource {
    fn ingredient(&self, code: i64) -> Option<&Ingredient>;

    fn require_ingredient(&self, code: i64) -> DbResult<&Ingredient> {
        self.ingredient(code).ok_or(DbError::IngredientNotFound(code))
    }
}

impl IngredientSource for [Ingredient] {
    fn ingredient(&self, code: i64) -> Option<&Ingredient> {
        self.iter().find(|i| i.code == code)
    }
}

impl IngredientSource for Vec<Ingredient> {
    fn ingredient(&self, code: i64) -> Option<&Ingredient> {
        self.as_slice().ingredient(code)
    }
}

/// One line of a meal: an ingredient code and an amount in grams
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MealIngredient {
    pub ingredient_code: i64,
    pub amount: f64,
}

/// A meal with cached totals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meal {
    pub code: i64,
    pub name: String,
    pub own_types: Vec<MealType>,
    ingredients: Vec<MealIngredient>,
    cooking: bool,
    water: bool,
    cost: f64,
    weight: f64,
    nutrition: Nutrition,
}

/// Data for creating a new meal
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MealCreate {
    pub name: String,
    #[serde(default)]
    pub own_types: Vec<MealType>,
    /// (ingredient code, grams) pairs
    #[serde(default)]
    pub ingredients: Vec<MealIngredient>,
}

/// Cached totals of a meal
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MealTotals {
    pub nutrition: Nutrition,
    pub cost: f64,
    pub weight: f64,
    pub cooking: bool,
    pub water: bool,
}

impl Meal {
    /// An empty meal with zero totals
    pub fn empty(code: i64, name: impl Into<String>, own_types: Vec<MealType>) -> Self {
        Self {
            code,
            name: name.into(),
            own_types,
            ingredients: Vec::new(),
            cooking: false,
            water: false,
            cost: 0.0,
            weight: 0.0,
            nutrition: Nutrition::zero(),
        }
    }

    /// Build a meal and compute its totals once.
    ///
    /// Repeated codes in `data.ingredients` collapse into one line holding
    /// the last amount given.
    pub fn create<S>(code: i64, data: MealCreate, source: &S) -> DbResult<Self>
    where
        S: IngredientSource + ?Sized,
    {
        let mut meal = Self::empty(code, data.name, data.own_types);
        for line in data.ingredients {
            match meal.position_of(line.ingredient_code) {
                Some(pos) => meal.ingredients[pos].amount = line.amount,
                None => meal.ingredients.push(line),
            }
        }
        meal.recalculate(source)?;
        Ok(meal)
    }

    pub fn ingredients(&self) -> &[MealIngredient] {
        &self.ingredients
    }

    pub fn ingredient_codes(&self) -> Vec<i64> {
        self.ingredients.iter().map(|l| l.ingredient_code).collect()
    }

    pub fn ingredient_amounts(&self) -> Vec<f64> {
        self.ingredients.iter().map(|l| l.amount).collect()
    }

    pub fn contains_ingredient(&self, code: i64) -> bool {
        self.position_of(code).is_some()
    }

    pub fn amount_of(&self, code: i64) -> Option<f64> {
        self.position_of(code).map(|pos| self.ingredients[pos].amount)
    }

    pub fn cooking(&self) -> bool {
        self.cooking
    }

    pub fn water(&self) -> bool {
        self.water
    }

    pub fn cost(&self) -> f64 {
        self.cost
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn nutrition(&self) -> Nutrition {
        self.nutrition
    }

    pub fn totals(&self) -> MealTotals {
        MealTotals {
            nutrition: self.nutrition,
            cost: self.cost,
            weight: self.weight,
            cooking: self.cooking,
            water: self.water,
        }
    }

    /// Add an ingredient, or replace its amount if it is already present.
    ///
    /// Appending updates the totals incrementally. Replacing an amount
    /// rebuilds every total from `source`.
    pub fn add_ingredient<S>(&mut self, source: &S, ingredient: &Ingredient, amount: f64) -> DbResult<()>
    where
        S: IngredientSource + ?Sized,
    {
        match self.position_of(ingredient.code) {
            Some(pos) => {
                self.ingredients[pos].amount = amount;
                self.recalculate(source)
            }
            None => {
                self.ingredients.push(MealIngredient {
                    ingredient_code: ingredient.code,
                    amount,
                });
                self.accumulate(ingredient, amount);
                Ok(())
            }
        }
    }

    /// Remove the first line whose ingredient is named `name`.
    ///
    /// Returns `Ok(false)` when no line matches.
    pub fn remove_ingredient_by_name<S>(&mut self, source: &S, name: &str) -> DbResult<bool>
    where
        S: IngredientSource + ?Sized,
    {
        let mut found = None;
        for (pos, line) in self.ingredients.iter().enumerate() {
            if source.require_ingredient(line.ingredient_code)?.name == name {
                found = Some(pos);
                break;
            }
        }

        match found {
            Some(pos) => {
                self.ingredients.remove(pos);
                self.recalculate(source)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Remove the line for an ingredient code. Returns `Ok(false)` if absent.
    pub fn remove_ingredient_by_code<S>(&mut self, source: &S, code: i64) -> DbResult<bool>
    where
        S: IngredientSource + ?Sized,
    {
        match self.position_of(code) {
            Some(pos) => {
                self.ingredients.remove(pos);
                self.recalculate(source)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Rebuild every cached total from the current ingredient lines
    pub fn recalculate<S>(&mut self, source: &S) -> DbResult<()>
    where
        S: IngredientSource + ?Sized,
    {
        // Resolve everything first so a missing code leaves the meal as it was
        let resolved = self
            .ingredients
            .iter()
            .map(|line| source.require_ingredient(line.ingredient_code).map(|i| (i, line.amount)))
            .collect::<DbResult<Vec<_>>>()?;

        self.cooking = false;
        self.water = false;
        self.cost = 0.0;
        self.weight = 0.0;
        self.nutrition = Nutrition::zero();

        for (ingredient, amount) in resolved {
            self.accumulate(ingredient, amount);
        }
        Ok(())
    }

    /// An independent copy for previews; ingredient codes stay shared
    pub fn snapshot(&self) -> Meal {
        self.clone()
    }

    /// Energy summed per ingredient, independent of the cached vector
    pub fn total_energy<S>(&self, source: &S) -> DbResult<f64>
    where
        S: IngredientSource + ?Sized,
    {
        let mut energy = 0.0;
        for line in &self.ingredients {
            let ingredient = source.require_ingredient(line.ingredient_code)?;
            energy += ingredient.nutrition.energy * 0.01 * line.amount;
        }
        Ok(energy)
    }

    fn position_of(&self, code: i64) -> Option<usize> {
        self.ingredients.iter().position(|l| l.ingredient_code == code)
    }

    fn accumulate(&mut self, ingredient: &Ingredient, amount: f64) {
        self.cooking |= ingredient.cooking;
        self.water |= ingredient.water;
        self.cost += ingredient.cost_for(amount);
        self.weight += amount;
        self.nutrition += ingredient.nutrition_for(amount);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::IngredientCreate;

    fn catalog() -> Vec<Ingredient> {
        vec![
            Ingredient::new(
                0,
                IngredientCreate {
                    name: "Rolled Oats".to_string(),
                    nutrition: Nutrition::from_array([370.0, 6.9, 1.2, 59.0, 1.3, 10.0, 13.0, 0.0]),
                    types: vec![MealType::Breakfast],
                    cooking: true,
                    water: true,
                    price_per_unit: 1.15,
                    unit_size: 850.0,
                },
            ),
            Ingredient::new(
                1,
                IngredientCreate {
                    name: "Smooth Peanut Butter".to_string(),
                    nutrition: Nutrition::from_array([641.0, 54.0, 8.7, 11.1, 7.2, 0.0, 24.5, 1.0]),
                    types: vec![MealType::Breakfast, MealType::Snack],
                    cooking: false,
                    water: false,
                    price_per_unit: 2.29,
                    unit_size: 340.0,
                },
            ),
            Ingredient::new(
                2,
                IngredientCreate {
                    name: "Dried Apricots".to_string(),
                    nutrition: Nutrition::from_array([241.0, 0.5, 0.0, 63.0, 53.0, 7.3, 3.4, 0.0]),
                    types: vec![MealType::Snack],
                    cooking: false,
                    water: false,
                    price_per_unit: f64::NAN,
                    unit_size: 200.0,
                },
            ),
        ]
    }

    fn expected_totals(meal: &Meal, source: &[Ingredient]) -> (f64, Nutrition) {
        let weight: f64 = meal.ingredients().iter().map(|l| l.amount).sum();
        let nutrition: Nutrition = meal
            .ingredients()
            .iter()
            .map(|l| source.ingredient(l.ingredient_code).unwrap().nutrition_for(l.amount))
            .sum();
        (weight, nutrition)
    }

    #[test]
    fn test_breakfast_one() {
        let items = catalog();
        let mut meal = Meal::empty(0, "Breakfast 1", vec![MealType::Breakfast]);
        meal.add_ingredient(&items, &items[0], 40.0).unwrap();

        assert_eq!(meal.weight(), 40.0);
        assert!((meal.nutrition()[0] - 148.0).abs() < 1e-9);
        assert!(meal.cooking());
        assert!(meal.water());
        assert!((meal.cost() - 1.15 / 850.0 * 40.0).abs() < 1e-12);
    }

    #[test]
    fn test_add_existing_replaces_amount() {
        let items = catalog();
        let mut meal = Meal::empty(0, "Breakfast 1", vec![MealType::Breakfast]);
        meal.add_ingredient(&items, &items[0], 40.0).unwrap();
        meal.add_ingredient(&items, &items[1], 20.0).unwrap();
        meal.add_ingredient(&items, &items[0], 60.0).unwrap();

        assert_eq!(meal.ingredients().len(), 2);
        assert_eq!(meal.amount_of(0), Some(60.0));
        assert_eq!(meal.weight(), 80.0);
    }

    #[test]
    fn test_add_same_amount_twice_is_idempotent() {
        let items = catalog();
        let mut meal = Meal::empty(0, "Breakfast 1", vec![MealType::Breakfast]);
        meal.add_ingredient(&items, &items[1], 20.0).unwrap();
        meal.add_ingredient(&items, &items[0], 40.0).unwrap();
        let once = meal.snapshot();
        meal.add_ingredient(&items, &items[0], 40.0).unwrap();

        assert_eq!(meal.ingredients(), once.ingredients());
        assert_eq!(meal.weight(), once.weight());
        assert!(meal.nutrition().approx_eq(&once.nutrition(), 1e-9));
        assert!((meal.cost() - once.cost()).abs() < 1e-12);
    }

    #[test]
    fn test_totals_consistent_after_mixed_edits() {
        let items = catalog();
        let mut meal = Meal::empty(3, "Trail Mix", vec![MealType::Snack]);
        meal.add_ingredient(&items, &items[1], 30.0).unwrap();
        meal.add_ingredient(&items, &items[0], 50.0).unwrap();
        meal.add_ingredient(&items, &items[1], 15.0).unwrap();
        assert!(meal.remove_ingredient_by_name(&items, "Rolled Oats").unwrap());
        meal.add_ingredient(&items, &items[0], 25.0).unwrap();

        let (weight, nutrition) = expected_totals(&meal, &items);
        assert!((meal.weight() - weight).abs() < 1e-9);
        assert!(meal.nutrition().approx_eq(&nutrition, 1e-9));
    }

    #[test]
    fn test_remove_rescans_flags() {
        let items = catalog();
        let mut meal = Meal::empty(0, "Breakfast 1", vec![MealType::Breakfast]);
        meal.add_ingredient(&items, &items[0], 40.0).unwrap();
        meal.add_ingredient(&items, &items[1], 20.0).unwrap();
        assert!(meal.cooking());

        assert!(meal.remove_ingredient_by_name(&items, "Rolled Oats").unwrap());
        assert!(!meal.cooking());
        assert!(!meal.water());
        assert_eq!(meal.weight(), 20.0);
    }

    #[test]
    fn test_remove_missing_name_returns_false() {
        let items = catalog();
        let mut meal = Meal::empty(0, "Breakfast 1", vec![]);
        meal.add_ingredient(&items, &items[0], 40.0).unwrap();
        assert!(!meal.remove_ingredient_by_name(&items, "Granola").unwrap());
        assert_eq!(meal.ingredients().len(), 1);
    }

    #[test]
    fn test_remove_by_name_picks_first_of_duplicates() {
        let mut items = catalog();
        items[2].name = "Rolled Oats".to_string();
        let mut meal = Meal::empty(0, "Porridge", vec![]);
        meal.add_ingredient(&items, &items[2], 10.0).unwrap();
        meal.add_ingredient(&items, &items[0], 40.0).unwrap();

        assert!(meal.remove_ingredient_by_name(&items, "Rolled Oats").unwrap());
        assert_eq!(meal.ingredient_codes(), vec![0]);
    }

    #[test]
    fn test_nan_price_propagates_to_cost() {
        let items = catalog();
        let mut meal = Meal::empty(0, "Snack", vec![MealType::Snack]);
        meal.add_ingredient(&items, &items[1], 20.0).unwrap();
        meal.add_ingredient(&items, &items[2], 30.0).unwrap();

        assert!(meal.cost().is_nan());
        assert_eq!(meal.weight(), 50.0);
    }

    #[test]
    fn test_create_computes_totals_once() {
        let items = catalog();
        let data = MealCreate {
            name: "Breakfast 2".to_string(),
            own_types: vec![MealType::Breakfast],
            ingredients: vec![
                MealIngredient { ingredient_code: 0, amount: 40.0 },
                MealIngredient { ingredient_code: 1, amount: 20.0 },
            ],
        };
        let meal = Meal::create(5, data, items.as_slice()).unwrap();

        assert_eq!(meal.code, 5);
        assert_eq!(meal.weight(), 60.0);
        assert!((meal.nutrition().energy - (148.0 + 128.2)).abs() < 1e-9);
    }

    #[test]
    fn test_create_with_unknown_code_fails() {
        let items = catalog();
        let data = MealCreate {
            name: "Mystery".to_string(),
            own_types: vec![],
            ingredients: vec![MealIngredient { ingredient_code: 99, amount: 1.0 }],
        };
        assert!(matches!(
            Meal::create(0, data, &items),
            Err(DbError::IngredientNotFound(99))
        ));
    }

    #[test]
    fn test_snapshot_is_independent() {
        let items = catalog();
        let mut meal = Meal::empty(0, "Breakfast 1", vec![]);
        meal.add_ingredient(&items, &items[0], 40.0).unwrap();

        let mut preview = meal.snapshot();
        preview.add_ingredient(&items, &items[1], 20.0).unwrap();

        assert_eq!(meal.ingredients().len(), 1);
        assert_eq!(meal.weight(), 40.0);
        assert_eq!(preview.weight(), 60.0);
    }

    #[test]
    fn test_total_energy_matches_vector() {
        let items = catalog();
        let mut meal = Meal::empty(0, "Breakfast 1", vec![]);
        meal.add_ingredient(&items, &items[0], 40.0).unwrap();
        meal.add_ingredient(&items, &items[1], 20.0).unwrap();

        let energy = meal.total_energy(&items).unwrap();
        assert!((energy - meal.nutrition().energy).abs() < 1e-9);
    }

    #[test]
    fn test_recalculate_picks_up_catalog_edits() {
        let mut items = catalog();
        let mut meal = Meal::empty(0, "Breakfast 1", vec![]);
        meal.add_ingredient(&items, &items[0], 100.0).unwrap();

        items[0].nutrition.energy = 400.0;
        meal.recalculate(&items).unwrap();
        assert!((meal.nutrition().energy - 400.0).abs() < 1e-9);
    }
}
