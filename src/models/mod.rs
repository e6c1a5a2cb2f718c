//! Data models
//!
//! Rust structs for the catalog, meals, trips and shopping lists.

mod ingredient;
mod meal;
mod meal_type;
mod nutrition;
mod shopping_list;
mod trip;

pub use ingredient::{Ingredient, IngredientCreate, IngredientUpdate};
pub use meal::{IngredientSource, Meal, MealCreate, MealIngredient, MealTotals};
pub use meal_type::MealType;
pub use nutrition::{Nutrition, NUTRIENT_COUNT, NUTRIENT_LABELS};
pub use shopping_list::{ShoppingList, ShoppingListRow};
pub use trip::{DayPlan, DaySummary, MealSource, Trip, TripSummary};
