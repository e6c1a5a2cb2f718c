//! Ingredient MCP Tools
//!
//! Tools for managing the ingredient catalog.

use serde::Serialize;

use crate::db::{DbError, SearchMode};
use crate::models::{Ingredient, IngredientCreate, IngredientUpdate, MealType, Nutrition};
use crate::session::Session;

/// Response for add_ingredient
#[derive(Debug, Serialize)]
pub struct AddIngredientResponse {
    pub code: i64,
    pub name: String,
    pub price_per_gram: f64,
}

/// Summary of an ingredient for list results
#[derive(Debug, Serialize)]
pub struct IngredientSummary {
    pub code: i64,
    pub name: String,
    pub energy: f64,
    pub types: Vec<MealType>,
    pub price_per_gram: f64,
}

impl From<&Ingredient> for IngredientSummary {
    fn from(item: &Ingredient) -> Self {
        Self {
            code: item.code,
            name: item.name.clone(),
            energy: item.nutrition.energy,
            types: item.types.clone(),
            price_per_gram: item.price_per_gram(),
        }
    }
}

/// Full ingredient detail response
#[derive(Debug, Serialize)]
pub struct IngredientDetail {
    #[serde(flatten)]
    pub ingredient: Ingredient,
    pub used_in_meals: Vec<String>,
}

/// Response for list_ingredients
#[derive(Debug, Serialize)]
pub struct ListIngredientsResponse {
    pub items: Vec<IngredientSummary>,
    pub total: usize,
}

/// Response for update_ingredient
#[derive(Debug, Serialize)]
pub struct UpdateIngredientResponse {
    pub success: bool,
    pub price_per_gram: f64,
    pub meals_updated: Vec<i64>,
}

/// Response for delete_ingredient blocked
#[derive(Debug, Serialize)]
pub struct DeleteIngredientBlockedResponse {
    pub error: String,
    pub used_in_meals: Vec<String>,
}

/// Response for successful delete_ingredient
#[derive(Debug, Serialize)]
pub struct DeleteIngredientSuccessResponse {
    pub success: bool,
    pub deleted_code: i64,
}

/// Response for name searches
#[derive(Debug, Serialize)]
pub struct SearchNamesResponse {
    pub names: Vec<String>,
    pub total: usize,
}

/// Raw ingredient fields as entered by a user
#[derive(Debug, Clone)]
pub struct IngredientInput {
    pub name: String,
    pub nutrition: Nutrition,
    pub types: Vec<String>,
    pub cooking: bool,
    pub water: bool,
    /// `None` for an unknown price
    pub price_per_unit: Option<f64>,
    /// `None` for an unknown unit size
    pub unit_size: Option<f64>,
}

impl IngredientInput {
    fn validate(self) -> Result<IngredientCreate, String> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err("Ingredient name cannot be empty".to_string());
        }
        if self.nutrition.as_array().iter().any(|v| *v < 0.0) {
            return Err("Nutrition values cannot be negative".to_string());
        }
        if matches!(self.unit_size, Some(size) if size <= 0.0) {
            return Err("unit_size must be greater than 0".to_string());
        }

        Ok(IngredientCreate {
            name: name.to_string(),
            nutrition: self.nutrition,
            types: parse_meal_types(&self.types)?,
            cooking: self.cooking,
            water: self.water,
            price_per_unit: self.price_per_unit.unwrap_or(f64::NAN),
            unit_size: self.unit_size.unwrap_or(f64::NAN),
        })
    }
}

/// Parse meal type labels such as "Breakfast" or "snack"
pub fn parse_meal_types(labels: &[String]) -> Result<Vec<MealType>, String> {
    let mut types = Vec::new();
    for label in labels {
        let meal_type = MealType::from_name(label)
            .ok_or_else(|| format!("Unknown meal type '{}'; use Breakfast, Lunch, Dinner or Snack", label))?;
        if !types.contains(&meal_type) {
            types.push(meal_type);
        }
    }
    Ok(types)
}

/// Add a new ingredient
pub fn add_ingredient(session: &Session, input: IngredientInput) -> Result<AddIngredientResponse, String> {
    let data = input.validate()?;
    session.with_state_mut(|state| {
        let item = state.database.add_ingredient(data);
        Ok(AddIngredientResponse {
            code: item.code,
            name: item.name.clone(),
            price_per_gram: item.price_per_gram(),
        })
    })
}

/// Get an ingredient by code
pub fn get_ingredient(session: &Session, code: i64) -> Result<Option<IngredientDetail>, String> {
    session.with_state(|state| {
        Ok(state.database.ingredient_by_code(code).map(|item| IngredientDetail {
            ingredient: item.clone(),
            used_in_meals: state.database.meals_using_ingredient(code),
        }))
    })
}

/// List every ingredient in insertion order
pub fn list_ingredients(session: &Session) -> Result<ListIngredientsResponse, String> {
    session.with_state(|state| {
        let items: Vec<IngredientSummary> = state.database.ingredients().iter().map(IngredientSummary::from).collect();
        let total = items.len();
        Ok(ListIngredientsResponse { items, total })
    })
}

/// Replace every field of an ingredient
pub fn update_ingredient(session: &Session, code: i64, input: IngredientInput) -> Result<UpdateIngredientResponse, String> {
    let data: IngredientUpdate = input.validate()?;
    session.with_state_mut(|state| {
        let meals_updated = state
            .database
            .update_ingredient(code, data)
            .map_err(|e| format!("Failed to update ingredient: {}", e))?;
        let price_per_gram = state
            .database
            .ingredient_by_code(code)
            .map(Ingredient::price_per_gram)
            .unwrap_or(f64::NAN);

        Ok(UpdateIngredientResponse {
            success: true,
            price_per_gram,
            meals_updated,
        })
    })
}

/// Delete an ingredient (blocked if used in any meal)
pub fn delete_ingredient(
    session: &Session,
    code: i64,
) -> Result<Result<DeleteIngredientSuccessResponse, DeleteIngredientBlockedResponse>, String> {
    session.with_state_mut(|state| match state.database.remove_ingredient_by_code(code) {
        Ok(_) => Ok(Ok(DeleteIngredientSuccessResponse {
            success: true,
            deleted_code: code,
        })),
        Err(DbError::ItemUsedElsewhere { used_in, .. }) => Ok(Err(DeleteIngredientBlockedResponse {
            error: format!("Cannot delete ingredient: used in {} meal(s)", used_in.len()),
            used_in_meals: used_in,
        })),
        Err(e) => Err(format!("Failed to delete ingredient: {}", e)),
    })
}

/// Search ingredient or meal names
pub fn search_names(session: &Session, mode: SearchMode, query: &str) -> Result<SearchNamesResponse, String> {
    session.with_state(|state| {
        let names = state.database.search_by_name(mode, query);
        let total = names.len();
        Ok(SearchNamesResponse { names, total })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;

    fn input(name: &str) -> IngredientInput {
        IngredientInput {
            name: name.to_string(),
            nutrition: Nutrition::from_array([370.0, 6.9, 1.2, 59.0, 1.3, 10.0, 13.0, 0.0]),
            types: vec!["breakfast".to_string(), "Breakfast".to_string()],
            cooking: true,
            water: true,
            price_per_unit: Some(1.15),
            unit_size: Some(850.0),
        }
    }

    fn session() -> (tempfile::TempDir, Session) {
        let dir = tempfile::tempdir().unwrap();
        let session = Session::new(Settings::new(dir.path()));
        (dir, session)
    }

    #[test]
    fn test_add_and_get() {
        let (_dir, session) = session();
        let added = add_ingredient(&session, input("  Rolled Oats ")).unwrap();
        assert_eq!(added.code, 0);
        assert_eq!(added.name, "Rolled Oats");

        let detail = get_ingredient(&session, 0).unwrap().unwrap();
        assert_eq!(detail.ingredient.types, vec![MealType::Breakfast]);
        assert!(detail.used_in_meals.is_empty());
        assert!(get_ingredient(&session, 5).unwrap().is_none());
    }

    #[test]
    fn test_validation() {
        let (_dir, session) = session();
        assert!(add_ingredient(&session, input(" ")).is_err());

        let mut bad_type = input("Oats");
        bad_type.types = vec!["Brunch".to_string()];
        assert!(add_ingredient(&session, bad_type).unwrap_err().contains("Brunch"));

        let mut unknown_price = input("Herbs");
        unknown_price.price_per_unit = None;
        assert!(add_ingredient(&session, unknown_price).unwrap().price_per_gram.is_nan());
    }

    #[test]
    fn test_delete_missing_is_error() {
        let (_dir, session) = session();
        assert!(delete_ingredient(&session, 3).is_err());
        add_ingredient(&session, input("Oats")).unwrap();
        assert!(delete_ingredient(&session, 0).unwrap().is_ok());
        assert_eq!(list_ingredients(&session).unwrap().total, 0);
    }
}
