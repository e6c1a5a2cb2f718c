//! Meal MCP Tools
//!
//! Tools for composing meals from catalog ingredients.

use serde::Serialize;

use crate::db::{DbError, LocalDatabase};
use crate::models::{Meal, MealCreate, MealIngredient, MealTotals, MealType, Nutrition};
use crate::session::Session;
use crate::tools::ingredients::parse_meal_types;

/// An ingredient line as entered by a user: the ingredient by code or name
#[derive(Debug, Clone)]
pub struct MealLineInput {
    pub ingredient_code: Option<i64>,
    pub ingredient_name: Option<String>,
    pub amount: f64,
}

/// One ingredient line with its resolved name
#[derive(Debug, Serialize)]
pub struct MealLineDetail {
    pub ingredient_code: i64,
    pub ingredient_name: String,
    pub amount: f64,
}

/// Full meal detail response
#[derive(Debug, Serialize)]
pub struct MealDetail {
    pub code: i64,
    pub name: String,
    pub own_types: Vec<MealType>,
    pub ingredients: Vec<MealLineDetail>,
    pub cooking: bool,
    pub water: bool,
    pub cost: f64,
    pub weight: f64,
    pub nutrition: Nutrition,
}

impl MealDetail {
    pub fn from_meal(meal: &Meal, db: &LocalDatabase) -> Self {
        let ingredients = meal
            .ingredients()
            .iter()
            .map(|line| MealLineDetail {
                ingredient_code: line.ingredient_code,
                ingredient_name: db
                    .ingredient_by_code(line.ingredient_code)
                    .map(|i| i.name.clone())
                    .unwrap_or_default(),
                amount: line.amount,
            })
            .collect();

        Self {
            code: meal.code,
            name: meal.name.clone(),
            own_types: meal.own_types.clone(),
            ingredients,
            cooking: meal.cooking(),
            water: meal.water(),
            cost: meal.cost(),
            weight: meal.weight(),
            nutrition: meal.nutrition(),
        }
    }
}

/// Summary of a meal for list results
#[derive(Debug, Serialize)]
pub struct MealSummary {
    pub code: i64,
    pub name: String,
    pub own_types: Vec<MealType>,
    pub energy: f64,
    pub weight: f64,
    pub cost: f64,
    pub cooking: bool,
}

impl From<&Meal> for MealSummary {
    fn from(meal: &Meal) -> Self {
        Self {
            code: meal.code,
            name: meal.name.clone(),
            own_types: meal.own_types.clone(),
            energy: meal.nutrition().energy,
            weight: meal.weight(),
            cost: meal.cost(),
            cooking: meal.cooking(),
        }
    }
}

/// Response for list_meals
#[derive(Debug, Serialize)]
pub struct ListMealsResponse {
    pub items: Vec<MealSummary>,
    pub total: usize,
}

/// Response for remove_ingredient_from_meal
#[derive(Debug, Serialize)]
pub struct RemoveMealIngredientResponse {
    pub removed: bool,
    pub meal: MealDetail,
}

/// Response for preview_ingredient_in_meal
#[derive(Debug, Serialize)]
pub struct PreviewMealResponse {
    pub current: MealTotals,
    pub preview: MealTotals,
    pub energy_difference: f64,
}

/// Response for delete_meal
#[derive(Debug, Serialize)]
pub struct DeleteMealResponse {
    pub success: bool,
    pub deleted_code: i64,
}

/// Resolve an ingredient given by code or by name to its code
fn resolve_ingredient(db: &LocalDatabase, line: &MealLineInput) -> Result<i64, String> {
    match (line.ingredient_code, line.ingredient_name.as_deref()) {
        (Some(code), _) => db
            .ingredient_by_code(code)
            .map(|i| i.code)
            .ok_or_else(|| DbError::IngredientNotFound(code).to_string()),
        (None, Some(name)) => db
            .ingredient_by_name(name.trim())
            .map(|i| i.code)
            .ok_or_else(|| format!("No ingredient named '{}'", name.trim())),
        (None, None) => Err(DbError::NoIngredientPassed.to_string()),
    }
}

fn check_amount(amount: f64) -> Result<(), String> {
    if amount.is_finite() && amount > 0.0 {
        Ok(())
    } else {
        Err(format!("amount must be a positive number of grams, got {}", amount))
    }
}

/// Create a new meal
pub fn create_meal(
    session: &Session,
    name: &str,
    own_types: &[String],
    lines: Vec<MealLineInput>,
) -> Result<MealDetail, String> {
    let name = name.trim();
    if name.is_empty() {
        return Err("Meal name cannot be empty".to_string());
    }
    let own_types = parse_meal_types(own_types)?;
    for line in &lines {
        check_amount(line.amount)?;
    }

    session.with_state_mut(|state| {
        let mut ingredients = Vec::with_capacity(lines.len());
        for line in &lines {
            let ingredient_code = resolve_ingredient(&state.database, line).map_err(|e| format!("Failed to create meal: {}", e))?;
            ingredients.push(MealIngredient {
                ingredient_code,
                amount: line.amount,
            });
        }

        let data = MealCreate {
            name: name.to_string(),
            own_types,
            ingredients,
        };
        let code = state
            .database
            .add_meal(data)
            .map_err(|e| format!("Failed to create meal: {}", e))?
            .code;
        find_detail(&state.database, code)
    })
}

fn find_detail(db: &LocalDatabase, code: i64) -> Result<MealDetail, String> {
    db.meal_by_code(code)
        .map(|meal| MealDetail::from_meal(meal, db))
        .ok_or_else(|| format!("Meal not found with code: {}", code))
}

/// Get a meal by code
pub fn get_meal(session: &Session, code: i64) -> Result<Option<MealDetail>, String> {
    session.with_state(|state| Ok(state.database.meal_by_code(code).map(|meal| MealDetail::from_meal(meal, &state.database))))
}

/// List every meal in insertion order
pub fn list_meals(session: &Session) -> Result<ListMealsResponse, String> {
    session.with_state(|state| {
        let items: Vec<MealSummary> = state.database.meals().iter().map(MealSummary::from).collect();
        let total = items.len();
        Ok(ListMealsResponse { items, total })
    })
}

/// Rename a meal or change its own meal types
pub fn update_meal_details(
    session: &Session,
    code: i64,
    name: Option<&str>,
    own_types: Option<&[String]>,
) -> Result<MealDetail, String> {
    let own_types = own_types.map(parse_meal_types).transpose()?;

    session.with_state_mut(|state| {
        let mut meal = state
            .database
            .meal_by_code(code)
            .ok_or_else(|| format!("Meal not found with code: {}", code))?
            .snapshot();

        if let Some(name) = name.map(str::trim) {
            if name.is_empty() {
                return Err("Meal name cannot be empty".to_string());
            }
            meal.name = name.to_string();
        }
        if let Some(own_types) = own_types {
            meal.own_types = own_types;
        }

        state.database.replace_meal(code, meal);
        find_detail(&state.database, code)
    })
}

/// Add an ingredient to a meal, or change the amount of one already in it
pub fn add_ingredient_to_meal(session: &Session, meal_code: i64, line: MealLineInput) -> Result<MealDetail, String> {
    check_amount(line.amount)?;
    session.with_state_mut(|state| {
        let ingredient_code = resolve_ingredient(&state.database, &line).map_err(|e| format!("Failed to add ingredient: {}", e))?;
        state
            .database
            .add_ingredient_to_meal(meal_code, ingredient_code, line.amount)
            .map_err(|e| format!("Failed to add ingredient: {}", e))?;
        find_detail(&state.database, meal_code)
    })
}

/// Remove the first ingredient with this name from a meal
pub fn remove_ingredient_from_meal(
    session: &Session,
    meal_code: i64,
    ingredient_name: &str,
) -> Result<RemoveMealIngredientResponse, String> {
    session.with_state_mut(|state| {
        let removed = state
            .database
            .remove_ingredient_from_meal(meal_code, ingredient_name.trim())
            .map_err(|e| format!("Failed to remove ingredient: {}", e))?;
        Ok(RemoveMealIngredientResponse {
            removed,
            meal: find_detail(&state.database, meal_code)?,
        })
    })
}

/// Show a meal's totals with an ingredient added, without changing it
pub fn preview_ingredient_in_meal(session: &Session, meal_code: i64, line: MealLineInput) -> Result<PreviewMealResponse, String> {
    check_amount(line.amount)?;
    session.with_state(|state| {
        let ingredient_code = resolve_ingredient(&state.database, &line).map_err(|e| format!("Failed to preview: {}", e))?;
        let current = state
            .database
            .meal_by_code(meal_code)
            .ok_or_else(|| format!("Meal not found with code: {}", meal_code))?
            .totals();
        let preview = state
            .database
            .preview_ingredient_in_meal(meal_code, ingredient_code, line.amount)
            .map_err(|e| format!("Failed to preview: {}", e))?
            .totals();

        Ok(PreviewMealResponse {
            energy_difference: preview.nutrition.energy - current.nutrition.energy,
            current,
            preview,
        })
    })
}

/// Delete a meal. Trip slots still naming it are skipped from then on.
pub fn delete_meal(session: &Session, code: i64) -> Result<DeleteMealResponse, String> {
    session.with_state_mut(|state| {
        if !state.database.remove_meal_by_code(code) {
            return Err(format!("Meal not found with code: {}", code));
        }
        Ok(DeleteMealResponse {
            success: true,
            deleted_code: code,
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::tools::ingredients::{add_ingredient, IngredientInput};

    fn session() -> (tempfile::TempDir, Session) {
        let dir = tempfile::tempdir().unwrap();
        let session = Session::new(Settings::new(dir.path()));
        for (name, energy) in [("Rolled Oats", 370.0), ("Smooth Peanut Butter", 641.0)] {
            add_ingredient(
                &session,
                IngredientInput {
                    name: name.to_string(),
                    nutrition: Nutrition::from_array([energy, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]),
                    types: vec![],
                    cooking: false,
                    water: false,
                    price_per_unit: Some(1.0),
                    unit_size: Some(100.0),
                },
            )
            .unwrap();
        }
        (dir, session)
    }

    fn by_name(name: &str, amount: f64) -> MealLineInput {
        MealLineInput {
            ingredient_code: None,
            ingredient_name: Some(name.to_string()),
            amount,
        }
    }

    #[test]
    fn test_create_by_name_and_code() {
        let (_dir, session) = session();
        let lines = vec![
            by_name("Rolled Oats", 40.0),
            MealLineInput { ingredient_code: Some(1), ingredient_name: None, amount: 20.0 },
        ];
        let meal = create_meal(&session, "Breakfast 1", &["Breakfast".to_string()], lines).unwrap();

        assert_eq!(meal.ingredients[1].ingredient_name, "Smooth Peanut Butter");
        assert!((meal.nutrition.energy - 276.2).abs() < 1e-9);
        assert_eq!(meal.weight, 60.0);
    }

    #[test]
    fn test_missing_ingredient_reference() {
        let (_dir, session) = session();
        let line = MealLineInput { ingredient_code: None, ingredient_name: None, amount: 10.0 };
        let err = create_meal(&session, "Nothing", &[], vec![line]).unwrap_err();
        assert!(err.contains("No ingredient"));
        assert!(create_meal(&session, "Bad", &[], vec![by_name("Rolled Oats", -1.0)]).is_err());
    }

    #[test]
    fn test_preview_and_edit() {
        let (_dir, session) = session();
        create_meal(&session, "Porridge", &[], vec![by_name("Rolled Oats", 50.0)]).unwrap();

        let preview = preview_ingredient_in_meal(&session, 0, by_name("Smooth Peanut Butter", 10.0)).unwrap();
        assert!((preview.energy_difference - 64.1).abs() < 1e-9);
        assert_eq!(get_meal(&session, 0).unwrap().unwrap().weight, 50.0);

        add_ingredient_to_meal(&session, 0, by_name("Smooth Peanut Butter", 10.0)).unwrap();
        let removed = remove_ingredient_from_meal(&session, 0, "Rolled Oats").unwrap();
        assert!(removed.removed);
        assert_eq!(removed.meal.weight, 10.0);
    }

    #[test]
    fn test_rename_keeps_code_and_position() {
        let (_dir, session) = session();
        create_meal(&session, "A", &[], vec![]).unwrap();
        create_meal(&session, "B", &[], vec![]).unwrap();

        let renamed = update_meal_details(&session, 0, Some("Alpha"), Some(&["snack".to_string()])).unwrap();
        assert_eq!(renamed.code, 0);
        assert_eq!(renamed.own_types, vec![MealType::Snack]);
        let names: Vec<String> = list_meals(&session).unwrap().items.into_iter().map(|m| m.name).collect();
        assert_eq!(names, vec!["Alpha", "B"]);

        assert!(delete_meal(&session, 0).unwrap().success);
        assert!(delete_meal(&session, 0).is_err());
    }
}
