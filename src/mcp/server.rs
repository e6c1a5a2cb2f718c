//! TrailFood MCP Server Implementation
//!
//! Implements the MCP server with all planner tools.

use std::sync::Arc;

use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo,
};
use rmcp::{schemars, tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::db::SearchMode;
use crate::models::Nutrition;
use crate::session::Session;
use crate::tools::database;
use crate::tools::ingredients::{self, IngredientInput};
use crate::tools::meals::{self, MealLineInput};
use crate::tools::shopping;
use crate::tools::status::StatusTracker;
use crate::tools::trips;

/// TrailFood MCP Service
#[derive(Clone)]
pub struct TrailFoodService {
    status_tracker: Arc<Mutex<StatusTracker>>,
    session: Session,
    tool_router: ToolRouter<TrailFoodService>,
}

impl TrailFoodService {
    pub fn new(session: Session) -> Self {
        let data_root = session.settings().home.clone();
        Self {
            status_tracker: Arc::new(Mutex::new(StatusTracker::new(data_root))),
            session,
            tool_router: Self::tool_router(),
        }
    }
}

fn to_result<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(value).map_err(|e| McpError::internal_error(e.to_string(), None))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

// ============================================================================
// Ingredient Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct IngredientParams {
    pub name: String,
    /// kcal per 100 g
    pub energy: f64,
    #[serde(default)]
    pub fat: f64,
    #[serde(default)]
    pub saturated_fat: f64,
    #[serde(default)]
    pub carbs: f64,
    #[serde(default)]
    pub sugar: f64,
    #[serde(default)]
    pub fiber: f64,
    #[serde(default)]
    pub protein: f64,
    #[serde(default)]
    pub salt: f64,
    /// Meal types this ingredient suits: Breakfast, Lunch, Dinner, Snack
    #[serde(default)]
    pub types: Vec<String>,
    #[serde(default)]
    pub cooking: bool,
    #[serde(default)]
    pub water: bool,
    /// Price of one purchasable unit; omit if unknown
    pub price_per_unit: Option<f64>,
    /// Grams in one purchasable unit; omit if unknown
    pub unit_size: Option<f64>,
}

impl From<IngredientParams> for IngredientInput {
    fn from(p: IngredientParams) -> Self {
        Self {
            name: p.name,
            nutrition: Nutrition {
                energy: p.energy,
                fat: p.fat,
                saturated_fat: p.saturated_fat,
                carbs: p.carbs,
                sugar: p.sugar,
                fiber: p.fiber,
                protein: p.protein,
                salt: p.salt,
            },
            types: p.types,
            cooking: p.cooking,
            water: p.water,
            price_per_unit: p.price_per_unit,
            unit_size: p.unit_size,
        }
    }
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UpdateIngredientParams {
    pub code: i64,
    #[serde(flatten)]
    pub fields: IngredientParams,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CodeParams {
    pub code: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SearchParams {
    /// One or two characters match name prefixes; longer text matches anywhere
    pub query: String,
}

// ============================================================================
// Meal Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct MealLineParams {
    pub ingredient_code: Option<i64>,
    pub ingredient_name: Option<String>,
    /// Grams
    pub amount: f64,
}

impl From<MealLineParams> for MealLineInput {
    fn from(p: MealLineParams) -> Self {
        Self {
            ingredient_code: p.ingredient_code,
            ingredient_name: p.ingredient_name,
            amount: p.amount,
        }
    }
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CreateMealParams {
    pub name: String,
    #[serde(default)]
    pub own_types: Vec<String>,
    #[serde(default)]
    pub ingredients: Vec<MealLineParams>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UpdateMealParams {
    pub code: i64,
    pub name: Option<String>,
    pub own_types: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct MealIngredientParams {
    pub meal_code: i64,
    #[serde(flatten)]
    pub line: MealLineParams,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct RemoveMealIngredientParams {
    pub meal_code: i64,
    pub ingredient_name: String,
}

// ============================================================================
// Trip Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct NewTripParams {
    #[serde(default)]
    pub name: String,
    pub duration: usize,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SetMealParams {
    pub meal_code: i64,
    /// Day index, starting at 0
    pub day_index: usize,
    /// Breakfast, Lunch, Dinner or Snack
    pub meal_type: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SlotParams {
    pub day_index: usize,
    pub meal_type: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct DayParams {
    pub day_index: usize,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct FileParams {
    pub file_name: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct OptionalFileParams {
    pub file_name: Option<String>,
}

// ============================================================================
// Shopping List Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct BuildShoppingListParams {
    #[serde(default = "default_persons")]
    pub persons: u32,
    /// Round to whole units and price the list; required before export
    #[serde(default = "default_finalize")]
    pub finalize: bool,
}

fn default_persons() -> u32 { 1 }
fn default_finalize() -> bool { true }

// ============================================================================
// Tool Router
// ============================================================================

#[tool_router]
impl TrailFoodService {
    // --- Status ---

    #[tool(description = "Get the current status of the TrailFood service including build info, open database, current trip and process information")]
    async fn trailfood_status(&self) -> Result<CallToolResult, McpError> {
        let tracker = self.status_tracker.lock().await;
        let status = tracker.get_status(&self.session).map_err(|e| McpError::internal_error(e, None))?;
        to_result(&status)
    }

    #[tool(description = "Get instructions for planning trip food with TrailFood. Call this when starting a planning session.")]
    fn planner_instructions(&self) -> Result<CallToolResult, McpError> {
        use crate::tools::status::PLANNER_INSTRUCTIONS;
        Ok(CallToolResult::success(vec![Content::text(PLANNER_INSTRUCTIONS)]))
    }

    // --- Ingredients ---

    #[tool(description = "Add an ingredient with nutrition per 100 g, price per unit and unit size in grams")]
    fn add_ingredient(&self, Parameters(p): Parameters<IngredientParams>) -> Result<CallToolResult, McpError> {
        let result = ingredients::add_ingredient(&self.session, p.into()).map_err(|e| McpError::internal_error(e, None))?;
        to_result(&result)
    }

    #[tool(description = "Get full details for an ingredient including the meals that use it")]
    fn get_ingredient(&self, Parameters(p): Parameters<CodeParams>) -> Result<CallToolResult, McpError> {
        let result = ingredients::get_ingredient(&self.session, p.code).map_err(|e| McpError::internal_error(e, None))?;
        match result {
            Some(item) => to_result(&item),
            None => Ok(CallToolResult::success(vec![Content::text(format!(
                r#"{{"error": "Ingredient not found", "code": {}}}"#,
                p.code
            ))])),
        }
    }

    #[tool(description = "List all ingredients")]
    fn list_ingredients(&self) -> Result<CallToolResult, McpError> {
        let result = ingredients::list_ingredients(&self.session).map_err(|e| McpError::internal_error(e, None))?;
        to_result(&result)
    }

    #[tool(description = "Replace every field of an ingredient. Meals using it are recomputed.")]
    fn update_ingredient(&self, Parameters(p): Parameters<UpdateIngredientParams>) -> Result<CallToolResult, McpError> {
        let result = ingredients::update_ingredient(&self.session, p.code, p.fields.into())
            .map_err(|e| McpError::internal_error(e, None))?;
        to_result(&result)
    }

    #[tool(description = "Delete an ingredient. Refused while any meal uses it.")]
    fn delete_ingredient(&self, Parameters(p): Parameters<CodeParams>) -> Result<CallToolResult, McpError> {
        let result = ingredients::delete_ingredient(&self.session, p.code).map_err(|e| McpError::internal_error(e, None))?;
        match result {
            Ok(success) => to_result(&success),
            Err(blocked) => to_result(&blocked),
        }
    }

    #[tool(description = "Search ingredient names")]
    fn search_ingredients(&self, Parameters(p): Parameters<SearchParams>) -> Result<CallToolResult, McpError> {
        let result = ingredients::search_names(&self.session, SearchMode::Ingredients, &p.query)
            .map_err(|e| McpError::internal_error(e, None))?;
        to_result(&result)
    }

    // --- Meals ---

    #[tool(description = "Create a meal from ingredients given by code or name with amounts in grams")]
    fn create_meal(&self, Parameters(p): Parameters<CreateMealParams>) -> Result<CallToolResult, McpError> {
        let lines = p.ingredients.into_iter().map(MealLineInput::from).collect();
        let result = meals::create_meal(&self.session, &p.name, &p.own_types, lines).map_err(|e| McpError::internal_error(e, None))?;
        to_result(&result)
    }

    #[tool(description = "Get a meal with its ingredients and totals")]
    fn get_meal(&self, Parameters(p): Parameters<CodeParams>) -> Result<CallToolResult, McpError> {
        let result = meals::get_meal(&self.session, p.code).map_err(|e| McpError::internal_error(e, None))?;
        match result {
            Some(meal) => to_result(&meal),
            None => Ok(CallToolResult::success(vec![Content::text(format!(
                r#"{{"error": "Meal not found", "code": {}}}"#,
                p.code
            ))])),
        }
    }

    #[tool(description = "List all meals with energy, weight and cost")]
    fn list_meals(&self) -> Result<CallToolResult, McpError> {
        let result = meals::list_meals(&self.session).map_err(|e| McpError::internal_error(e, None))?;
        to_result(&result)
    }

    #[tool(description = "Rename a meal or change its meal types")]
    fn update_meal(&self, Parameters(p): Parameters<UpdateMealParams>) -> Result<CallToolResult, McpError> {
        let result = meals::update_meal_details(&self.session, p.code, p.name.as_deref(), p.own_types.as_deref())
            .map_err(|e| McpError::internal_error(e, None))?;
        to_result(&result)
    }

    #[tool(description = "Add an ingredient to a meal, or change its amount if it is already there")]
    fn add_ingredient_to_meal(&self, Parameters(p): Parameters<MealIngredientParams>) -> Result<CallToolResult, McpError> {
        let result = meals::add_ingredient_to_meal(&self.session, p.meal_code, p.line.into())
            .map_err(|e| McpError::internal_error(e, None))?;
        to_result(&result)
    }

    #[tool(description = "Remove an ingredient from a meal by ingredient name")]
    fn remove_ingredient_from_meal(&self, Parameters(p): Parameters<RemoveMealIngredientParams>) -> Result<CallToolResult, McpError> {
        let result = meals::remove_ingredient_from_meal(&self.session, p.meal_code, &p.ingredient_name)
            .map_err(|e| McpError::internal_error(e, None))?;
        to_result(&result)
    }

    #[tool(description = "Show a meal's totals with an ingredient added, without changing the meal")]
    fn preview_ingredient_in_meal(&self, Parameters(p): Parameters<MealIngredientParams>) -> Result<CallToolResult, McpError> {
        let result = meals::preview_ingredient_in_meal(&self.session, p.meal_code, p.line.into())
            .map_err(|e| McpError::internal_error(e, None))?;
        to_result(&result)
    }

    #[tool(description = "Delete a meal")]
    fn delete_meal(&self, Parameters(p): Parameters<CodeParams>) -> Result<CallToolResult, McpError> {
        let result = meals::delete_meal(&self.session, p.code).map_err(|e| McpError::internal_error(e, None))?;
        to_result(&result)
    }

    #[tool(description = "Search meal names")]
    fn search_meals(&self, Parameters(p): Parameters<SearchParams>) -> Result<CallToolResult, McpError> {
        let result = ingredients::search_names(&self.session, SearchMode::Meals, &p.query)
            .map_err(|e| McpError::internal_error(e, None))?;
        to_result(&result)
    }

    // --- Trip ---

    #[tool(description = "Start a new empty trip of the given number of days against the open database")]
    fn new_trip(&self, Parameters(p): Parameters<NewTripParams>) -> Result<CallToolResult, McpError> {
        let result = trips::new_trip(&self.session, &p.name, p.duration).map_err(|e| McpError::internal_error(e, None))?;
        to_result(&result)
    }

    #[tool(description = "Show the current trip plan")]
    fn get_trip(&self) -> Result<CallToolResult, McpError> {
        let result = trips::get_trip(&self.session).map_err(|e| McpError::internal_error(e, None))?;
        to_result(&result)
    }

    #[tool(description = "Append an empty day to the current trip")]
    fn add_day(&self) -> Result<CallToolResult, McpError> {
        let result = trips::add_day(&self.session).map_err(|e| McpError::internal_error(e, None))?;
        to_result(&result)
    }

    #[tool(description = "Put a meal into a day's Breakfast, Lunch, Dinner or Snack slot")]
    fn set_meal_at_day(&self, Parameters(p): Parameters<SetMealParams>) -> Result<CallToolResult, McpError> {
        let result = trips::set_meal_at_day(&self.session, p.meal_code, p.day_index, &p.meal_type)
            .map_err(|e| McpError::internal_error(e, None))?;
        to_result(&result)
    }

    #[tool(description = "Clear a day's meal slot")]
    fn remove_meal_at_day(&self, Parameters(p): Parameters<SlotParams>) -> Result<CallToolResult, McpError> {
        let result = trips::remove_meal_at_day(&self.session, p.day_index, &p.meal_type)
            .map_err(|e| McpError::internal_error(e, None))?;
        to_result(&result)
    }

    #[tool(description = "Nutrition, cost, weight and cooking count for one day")]
    fn get_day_summary(&self, Parameters(p): Parameters<DayParams>) -> Result<CallToolResult, McpError> {
        let result = trips::get_day_summary(&self.session, p.day_index).map_err(|e| McpError::internal_error(e, None))?;
        to_result(&result)
    }

    #[tool(description = "Nutrition, cost, weight and cooking count for the whole trip")]
    fn get_trip_summary(&self) -> Result<CallToolResult, McpError> {
        let result = trips::get_trip_summary(&self.session).map_err(|e| McpError::internal_error(e, None))?;
        to_result(&result)
    }

    #[tool(description = "Save the current trip to the trips directory")]
    fn save_trip(&self, Parameters(p): Parameters<FileParams>) -> Result<CallToolResult, McpError> {
        let result = trips::save_trip(&self.session, &p.file_name).map_err(|e| McpError::internal_error(e, None))?;
        to_result(&result)
    }

    #[tool(description = "Load a trip from the trips directory. Refused if it was planned against another database.")]
    fn load_trip(&self, Parameters(p): Parameters<FileParams>) -> Result<CallToolResult, McpError> {
        let result = trips::load_trip(&self.session, &p.file_name).map_err(|e| McpError::internal_error(e, None))?;
        to_result(&result)
    }

    // --- Database ---

    #[tool(description = "Save the ingredient and meal tables. Without a file name, saves back to the open base file.")]
    fn save_database(&self, Parameters(p): Parameters<OptionalFileParams>) -> Result<CallToolResult, McpError> {
        let result = database::save_database(&self.session, p.file_name.as_deref()).map_err(|e| McpError::internal_error(e, None))?;
        to_result(&result)
    }

    #[tool(description = "Open a database from its base file. Replaces the current trip with an empty one.")]
    fn load_database(&self, Parameters(p): Parameters<FileParams>) -> Result<CallToolResult, McpError> {
        let result = database::load_database(&self.session, &p.file_name).map_err(|e| McpError::internal_error(e, None))?;
        to_result(&result)
    }

    // --- Shopping List ---

    #[tool(description = "Build the shopping list for the current trip")]
    fn build_shopping_list(&self, Parameters(p): Parameters<BuildShoppingListParams>) -> Result<CallToolResult, McpError> {
        let result = shopping::build_shopping_list(&self.session, p.persons, p.finalize)
            .map_err(|e| McpError::internal_error(e, None))?;
        to_result(&result)
    }

    #[tool(description = "Export the last built shopping list as a CSV spreadsheet")]
    fn export_shopping_list(&self, Parameters(p): Parameters<OptionalFileParams>) -> Result<CallToolResult, McpError> {
        let result = shopping::export_shopping_list(&self.session, p.file_name.as_deref())
            .map_err(|e| McpError::internal_error(e, None))?;
        to_result(&result)
    }
}

// ============================================================================
// Server Handler
// ============================================================================

#[tool_handler]
impl ServerHandler for TrailFoodService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "trailfood".into(),
                version: crate::build_info::VERSION.into(),
                title: Some("TrailFood".into()),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "TrailFood - trip food planner. \
                 IMPORTANT: Call planner_instructions before planning. \
                 Ingredients: add/get/list/update/delete_ingredient, search_ingredients. \
                 Meals: create/get/list/update/delete_meal, add/remove_ingredient_from_meal, preview_ingredient_in_meal, search_meals. \
                 Trip: new_trip, get_trip, add_day, set/remove_meal_at_day, get_day_summary, get_trip_summary, save/load_trip. \
                 Database: save/load_database. \
                 Shopping: build_shopping_list, export_shopping_list."
                    .into(),
            ),
        }
    }
}
