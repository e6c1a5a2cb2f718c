//! Shopping List MCP Tools
//!
//! Tools for turning the current trip into a shopping list and exporting it.

use serde::Serialize;

use crate::config::Settings;
use crate::models::{ShoppingList, ShoppingListRow};
use crate::session::Session;

/// Response for build_shopping_list
#[derive(Debug, Serialize)]
pub struct ShoppingListResponse {
    pub persons: u32,
    pub finalized: bool,
    pub rows: Vec<ShoppingListRow>,
    pub total_cost: f64,
}

impl From<&ShoppingList> for ShoppingListResponse {
    fn from(list: &ShoppingList) -> Self {
        Self {
            persons: list.persons,
            finalized: list.is_finalized(),
            rows: list.rows().to_vec(),
            total_cost: if list.is_finalized() { list.total_cost() } else { f64::NAN },
        }
    }
}

/// Response for export_shopping_list
#[derive(Debug, Serialize)]
pub struct ExportShoppingListResponse {
    pub success: bool,
    pub path: String,
    pub row_count: usize,
    pub total_cost: f64,
}

/// Rebuild the shopping list for the current trip.
///
/// With `finalize` false only the gram totals are computed and the list
/// cannot be exported until it is built again with `finalize` true.
pub fn build_shopping_list(session: &Session, persons: u32, finalize: bool) -> Result<ShoppingListResponse, String> {
    if persons == 0 {
        return Err("persons must be at least 1".to_string());
    }
    session.with_state_mut(|state| {
        let mut list = ShoppingList::new(persons);
        list.recompute_quantities(&state.trip, &state.database, persons)
            .map_err(|e| format!("Failed to build shopping list: {}", e))?;
        if finalize {
            list.finalize_units();
        }

        let response = ShoppingListResponse::from(&list);
        state.shopping_list = Some(list);
        Ok(response)
    })
}

/// Export the last built shopping list to the shopping lists directory
pub fn export_shopping_list(session: &Session, file_name: Option<&str>) -> Result<ExportShoppingListResponse, String> {
    let settings = session.settings();
    session.with_state(|state| {
        let list = state
            .shopping_list
            .as_ref()
            .ok_or_else(|| "No shopping list has been built for this trip".to_string())?;

        let name = match file_name.map(str::trim).filter(|n| !n.is_empty()) {
            Some(name) => name.to_string(),
            None => default_file_name(&state.trip.name),
        };
        let path = Settings::resolve(&settings.shopping_lists_dir(), &name);
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(|e| format!("Failed to create {}: {}", dir.display(), e))?;
        }

        list.export(&path)
            .map_err(|e| format!("Failed to export shopping list: {}", e))?;

        Ok(ExportShoppingListResponse {
            success: true,
            path: path.display().to_string(),
            row_count: list.rows().len(),
            total_cost: list.total_cost(),
        })
    })
}

/// `<trip>_shopping_list.csv`
pub fn default_file_name(trip_name: &str) -> String {
    let stem = if trip_name.trim().is_empty() { "trip" } else { trip_name.trim() };
    format!("{}_shopping_list.csv", stem)
}
