//! Trip MCP Tools
//!
//! Tools for planning meals onto the days of the current trip.

use std::path::PathBuf;

use serde::Serialize;

use crate::config::Settings;
use crate::db::LocalDatabase;
use crate::models::{DaySummary, MealType, Trip, TripSummary};
use crate::session::{PlannerState, Session};

/// One filled or empty slot of a day
#[derive(Debug, Serialize)]
pub struct SlotView {
    pub meal_type: MealType,
    pub meal_code: Option<i64>,
    pub meal_name: Option<String>,
}

/// One day of the plan
#[derive(Debug, Serialize)]
pub struct DayView {
    pub day_index: usize,
    pub slots: Vec<SlotView>,
}

/// Response for get_trip and the trip editing tools
#[derive(Debug, Serialize)]
pub struct TripView {
    pub name: String,
    pub duration: usize,
    pub linked_db_code: Option<i64>,
    pub linked_db_name: String,
    pub days: Vec<DayView>,
}

impl TripView {
    pub fn from_trip(trip: &Trip, db: &LocalDatabase) -> Self {
        let days = trip
            .days()
            .iter()
            .enumerate()
            .map(|(day_index, day)| DayView {
                day_index,
                slots: MealType::ALL
                    .iter()
                    .map(|t| {
                        let meal_code = day.meal_code(*t);
                        SlotView {
                            meal_type: *t,
                            meal_code,
                            meal_name: meal_code.and_then(|c| db.meal_by_code(c)).map(|m| m.name.clone()),
                        }
                    })
                    .collect(),
            })
            .collect();

        Self {
            name: trip.name.clone(),
            duration: trip.duration(),
            linked_db_code: trip.linked_db_code,
            linked_db_name: trip.linked_db_name.clone(),
            days,
        }
    }
}

/// Response for set_meal_at_day and remove_meal_at_day
#[derive(Debug, Serialize)]
pub struct SlotChangeResponse {
    pub success: bool,
    pub day_index: usize,
    pub meal_type: MealType,
    pub day: Option<DaySummary>,
}

/// Response for get_day_summary
#[derive(Debug, Serialize)]
pub struct DaySummaryResponse {
    pub day_index: usize,
    #[serde(flatten)]
    pub summary: DaySummary,
}

/// Response for save_trip
#[derive(Debug, Serialize)]
pub struct SaveTripResponse {
    pub success: bool,
    pub path: String,
}

fn parse_meal_type(label: &str) -> Result<MealType, String> {
    MealType::from_name(label)
        .ok_or_else(|| format!("Unknown meal type '{}'; use Breakfast, Lunch, Dinner or Snack", label))
}

/// `name` inside the trips directory, with `.csv` added if it has no extension
fn trip_path(settings: &Settings, name: &str) -> Result<PathBuf, String> {
    let name = name.trim();
    if name.is_empty() {
        return Err("Trip file name cannot be empty".to_string());
    }
    let mut path = Settings::resolve(&settings.trips_dir(), name);
    if path.extension().is_none() {
        path.set_extension("csv");
    }
    Ok(path)
}

/// Start a new trip against the open database
pub fn new_trip(session: &Session, name: &str, duration: usize) -> Result<TripView, String> {
    if duration == 0 {
        return Err("duration must be at least 1 day".to_string());
    }
    session.with_state_mut(|state| {
        state.trip = PlannerState::fresh_trip(&state.database, duration).with_name(name.trim());
        state.shopping_list = None;
        Ok(TripView::from_trip(&state.trip, &state.database))
    })
}

/// Show the current trip
pub fn get_trip(session: &Session) -> Result<TripView, String> {
    session.with_state(|state| Ok(TripView::from_trip(&state.trip, &state.database)))
}

/// Append an empty day
pub fn add_day(session: &Session) -> Result<TripView, String> {
    session.with_state_mut(|state| {
        state.trip.add_day();
        Ok(TripView::from_trip(&state.trip, &state.database))
    })
}

/// Put a meal into a slot, replacing whatever was there
pub fn set_meal_at_day(session: &Session, meal_code: i64, day_index: usize, meal_type: &str) -> Result<SlotChangeResponse, String> {
    let meal_type = parse_meal_type(meal_type)?;
    session.with_state_mut(|state| {
        if state.database.meal_by_code(meal_code).is_none() {
            return Err(format!("Meal not found with code: {}", meal_code));
        }
        let success = state.trip.set_meal_at_day(meal_code, day_index, meal_type);
        Ok(SlotChangeResponse {
            success,
            day_index,
            meal_type,
            day: state.trip.day_summary(&state.database, day_index),
        })
    })
}

/// Clear a slot
pub fn remove_meal_at_day(session: &Session, day_index: usize, meal_type: &str) -> Result<SlotChangeResponse, String> {
    let meal_type = parse_meal_type(meal_type)?;
    session.with_state_mut(|state| {
        let success = state.trip.remove_meal_at_day(day_index, meal_type);
        Ok(SlotChangeResponse {
            success,
            day_index,
            meal_type,
            day: state.trip.day_summary(&state.database, day_index),
        })
    })
}

/// Totals for one day
pub fn get_day_summary(session: &Session, day_index: usize) -> Result<DaySummaryResponse, String> {
    session.with_state(|state| {
        let summary = state
            .trip
            .day_summary(&state.database, day_index)
            .ok_or_else(|| format!("Day {} is outside the trip ({} days)", day_index, state.trip.duration()))?;
        Ok(DaySummaryResponse { day_index, summary })
    })
}

/// Totals for the whole trip
pub fn get_trip_summary(session: &Session) -> Result<TripSummary, String> {
    session.with_state(|state| Ok(state.trip.trip_summary(&state.database)))
}

/// Write the current trip to the trips directory
pub fn save_trip(session: &Session, file_name: &str) -> Result<SaveTripResponse, String> {
    let path = trip_path(session.settings(), file_name)?;
    session.with_state_mut(|state| {
        state
            .database
            .save_trip(&state.trip, &path)
            .map_err(|e| format!("Failed to save trip: {}", e))?;
        state.trip.link_database(state.database.code, state.database.name.clone());
        if let Some(stem) = path.file_stem() {
            state.trip.name = stem.to_string_lossy().into_owned();
        }
        Ok(SaveTripResponse {
            success: true,
            path: path.display().to_string(),
        })
    })
}

/// Load a trip planned against the open database
pub fn load_trip(session: &Session, file_name: &str) -> Result<TripView, String> {
    let path = trip_path(session.settings(), file_name)?;
    session.with_state_mut(|state| {
        let trip = state
            .database
            .load_trip(&path)
            .map_err(|e| format!("Failed to load trip: {}", e))?;
        state.trip = trip;
        state.shopping_list = None;
        Ok(TripView::from_trip(&state.trip, &state.database))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::ingredients::{add_ingredient, IngredientInput};
    use crate::tools::meals::{create_meal, MealLineInput};
    use crate::models::Nutrition;

    fn session() -> (tempfile::TempDir, Session) {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::new(dir.path());
        settings.ensure_dirs().unwrap();
        let session = Session::new(settings);
        add_ingredient(
            &session,
            IngredientInput {
                name: "Couscous".to_string(),
                nutrition: Nutrition::from_array([360.0, 1.0, 0.2, 72.0, 0.5, 5.0, 12.0, 0.0]),
                types: vec![],
                cooking: true,
                water: true,
                price_per_unit: Some(2.0),
                unit_size: Some(500.0),
            },
        )
        .unwrap();
        let line = MealLineInput { ingredient_code: Some(0), ingredient_name: None, amount: 125.0 };
        create_meal(&session, "Couscous Dinner", &["Dinner".to_string()], vec![line]).unwrap();
        (dir, session)
    }

    #[test]
    fn test_plan_and_summarise() {
        let (_dir, session) = session();
        new_trip(&session, "weekend", 2).unwrap();

        let change = set_meal_at_day(&session, 0, 1, "dinner").unwrap();
        assert!(change.success);
        assert_eq!(change.day.unwrap().cooking_count, 1);

        let out_of_range = set_meal_at_day(&session, 0, 2, "Dinner").unwrap();
        assert!(!out_of_range.success);
        assert!(out_of_range.day.is_none());
        assert!(set_meal_at_day(&session, 9, 0, "Dinner").is_err());
        assert!(set_meal_at_day(&session, 0, 0, "Brunch").is_err());

        let summary = get_trip_summary(&session).unwrap();
        assert_eq!(summary.duration, 2);
        assert!((summary.weight - 125.0).abs() < 1e-9);
        assert!((summary.nutrition.energy - 450.0).abs() < 1e-9);
        assert!(get_day_summary(&session, 2).is_err());

        let view = add_day(&session).unwrap();
        assert_eq!(view.duration, 3);
        assert_eq!(view.days[1].slots[2].meal_name.as_deref(), Some("Couscous Dinner"));
    }

    #[test]
    fn test_save_and_load() {
        let (dir, session) = session();
        new_trip(&session, "weekend", 1).unwrap();
        set_meal_at_day(&session, 0, 0, "Dinner").unwrap();

        let saved = save_trip(&session, "weekend").unwrap();
        assert!(saved.path.ends_with("weekend.csv"));
        assert!(dir.path().join("trips").join("weekend.csv").exists());

        remove_meal_at_day(&session, 0, "Dinner").unwrap();
        let loaded = load_trip(&session, "weekend.csv").unwrap();
        assert_eq!(loaded.name, "weekend");
        assert_eq!(loaded.days[0].slots[2].meal_code, Some(0));
        assert!(load_trip(&session, "missing").is_err());
    }
}
