//! TrailFood Status Tool
//!
//! Provides runtime status information about the TrailFood service.

use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use sysinfo::{Pid, ProcessesToUpdate, System};

use crate::build_info::BuildInfo;
use crate::session::Session;

/// Planning instructions for AI assistants
pub const PLANNER_INSTRUCTIONS: &str = r#"
# TrailFood Planning Instructions

## Overview

1. **Ingredients** - catalog entries with nutrition per 100 g, price per purchasable unit and unit size in grams
2. **Meals** - named lists of (ingredient, grams); totals are computed for you
3. **Trip** - days with one slot each for Breakfast, Lunch, Dinner and Snack
4. **Shopping list** - grams per ingredient over the whole trip, rounded up to whole units

## Ingredients

- Nutrition fields are per 100 g: energy (kcal), fat, sat_fat, carbs, sugar, fiber, protein, salt.
- Leave `price_per_unit` or `unit_size` out when unknown. Costs that depend on them show as null.
- An ingredient used by any meal cannot be deleted. Remove it from those meals first.

## Meals

- Refer to ingredients by `ingredient_code` or `ingredient_name`. Names match the first ingredient with that exact name.
- Adding an ingredient that is already in the meal replaces its amount.
- Use `preview_ingredient_in_meal` to see the effect of an addition without changing the meal.

## Trips

- Days are numbered from 0.
- A trip belongs to the database it was planned against. Loading a trip saved against another database is refused.
- Deleting a meal leaves trip slots that used it; they are skipped in summaries.

## Files

- `save_database` writes `<name>_ingredients.csv`, `<name>_meals.csv` and the base file `<name>.txt` to the databases directory.
- The last saved or loaded database is reopened when the server starts.
"#;

/// Runtime status of the TrailFood service
#[derive(Debug, Clone, Serialize)]
pub struct TrailFoodStatus {
    /// Build information
    pub build_number: u64,
    pub build_timestamp: &'static str,
    pub version: &'static str,

    /// Data information
    pub data_root: String,
    pub database_code: i64,
    pub database_name: String,
    pub base_file: Option<String>,
    pub ingredient_count: usize,
    pub meal_count: usize,
    pub trip_name: String,
    pub trip_days: usize,

    /// Process information
    pub uptime_seconds: u64,
    pub process_id: u32,
    pub memory_usage_bytes: u64,
}

/// Status tracker for collecting runtime information
pub struct StatusTracker {
    start_time: Instant,
    data_root: PathBuf,
}

impl StatusTracker {
    /// Create a new status tracker
    pub fn new(data_root: PathBuf) -> Self {
        Self {
            start_time: Instant::now(),
            data_root,
        }
    }

    /// Get the current status
    pub fn get_status(&self, session: &Session) -> Result<TrailFoodStatus, String> {
        let build_info = BuildInfo::current();

        // Get process info
        let pid = std::process::id();
        let mut sys = System::new();
        sys.refresh_processes(ProcessesToUpdate::Some(&[Pid::from_u32(pid)]));

        let memory_usage_bytes = sys
            .process(Pid::from_u32(pid))
            .map(|p| p.memory())
            .unwrap_or(0);

        session.with_state(|state| {
            Ok(TrailFoodStatus {
                build_number: build_info.build_number,
                build_timestamp: build_info.build_timestamp,
                version: build_info.version,
                data_root: self.data_root.display().to_string(),
                database_code: state.database.code,
                database_name: state.database.name.clone(),
                base_file: state.base_path.as_ref().map(|p| p.display().to_string()),
                ingredient_count: state.database.ingredients().len(),
                meal_count: state.database.meals().len(),
                trip_name: state.trip.name.clone(),
                trip_days: state.trip.duration(),
                uptime_seconds: self.start_time.elapsed().as_secs(),
                process_id: pid,
                memory_usage_bytes,
            })
        })
    }
}
