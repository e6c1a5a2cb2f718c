//! Planner session
//!
//! The state shared by every tool call of one server: the open database, the
//! trip being planned and the last shopping list built from it.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::config::Settings;
use crate::db::LocalDatabase;
use crate::models::{ShoppingList, Trip};

/// Everything a tool call may read or change
#[derive(Debug)]
pub struct PlannerState {
    pub database: LocalDatabase,
    pub trip: Trip,
    pub shopping_list: Option<ShoppingList>,
    /// Base file of the database, once saved or loaded
    pub base_path: Option<PathBuf>,
}

impl PlannerState {
    fn new(database: LocalDatabase) -> Self {
        let trip = Self::fresh_trip(&database, 1);
        Self {
            database,
            trip,
            shopping_list: None,
            base_path: None,
        }
    }

    /// An empty trip linked to the open database
    pub fn fresh_trip(database: &LocalDatabase, duration: usize) -> Trip {
        let mut trip = Trip::new(duration);
        trip.link_database(database.code, database.name.clone());
        trip
    }

    /// Swap in another database. The trip and shopping list belonged to the
    /// old one and are reset.
    pub fn replace_database(&mut self, database: LocalDatabase, base_path: PathBuf) {
        self.trip = Self::fresh_trip(&database, 1);
        self.database = database;
        self.shopping_list = None;
        self.base_path = Some(base_path);
    }
}

/// Shared handle to the planner state
#[derive(Clone)]
pub struct Session {
    state: Arc<Mutex<PlannerState>>,
    settings: Arc<Settings>,
}

impl Session {
    /// Start with an empty database
    pub fn new(settings: Settings) -> Self {
        let database = LocalDatabase::new().with_separator(settings.separator);
        Self {
            state: Arc::new(Mutex::new(PlannerState::new(database))),
            settings: Arc::new(settings),
        }
    }

    /// Start with the database remembered in `config.ini`, or an empty one
    pub fn restore(settings: Settings) -> Self {
        let session = Self::new(settings);
        let Some(base_path) = session.settings.last_base_file() else {
            return session;
        };

        let mut database = LocalDatabase::new().with_separator(session.settings.separator);
        match database.load_from_base_file(&base_path) {
            Ok(()) => {
                tracing::info!("Restored database '{}' from {}", database.name, base_path.display());
                if let Ok(mut state) = session.state.lock() {
                    state.replace_database(database, base_path);
                }
            }
            Err(e) => {
                tracing::warn!("Could not restore {}: {}", base_path.display(), e);
            }
        }
        session
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Execute a closure with read access to the state
    pub fn with_state<F, T>(&self, f: F) -> Result<T, String>
    where
        F: FnOnce(&PlannerState) -> Result<T, String>,
    {
        let state = self.state.lock().map_err(|_| "Planner state lock poisoned".to_string())?;
        f(&state)
    }

    /// Execute a closure with write access to the state
    pub fn with_state_mut<F, T>(&self, f: F) -> Result<T, String>
    where
        F: FnOnce(&mut PlannerState) -> Result<T, String>,
    {
        let mut state = self.state.lock().map_err(|_| "Planner state lock poisoned".to_string())?;
        f(&mut state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_trip_is_linked() {
        let dir = tempfile::tempdir().unwrap();
        let session = Session::new(Settings::new(dir.path()));
        session
            .with_state(|state| {
                assert!(state.trip.verify_paired_database(state.database.code));
                assert_eq!(state.trip.duration(), 1);
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn test_restore_reopens_remembered_database() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::new(dir.path());
        settings.ensure_dirs().unwrap();

        let mut db = LocalDatabase::new();
        db.add_ingredient(crate::models::IngredientCreate {
            name: "Lentils".to_string(),
            nutrition: crate::models::Nutrition::zero(),
            types: vec![],
            cooking: true,
            water: true,
            price_per_unit: 1.0,
            unit_size: 500.0,
        });
        let base = db.save(&settings.databases_dir(), "alps.txt").unwrap();
        settings.remember_base_file(&base).unwrap();

        let session = Session::restore(settings);
        session
            .with_state(|state| {
                assert_eq!(state.database.code, db.code);
                assert_eq!(state.database.ingredient_names(), vec!["Lentils".to_string()]);
                assert_eq!(state.base_path.as_deref(), Some(base.as_path()));
                assert!(state.trip.verify_paired_database(db.code));
                Ok(())
            })
            .unwrap();
    }
}
