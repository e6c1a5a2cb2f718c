//! Database MCP Tools
//!
//! Tools for saving and opening databases in the databases directory.

use std::path::PathBuf;

use serde::Serialize;

use crate::config::Settings;
use crate::db::LocalDatabase;
use crate::session::Session;

const DEFAULT_BASE_NAME: &str = "database.txt";

/// Response for save_database and load_database
#[derive(Debug, Serialize)]
pub struct DatabaseFileResponse {
    pub success: bool,
    pub code: i64,
    pub name: String,
    pub base_file: String,
    pub ingredient_count: usize,
    pub meal_count: usize,
}

fn response(db: &LocalDatabase, base_path: &std::path::Path) -> DatabaseFileResponse {
    DatabaseFileResponse {
        success: true,
        code: db.code,
        name: db.name.clone(),
        base_file: base_path.display().to_string(),
        ingredient_count: db.ingredients().len(),
        meal_count: db.meals().len(),
    }
}

/// `name` with a `.txt` extension added if it has none
fn base_name(name: &str) -> Result<String, String> {
    let name = name.trim();
    if name.is_empty() {
        return Err("Database file name cannot be empty".to_string());
    }
    let mut path = PathBuf::from(name);
    if path.extension().is_none() {
        path.set_extension("txt");
    }
    Ok(path.display().to_string())
}

/// Save the open database. Without a name it goes back to the file it
/// came from, or to `database.txt`.
pub fn save_database(session: &Session, file_name: Option<&str>) -> Result<DatabaseFileResponse, String> {
    let settings = session.settings();
    let (response, base_path) = session.with_state_mut(|state| {
        let (dir, name) = match (file_name, &state.base_path) {
            (Some(name), _) => {
                let path = Settings::resolve(&settings.databases_dir(), &base_name(name)?);
                split(&path)?
            }
            (None, Some(path)) => split(path)?,
            (None, None) => (settings.databases_dir(), DEFAULT_BASE_NAME.to_string()),
        };

        let base_path = state
            .database
            .save(&dir, &name)
            .map_err(|e| format!("Failed to save database: {}", e))?;
        if state.trip.verify_paired_database(state.database.code) {
            state.trip.link_database(state.database.code, state.database.name.clone());
        }
        state.base_path = Some(base_path.clone());
        Ok((response(&state.database, &base_path), base_path))
    })?;

    remember(settings, &base_path);
    Ok(response)
}

/// Open a database from its base file. The current trip and shopping list
/// are replaced by an empty trip for the new database.
pub fn load_database(session: &Session, file_name: &str) -> Result<DatabaseFileResponse, String> {
    let settings = session.settings();
    let base_path = Settings::resolve(&settings.databases_dir(), &base_name(file_name)?);

    let mut database = LocalDatabase::new().with_separator(settings.separator);
    database
        .load_from_base_file(&base_path)
        .map_err(|e| format!("Failed to load database: {}", e))?;

    let response = response(&database, &base_path);
    session.with_state_mut(|state| {
        state.replace_database(database, base_path.clone());
        Ok(())
    })?;

    remember(settings, &base_path);
    Ok(response)
}

fn split(path: &std::path::Path) -> Result<(PathBuf, String), String> {
    let dir = path.parent().map(PathBuf::from).unwrap_or_default();
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| format!("'{}' is not a file name", path.display()))?;
    Ok((dir, name))
}

fn remember(settings: &Settings, base_path: &std::path::Path) {
    if let Err(e) = settings.remember_base_file(base_path) {
        tracing::warn!("Could not update config.ini: {}", e);
    }
}
