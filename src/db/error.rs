//! Error types shared by the catalog, planner and file storage

use thiserror::Error;

/// Database error types
#[derive(Debug, Error)]
pub enum DbError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Ingredient not found with code: {0}")]
    IngredientNotFound(i64),

    #[error("Meal not found with code: {0}")]
    MealNotFound(i64),

    #[error("No ingredient was passed")]
    NoIngredientPassed,

    #[error("Ingredient {code} is used in {} meal(s): {}", used_in.len(), used_in.join(", "))]
    ItemUsedElsewhere { code: i64, used_in: Vec<String> },

    #[error("Trip belongs to database {trip_db_code:?}, but the loaded database is {database_code}")]
    PairingMismatch {
        trip_db_code: Option<i64>,
        database_code: i64,
    },

    #[error("Shopping list has not been finalized")]
    ShoppingListNotFinalized,

    #[error("Unknown meal type code: {0}")]
    UnknownMealType(i64),

    #[error("Malformed {source_name} at line {line}: {message}")]
    Malformed {
        source_name: String,
        line: usize,
        message: String,
    },
}

impl DbError {
    pub(crate) fn malformed(source_name: &str, line: usize, message: impl Into<String>) -> Self {
        DbError::Malformed {
            source_name: source_name.to_string(),
            line,
            message: message.into(),
        }
    }
}

/// Result type for database operations
pub type DbResult<T> = Result<T, DbError>;
