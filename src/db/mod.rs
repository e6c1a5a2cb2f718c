//! Database module
//!
//! The in-memory catalog and its flat-file persistence.

mod database;
pub mod error;
pub mod storage;
pub mod trip_file;

pub use database::{LocalDatabase, SearchMode, DEFAULT_SEPARATOR};
pub use error::{DbError, DbResult};
