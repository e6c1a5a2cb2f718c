//! TrailFood Tools module
//!
//! MCP tool implementations for the trip food planner.

pub mod database;
pub mod ingredients;
pub mod meals;
pub mod shopping;
pub mod status;
pub mod trips;
