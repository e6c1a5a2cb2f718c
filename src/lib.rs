//! TrailFood Library
//!
//! Core functionality for planning the food of multi-day trips.

pub mod build_info;
pub mod config;
pub mod db;
pub mod mcp;
pub mod models;
pub mod session;
pub mod tools;
