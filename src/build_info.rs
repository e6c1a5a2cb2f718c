//! Build information
//!
//! Build number and timestamp embedded by `build.rs`, and the startup banner.

use serde::Serialize;

use crate::config::Settings;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Stamped by `build.rs`; absent when the crate is built without it
const RAW_BUILD_NUMBER: Option<&str> = option_env!("TRAILFOOD_BUILD_NUMBER");
const RAW_BUILD_TIMESTAMP: Option<&str> = option_env!("TRAILFOOD_BUILD_TIMESTAMP");

fn build_number(raw: Option<&str>) -> u64 {
    raw.and_then(|s| s.trim().parse().ok()).unwrap_or(0)
}

#[derive(Debug, Clone, Serialize)]
pub struct BuildInfo {
    pub name: &'static str,
    pub version: &'static str,
    pub build_number: u64,
    pub build_timestamp: &'static str,
}

impl BuildInfo {
    pub fn current() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME"),
            version: VERSION,
            build_number: build_number(RAW_BUILD_NUMBER),
            build_timestamp: RAW_BUILD_TIMESTAMP.unwrap_or("unknown"),
        }
    }
}

/// Print the startup banner to stderr
pub fn print_startup_banner(settings: &Settings) {
    let info = BuildInfo::current();
    let separator = match settings.separator {
        b'\t' => "tab".to_string(),
        byte => (byte as char).to_string(),
    };
    eprintln!("===============================================");
    eprintln!("  TrailFood trip food planner");
    eprintln!("  Version: {} | Build: {}", info.version, info.build_number);
    eprintln!("  Compiled: {}", info.build_timestamp);
    eprintln!("  Data: {} | Separator: {}", settings.home.display(), separator);
    eprintln!("===============================================");
}
