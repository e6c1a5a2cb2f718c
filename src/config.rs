//! Runtime configuration
//!
//! Environment variables with executable-relative defaults, plus the small
//! `config.ini` that remembers the last database base file.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::db::DEFAULT_SEPARATOR;

pub const HOME_VAR: &str = "TRAILFOOD_HOME";
pub const SEPARATOR_VAR: &str = "TRAILFOOD_SEPARATOR";

const CONFIG_FILE: &str = "config.ini";

/// Where data lives and how it is delimited
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub home: PathBuf,
    pub separator: u8,
}

impl Settings {
    pub fn new(home: impl Into<PathBuf>) -> Self {
        Self {
            home: home.into(),
            separator: DEFAULT_SEPARATOR,
        }
    }

    /// Read `TRAILFOOD_HOME` and `TRAILFOOD_SEPARATOR`
    pub fn from_env() -> Self {
        let home = std::env::var(HOME_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_home());

        let separator = match std::env::var(SEPARATOR_VAR) {
            Ok(value) => parse_separator(&value).unwrap_or_else(|| {
                tracing::warn!("Ignoring {}={:?}; using ';'", SEPARATOR_VAR, value);
                DEFAULT_SEPARATOR
            }),
            Err(_) => DEFAULT_SEPARATOR,
        };

        Self { home, separator }
    }

    pub fn databases_dir(&self) -> PathBuf {
        self.home.join("databases")
    }

    pub fn trips_dir(&self) -> PathBuf {
        self.home.join("trips")
    }

    pub fn shopping_lists_dir(&self) -> PathBuf {
        self.home.join("shopping_lists")
    }

    pub fn config_dir(&self) -> PathBuf {
        self.home.join("config")
    }

    /// Create the data directories if missing
    pub fn ensure_dirs(&self) -> io::Result<()> {
        for dir in [
            self.databases_dir(),
            self.trips_dir(),
            self.shopping_lists_dir(),
            self.config_dir(),
        ] {
            fs::create_dir_all(&dir)?;
        }
        Ok(())
    }

    /// Base file remembered from the last save or load, if it still exists
    pub fn last_base_file(&self) -> Option<PathBuf> {
        let text = fs::read_to_string(self.config_dir().join(CONFIG_FILE)).ok()?;
        let line = text.lines().next()?.trim();
        if line.is_empty() {
            return None;
        }

        let path = PathBuf::from(line);
        let path = if path.is_relative() { self.home.join(path) } else { path };
        path.is_file().then_some(path)
    }

    pub fn remember_base_file(&self, base_path: &Path) -> io::Result<()> {
        let stored = base_path.strip_prefix(&self.home).unwrap_or(base_path);
        fs::create_dir_all(self.config_dir())?;
        fs::write(self.config_dir().join(CONFIG_FILE), format!("{}\n", stored.display()))
    }

    /// Resolve a user supplied file name against a data directory.
    /// Absolute paths are kept as given.
    pub fn resolve(dir: &Path, name: &str) -> PathBuf {
        let path = Path::new(name);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            dir.join(path)
        }
    }
}

/// `<project>/data`, found from the executable location
fn default_home() -> PathBuf {
    let mut path = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|p| p.to_path_buf()))
        .unwrap_or_else(|| PathBuf::from("."));

    // Go up from target/release or target/debug to project root
    if path.ends_with("release") || path.ends_with("debug") {
        if let Some(parent) = path.parent() {
            if let Some(grandparent) = parent.parent() {
                path = grandparent.to_path_buf();
            }
        }
    }

    path.push("data");
    path
}

/// A single ASCII character, or `tab`
fn parse_separator(value: &str) -> Option<u8> {
    if value.eq_ignore_ascii_case("tab") || value == "\\t" {
        return Some(b'\t');
    }
    match value.as_bytes() {
        [byte] if byte.is_ascii() && !byte.is_ascii_alphanumeric() && *byte != b'"' => Some(*byte),
        _ => None,
    }
}
