//! Dashboard configuration
//!
//! Command-line flags (or their environment variables) win over an optional
//! JSON settings file, which wins over built-in defaults.

use crate::error::{DashboardError, Result};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_BIND: &str = "0.0.0.0:8080";
pub const DEFAULT_PAGE_TITLE: &str = "Hierarchy Dashboard";
const DB_FILE_NAME: &str = ".hierarchy.db";
const APP_DIR_NAME: &str = "hierarchy-dashboard";

/// hierarchy-dashboard: node headcounts and gender distribution
#[derive(Parser, Debug, Clone, Default)]
#[command(author, version, about, long_about = None)]
pub struct ServerArgs {
    /// Path to the SQLite store holding HierarchyTable_Final and Employees
    #[arg(long, value_name = "PATH", env = "HIERARCHY_DB")]
    pub db: Option<PathBuf>,

    /// Address to serve the dashboard on (default: 0.0.0.0:8080)
    #[arg(long, value_name = "ADDR:PORT", env = "HIERARCHY_BIND")]
    pub bind: Option<String>,

    /// JSON settings file
    ///
    /// If not specified, settings.json in the platform config directory is
    /// used when present.
    #[arg(long, value_name = "FILE")]
    pub settings: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    #[serde(default)]
    pub db_path: Option<PathBuf>,
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_page_title")]
    pub page_title: String,
}

fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}

fn default_page_title() -> String {
    DEFAULT_PAGE_TITLE.to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            db_path: None,
            bind: default_bind(),
            page_title: default_page_title(),
        }
    }
}

/// Settings after flags, file and defaults have been merged.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    pub db_path: PathBuf,
    pub bind: String,
    pub page_title: String,
}

impl Settings {
    /// Read a settings file. Missing or malformed files are errors.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| DashboardError::SettingsIo {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| DashboardError::SettingsFormat {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load the file named on the command line, or the default one if it exists.
    pub fn for_args(args: &ServerArgs) -> Result<Self> {
        if let Some(path) = &args.settings {
            return Self::load(path);
        }
        match default_settings_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(Settings::default()),
        }
    }

    pub fn resolve(&self, args: &ServerArgs, cwd: &Path) -> ResolvedConfig {
        let non_empty = |p: &PathBuf| !p.as_os_str().is_empty();
        let db_path = args
            .db
            .clone()
            .filter(non_empty)
            .or_else(|| self.db_path.clone().filter(non_empty))
            .unwrap_or_else(|| find_database(cwd));
        let bind = args
            .bind
            .clone()
            .filter(|b| !b.is_empty())
            .unwrap_or_else(|| self.bind.clone());

        ResolvedConfig {
            db_path,
            bind,
            page_title: self.page_title.clone(),
        }
    }
}

fn default_settings_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join(APP_DIR_NAME).join("settings.json"))
}

/// Walk up from `start` looking for `.hierarchy.db`, then fall back to the
/// platform data directory.
pub fn find_database(start: &Path) -> PathBuf {
    let mut dir = Some(start);
    while let Some(current) = dir {
        let candidate = current.join(DB_FILE_NAME);
        if candidate.exists() {
            return candidate;
        }
        dir = current.parent();
    }

    dirs::data_dir()
        .map(|p| p.join(APP_DIR_NAME).join("hierarchy.db"))
        .unwrap_or_else(|| PathBuf::from("hierarchy.db"))
}
