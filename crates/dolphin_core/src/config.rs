//! Navigator settings.
//!
//! Settings live in a JSON file under the data directory. A missing file
//! means defaults; unknown fields are ignored so older builds can read newer
//! files.

use crate::error::DolphinError;
use crate::sql::DEFAULT_PAGE_SIZE;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Settings file name inside the data directory.
pub const SETTINGS_FILE: &str = "settings.json";

/// Tunables for the navigator core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigatorSettings {
    /// Row limit of generated SELECT templates.
    pub default_page_size: u32,
    /// Seconds to wait for a new connection to validate.
    pub connect_timeout_secs: u32,
    /// Path or name of the `mysqldump` binary used for backups.
    pub dump_program: PathBuf,
    /// Log filter overriding the environment (e.g. `dolphin_core=trace`).
    pub log_filter: Option<String>,
}

impl Default for NavigatorSettings {
    fn default() -> Self {
        Self {
            default_page_size: DEFAULT_PAGE_SIZE,
            connect_timeout_secs: 10,
            dump_program: PathBuf::from("mysqldump"),
            log_filter: None,
        }
    }
}

impl NavigatorSettings {
    /// Load settings from `path`, falling back to defaults if it does not exist.
    pub fn load(path: &Path) -> Result<Self, DolphinError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No settings file, using defaults");
            return Ok(Self::default());
        }

        let text = std::fs::read_to_string(path).map_err(|e| DolphinError::Config {
            message: format!("Failed to read settings '{}': {e}", path.display()),
            source: Some(Box::new(e)),
        })?;
        let settings: Self = serde_json::from_str(&text)?;
        settings.validate()?;

        tracing::debug!(path = %path.display(), "Settings loaded");
        Ok(settings)
    }

    /// Write settings to `path`, creating parent directories as needed.
    pub fn save(&self, path: &Path) -> Result<(), DolphinError> {
        self.validate()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| DolphinError::Config {
                message: format!("Failed to create '{}': {e}", parent.display()),
                source: Some(Box::new(e)),
            })?;
        }
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text).map_err(|e| DolphinError::Config {
            message: format!("Failed to write settings '{}': {e}", path.display()),
            source: Some(Box::new(e)),
        })
    }

    /// Reject values the core cannot work with.
    pub fn validate(&self) -> Result<(), DolphinError> {
        if self.default_page_size == 0 {
            return Err(DolphinError::config("default_page_size must be at least 1"));
        }
        if self.connect_timeout_secs == 0 {
            return Err(DolphinError::config("connect_timeout_secs must be at least 1"));
        }
        if self.dump_program.as_os_str().is_empty() {
            return Err(DolphinError::config("dump_program cannot be empty"));
        }
        Ok(())
    }

    /// Connect timeout as a duration.
    pub fn connect_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(u64::from(self.connect_timeout_secs))
    }
}

/// Get the default data directory based on build type.
///
/// Debug builds keep data next to the working directory.
pub fn default_data_dir() -> PathBuf {
    #[cfg(debug_assertions)]
    {
        PathBuf::from("./dolphin_data")
    }

    #[cfg(not(debug_assertions))]
    {
        dirs::data_dir()
            .map(|d| d.join("dolphin"))
            .unwrap_or_else(|| PathBuf::from("./dolphin_data"))
    }
}

/// Default location of the settings file.
pub fn default_settings_path() -> PathBuf {
    default_data_dir().join(SETTINGS_FILE)
}
