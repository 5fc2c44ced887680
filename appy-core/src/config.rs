//! Client configuration.

use std::path::{Path, PathBuf};

use config::{Config, File};
use serde::{Deserialize, Serialize};

use crate::datasource::pageable::DEFAULT_PAGE_SIZE;
use crate::error::{AppyError, AppyResult};

static DEFAULT_DATA_DIR: &str = "~/appy";

fn default_data_dir() -> PathBuf {
    PathBuf::from(DEFAULT_DATA_DIR)
}

fn default_facility_id() -> i32 {
    1
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

fn default_rows_per_hour() -> u32 {
    4
}

fn default_days_to_show() -> u32 {
    1
}

/// Configuration at ~/.config/appy/config.toml
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AppyConfig {
    /// Where the local collections are stored.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Facility (tenant) whose appointments, schedule, services and clients
    /// are read and written.
    #[serde(default = "default_facility_id")]
    pub facility_id: i32,

    /// Entities requested per page by paged lists.
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Text rows drawn per hour in the day view.
    #[serde(default = "default_rows_per_hour")]
    pub rows_per_hour: u32,

    /// Number of consecutive days shown at once.
    #[serde(default = "default_days_to_show")]
    pub days_to_show: u32,
}

impl Default for AppyConfig {
    fn default() -> Self {
        AppyConfig {
            data_dir: default_data_dir(),
            facility_id: default_facility_id(),
            page_size: default_page_size(),
            rows_per_hour: default_rows_per_hour(),
            days_to_show: default_days_to_show(),
        }
    }
}

impl AppyConfig {
    pub fn config_path() -> AppyResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| AppyError::Config("Could not determine config directory".into()))?
            .join("appy");

        Ok(config_dir.join("config.toml"))
    }

    /// Load ~/.config/appy/config.toml, creating a commented default first
    /// if it does not exist.
    pub fn load() -> AppyResult<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
        }

        Self::load_from(&config_path)
    }

    /// Load from an explicit path. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> AppyResult<Self> {
        let config: AppyConfig = Config::builder()
            .add_source(File::from(path).required(false))
            .build()
            .map_err(|e| AppyError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| AppyError::Config(e.to_string()))?;

        if config.page_size == 0 {
            return Err(AppyError::Config("page_size must be at least 1".into()));
        }

        Ok(config)
    }

    /// `data_dir` with `~` expanded.
    pub fn data_path(&self) -> PathBuf {
        let full_path_str = shellexpand::tilde(&self.data_dir.to_string_lossy()).into_owned();

        PathBuf::from(full_path_str)
    }

    /// Save to ~/.config/appy/config.toml
    pub fn save(&self) -> AppyResult<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> AppyResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| AppyError::Config(e.to_string()))?;

        std::fs::write(path, content)
            .map_err(|e| AppyError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }

    /// Create a default config file with all options commented out.
    pub fn create_default_config(path: &Path) -> AppyResult<()> {
        let contents = format!(
            "\
# appy configuration

# Where appointments, services and clients are stored:
# data_dir = \"{DEFAULT_DATA_DIR}\"

# Facility whose data is read and written:
# facility_id = {}

# Appointments fetched per page when listing:
# page_size = {DEFAULT_PAGE_SIZE}

# Text rows per hour in the day view:
# rows_per_hour = {}

# Days shown side by side:
# days_to_show = {}
",
            default_facility_id(),
            default_rows_per_hour(),
            default_days_to_show(),
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                AppyError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| AppyError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commented_default_config_loads_as_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("appy").join("config.toml");

        AppyConfig::create_default_config(&path).unwrap();
        let config = AppyConfig::load_from(&path).unwrap();

        assert_eq!(config, AppyConfig::default());
    }

    #[test]
    fn saved_values_are_loaded_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let config = AppyConfig {
            facility_id: 7,
            days_to_show: 3,
            ..AppyConfig::default()
        };

        config.save_to(&path).unwrap();

        assert_eq!(AppyConfig::load_from(&path).unwrap(), config);
    }

    #[test]
    fn zero_page_size_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "page_size = 0\n").unwrap();

        assert!(matches!(AppyConfig::load_from(&path), Err(AppyError::Config(_))));
    }
}
