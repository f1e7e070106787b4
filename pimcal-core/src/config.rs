//! Global pimcal configuration.

use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::date_range::DEFAULT_WINDOW_DAYS;
use crate::error::{PimError, PimResult};

const DEFAULT_EXPANSION_LIMIT: u16 = 365;
const DEFAULT_LOG_FILTER: &str = "info";

fn default_expansion_limit() -> u16 {
    DEFAULT_EXPANSION_LIMIT
}

fn default_window_days() -> i64 {
    DEFAULT_WINDOW_DAYS
}

fn default_log_filter() -> String {
    DEFAULT_LOG_FILTER.to_string()
}

/// Configuration at ~/.config/pimcal/config.toml, overridable with
/// `PIMCAL_*` environment variables.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PimConfig {
    /// Maximum number of occurrences a single expansion returns.
    #[serde(default = "default_expansion_limit")]
    pub expansion_limit: u16,

    /// Days either side of now covered when no expansion window is given.
    #[serde(default = "default_window_days")]
    pub default_window_days: i64,

    /// `tracing` filter used when `RUST_LOG` is not set.
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

impl Default for PimConfig {
    fn default() -> Self {
        PimConfig {
            expansion_limit: DEFAULT_EXPANSION_LIMIT,
            default_window_days: DEFAULT_WINDOW_DAYS,
            log_filter: default_log_filter(),
        }
    }
}

impl PimConfig {
    pub fn config_path() -> PimResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| PimError::Config("Could not determine config directory".into()))?
            .join("pimcal");

        Ok(config_dir.join("config.toml"))
    }

    /// Load from the default location, creating a commented template there
    /// first if there is none.
    pub fn load() -> PimResult<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
        }

        Self::load_from(&config_path)
    }

    /// Load from `path` (which may be missing) plus the environment.
    pub fn load_from(path: &Path) -> PimResult<Self> {
        Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(Environment::with_prefix("PIMCAL").try_parsing(true))
            .build()
            .map_err(|e| PimError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| PimError::Config(e.to_string()))
    }

    pub fn save(&self, path: &Path) -> PimResult<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| PimError::Config(e.to_string()))?;

        std::fs::write(path, content)
            .map_err(|e| PimError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }

    /// Create a default config file with all options commented out.
    pub fn create_default_config(path: &Path) -> PimResult<()> {
        let contents = format!(
            "\
# pimcal configuration

# Maximum occurrences returned by one expansion:
# expansion_limit = {DEFAULT_EXPANSION_LIMIT}

# Days either side of today to expand when no range is given:
# default_window_days = {DEFAULT_WINDOW_DAYS}

# Log filter (RUST_LOG takes precedence):
# log_filter = \"{DEFAULT_LOG_FILTER}\"
"
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                PimError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| PimError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }
}
