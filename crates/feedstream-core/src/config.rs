//! Runtime configuration
//!
//! Loaded from `~/.feedstream/config.toml` when present; every field falls
//! back to the defaults in [`crate::constants`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::constants;

/// Scroll pipeline tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrollConfig {
    /// Coalescing window in milliseconds
    pub coalesce_window_ms: u64,
    /// Logged scrolls must exceed this magnitude
    pub tolerance: i32,
}

impl ScrollConfig {
    pub fn coalesce_window(&self) -> Duration {
        Duration::from_millis(self.coalesce_window_ms)
    }
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            coalesce_window_ms: constants::scroll::COALESCE_WINDOW.as_millis() as u64,
            tolerance: constants::scroll::SCROLL_TOLERANCE,
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub scroll: ScrollConfig,
    /// SQLite database path; defaults to [`default_database_path`]
    pub database_path: Option<PathBuf>,
}

impl FeedConfig {
    /// Parse configuration from TOML text
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).context("invalid feedstream config")
    }

    /// Load configuration from `path`, or defaults if the file does not exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config = Self::from_toml(&text)?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Resolved database path
    pub fn database_path(&self) -> PathBuf {
        self.database_path
            .clone()
            .unwrap_or_else(default_database_path)
    }
}

/// `~/.feedstream`
pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(constants::storage::CONFIG_DIR_NAME)
}

/// `~/.feedstream/config.toml`
pub fn default_config_path() -> PathBuf {
    config_dir().join(constants::storage::CONFIG_FILE_NAME)
}

/// `~/.feedstream/feedstream.db`
pub fn default_database_path() -> PathBuf {
    config_dir().join(constants::storage::DATABASE_FILE_NAME)
}
