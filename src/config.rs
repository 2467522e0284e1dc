//! Configuration management for vidstash
//!
//! Handles config file loading/saving.
//! Config is stored at ~/.config/vidstash/config.toml

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default addon base URL when neither config nor flag supplies one
pub const DEFAULT_ADDON_URL: &str = "https://torrentio.strem.fun";

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Where persisted state lives (defaults to the platform data dir)
    pub data_dir: Option<PathBuf>,
    /// Where downloaded media and thumbnails land
    pub media_dir: Option<PathBuf>,
    /// Base URL of the stream-resolution addon
    pub addon_url: Option<String>,
}

impl Config {
    /// Get config file path (~/.config/vidstash/config.toml)
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("vidstash").join("config.toml"))
    }

    /// Load config from file, or return default if not found
    pub fn load() -> Self {
        Self::path()
            .and_then(|p| std::fs::read_to_string(p).ok())
            .and_then(|s| toml::from_str(&s).ok())
            .unwrap_or_default()
    }

    /// Load config from a specific file
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&raw)?)
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        let path = Self::path().ok_or_else(|| anyhow::anyhow!("Could not determine config path"))?;

        // Create parent directory if needed
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let toml = toml::to_string_pretty(self)?;
        std::fs::write(path, toml)?;
        Ok(())
    }

    /// Resolved data directory: config value, else `{data_dir}/vidstash`,
    /// else `.vidstash` in the working directory.
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir
            .clone()
            .or_else(|| dirs::data_dir().map(|p| p.join("vidstash")))
            .unwrap_or_else(|| PathBuf::from(".vidstash"))
    }

    /// Resolved media directory: config value, else `{data_dir}/media`.
    pub fn media_dir(&self) -> PathBuf {
        self.media_dir
            .clone()
            .unwrap_or_else(|| self.data_dir().join("media"))
    }

    /// Resolved addon base URL.
    pub fn addon_url(&self) -> String {
        self.addon_url
            .clone()
            .unwrap_or_else(|| DEFAULT_ADDON_URL.to_string())
    }
}
