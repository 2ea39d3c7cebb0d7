//! Configuration module

use crate::archive::{ExtractOptions, PackOptions};
use crate::compression::DEFAULT_LEVEL;
use crate::{Error, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Archive creation settings
    pub pack: PackOptions,
    /// Extraction settings
    pub extract: ExtractOptions,
    /// Gzip settings
    pub compression: CompressionConfig,
}

/// Compression configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressionConfig {
    /// Gzip level (0-9)
    pub level: u32,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LEVEL,
        }
    }
}

impl Config {
    /// Get the default configuration file path
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = config_dir()
            .ok_or_else(|| Error::Config("Unable to determine config directory".to_string()))?;

        Ok(config_dir.join("dirtar").join("config.toml"))
    }

    /// Get default configuration content with comments
    pub fn default_config_content() -> String {
        r#"# dirtar configuration file

[pack]
# Visit directory entries in file-name order for reproducible archives
sort_entries = false
# Store explicit directory entries so empty directories are recreated
directory_entries = false
# Archive the targets of symlinks (links themselves are never stored)
follow_symlinks = true

[extract]
# Replace files that already exist in the destination
overwrite = true
# Apply the Unix permissions stored in the archive
preserve_permissions = false
# Apply the modification times stored in the archive
preserve_mtime = true
# Entries that would escape the destination: "skip" or "abort"
unsafe_entries = "skip"

[compression]
# Gzip level, 0 (store) to 9 (best)
level = 6
"#
        .to_string()
    }

    /// Parse configuration from TOML text
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file, which must exist
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read {:?}: {}", path, e)))?;
        Self::from_toml(&contents)
    }

    /// Load configuration from the default location, or defaults when absent
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;

        if !path.exists() {
            debug!("No configuration at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        Self::load_from(&path)
    }

    /// Write the commented default configuration to the default location
    ///
    /// Fails with [`Error::FileExists`] rather than replacing an existing file.
    pub fn init() -> Result<PathBuf> {
        let path = Self::config_path()?;
        if path.exists() {
            return Err(Error::FileExists(path));
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, Self::default_config_content())?;
        Ok(path)
    }

    /// Serialize to TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))
    }

    fn validate(&self) -> Result<()> {
        if self.compression.level > 9 {
            return Err(Error::Config(format!(
                "compression.level must be between 0 and 9, got {}",
                self.compression.level
            )));
        }
        Ok(())
    }
}
