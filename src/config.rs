// SPDX-License-Identifier: GPL-3.0-only

use crate::constants::{DEFAULT_ALBUM, DEFAULT_APP_PREFIX};
use crate::errors::ConfigError;
use crate::filters::{FilterConfig, FilterMode, Intensity};
use crate::pipelines::photo::EncodingQuality;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Directory name used under the platform config and data directories
const APP_DIR: &str = "filtercam";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Prefix of snapshot file names
    pub app_prefix: String,
    /// Subfolder of the pictures directory reserved for snapshots
    pub album: String,
    /// Pictures directory override
    pub pictures_dir: Option<PathBuf>,
    /// JPEG quality preset for snapshots
    pub jpeg_quality: EncodingQuality,
    /// Filter selected at startup
    pub default_filter: FilterMode,
    /// Intensity selected at startup (clamped to 0-100)
    pub default_intensity: Intensity,
    /// Favorites file override
    pub favorites_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_prefix: DEFAULT_APP_PREFIX.to_string(),
            album: DEFAULT_ALBUM.to_string(),
            pictures_dir: None,
            jpeg_quality: EncodingQuality::default(),
            default_filter: FilterMode::None,
            default_intensity: Intensity::default(),
            favorites_file: None,
        }
    }
}

impl Config {
    /// Default location of the config file
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR).join("config.json"))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Load from the default location
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::default_path()?)
    }

    /// Load from `path`; a missing file yields the defaults
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match fs::read_to_string(path) {
            Ok(contents) => {
                let config = serde_json::from_str(&contents)?;
                debug!(path = %path.display(), "Configuration loaded");
                Ok(config)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "No configuration file, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Write pretty JSON to `path` through a temporary file
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, path)?;
        info!(path = %path.display(), "Configuration saved");
        Ok(())
    }

    /// Directory whose album subfolder holds the snapshots
    pub fn pictures_root(&self) -> PathBuf {
        self.pictures_dir
            .clone()
            .or_else(dirs::picture_dir)
            .or_else(|| dirs::home_dir().map(|home| home.join("Pictures")))
            .unwrap_or_else(|| PathBuf::from("Pictures"))
    }

    /// Where favourites are persisted
    pub fn favorites_path(&self) -> PathBuf {
        self.favorites_file.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .map(|dir| dir.join(APP_DIR))
                .unwrap_or_else(|| PathBuf::from(".").join(APP_DIR))
                .join("favorites.json")
        })
    }

    /// Filter selection at startup
    pub fn initial_filter(&self) -> FilterConfig {
        FilterConfig {
            mode: self.default_filter,
            intensity: self.default_intensity,
        }
    }
}
