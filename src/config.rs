//! Viewer configuration, stored as JSON.
//!
//! ```json
//! {
//!   "version": 1,
//!   "image_orientation": "RAI",
//!   "display_orientation": ["RAI", "IAR", "RAI"],
//!   "intensity_control_points": 4,
//!   "sort_by": "image_position_patient",
//!   "log_level": "info"
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::enums::SortBy;
use crate::orientation::{DEFAULT_DISPLAY_CODES, ImageGeometry, OrientationError};

/// Current configuration file format version.
pub const CONFIG_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config version {file_version} is newer than supported version {supported_version}")]
    VersionTooNew { file_version: u32, supported_version: u32 },

    #[error("An intensity curve needs at least two control points, got {0}")]
    TooFewControlPoints(usize),

    #[error(transparent)]
    Orientation(#[from] OrientationError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewerConfig {
    pub version: u32,

    /// Anatomical orientation of the image axes.
    #[serde(default = "default_orientation")]
    pub image_orientation: String,

    /// Anatomical orientation of each display frame, one per display axis.
    #[serde(default = "default_display_orientation")]
    pub display_orientation: [String; 3],

    #[serde(default = "default_control_points")]
    pub intensity_control_points: usize,

    #[serde(default)]
    pub sort_by: SortBy,

    #[serde(default)]
    pub log_level: LogLevel,
}

fn default_orientation() -> String {
    "RAI".to_string()
}

fn default_display_orientation() -> [String; 3] {
    DEFAULT_DISPLAY_CODES.map(String::from)
}

fn default_control_points() -> usize {
    4
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            image_orientation: default_orientation(),
            display_orientation: default_display_orientation(),
            intensity_control_points: default_control_points(),
            sort_by: SortBy::default(),
            log_level: LogLevel::default(),
        }
    }
}

impl ViewerConfig {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;

        if config.version > CONFIG_VERSION {
            return Err(ConfigError::VersionTooNew {
                file_version: config.version,
                supported_version: CONFIG_VERSION,
            });
        }
        if config.intensity_control_points < 2 {
            return Err(ConfigError::TooFewControlPoints(config.intensity_control_points));
        }
        if config.version < CONFIG_VERSION {
            log::warn!(
                "Config version mismatch: expected {}, got {}",
                CONFIG_VERSION,
                config.version
            );
        }

        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Resolve the orientation codes into image and display transforms.
    pub fn geometry(&self) -> Result<ImageGeometry, ConfigError> {
        let [first, second, third] = &self.display_orientation;
        Ok(ImageGeometry::from_codes(
            &self.image_orientation,
            [first.as_str(), second.as_str(), third.as_str()],
        )?)
    }
}
