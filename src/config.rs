// SPDX-License-Identifier: GPL-3.0-only

use crate::constants::analysis;
use crate::errors::ConfigError;
use crate::frame_processor::ViewPadding;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Frame analysis settings
///
/// Missing fields in a configuration file fall back to their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Minimum time between frames submitted for detection, in milliseconds
    pub min_interval_ms: u64,
    /// Frames larger than this are downscaled before QR detection
    pub qr_max_dimension: u32,
    /// Display pixel density of the preview view
    pub density: f32,
    /// Left padding of the preview view, in view pixels
    pub view_padding_left: i32,
    /// Top padding of the preview view, in view pixels
    pub view_padding_top: i32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            min_interval_ms: analysis::DEFAULT_MIN_INTERVAL_MS,
            qr_max_dimension: analysis::DEFAULT_QR_MAX_DIMENSION,
            density: analysis::DEFAULT_DENSITY,
            view_padding_left: 0,
            view_padding_top: 0,
        }
    }
}

impl Config {
    /// Parse a JSON configuration document
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load a JSON configuration file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Read(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&contents)
    }

    /// Sampling interval for a frame stream
    ///
    /// A stream feeding frames into detection keeps one
    /// `AnalysisSlot::new(config.min_interval())` and asks it before building
    /// each task.
    pub fn min_interval(&self) -> Duration {
        Duration::from_millis(self.min_interval_ms)
    }

    pub fn view_padding(&self) -> ViewPadding {
        ViewPadding::new(self.view_padding_left, self.view_padding_top)
    }
}
