//! Editor configuration.

use crate::snap::{GRID_SIZE, SnapMode};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors from loading or parsing an [`EditorConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Tunables for tools, selection and history.
///
/// Pixel-valued tolerances are converted to world units through the camera
/// at the time of use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Pick tolerance in device pixels.
    pub hit_tolerance_px: f64,
    /// Selection handle grab radius in device pixels.
    pub handle_tolerance_px: f64,
    pub snap_mode: SnapMode,
    pub grid_size: f64,
    /// Snap line and polyline segments to 15° increments.
    pub angle_snap: bool,
    /// Radius around a polyline's first vertex that closes it.
    pub polyline_close_tolerance_px: f64,
    pub double_click_ms: u64,
    pub double_click_distance: f64,
    pub max_undo_history: usize,
    pub default_layer_name: String,
    /// Offset applied to duplicated shapes, in world units.
    pub duplicate_offset: f64,
    /// Corner radius given to rectangles created by the rectangle tool.
    pub rectangle_corner_radius: f64,
    /// Content of text runs created by the text tool.
    pub text_content: String,
    pub text_size: f64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            hit_tolerance_px: 8.0,
            handle_tolerance_px: 10.0,
            snap_mode: SnapMode::None,
            grid_size: GRID_SIZE,
            angle_snap: false,
            polyline_close_tolerance_px: 6.0,
            double_click_ms: 500,
            double_click_distance: 5.0,
            max_undo_history: 50,
            default_layer_name: "Layer 1".to_string(),
            duplicate_offset: 10.0,
            rectangle_corner_radius: 0.0,
            text_content: "Text".to_string(),
            text_size: 16.0,
        }
    }
}

impl EditorConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load from a JSON file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(json) => Self::from_json_str(&json),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No config at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }
}
