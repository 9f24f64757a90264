//! Editor configuration.
//!
//! Every field has a default, so a host can pass a partial JSON object
//! such as `{"readonly": true}` and get the rest filled in.

use crate::error::{EditorError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Background grid cell size, in logical units. Also the paste offset step.
    pub grid_size: f32,
    /// Maximum logical distance from a grid line that still snaps.
    pub snap_threshold: f32,
    /// Opacity multiplier applied to selected nodes.
    pub selected_opacity: f32,
    /// Snap resize handles to the grid.
    pub attract_resize: bool,
    /// Block every editing interaction; selection and navigation still work.
    pub readonly: bool,
    pub zoom: ZoomConfig,
    pub key_move: KeyMoveConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoomConfig {
    pub scale_by: f32,
    pub scale_min: f32,
    pub scale_max: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyMoveConfig {
    pub speed_max: f32,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            grid_size: 20.0,
            snap_threshold: 5.0,
            selected_opacity: 0.8,
            attract_resize: true,
            readonly: false,
            zoom: ZoomConfig::default(),
            key_move: KeyMoveConfig::default(),
        }
    }
}

impl Default for ZoomConfig {
    fn default() -> Self {
        Self {
            scale_by: 0.1,
            scale_min: 0.2,
            scale_max: 5.0,
        }
    }
}

impl Default for KeyMoveConfig {
    fn default() -> Self {
        Self { speed_max: 20.0 }
    }
}

impl ZoomConfig {
    /// Clamp a requested scale into the allowed range.
    pub fn clamp(&self, scale: f32) -> f32 {
        scale.clamp(self.scale_min, self.scale_max)
    }
}

impl EditorConfig {
    /// Parse and validate a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: EditorConfig = serde_json::from_str(json)?;
        config.validate()?;
        log::debug!("editor config loaded: {config:?}");
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.grid_size.is_finite() && self.grid_size > 0.0) {
            return Err(EditorError::InvalidConfig(format!(
                "grid_size must be positive, got {}",
                self.grid_size
            )));
        }
        if !(self.snap_threshold.is_finite() && self.snap_threshold >= 0.0) {
            return Err(EditorError::InvalidConfig(format!(
                "snap_threshold must be non-negative, got {}",
                self.snap_threshold
            )));
        }
        if !(0.0..=1.0).contains(&self.selected_opacity) {
            return Err(EditorError::InvalidConfig(format!(
                "selected_opacity must be within 0..=1, got {}",
                self.selected_opacity
            )));
        }
        let zoom = &self.zoom;
        for scale in [zoom.scale_min, zoom.scale_max] {
            if !(scale.is_finite() && scale > 0.0) {
                return Err(EditorError::InvalidScale(scale));
            }
        }
        if zoom.scale_min > zoom.scale_max {
            return Err(EditorError::InvalidConfig(format!(
                "zoom.scale_min {} exceeds zoom.scale_max {}",
                zoom.scale_min, zoom.scale_max
            )));
        }
        if !(zoom.scale_by.is_finite() && zoom.scale_by > 0.0) {
            return Err(EditorError::InvalidConfig(format!(
                "zoom.scale_by must be positive, got {}",
                zoom.scale_by
            )));
        }
        if self.key_move.speed_max < 1.0 {
            return Err(EditorError::InvalidConfig(format!(
                "key_move.speed_max must be at least 1, got {}",
                self.key_move.speed_max
            )));
        }
        Ok(())
    }
}
