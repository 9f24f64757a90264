//! Viewport transform: logical document units ↔ zoom-compensated overlay units.
//!
//! The scene layer is drawn at `scale` and shifted by `(offset_x, offset_y)`
//! screen pixels. Overlay geometry that lives inside the scaled layer but
//! must keep a constant on-screen size (hairlines, selection borders,
//! ruler ticks) is divided by the scale before drawing.

use crate::geometry::Point;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewTransform {
    scale: f32,
    pub offset_x: f32,
    pub offset_y: f32,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            scale: 1.0,
            offset_x: 0.0,
            offset_y: 0.0,
        }
    }
}

impl ViewTransform {
    /// Panics in debug builds if `scale <= 0`. Validate at the zoom boundary.
    pub fn new(scale: f32, offset_x: f32, offset_y: f32) -> Self {
        debug_assert!(scale > 0.0, "view scale must be positive, got {scale}");
        Self {
            scale,
            offset_x,
            offset_y,
        }
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn offset(&self) -> Point {
        Point::new(self.offset_x, self.offset_y)
    }

    /// `value / scale`: a length that renders at `value` screen pixels
    /// inside a layer already drawn at `scale`.
    #[must_use]
    pub fn to_overlay_units(&self, value: f32) -> f32 {
        value / self.scale
    }

    /// `value * scale`: inverse of [`Self::to_overlay_units`].
    #[must_use]
    pub fn to_screen_units(&self, value: f32) -> f32 {
        value * self.scale
    }

    /// Stage-space pointer position → logical document position.
    #[must_use]
    pub fn screen_to_logical(&self, p: Point) -> Point {
        Point::new(
            self.to_overlay_units(p.x - self.offset_x),
            self.to_overlay_units(p.y - self.offset_y),
        )
    }

    /// Logical document position → stage-space position.
    #[must_use]
    pub fn logical_to_screen(&self, p: Point) -> Point {
        Point::new(
            self.to_screen_units(p.x) + self.offset_x,
            self.to_screen_units(p.y) + self.offset_y,
        )
    }

    /// Set a new scale keeping the logical point under `anchor` fixed on screen.
    pub fn zoom_at(&mut self, anchor: Point, new_scale: f32) {
        debug_assert!(new_scale > 0.0, "view scale must be positive, got {new_scale}");
        let logical = self.screen_to_logical(anchor);
        self.scale = new_scale;
        self.offset_x = anchor.x - logical.x * new_scale;
        self.offset_y = anchor.y - logical.y * new_scale;
    }

    /// Shift the viewport by a screen-pixel delta.
    pub fn pan_by(&mut self, dx: f32, dy: f32) {
        self.offset_x += dx;
        self.offset_y += dy;
    }
}
