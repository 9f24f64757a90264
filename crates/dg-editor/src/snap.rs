//! Magnetic grid snapping for resize handles.

use crate::selection::{Handle, TransformControl};
use dg_core::{Point, ViewTransform};

impl Handle {
    /// Whether dragging this handle changes the box's horizontal extent.
    pub fn moves_x(self) -> bool {
        matches!(
            self,
            Handle::TopLeft
                | Handle::TopRight
                | Handle::MiddleLeft
                | Handle::MiddleRight
                | Handle::BottomLeft
                | Handle::BottomRight
        )
    }

    /// Whether dragging this handle changes the box's vertical extent.
    pub fn moves_y(self) -> bool {
        matches!(
            self,
            Handle::TopLeft
                | Handle::TopCenter
                | Handle::TopRight
                | Handle::BottomLeft
                | Handle::BottomCenter
                | Handle::BottomRight
        )
    }
}

/// Grid snapping for the active resize handle.
///
/// Stateless: everything it needs comes from the viewport and the
/// transform control at the moment of the call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapResize {
    /// Grid cell size in logical units.
    pub grid_size: f32,
    /// Logical distance under which an axis snaps.
    pub threshold: f32,
}

impl Default for SnapResize {
    fn default() -> Self {
        Self {
            grid_size: 20.0,
            threshold: 5.0,
        }
    }
}

impl SnapResize {
    pub fn new(grid_size: f32, threshold: f32) -> Self {
        Self {
            grid_size,
            threshold,
        }
    }

    /// Snap a candidate stage-space handle position.
    ///
    /// Rotation handles pass through unchanged. Each axis the handle moves is
    /// snapped to the nearest grid line independently. Edge handles move a
    /// single axis, so unlike a plain per-axis snap the other coordinate of
    /// an edge handle is never touched, even when it sits near a grid line.
    #[must_use]
    pub fn bound(&self, view: &ViewTransform, handle: Handle, new_pos: Point) -> Point {
        if handle.is_rotation() {
            return new_pos;
        }
        let logical = view.screen_to_logical(new_pos);
        let mut snapped = new_pos;
        if handle.moves_x()
            && let Some(x) = self.nearest_line(logical.x)
        {
            snapped.x = view.to_screen_units(x) + view.offset_x;
        }
        if handle.moves_y()
            && let Some(y) = self.nearest_line(logical.y)
        {
            snapped.y = view.to_screen_units(y) + view.offset_y;
        }
        snapped
    }

    /// Snap against whatever handle the control is currently dragging.
    /// Outside a drag the position is returned unchanged.
    #[must_use]
    pub fn bound_active(
        &self,
        view: &ViewTransform,
        control: &TransformControl,
        new_pos: Point,
    ) -> Point {
        match control.active_handle() {
            Some(handle) => self.bound(view, handle, new_pos),
            None => new_pos,
        }
    }

    /// Grid line within `threshold` of `logical`, if any.
    fn nearest_line(&self, logical: f32) -> Option<f32> {
        let nearest = (logical / self.grid_size).round() * self.grid_size;
        ((logical - nearest).abs() < self.threshold).then_some(nearest)
    }
}
