//! Overlay geometry drawn above the scene: the marquee, the transform box
//! and the hover outline.
//!
//! Every shape is returned in logical units ready to be drawn inside the
//! scaled scene layer; strokes and paddings go through `to_overlay_units`
//! so they stay a constant number of screen pixels at any zoom.

use dg_core::geometry::{Bounds, Point};
use dg_core::{NodeIndex, SceneGraph, ViewTransform};
use kurbo::{Rect, Size};

/// On-screen stroke width of selection borders, in pixels.
pub const HAIRLINE_PX: f32 = 1.0;
/// Gap between the selection and its transform box, in pixels.
pub const TRANSFORM_PADDING_PX: f32 = 4.0;
/// Side length of a resize handle square, in pixels.
pub const HANDLE_SIZE_PX: f32 = 8.0;

/// Stroke width that renders as a one-pixel line at the current zoom.
pub fn hairline(view: &ViewTransform) -> f64 {
    f64::from(view.to_overlay_units(HAIRLINE_PX))
}

pub fn to_rect(b: &Bounds) -> Rect {
    Rect::new(
        f64::from(b.x),
        f64::from(b.y),
        f64::from(b.right()),
        f64::from(b.bottom()),
    )
}

pub fn from_rect(r: Rect) -> Bounds {
    Bounds::new(r.x0 as f32, r.y0 as f32, r.width() as f32, r.height() as f32)
}

/// Marquee between two stage-space pointer positions, in logical units.
pub fn marquee_rect(view: &ViewTransform, start: Point, end: Point) -> Rect {
    let a = view.screen_to_logical(start);
    let b = view.screen_to_logical(end);
    Rect::new(
        f64::from(a.x),
        f64::from(a.y),
        f64::from(b.x),
        f64::from(b.y),
    )
    .abs()
}

/// Union of the bound nodes' client rects, `None` for an empty binding.
pub fn selection_bounds(graph: &SceneGraph, nodes: &[NodeIndex]) -> Option<Rect> {
    nodes
        .iter()
        .filter(|&&idx| graph.graph.contains_node(idx))
        .filter_map(|&idx| graph.client_rect(idx))
        .map(|b| to_rect(&b))
        .reduce(|acc, r| acc.union(r))
}

/// Transform box around the selection, inflated by a constant screen padding.
pub fn transform_box(view: &ViewTransform, graph: &SceneGraph, nodes: &[NodeIndex]) -> Option<Rect> {
    let pad = f64::from(view.to_overlay_units(TRANSFORM_PADDING_PX));
    selection_bounds(graph, nodes).map(|r| r.inflate(pad, pad))
}

/// Eight resize handles around `frame`, corners first, clockwise from top-left.
pub fn resize_handles(view: &ViewTransform, frame: Rect) -> [Rect; 8] {
    let side = f64::from(view.to_overlay_units(HANDLE_SIZE_PX));
    let size = Size::new(side, side);
    let center = frame.center();
    [
        (frame.x0, frame.y0),
        (frame.x1, frame.y0),
        (frame.x1, frame.y1),
        (frame.x0, frame.y1),
        (center.x, frame.y0),
        (frame.x1, center.y),
        (center.x, frame.y1),
        (frame.x0, center.y),
    ]
    .map(|(x, y)| Rect::from_center_size((x, y), size))
}
