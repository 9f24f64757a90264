//! Interaction handlers for canvas input.
//!
//! Each handler owns one capability. The dispatcher offers every event to
//! the handlers in priority order until one of them returns `Flow::Stop`.
//!
//! ## Gestures
//!
//! | Input                         | Effect                                 |
//! |-------------------------------|----------------------------------------|
//! | left drag on empty canvas     | marquee selection                      |
//! | click asset                   | select it alone                        |
//! | ctrl/⌘ click asset            | add it to the selection                |
//! | ctrl/⌘ click transform box    | toggle the node under the pointer      |
//! | drag selection                | move every selected node               |
//! | right drag, ctrl + left drag  | pan                                    |
//! | wheel / ctrl + wheel          | pan / zoom at pointer                  |
//! | arrow keys                    | nudge selection, accelerating          |

use crate::editor::{DragState, EditorState};
use crate::events::{EditorEvent, HistoryRequest};
use crate::input::{InputEvent, Modifiers, MouseButton};
use crate::shortcuts::{ShortcutAction, ShortcutMap};
use dg_core::{NodeId, NodeIndex, Point, SceneGraph};
use dg_render::{hit, overlay};

/// Whether lower-priority handlers still see the event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionKind {
    Shortcut,
    KeyMove,
    Zoom,
    Transform,
    Pan,
    Selection,
    Hover,
}

/// Trait for capability handlers consuming input events.
pub trait Interaction {
    fn kind(&self) -> InteractionKind;

    fn handle(&mut self, state: &mut EditorState, event: &InputEvent) -> Flow;
}

/// Topmost asset under a logical point that still listens to the pointer.
fn listening_hit(graph: &SceneGraph, logical: Point) -> Option<NodeIndex> {
    let candidates: Vec<NodeIndex> = hit::selectable_layer(graph)
        .into_iter()
        .filter(|&idx| graph.graph[idx].listening)
        .collect();
    hit::point_hit(graph, logical, &candidates)
}

// ─── Shortcuts ───────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct ShortcutInteraction;

impl Interaction for ShortcutInteraction {
    fn kind(&self) -> InteractionKind {
        InteractionKind::Shortcut
    }

    fn handle(&mut self, state: &mut EditorState, event: &InputEvent) -> Flow {
        let InputEvent::KeyDown { key, modifiers } = event else {
            return Flow::Continue;
        };
        let Some(action) = ShortcutMap::resolve(
            key,
            modifiers.ctrl,
            modifiers.shift,
            modifiers.alt,
            modifiers.meta,
        ) else {
            return Flow::Continue;
        };
        if state.config.readonly && action.is_editing() {
            log::trace!("readonly: ignoring {action:?}");
            return Flow::Stop;
        }

        match action {
            ShortcutAction::Copy => state.copy_start(),
            ShortcutAction::Paste => {
                state.paste();
            }
            ShortcutAction::SelectAll => state.select_all(),
            ShortcutAction::Delete => {
                let ids = state.selected().to_vec();
                state.remove(&ids);
            }
            ShortcutAction::Deselect => state.clear_selection(false),
            ShortcutAction::Undo => state
                .events
                .push(EditorEvent::HistoryRequested(HistoryRequest::Undo)),
            ShortcutAction::Redo => state
                .events
                .push(EditorEvent::HistoryRequested(HistoryRequest::Redo)),
        }
        Flow::Stop
    }
}

// ─── Key move ────────────────────────────────────────────────────────────

/// Arrow-key nudging. Holding a key accelerates up to `key_move.speed_max`.
#[derive(Debug)]
pub struct KeyMoveInteraction {
    speed: f32,
    moved: bool,
}

impl Default for KeyMoveInteraction {
    fn default() -> Self {
        Self {
            speed: 1.0,
            moved: false,
        }
    }
}

fn arrow_direction(key: &str) -> Option<(f32, f32)> {
    match key {
        "ArrowUp" => Some((0.0, -1.0)),
        "ArrowDown" => Some((0.0, 1.0)),
        "ArrowLeft" => Some((-1.0, 0.0)),
        "ArrowRight" => Some((1.0, 0.0)),
        _ => None,
    }
}

impl KeyMoveInteraction {
    pub fn speed(&self) -> f32 {
        self.speed
    }
}

impl Interaction for KeyMoveInteraction {
    fn kind(&self) -> InteractionKind {
        InteractionKind::KeyMove
    }

    fn handle(&mut self, state: &mut EditorState, event: &InputEvent) -> Flow {
        match event {
            InputEvent::KeyDown { key, modifiers } if !modifiers.command() => {
                let Some((ux, uy)) = arrow_direction(key) else {
                    return Flow::Continue;
                };
                if state.config.readonly || state.selection.is_empty() {
                    return Flow::Stop;
                }
                state.move_selection_by(ux * self.speed, uy * self.speed);
                self.speed = (self.speed + 1.0).min(state.config.key_move.speed_max);
                self.moved = true;
                Flow::Stop
            }
            InputEvent::KeyUp { key, .. } if arrow_direction(key).is_some() => {
                self.speed = 1.0;
                if std::mem::take(&mut self.moved) {
                    state.events.push(EditorEvent::StateChanged);
                }
                Flow::Stop
            }
            _ => Flow::Continue,
        }
    }
}

// ─── Zoom ────────────────────────────────────────────────────────────────

/// Ctrl + wheel zooms around the pointer, a plain wheel pans.
#[derive(Debug, Default)]
pub struct ZoomInteraction;

impl Interaction for ZoomInteraction {
    fn kind(&self) -> InteractionKind {
        InteractionKind::Zoom
    }

    fn handle(&mut self, state: &mut EditorState, event: &InputEvent) -> Flow {
        let InputEvent::Wheel {
            x,
            y,
            dx,
            dy,
            modifiers,
        } = event
        else {
            return Flow::Continue;
        };

        if modifiers.ctrl {
            if *dy == 0.0 {
                return Flow::Stop;
            }
            let step = state.config.zoom.scale_by;
            let current = state.view.scale();
            let target = if *dy < 0.0 {
                current + step
            } else {
                current - step
            };
            let target = state.config.zoom.clamp(target);
            if let Err(err) = state.set_scale(target, Point::new(*x, *y)) {
                log::debug!("zoom ignored: {err}");
            }
        } else {
            state.pan_by(-dx, -dy);
        }
        Flow::Stop
    }
}

// ─── Transform control ───────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct TransformInteraction;

impl Interaction for TransformInteraction {
    fn kind(&self) -> InteractionKind {
        InteractionKind::Transform
    }

    fn handle(&mut self, state: &mut EditorState, event: &InputEvent) -> Flow {
        match event {
            InputEvent::TransformStart { handle } => {
                if !state.config.readonly {
                    state.selection.transform_mut().begin(*handle);
                }
                Flow::Stop
            }
            InputEvent::TransformEnd => {
                state.transform_end();
                Flow::Stop
            }
            _ => Flow::Continue,
        }
    }
}

// ─── Pan ─────────────────────────────────────────────────────────────────

/// Right-button drag, or ctrl + left drag on empty canvas, pans the viewport.
#[derive(Debug, Default)]
pub struct PanInteraction;

impl PanInteraction {
    fn starts_pan(state: &EditorState, p: Point, button: MouseButton, modifiers: Modifiers) -> bool {
        match button {
            MouseButton::Right => true,
            MouseButton::Left if modifiers.ctrl => {
                let logical = state.view.screen_to_logical(p);
                let on_control = state
                    .transform_box()
                    .is_some_and(|frame| frame.contains(to_kurbo(logical)));
                !on_control && listening_hit(&state.graph, logical).is_none()
            }
            _ => false,
        }
    }
}

impl Interaction for PanInteraction {
    fn kind(&self) -> InteractionKind {
        InteractionKind::Pan
    }

    fn handle(&mut self, state: &mut EditorState, event: &InputEvent) -> Flow {
        match event {
            InputEvent::PointerDown {
                x,
                y,
                button,
                modifiers,
            } => {
                let p = Point::new(*x, *y);
                if !Self::starts_pan(state, p, *button, *modifiers) {
                    return Flow::Continue;
                }
                state.drag = DragState::Panning { last: p };
                // Ctrl + left on empty canvas still clears the selection below.
                if *button == MouseButton::Right {
                    Flow::Stop
                } else {
                    Flow::Continue
                }
            }
            InputEvent::PointerMove { x, y, .. } => {
                let DragState::Panning { last } = state.drag else {
                    return Flow::Continue;
                };
                let p = Point::new(*x, *y);
                state.pan_by(p.x - last.x, p.y - last.y);
                state.drag = DragState::Panning { last: p };
                Flow::Stop
            }
            InputEvent::PointerUp { .. } if matches!(state.drag, DragState::Panning { .. }) => {
                state.drag = DragState::Idle;
                Flow::Stop
            }
            _ => Flow::Continue,
        }
    }
}

// ─── Selection ───────────────────────────────────────────────────────────

/// Click selection, marquee selection and dragging the selection.
#[derive(Debug, Default)]
pub struct SelectionInteraction;

fn to_kurbo(p: Point) -> kurbo::Point {
    kurbo::Point::new(f64::from(p.x), f64::from(p.y))
}

impl SelectionInteraction {
    /// Ctrl/⌘ click on the transform control: drop the topmost selected node
    /// under the pointer, or add the topmost unselected one.
    fn toggle_at(state: &mut EditorState, logical: Point) {
        let bound = state.selection.transform().bound_nodes().to_vec();
        if let Some(idx) = hit::point_hit(&state.graph, logical, &bound) {
            let id = state.graph.graph[idx].id;
            state.selection.deselect(&mut state.graph, id, &mut state.events);
        } else if let Some(idx) = listening_hit(&state.graph, logical) {
            let id = state.graph.graph[idx].id;
            state.selection.append(&mut state.graph, id, &mut state.events);
        }
    }

    fn pointer_down(state: &mut EditorState, p: Point, modifiers: Modifiers) {
        let logical = state.view.screen_to_logical(p);
        let movable = !state.config.readonly;

        let on_control = state.selection.transform().is_bound()
            && state
                .transform_box()
                .is_some_and(|frame| frame.contains(to_kurbo(logical)));
        if on_control {
            if modifiers.command() {
                Self::toggle_at(state, logical);
            } else if movable {
                state.drag = DragState::Moving {
                    last: p,
                    moved: false,
                };
            }
            return;
        }

        match listening_hit(&state.graph, logical) {
            Some(idx) => {
                let id: NodeId = state.graph.graph[idx].id;
                if modifiers.command() {
                    state.selection.append(&mut state.graph, id, &mut state.events);
                } else {
                    state.select(&[id]);
                }
                if movable {
                    state.drag = DragState::Moving {
                        last: p,
                        moved: false,
                    };
                }
            }
            None => {
                state.clear_selection(false);
                if !modifiers.ctrl && !matches!(state.drag, DragState::Panning { .. }) {
                    state.drag = DragState::Marquee {
                        start: p,
                        current: p,
                    };
                }
            }
        }
    }

    fn pointer_up(state: &mut EditorState) {
        let marquee = state.marquee().map(overlay::from_rect);
        match std::mem::take(&mut state.drag) {
            DragState::Marquee { .. } => {
                if let Some(rect) = marquee
                    && rect.has_area()
                {
                    let ids: Vec<NodeId> = hit::hit_test_rect(&state.graph, &rect)
                        .into_iter()
                        .map(|idx| state.graph.graph[idx].id)
                        .collect();
                    state.select(&ids);
                }
                state.events.push(EditorEvent::Redraw);
            }
            DragState::Moving { moved: true, .. } => {
                state.events.push(EditorEvent::StateChanged);
            }
            _ => {}
        }
    }
}

impl Interaction for SelectionInteraction {
    fn kind(&self) -> InteractionKind {
        InteractionKind::Selection
    }

    fn handle(&mut self, state: &mut EditorState, event: &InputEvent) -> Flow {
        match event {
            InputEvent::PointerDown {
                x,
                y,
                button: MouseButton::Left,
                modifiers,
            } => {
                Self::pointer_down(state, Point::new(*x, *y), *modifiers);
                Flow::Stop
            }
            InputEvent::PointerMove { x, y, .. } => {
                let p = Point::new(*x, *y);
                match state.drag {
                    DragState::Marquee { start, .. } => {
                        state.drag = DragState::Marquee { start, current: p };
                        state.events.push(EditorEvent::Redraw);
                        Flow::Stop
                    }
                    DragState::Moving { last, .. } => {
                        let dx = state.view.to_overlay_units(p.x - last.x);
                        let dy = state.view.to_overlay_units(p.y - last.y);
                        state.move_selection_by(dx, dy);
                        state.drag = DragState::Moving {
                            last: p,
                            moved: true,
                        };
                        Flow::Stop
                    }
                    _ => Flow::Continue,
                }
            }
            InputEvent::PointerUp { .. } => {
                Self::pointer_up(state);
                Flow::Stop
            }
            _ => Flow::Continue,
        }
    }
}

// ─── Hover ───────────────────────────────────────────────────────────────

/// Shows an asset's connection points while the pointer is over it.
#[derive(Debug, Default)]
pub struct HoverInteraction {
    hovered: Option<NodeId>,
}

impl HoverInteraction {
    pub fn hovered(&self) -> Option<NodeId> {
        self.hovered
    }

    fn set_hover(graph: &mut SceneGraph, id: NodeId, on: bool) {
        if let Some(node) = graph.get_by_id_mut(id) {
            node.hovered = on;
            for point in &mut node.points {
                point.visible = on;
            }
        }
    }
}

impl Interaction for HoverInteraction {
    fn kind(&self) -> InteractionKind {
        InteractionKind::Hover
    }

    fn handle(&mut self, state: &mut EditorState, event: &InputEvent) -> Flow {
        let InputEvent::PointerMove { x, y, .. } = event else {
            return Flow::Continue;
        };
        let logical = state.view.screen_to_logical(Point::new(*x, *y));
        let target = listening_hit(&state.graph, logical).map(|idx| state.graph.graph[idx].id);
        if target == self.hovered {
            return Flow::Continue;
        }
        if let Some(old) = self.hovered.take() {
            Self::set_hover(&mut state.graph, old, false);
        }
        if let Some(new) = target {
            Self::set_hover(&mut state.graph, new, true);
        }
        self.hovered = target;
        state.events.push(EditorEvent::Redraw);
        Flow::Continue
    }
}
