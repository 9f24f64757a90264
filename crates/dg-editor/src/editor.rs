//! Editor state and the public facade.
//!
//! `EditorState` owns the scene and every piece of interaction state; the
//! operations on it are what shortcut dispatch, pointer handlers and the
//! host call. `Editor` pairs it with the event dispatcher.

use crate::clone::{self, Clipboard};
use crate::config::EditorConfig;
use crate::dispatch::Dispatcher;
use crate::error::{EditorError, Result};
use crate::events::{EditorEvent, EventQueue};
use crate::input::InputEvent;
use crate::selection::SelectionEngine;
use crate::snap::SnapResize;
use dg_core::{NodeId, NodeTree, Point, SceneGraph, ViewTransform};
use dg_render::overlay;

// ─── Drag state ──────────────────────────────────────────────────────────

/// What the current left-button gesture is doing, if anything.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DragState {
    #[default]
    Idle,
    /// Rubber-band selection from `start` to `current`, stage pixels.
    Marquee { start: Point, current: Point },
    /// Moving the selection; `last` is the previous stage position.
    Moving { last: Point, moved: bool },
    /// Panning the viewport.
    Panning { last: Point },
}

// ─── Editor state ────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct EditorState {
    pub graph: SceneGraph,
    pub view: ViewTransform,
    pub selection: SelectionEngine,
    pub clipboard: Clipboard,
    pub config: EditorConfig,
    pub snap: SnapResize,
    pub drag: DragState,
    pub events: EventQueue,
}

impl EditorState {
    pub fn new(config: EditorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            graph: SceneGraph::new(),
            view: ViewTransform::default(),
            selection: SelectionEngine::new(config.selected_opacity),
            clipboard: Clipboard::default(),
            snap: SnapResize::new(config.grid_size, config.snap_threshold),
            config,
            drag: DragState::Idle,
            events: EventQueue::default(),
        })
    }

    // ─── Selection ───────────────────────────────────────────────────────

    pub fn select(&mut self, ids: &[NodeId]) {
        self.selection.select(&mut self.graph, ids, &mut self.events);
    }

    pub fn clear_selection(&mut self, silent: bool) {
        self.selection.clear(&mut self.graph, silent, &mut self.events);
    }

    pub fn select_all(&mut self) {
        self.selection.select_all(&mut self.graph, &mut self.events);
    }

    pub fn move_selection_by(&mut self, dx: f32, dy: f32) {
        self.selection
            .move_selection_by(&mut self.graph, dx, dy, &mut self.events);
    }

    /// Rotate the single selected asset around its center.
    pub fn rotate_selection_to(&mut self, degrees: f32) {
        if self.config.readonly {
            return;
        }
        if self
            .selection
            .rotate_selection_to(&mut self.graph, degrees, &mut self.events)
        {
            self.events.push(EditorEvent::StateChanged);
        }
    }

    pub fn selected(&self) -> &[NodeId] {
        self.selection.selected()
    }

    // ─── Copy / paste ────────────────────────────────────────────────────

    /// Snapshot the current selection for pasting.
    pub fn copy_start(&mut self) {
        let ids = self.selection.selected().to_vec();
        self.clipboard.copy_start(&self.graph, &ids);
    }

    /// Paste the copied snapshot, one grid cell further away each time.
    /// Returns the pasted ids; empty when nothing was copied.
    pub fn paste(&mut self) -> Vec<NodeId> {
        if self.clipboard.is_empty() {
            return Vec::new();
        }
        self.clear_selection(false);
        let offset = self.clipboard.next_offset(self.grid_step());
        let trees = self.clipboard.cache().to_vec();
        self.install_clones(&trees, offset)
    }

    /// One on-screen grid cell in logical units.
    fn grid_step(&self) -> f32 {
        self.view.to_overlay_units(self.config.grid_size)
    }

    /// Duplicate live nodes one on-screen grid cell away and select the
    /// copies. Leaves the paste cache untouched.
    pub fn duplicate(&mut self, ids: &[NodeId]) -> Vec<NodeId> {
        let trees: Vec<NodeTree> = ids
            .iter()
            .filter_map(|&id| clone::detached_copy(&self.graph, id))
            .collect();
        if trees.is_empty() {
            return Vec::new();
        }
        self.install_clones(&trees, self.grid_step())
    }

    fn install_clones(&mut self, trees: &[NodeTree], offset: f32) -> Vec<NodeId> {
        let mut alloc = clone::allocator_for(&self.graph, trees);
        let roots = clone::duplicate(&mut self.graph, trees, offset, &mut alloc);
        self.select(&roots);
        self.events.push(EditorEvent::StateChanged);
        roots
    }

    // ─── Removal ─────────────────────────────────────────────────────────

    /// Destroy nodes and every link pair that names them.
    pub fn remove(&mut self, ids: &[NodeId]) {
        if ids.is_empty() {
            return;
        }
        self.clear_selection(false);
        let mut removed = 0;
        for &id in ids {
            let Some(idx) = self.graph.index_of(id) else {
                continue;
            };
            self.graph.purge_links_to(id);
            self.graph.remove_tree(idx);
            removed += 1;
        }
        self.selection.prune(&self.graph);
        log::debug!("removed {removed} node(s)");
        if removed > 0 {
            self.events.push(EditorEvent::StateChanged);
        }
        self.events.push(EditorEvent::Redraw);
    }

    // ─── Transform control ───────────────────────────────────────────────

    /// Bound a dragged handle position (stage pixels) to the grid.
    pub fn anchor_drag_bound(&self, new_pos: Point) -> Point {
        if !self.config.attract_resize {
            return new_pos;
        }
        self.snap
            .bound_active(&self.view, self.selection.transform(), new_pos)
    }

    /// Release of a transform handle.
    pub fn transform_end(&mut self) {
        if self.selection.transform_mut().end().is_none() {
            return;
        }
        self.selection.renormalize(&mut self.graph, &mut self.events);
        self.events.push(EditorEvent::StateChanged);
    }

    // ─── Viewport ────────────────────────────────────────────────────────

    /// Set the zoom level around a stage-space anchor. Out-of-range values
    /// are clamped; non-positive or non-finite values are rejected.
    pub fn set_scale(&mut self, scale: f32, anchor: Point) -> Result<()> {
        if !(scale.is_finite() && scale > 0.0) {
            log::debug!("rejected zoom to scale {scale}");
            return Err(EditorError::InvalidScale(scale));
        }
        let scale = self.config.zoom.clamp(scale);
        if scale == self.view.scale() {
            return Ok(());
        }
        self.view.zoom_at(anchor, scale);
        self.events.push(EditorEvent::ScaleChanged);
        self.events.push(EditorEvent::PositionChanged);
        self.events.push(EditorEvent::Redraw);
        Ok(())
    }

    pub fn pan_by(&mut self, dx: f32, dy: f32) {
        if dx == 0.0 && dy == 0.0 {
            return;
        }
        self.view.pan_by(dx, dy);
        self.events.push(EditorEvent::PositionChanged);
        self.events.push(EditorEvent::Redraw);
    }

    // ─── Overlay queries ─────────────────────────────────────────────────

    /// In-progress marquee in logical units.
    pub fn marquee(&self) -> Option<kurbo::Rect> {
        match self.drag {
            DragState::Marquee { start, current } => {
                Some(overlay::marquee_rect(&self.view, start, current))
            }
            _ => None,
        }
    }

    /// Transform-control frame around the selection in logical units.
    pub fn transform_box(&self) -> Option<kurbo::Rect> {
        overlay::transform_box(
            &self.view,
            &self.graph,
            self.selection.transform().bound_nodes(),
        )
    }
}

// ─── Editor facade ───────────────────────────────────────────────────────

/// Entry point for hosts: feed input events, call operations, drain events.
pub struct Editor {
    pub state: EditorState,
    dispatcher: Dispatcher,
}

impl Editor {
    pub fn new(config: EditorConfig) -> Result<Self> {
        Ok(Self {
            state: EditorState::new(config)?,
            dispatcher: Dispatcher::standard(),
        })
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Self::new(EditorConfig::from_json(json)?)
    }

    pub fn graph(&self) -> &SceneGraph {
        &self.state.graph
    }

    pub fn graph_mut(&mut self) -> &mut SceneGraph {
        &mut self.state.graph
    }

    pub fn view(&self) -> &ViewTransform {
        &self.state.view
    }

    pub fn handle_event(&mut self, event: &InputEvent) {
        self.dispatcher.dispatch(&mut self.state, event);
    }

    pub fn select(&mut self, ids: &[NodeId]) {
        self.state.select(ids);
    }

    pub fn clear_selection(&mut self, silent: bool) {
        self.state.clear_selection(silent);
    }

    pub fn select_all(&mut self) {
        self.state.select_all();
    }

    pub fn move_selection_by(&mut self, dx: f32, dy: f32) {
        self.state.move_selection_by(dx, dy);
    }

    pub fn rotate_selection_to(&mut self, degrees: f32) {
        self.state.rotate_selection_to(degrees);
    }

    pub fn selected(&self) -> &[NodeId] {
        self.state.selected()
    }

    pub fn copy_start(&mut self) {
        self.state.copy_start();
    }

    pub fn paste(&mut self) -> Vec<NodeId> {
        self.state.paste()
    }

    pub fn duplicate(&mut self, ids: &[NodeId]) -> Vec<NodeId> {
        self.state.duplicate(ids)
    }

    pub fn remove(&mut self, ids: &[NodeId]) {
        self.state.remove(ids);
    }

    pub fn anchor_drag_bound(&self, new_pos: Point) -> Point {
        self.state.anchor_drag_bound(new_pos)
    }

    pub fn set_scale(&mut self, scale: f32, anchor: Point) -> Result<()> {
        self.state.set_scale(scale, anchor)
    }

    pub fn drain_events(&mut self) -> Vec<EditorEvent> {
        self.state.events.drain()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dg_core::model::*;

    fn editor_with(ids: &[&str]) -> (Editor, Vec<NodeId>) {
        let mut editor = Editor::new(EditorConfig::default()).unwrap();
        let ids = ids
            .iter()
            .map(|name| {
                let id = NodeId::intern(name);
                editor
                    .graph_mut()
                    .add_to_layer(SceneNode::asset(id, AssetKind::Text));
                id
            })
            .collect();
        (editor, ids)
    }

    #[test]
    fn clone_offset_is_one_screen_cell_at_any_zoom() {
        let (mut editor, ids) = editor_with(&["ed_zoomed_paste"]);
        editor.set_scale(2.0, Point::ZERO).unwrap();
        editor.select(&ids);
        editor.copy_start();

        let pos = |editor: &Editor, id| editor.graph().get_by_id(id).unwrap().position;
        let first = editor.paste();
        assert_eq!(pos(&editor, first[0]), Point::new(10.0, 10.0));
        let second = editor.paste();
        assert_eq!(pos(&editor, second[0]), Point::new(20.0, 20.0));

        let dup = editor.duplicate(&ids);
        assert_eq!(pos(&editor, dup[0]), Point::new(10.0, 10.0));
    }

    #[test]
    fn rotation_keeps_center_and_survives_clear() {
        let (mut editor, ids) = editor_with(&["ed_rotate"]);
        let idx = editor.graph().index_of(ids[0]).unwrap();
        editor.graph_mut().graph[idx].position = Point::new(100.0, 100.0);
        editor.graph_mut().add_node(
            idx,
            SceneNode::new(
                NodeId::intern("ed_rotate_body"),
                NodeKind::Rect {
                    width: 40.0,
                    height: 20.0,
                },
            ),
        );
        editor.select(&ids);
        editor.drain_events();

        editor.rotate_selection_to(90.0);
        assert!(editor.drain_events().contains(&EditorEvent::StateChanged));
        editor.clear_selection(false);

        let node = editor.graph().get_by_id(ids[0]).unwrap();
        assert_eq!(node.rotation, 90.0);
        assert!((node.position.x - 130.0).abs() < 1e-3);
        assert!((node.position.y - 90.0).abs() < 1e-3);
    }

    #[test]
    fn rotation_is_ignored_for_multi_select() {
        let (mut editor, ids) = editor_with(&["ed_rot_multi_a", "ed_rot_multi_b"]);
        editor.select(&ids);
        editor.rotate_selection_to(45.0);
        assert!(
            ids.iter()
                .all(|&id| editor.graph().get_by_id(id).unwrap().rotation == 0.0)
        );
    }

    #[test]
    fn paste_with_empty_cache_is_noop() {
        let (mut editor, _) = editor_with(&["ed_empty_paste"]);
        assert!(editor.paste().is_empty());
        assert_eq!(editor.graph().layer().len(), 1);
    }

    #[test]
    fn paste_selects_clones_and_requests_history() {
        let (mut editor, ids) = editor_with(&["ed_paste"]);
        editor.select(&ids);
        editor.copy_start();
        editor.drain_events();

        let pasted = editor.paste();
        assert_eq!(editor.selected(), pasted.as_slice());
        let events = editor.drain_events();
        assert!(events.contains(&EditorEvent::StateChanged));
        assert!(events.contains(&EditorEvent::SelectionChanged));
    }

    #[test]
    fn rejects_bad_scale() {
        let (mut editor, _) = editor_with(&[]);
        assert!(matches!(
            editor.set_scale(0.0, Point::ZERO),
            Err(EditorError::InvalidScale(_))
        ));
        assert!(editor.set_scale(f32::NAN, Point::ZERO).is_err());
    }

    #[test]
    fn scale_is_clamped() {
        let (mut editor, _) = editor_with(&[]);
        editor.set_scale(50.0, Point::ZERO).unwrap();
        assert_eq!(editor.view().scale(), 5.0);
        editor.set_scale(0.01, Point::ZERO).unwrap();
        assert_eq!(editor.view().scale(), 0.2);
    }

    #[test]
    fn anchor_bound_respects_attract_flag() {
        let (mut editor, ids) = editor_with(&["ed_attract"]);
        editor.select(&ids);
        editor
            .state
            .selection
            .transform_mut()
            .begin(crate::selection::Handle::BottomRight);
        assert_eq!(
            editor.anchor_drag_bound(Point::new(42.0, 42.0)),
            Point::new(40.0, 40.0)
        );

        editor.state.config.attract_resize = false;
        assert_eq!(
            editor.anchor_drag_bound(Point::new(42.0, 42.0)),
            Point::new(42.0, 42.0)
        );
    }

    #[test]
    fn remove_clears_selection() {
        let (mut editor, ids) = editor_with(&["ed_rm_a", "ed_rm_b"]);
        editor.select(&ids);
        editor.remove(&ids[..1]);
        assert!(editor.selected().is_empty());
        assert!(!editor.graph().contains(ids[0]));
        let b = editor.graph().get_by_id(ids[1]).unwrap();
        assert_eq!(b.opacity, 1.0);
    }
}
