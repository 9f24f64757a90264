//! Selection engine and the shared transform control.
//!
//! Selecting a node snapshots its position, opacity and stacking, dims it,
//! stops it from listening to pointer events and lifts it to the top of the
//! main layer. Clearing restores all of it. The engine is the only writer
//! of `z_order` and `stack_seq` after a node has been inserted.
//!
//! ## Capabilities
//!
//! | Selection         | Resize             | Rotate             |
//! |-------------------|--------------------|--------------------|
//! | empty             | enabled            | unchanged          |
//! | one asset         | per [`AssetKind`]  | per [`AssetKind`]  |
//! | two or more       | disabled           | disabled           |
//!
//! [`AssetKind`]: dg_core::AssetKind

use crate::events::{EditorEvent, EventQueue};
use dg_core::{NodeId, NodeIndex, SceneGraph, SelectionSnapshot, is_selectable};
use dg_render::selectable_layer;

// ─── Transform control ───────────────────────────────────────────────────

/// Grab handles of the transform control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handle {
    TopLeft,
    TopCenter,
    TopRight,
    MiddleRight,
    BottomRight,
    BottomCenter,
    BottomLeft,
    MiddleLeft,
    Rotater,
}

impl Handle {
    pub fn is_rotation(self) -> bool {
        matches!(self, Handle::Rotater)
    }
}

/// The single resize/rotate widget bound to the current selection.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformControl {
    bound_nodes: Vec<NodeIndex>,
    active_handle: Option<Handle>,
    pub resize_enabled: bool,
    pub rotate_enabled: bool,
}

impl Default for TransformControl {
    fn default() -> Self {
        Self {
            bound_nodes: Vec::new(),
            active_handle: None,
            resize_enabled: true,
            rotate_enabled: true,
        }
    }
}

impl TransformControl {
    pub fn bound_nodes(&self) -> &[NodeIndex] {
        &self.bound_nodes
    }

    pub fn active_handle(&self) -> Option<Handle> {
        self.active_handle
    }

    pub fn is_bound(&self) -> bool {
        !self.bound_nodes.is_empty()
    }

    /// Start a handle drag. Ignored when nothing is bound or the handle's
    /// capability is disabled.
    pub fn begin(&mut self, handle: Handle) -> bool {
        let allowed = if handle.is_rotation() {
            self.rotate_enabled
        } else {
            self.resize_enabled
        };
        if !self.is_bound() || !allowed {
            return false;
        }
        self.active_handle = Some(handle);
        true
    }

    pub fn end(&mut self) -> Option<Handle> {
        self.active_handle.take()
    }

    fn bind(&mut self, nodes: Vec<NodeIndex>) {
        self.bound_nodes = nodes;
        self.active_handle = None;
    }
}

// ─── Selection engine ────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct SelectionEngine {
    selected: Vec<NodeId>,
    transform: TransformControl,
    selected_opacity: f32,
}

impl Default for SelectionEngine {
    fn default() -> Self {
        Self::new(0.8)
    }
}

impl SelectionEngine {
    /// `selected_opacity` multiplies a node's opacity while it is selected.
    pub fn new(selected_opacity: f32) -> Self {
        Self {
            selected: Vec::new(),
            transform: TransformControl::default(),
            selected_opacity,
        }
    }

    /// Currently selected ids, in stacking order (topmost last).
    pub fn selected(&self) -> &[NodeId] {
        &self.selected
    }

    pub fn is_selected(&self, id: NodeId) -> bool {
        self.selected.contains(&id)
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn transform(&self) -> &TransformControl {
        &self.transform
    }

    pub fn transform_mut(&mut self) -> &mut TransformControl {
        &mut self.transform
    }

    /// Replace the selection with `ids`. An empty slice is a plain `clear`.
    pub fn select(&mut self, graph: &mut SceneGraph, ids: &[NodeId], events: &mut EventQueue) {
        if ids.is_empty() {
            self.clear(graph, false, events);
            self.transform.resize_enabled = true;
            return;
        }
        self.clear(graph, true, events);

        let mut incoming: Vec<NodeIndex> = Vec::with_capacity(ids.len());
        for &id in ids {
            let idx = graph.index_of(id);
            debug_assert!(idx.is_some(), "selecting {id}, which is not in the scene");
            let Some(idx) = idx else { continue };
            if !is_selectable(&graph.graph[idx]) || incoming.contains(&idx) {
                continue;
            }
            incoming.push(idx);
        }
        if incoming.is_empty() {
            self.transform.resize_enabled = true;
            events.push(EditorEvent::SelectionChanged);
            return;
        }

        let max_z = max_selectable_z(graph);
        incoming.sort_by_key(|&idx| graph.graph[idx].stacking_key());

        for &idx in &incoming {
            let seq = graph.next_seq();
            let node = &mut graph.graph[idx];
            node.selection = Some(SelectionSnapshot {
                position: node.position,
                opacity: node.opacity,
                z_order: node.z_order,
                stack_seq: node.stack_seq,
            });
            node.opacity *= self.selected_opacity;
            node.listening = false;
            node.z_order = max_z;
            node.stack_seq = seq;
        }

        self.apply_constraints(graph, &incoming);
        self.selected = incoming.iter().map(|&idx| graph.graph[idx].id).collect();
        self.transform.bind(incoming);

        log::debug!("selected {} node(s) at z {max_z}", self.selected.len());
        events.push(EditorEvent::SelectionChanged);
        events.push(EditorEvent::Redraw);
    }

    /// Add `id` to the current selection.
    pub fn append(&mut self, graph: &mut SceneGraph, id: NodeId, events: &mut EventQueue) {
        if self.is_selected(id) {
            return;
        }
        let mut ids = self.selected.clone();
        ids.push(id);
        self.select(graph, &ids, events);
    }

    /// Remove `id` from the current selection.
    pub fn deselect(&mut self, graph: &mut SceneGraph, id: NodeId, events: &mut EventQueue) {
        if !self.is_selected(id) {
            return;
        }
        let ids: Vec<NodeId> = self.selected.iter().copied().filter(|&s| s != id).collect();
        self.select(graph, &ids, events);
    }

    /// Detach the transform control and restore every member's snapshot.
    ///
    /// `silent` only suppresses the `SelectionChanged` notification; the
    /// restore always runs.
    pub fn clear(&mut self, graph: &mut SceneGraph, silent: bool, events: &mut EventQueue) {
        self.transform.bind(Vec::new());
        if self.selected.is_empty() {
            return;
        }

        let mut members: Vec<(NodeIndex, SelectionSnapshot)> = self
            .selected
            .iter()
            .filter_map(|&id| graph.index_of(id))
            .filter_map(|idx| graph.graph[idx].selection.map(|snap| (idx, snap)))
            .collect();
        members.sort_by_key(|(_, snap)| (snap.z_order, snap.stack_seq));

        for (idx, snap) in members {
            let node = &mut graph.graph[idx];
            node.position = snap.position;
            node.opacity = snap.opacity;
            node.z_order = snap.z_order;
            node.stack_seq = snap.stack_seq;
            node.listening = true;
            node.selection = None;
        }

        log::trace!("selection cleared ({} node(s))", self.selected.len());
        self.selected.clear();
        if !silent {
            events.push(EditorEvent::SelectionChanged);
        }
        events.push(EditorEvent::Redraw);
    }

    /// Translate every selected node by a logical offset. No snapping.
    ///
    /// The move is committed into each snapshot, so a later `clear` keeps it.
    pub fn move_selection_by(
        &mut self,
        graph: &mut SceneGraph,
        dx: f32,
        dy: f32,
        events: &mut EventQueue,
    ) {
        if self.selected.is_empty() {
            return;
        }
        for &id in &self.selected {
            let Some(node) = graph.get_by_id_mut(id) else {
                continue;
            };
            node.position = node.position.offset(dx, dy);
            if let Some(snap) = node.selection.as_mut() {
                snap.position = node.position;
            }
        }
        events.push(EditorEvent::Redraw);
    }

    /// Rotate a single selected node to `degrees` around its center.
    /// Returns `false` when rotation is disabled for the current selection.
    /// Like a move, the resulting position is committed into the snapshot.
    pub fn rotate_selection_to(
        &mut self,
        graph: &mut SceneGraph,
        degrees: f32,
        events: &mut EventQueue,
    ) -> bool {
        let &[id] = self.selected.as_slice() else {
            return false;
        };
        if !self.transform.rotate_enabled {
            return false;
        }
        let Some(idx) = graph.index_of(id) else {
            return false;
        };
        if !graph.rotate_about_center(idx, degrees) {
            return false;
        }
        let node = &mut graph.graph[idx];
        if let Some(snap) = node.selection.as_mut() {
            snap.position = node.position;
        }
        events.push(EditorEvent::Redraw);
        true
    }

    /// Select every selectable asset on the main layer.
    pub fn select_all(&mut self, graph: &mut SceneGraph, events: &mut EventQueue) {
        let ids: Vec<NodeId> = selectable_layer(graph)
            .into_iter()
            .map(|idx| graph.graph[idx].id)
            .collect();
        self.select(graph, &ids, events);
    }

    /// Lift the selection back to the top of the layer after a transform,
    /// keeping its internal order.
    pub fn renormalize(&mut self, graph: &mut SceneGraph, events: &mut EventQueue) {
        let mut members: Vec<NodeIndex> = self
            .selected
            .iter()
            .filter_map(|&id| graph.index_of(id))
            .collect();
        if members.is_empty() {
            return;
        }
        let max_z = max_selectable_z(graph);
        members.sort_by_key(|&idx| graph.graph[idx].stacking_key());
        for idx in members {
            let seq = graph.next_seq();
            let node = &mut graph.graph[idx];
            node.z_order = max_z;
            node.stack_seq = seq;
        }
        events.push(EditorEvent::Redraw);
    }

    /// Forget members that no longer exist in the graph.
    pub fn prune(&mut self, graph: &SceneGraph) {
        self.selected.retain(|&id| graph.contains(id));
        let live: Vec<NodeIndex> = self
            .transform
            .bound_nodes
            .iter()
            .copied()
            .filter(|&idx| graph.graph.contains_node(idx))
            .collect();
        self.transform.bound_nodes = live;
    }

    fn apply_constraints(&mut self, graph: &SceneGraph, nodes: &[NodeIndex]) {
        match nodes {
            [single] => {
                let caps = graph.graph[*single]
                    .asset_kind()
                    .map(|kind| kind.capabilities());
                self.transform.resize_enabled = caps.is_none_or(|c| c.resizable);
                self.transform.rotate_enabled = caps.is_none_or(|c| c.rotatable);
            }
            _ => {
                self.transform.resize_enabled = false;
                self.transform.rotate_enabled = false;
            }
        }
    }
}

/// Highest `z_order` among selectable nodes on the main layer.
fn max_selectable_z(graph: &SceneGraph) -> i32 {
    selectable_layer(graph)
        .into_iter()
        .map(|idx| graph.graph[idx].z_order)
        .max()
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dg_core::model::*;
    use pretty_assertions::assert_eq;

    fn asset(sg: &mut SceneGraph, id: &str, kind: AssetKind, z: i32) -> NodeId {
        let id = NodeId::intern(id);
        sg.add_to_layer(SceneNode::asset(id, kind).with_z(z));
        id
    }

    fn z(sg: &SceneGraph, id: NodeId) -> i32 {
        sg.get_by_id(id).unwrap().z_order
    }

    #[test]
    fn select_dims_and_stops_listening() {
        let mut sg = SceneGraph::new();
        let mut events = EventQueue::default();
        let a = asset(&mut sg, "sel_dim", AssetKind::Text, 0);
        let mut engine = SelectionEngine::default();
        engine.select(&mut sg, &[a], &mut events);

        let node = sg.get_by_id(a).unwrap();
        assert!((node.opacity - 0.8).abs() < 1e-6);
        assert!(!node.listening);
        assert!(node.is_selected());
        assert!(events.contains(EditorEvent::SelectionChanged));
    }

    #[test]
    fn elevation_preserves_relative_order() {
        let mut sg = SceneGraph::new();
        let mut events = EventQueue::default();
        let a = asset(&mut sg, "sel_el_a", AssetKind::Text, 1);
        let b = asset(&mut sg, "sel_el_b", AssetKind::Text, 4);
        let c = asset(&mut sg, "sel_el_c", AssetKind::Text, 7);
        let mut engine = SelectionEngine::default();
        engine.select(&mut sg, &[b, a], &mut events);

        assert_eq!((z(&sg, a), z(&sg, b)), (7, 7));
        let key = |id| sg.get_by_id(id).unwrap().stacking_key();
        assert!(key(a) < key(b));
        assert!(key(c) < key(a));
        assert_eq!(engine.selected(), &[a, b]);
    }

    #[test]
    fn helper_z_does_not_count_toward_max() {
        let mut sg = SceneGraph::new();
        let mut events = EventQueue::default();
        sg.add_to_layer(
            SceneNode::new(NodeId::intern("sel_helper"), NodeKind::Group)
                .with_role(NodeRole::Helper(HelperKind::SelectRect))
                .with_z(99),
        );
        let a = asset(&mut sg, "sel_helper_a", AssetKind::Text, 2);
        let _b = asset(&mut sg, "sel_helper_b", AssetKind::Text, 3);
        let mut engine = SelectionEngine::default();
        engine.select(&mut sg, &[a], &mut events);
        assert_eq!(z(&sg, a), 3);
    }

    #[test]
    fn constraint_table() {
        let mut sg = SceneGraph::new();
        let mut events = EventQueue::default();
        let line = asset(&mut sg, "sel_line", AssetKind::Graph(GraphKind::Line), 0);
        let img = asset(&mut sg, "sel_img", AssetKind::Image(ImageKind::Svg), 0);
        let mut engine = SelectionEngine::default();

        engine.select(&mut sg, &[line], &mut events);
        assert!(engine.transform().resize_enabled);
        assert!(!engine.transform().rotate_enabled);

        engine.select(&mut sg, &[img], &mut events);
        assert!(engine.transform().resize_enabled);
        assert!(engine.transform().rotate_enabled);

        engine.select(&mut sg, &[line, img], &mut events);
        assert!(!engine.transform().resize_enabled);
        assert!(!engine.transform().rotate_enabled);
        assert_eq!(engine.transform().bound_nodes().len(), 2);
    }

    #[test]
    fn select_empty_is_clear() {
        let mut sg = SceneGraph::new();
        let mut events = EventQueue::default();
        let a = asset(&mut sg, "sel_empty_a", AssetKind::Text, 0);
        let b = asset(&mut sg, "sel_empty_b", AssetKind::Text, 0);
        let mut engine = SelectionEngine::default();
        engine.select(&mut sg, &[a, b], &mut events);
        engine.select(&mut sg, &[], &mut events);

        assert!(engine.is_empty());
        assert!(!engine.transform().is_bound());
        assert!(engine.transform().resize_enabled);
        assert!(sg.get_by_id(a).unwrap().selection.is_none());
    }

    #[test]
    fn select_of_only_helpers_resets_constraints() {
        let mut sg = SceneGraph::new();
        let mut events = EventQueue::default();
        let a = asset(&mut sg, "sel_helper_a", AssetKind::Text, 0);
        let b = asset(&mut sg, "sel_helper_b", AssetKind::Text, 0);
        let helper = NodeId::intern("sel_helper_rect");
        sg.add_to_layer(
            SceneNode::new(helper, NodeKind::Group).with_role(NodeRole::Helper(HelperKind::SelectRect)),
        );
        let mut engine = SelectionEngine::default();
        engine.select(&mut sg, &[a, b], &mut events);
        assert!(!engine.transform().resize_enabled);

        engine.select(&mut sg, &[helper], &mut events);
        assert!(engine.is_empty());
        assert!(!engine.transform().is_bound());
        assert!(engine.transform().resize_enabled);
    }

    #[test]
    fn silent_clear_still_restores() {
        let mut sg = SceneGraph::new();
        let mut events = EventQueue::default();
        let a = asset(&mut sg, "sel_silent", AssetKind::Text, 0);
        let mut engine = SelectionEngine::default();
        engine.select(&mut sg, &[a], &mut events);
        events.drain();

        engine.clear(&mut sg, true, &mut events);
        assert!(!events.contains(EditorEvent::SelectionChanged));
        let node = sg.get_by_id(a).unwrap();
        assert_eq!(node.opacity, 1.0);
        assert!(node.listening);
    }

    #[test]
    fn moves_survive_clear() {
        let mut sg = SceneGraph::new();
        let mut events = EventQueue::default();
        let a = asset(&mut sg, "sel_move", AssetKind::Text, 0);
        let mut engine = SelectionEngine::default();
        engine.select(&mut sg, &[a], &mut events);
        engine.move_selection_by(&mut sg, 3.0, 4.0, &mut events);
        engine.clear(&mut sg, false, &mut events);

        assert_eq!(sg.get_by_id(a).unwrap().position, dg_core::Point::new(3.0, 4.0));
    }

    #[test]
    fn transform_begin_respects_capabilities() {
        let mut sg = SceneGraph::new();
        let mut events = EventQueue::default();
        let line = asset(&mut sg, "sel_begin_line", AssetKind::Graph(GraphKind::Bezier), 0);
        let mut engine = SelectionEngine::default();
        assert!(!engine.transform_mut().begin(Handle::TopLeft));

        engine.select(&mut sg, &[line], &mut events);
        assert!(!engine.transform_mut().begin(Handle::Rotater));
        assert!(engine.transform_mut().begin(Handle::BottomRight));
        assert_eq!(engine.transform().active_handle(), Some(Handle::BottomRight));
        assert_eq!(engine.transform_mut().end(), Some(Handle::BottomRight));
    }

    #[test]
    fn append_and_deselect() {
        let mut sg = SceneGraph::new();
        let mut events = EventQueue::default();
        let a = asset(&mut sg, "sel_app_a", AssetKind::Text, 0);
        let b = asset(&mut sg, "sel_app_b", AssetKind::Text, 0);
        let mut engine = SelectionEngine::default();
        engine.select(&mut sg, &[a], &mut events);
        engine.append(&mut sg, b, &mut events);
        assert_eq!(engine.selected().len(), 2);

        engine.deselect(&mut sg, a, &mut events);
        assert_eq!(engine.selected(), &[b]);
        let node_a = sg.get_by_id(a).unwrap();
        assert!(node_a.selection.is_none());
        assert_eq!(node_a.opacity, 1.0);
    }
}
