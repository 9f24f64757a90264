//! Core scene model for the diagram surface.
//!
//! The scene is a tree held in a `StableDiGraph`: edges go parent → child.
//! Direct children of the root form the main layer. User-placed assets are
//! `Group` nodes on that layer whose children are the primitives that draw
//! them; overlay roots and selection helpers live on the same layer and are
//! told apart by their `NodeRole`.
//!
//! Assets with connection points carry their link pairs inline on each point,
//! so two linked assets each hold a copy of the pair record.

use crate::geometry::{Bounds, Point, rotate_around_center};
use crate::id::NodeId;
use petgraph::graph::NodeIndex;
use petgraph::stable_graph::StableDiGraph;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::{HashMap, HashSet};

// ─── Asset kinds & capabilities ──────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageKind {
    Svg,
    Gif,
    Other,
}

/// Vector graphic subtypes drawn with the graph tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GraphKind {
    Line,
    Curve,
    Rect,
    Circle,
    Bezier,
}

/// What a selectable asset is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssetKind {
    Image(ImageKind),
    Graph(GraphKind),
    Text,
    /// Structured asset loaded from a JSON description.
    Json,
}

/// Editing capabilities the transform control exposes for a single asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub resizable: bool,
    pub rotatable: bool,
}

impl AssetKind {
    /// Per-variant capability table.
    ///
    /// | kind                       | resize | rotate |
    /// |----------------------------|--------|--------|
    /// | Image / Text / Json        | yes    | yes    |
    /// | Graph Line / Curve / Bezier| yes    | no     |
    /// | Graph Rect / Circle        | no     | yes    |
    pub const fn capabilities(self) -> Capabilities {
        match self {
            AssetKind::Graph(GraphKind::Line | GraphKind::Curve | GraphKind::Bezier) => {
                Capabilities {
                    resizable: true,
                    rotatable: false,
                }
            }
            // Sized through their own adjust anchors instead of the transform box.
            AssetKind::Graph(GraphKind::Rect | GraphKind::Circle) => Capabilities {
                resizable: false,
                rotatable: true,
            },
            AssetKind::Image(_) | AssetKind::Text | AssetKind::Json => Capabilities {
                resizable: true,
                rotatable: true,
            },
        }
    }
}

// ─── Roles ───────────────────────────────────────────────────────────────

/// Interaction helpers drawn by the selection machinery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HelperKind {
    SelectRect,
    HoverRect,
}

/// Roots of auxiliary draw layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OverlayKind {
    Background,
    Ruler,
    ScaleInfo,
    ReferenceLine,
    ContextMenu,
    Attract,
}

/// Primitives used to render links.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinkPart {
    Anchor,
    LinkingLine,
    Point,
    Line,
    ManualPoint,
}

/// What a node is for. Only `Asset` roots can ever be selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NodeRole {
    Asset(AssetKind),
    Helper(HelperKind),
    Overlay(OverlayKind),
    Link(LinkPart),
    /// A drawing primitive inside an asset.
    #[default]
    Part,
}

// ─── Shapes ──────────────────────────────────────────────────────────────

/// The geometric primitive a node draws.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeKind {
    Root,
    /// Container with no geometry of its own.
    Group,
    Rect {
        width: f32,
        height: f32,
    },
    /// Centered on the node origin.
    Ellipse {
        rx: f32,
        ry: f32,
    },
    Image {
        width: f32,
        height: f32,
    },
    Text {
        content: String,
        width: f32,
        height: f32,
    },
    Line {
        points: Vec<Point>,
    },
}

impl NodeKind {
    pub fn is_container(&self) -> bool {
        matches!(self, NodeKind::Group)
    }

    /// Own extent in node-local coordinates, ignoring children.
    pub fn local_bounds(&self) -> Option<Bounds> {
        match self {
            NodeKind::Root | NodeKind::Group => None,
            NodeKind::Rect { width, height }
            | NodeKind::Image { width, height }
            | NodeKind::Text { width, height, .. } => Some(Bounds::new(0.0, 0.0, *width, *height)),
            NodeKind::Ellipse { rx, ry } => Some(Bounds::new(-rx, -ry, rx * 2.0, ry * 2.0)),
            NodeKind::Line { points } => Bounds::enclosing(points.iter().copied()),
        }
    }
}

// ─── Connection points & links ───────────────────────────────────────────

/// Which side of its owner a connection point sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Top,
    Bottom,
    Left,
    Right,
}

/// How a link between two points is routed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LinkKind {
    #[default]
    Auto,
    Straight,
    Manual,
    Curve,
    Bezier,
}

/// Per-link style overrides.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LinkStyle {
    pub stroke: Option<String>,
    pub stroke_width: Option<f32>,
    pub arrow_start: bool,
    pub arrow_end: bool,
    pub tension: Option<f32>,
}

/// One end of a link pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub owner_id: NodeId,
    pub point_id: NodeId,
}

/// A connection between two connection points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkPair {
    pub id: NodeId,
    pub from: Endpoint,
    pub to: Endpoint,
    /// Excluded from link rendering, but kept.
    pub disabled: bool,
    pub link_type: Option<LinkKind>,
    pub style: Option<LinkStyle>,
}

impl LinkPair {
    pub fn new(id: NodeId, from: Endpoint, to: Endpoint) -> Self {
        Self {
            id,
            from,
            to,
            disabled: false,
            link_type: None,
            style: None,
        }
    }

    pub fn touches(&self, owner_id: NodeId) -> bool {
        self.from.owner_id == owner_id || self.to.owner_id == owner_id
    }
}

/// A named attachment location on an asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionPoint {
    pub id: NodeId,
    pub owner_id: NodeId,
    pub x: f32,
    pub y: f32,
    pub direction: Option<Direction>,
    pub alias: Option<String>,
    pub visible: bool,
    pub pairs: SmallVec<[LinkPair; 2]>,
}

impl ConnectionPoint {
    pub fn new(id: NodeId, owner_id: NodeId, x: f32, y: f32) -> Self {
        Self {
            id,
            owner_id,
            x,
            y,
            direction: None,
            alias: None,
            visible: false,
            pairs: SmallVec::new(),
        }
    }
}

/// Adjust handle of a graph asset (line end, curve control, …).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphAnchor {
    pub adjust_type: String,
    pub owner_id: NodeId,
}

// ─── Scene nodes ─────────────────────────────────────────────────────────

/// State captured when a node enters the selection, restored when it leaves.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SelectionSnapshot {
    pub position: Point,
    pub opacity: f32,
    pub z_order: i32,
    pub stack_seq: u64,
}

/// A single node in the scene tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneNode {
    pub id: NodeId,
    pub kind: NodeKind,
    pub role: NodeRole,

    /// Parent-relative position.
    pub position: Point,
    pub rotation: f32,
    pub scale_x: f32,
    pub scale_y: f32,

    /// Render and selection priority; higher draws on top.
    pub z_order: i32,
    /// Tie-break among equal `z_order`: higher was stacked later and wins.
    /// Stamped by the graph on insertion and by the selection on elevation.
    pub stack_seq: u64,

    pub opacity: f32,
    /// Whether the node reacts to pointer events.
    pub listening: bool,
    pub visible: bool,
    pub hovered: bool,

    pub points: Vec<ConnectionPoint>,
    pub anchors: Vec<GraphAnchor>,
    /// Manual bend points of links leaving this asset, keyed by pair id.
    pub manual_points: HashMap<NodeId, Vec<Point>>,

    /// Present only while the node is selected.
    pub selection: Option<SelectionSnapshot>,
}

impl SceneNode {
    pub fn new(id: NodeId, kind: NodeKind) -> Self {
        Self {
            id,
            kind,
            role: NodeRole::Part,
            position: Point::ZERO,
            rotation: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            z_order: 0,
            stack_seq: 0,
            opacity: 1.0,
            listening: true,
            visible: true,
            hovered: false,
            points: Vec::new(),
            anchors: Vec::new(),
            manual_points: HashMap::new(),
            selection: None,
        }
    }

    /// An asset root group.
    pub fn asset(id: NodeId, kind: AssetKind) -> Self {
        Self {
            role: NodeRole::Asset(kind),
            ..Self::new(id, NodeKind::Group)
        }
    }

    pub fn with_role(mut self, role: NodeRole) -> Self {
        self.role = role;
        self
    }

    pub fn at(mut self, x: f32, y: f32) -> Self {
        self.position = Point::new(x, y);
        self
    }

    pub fn with_z(mut self, z_order: i32) -> Self {
        self.z_order = z_order;
        self
    }

    pub fn asset_kind(&self) -> Option<AssetKind> {
        match self.role {
            NodeRole::Asset(kind) => Some(kind),
            _ => None,
        }
    }

    /// Ordering key for stacking: higher draws and hit-tests first.
    pub fn stacking_key(&self) -> (i32, u64) {
        (self.z_order, self.stack_seq)
    }

    pub fn is_selected(&self) -> bool {
        self.selection.is_some()
    }

    /// Drop pointer-interaction leftovers so a copy starts fresh.
    pub fn reset_interaction(&mut self) {
        if let Some(snapshot) = self.selection.take() {
            self.opacity = snapshot.opacity;
        }
        self.listening = true;
        self.hovered = false;
    }

    /// Map a node-local point into the parent's coordinate space.
    pub fn to_parent(&self, p: Point) -> Point {
        Point::new(p.x * self.scale_x, p.y * self.scale_y)
            .rotate(self.rotation)
            .offset(self.position.x, self.position.y)
    }

    pub fn find_point(&self, point_id: NodeId) -> Option<&ConnectionPoint> {
        self.points.iter().find(|p| p.id == point_id)
    }
}

/// A detached deep copy of a node and its descendants.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeTree {
    pub node: SceneNode,
    pub children: Vec<NodeTree>,
}

impl NodeTree {
    /// Visit this node and every descendant, parents before children.
    pub fn walk_mut(&mut self, f: &mut impl FnMut(&mut SceneNode)) {
        f(&mut self.node);
        for child in &mut self.children {
            child.walk_mut(f);
        }
    }

    pub fn walk(&self, f: &mut impl FnMut(&SceneNode)) {
        f(&self.node);
        for child in &self.children {
            child.walk(f);
        }
    }
}

// ─── Scene Graph ─────────────────────────────────────────────────────────

/// The complete scene: a tree of `SceneNode` values under a single root.
#[derive(Debug, Clone)]
pub struct SceneGraph {
    /// The underlying directed graph.
    pub graph: StableDiGraph<SceneNode, ()>,

    /// The root node index.
    pub root: NodeIndex,

    /// Index from NodeId → NodeIndex for fast lookup.
    pub id_index: HashMap<NodeId, NodeIndex>,

    next_seq: u64,
}

impl SceneGraph {
    /// Create a new empty scene graph with a root node.
    #[must_use]
    pub fn new() -> Self {
        let mut graph = StableDiGraph::new();
        let root_id = NodeId::intern("root");
        let root = graph.add_node(SceneNode::new(root_id, NodeKind::Root));

        let mut id_index = HashMap::new();
        id_index.insert(root_id, root);

        Self {
            graph,
            root,
            id_index,
            next_seq: 0,
        }
    }

    /// Fresh stacking sequence number; strictly increasing.
    pub fn next_seq(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }

    /// Add a node as a child of `parent`. Returns the new node's index.
    pub fn add_node(&mut self, parent: NodeIndex, mut node: SceneNode) -> NodeIndex {
        debug_assert!(
            !self.id_index.contains_key(&node.id),
            "duplicate scene id {}",
            node.id
        );
        node.stack_seq = self.next_seq();
        let id = node.id;
        let idx = self.graph.add_node(node);
        self.graph.add_edge(parent, idx, ());
        self.id_index.insert(id, idx);
        idx
    }

    /// Add a node to the main layer.
    pub fn add_to_layer(&mut self, node: SceneNode) -> NodeIndex {
        self.add_node(self.root, node)
    }

    /// Remove a node and all of its descendants, keeping `id_index` in sync.
    pub fn remove_tree(&mut self, idx: NodeIndex) -> Option<SceneNode> {
        for child in self.children(idx) {
            self.remove_tree(child);
        }
        let removed = self.graph.remove_node(idx);
        if let Some(node) = &removed {
            self.id_index.remove(&node.id);
        }
        removed
    }

    /// Look up a node by its id.
    pub fn get_by_id(&self, id: NodeId) -> Option<&SceneNode> {
        self.id_index.get(&id).map(|idx| &self.graph[*idx])
    }

    /// Look up a node mutably by its id.
    pub fn get_by_id_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        self.id_index
            .get(&id)
            .copied()
            .map(|idx| &mut self.graph[idx])
    }

    pub fn index_of(&self, id: NodeId) -> Option<NodeIndex> {
        self.id_index.get(&id).copied()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.id_index.contains_key(&id)
    }

    /// Children of a node in insertion order.
    ///
    /// Sorted by `NodeIndex` so the result is deterministic regardless of
    /// how `petgraph` iterates its adjacency list.
    pub fn children(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut children: Vec<NodeIndex> = self
            .graph
            .neighbors_directed(idx, petgraph::Direction::Outgoing)
            .collect();
        children.sort();
        children
    }

    /// Nodes directly on the main layer.
    pub fn layer(&self) -> Vec<NodeIndex> {
        self.children(self.root)
    }

    /// Every identifier currently in use: nodes, connection points, link pairs.
    pub fn all_ids(&self) -> HashSet<NodeId> {
        let mut ids = HashSet::new();
        for node in self.graph.node_weights() {
            ids.insert(node.id);
            for point in &node.points {
                ids.insert(point.id);
                for pair in &point.pairs {
                    ids.insert(pair.id);
                    ids.insert(pair.from.owner_id);
                    ids.insert(pair.from.point_id);
                    ids.insert(pair.to.owner_id);
                    ids.insert(pair.to.point_id);
                }
            }
            ids.extend(node.manual_points.keys().copied());
        }
        ids
    }

    /// Detach-free deep copy of the subtree rooted at `idx`.
    pub fn extract_tree(&self, idx: NodeIndex) -> NodeTree {
        NodeTree {
            node: self.graph[idx].clone(),
            children: self
                .children(idx)
                .into_iter()
                .map(|child| self.extract_tree(child))
                .collect(),
        }
    }

    /// Insert a detached subtree below `parent`, preserving child order.
    pub fn insert_tree(&mut self, parent: NodeIndex, tree: NodeTree) -> NodeIndex {
        let idx = self.add_node(parent, tree.node);
        for child in tree.children {
            self.insert_tree(idx, child);
        }
        idx
    }

    /// Bounding rectangle of a node and its visible descendants in the
    /// coordinate space of the node's parent. For main-layer nodes that is
    /// logical scene space.
    pub fn client_rect(&self, idx: NodeIndex) -> Option<Bounds> {
        let node = &self.graph[idx];
        if matches!(node.kind, NodeKind::Root) || !node.visible {
            return None;
        }
        let local = self.local_extent(idx)?;
        Bounds::enclosing(local.corners().map(|c| node.to_parent(c)))
    }

    fn local_extent(&self, idx: NodeIndex) -> Option<Bounds> {
        let own = self.graph[idx].kind.local_bounds();
        self.children(idx)
            .into_iter()
            .filter_map(|child| self.client_rect(child))
            .fold(own, |acc, b| Some(acc.map_or(b, |a| a.union(&b))))
    }

    /// Set a node's rotation, shifting its position so the center of its
    /// local extent stays where it is. Returns `false` for nodes without
    /// an extent.
    pub fn rotate_about_center(&mut self, idx: NodeIndex, degrees: f32) -> bool {
        let Some(extent) = self.local_extent(idx) else {
            return false;
        };
        let node = &mut self.graph[idx];
        let center = Point::new(
            (extent.x + extent.width / 2.0) * node.scale_x,
            (extent.y + extent.height / 2.0) * node.scale_y,
        );
        let shift = rotate_around_center(center, node.rotation, degrees);
        node.position = node.position.offset(shift.x, shift.y);
        node.rotation = degrees;
        true
    }

    /// Find a connection point by owner and point id.
    pub fn find_point(&self, endpoint: Endpoint) -> Option<&ConnectionPoint> {
        self.get_by_id(endpoint.owner_id)?
            .find_point(endpoint.point_id)
    }

    /// Every enabled pair on `owner_id` whose endpoints both still resolve.
    /// Pairs naming a deleted asset are skipped.
    pub fn live_pairs(&self, owner_id: NodeId) -> Vec<&LinkPair> {
        let Some(node) = self.get_by_id(owner_id) else {
            return Vec::new();
        };
        node.points
            .iter()
            .flat_map(|p| p.pairs.iter())
            .filter(|pair| !pair.disabled)
            .filter(|pair| self.find_point(pair.from).is_some() && self.find_point(pair.to).is_some())
            .collect()
    }

    /// Drop every link pair that names `owner_id` on either side from all
    /// other nodes, together with the manual bend points keyed by it.
    /// Returns the number of pair records removed.
    pub fn purge_links_to(&mut self, owner_id: NodeId) -> usize {
        let mut removed = 0;
        for node in self.graph.node_weights_mut() {
            if node.id == owner_id || node.points.is_empty() {
                continue;
            }
            for point in &mut node.points {
                for pair in point.pairs.iter().filter(|pair| pair.touches(owner_id)) {
                    node.manual_points.remove(&pair.id);
                    removed += 1;
                }
                point.pairs.retain(|pair| !pair.touches(owner_id));
            }
        }
        if removed > 0 {
            log::debug!("purged {removed} link pair(s) referencing {owner_id}");
        }
        removed
    }
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}
