//! Duplication of asset subtrees with their internal identifier graph.
//!
//! Assets reference each other by id: connection points name their owner,
//! link pairs name both endpoints, manual bend points are keyed by pair id
//! and graph anchors name their owner. A clone gets a fresh id for every
//! node, point and pair that belongs to the duplicated set, and every
//! reference to one of those ids is rewritten. References that leave the
//! set are kept as they are.

use dg_core::{IdAllocator, IdPrefix, NodeId, NodeTree, SceneGraph, SceneNode};
use std::collections::{HashMap, HashSet};

// ─── Identifier remap ────────────────────────────────────────────────────

/// One-to-one mapping from original ids to fresh ids for one duplication.
#[derive(Debug, Default)]
pub struct IdRemap {
    map: HashMap<NodeId, NodeId>,
}

impl IdRemap {
    /// Map `old` to a fresh id, allocating it on first encounter only.
    fn assign(&mut self, old: NodeId, prefix: IdPrefix, alloc: &mut IdAllocator) -> NodeId {
        *self.map.entry(old).or_insert_with(|| alloc.fresh(prefix))
    }

    fn get(&self, old: NodeId) -> Option<NodeId> {
        self.map.get(&old).copied()
    }

    /// The mapped id, or `id` itself when it was not part of the set.
    pub fn apply(&self, id: NodeId) -> NodeId {
        self.get(id).unwrap_or(id)
    }

    fn len(&self) -> usize {
        self.map.len()
    }

    /// Collect every id owned by the trees: node ids (descendants included),
    /// connection point ids and pair ids.
    pub fn discover(trees: &[NodeTree], alloc: &mut IdAllocator) -> Self {
        let mut remap = IdRemap::default();
        for tree in trees {
            tree.walk(&mut |node| {
                remap.assign(node.id, IdPrefix::Node, alloc);
                for point in &node.points {
                    remap.assign(point.id, IdPrefix::Point, alloc);
                    for pair in &point.pairs {
                        remap.assign(pair.id, IdPrefix::Pair, alloc);
                    }
                }
            });
        }
        remap
    }

    fn rewrite(&self, node: &mut SceneNode, dx: f32, dy: f32) {
        node.id = self.apply(node.id);
        for point in &mut node.points {
            point.id = self.apply(point.id);
            point.owner_id = self.apply(point.owner_id);
            point.visible = false;
            for pair in &mut point.pairs {
                pair.id = self.apply(pair.id);
                pair.from.owner_id = self.apply(pair.from.owner_id);
                pair.from.point_id = self.apply(pair.from.point_id);
                pair.to.owner_id = self.apply(pair.to.owner_id);
                pair.to.point_id = self.apply(pair.to.point_id);
            }
        }
        for anchor in &mut node.anchors {
            anchor.owner_id = self.apply(anchor.owner_id);
        }
        node.manual_points = std::mem::take(&mut node.manual_points)
            .into_iter()
            .map(|(pair_id, points)| {
                let shifted = points.into_iter().map(|p| p.offset(dx, dy)).collect();
                (self.apply(pair_id), shifted)
            })
            .collect();
    }
}

// ─── Clone graph ─────────────────────────────────────────────────────────

/// Detached copy of a live node, as it looked before it was selected.
pub fn detached_copy(graph: &SceneGraph, id: NodeId) -> Option<NodeTree> {
    let idx = graph.index_of(id)?;
    let mut tree = graph.extract_tree(idx);
    if let Some(snapshot) = tree.node.selection {
        tree.node.position = snapshot.position;
        tree.node.z_order = snapshot.z_order;
    }
    tree.walk_mut(&mut SceneNode::reset_interaction);
    Some(tree)
}

/// Every id appearing anywhere in the trees, references included.
fn referenced_ids(trees: &[NodeTree]) -> HashSet<NodeId> {
    let mut ids = HashSet::new();
    for tree in trees {
        tree.walk(&mut |node| {
            ids.insert(node.id);
            for point in &node.points {
                ids.insert(point.id);
                ids.insert(point.owner_id);
                for pair in &point.pairs {
                    ids.extend([
                        pair.id,
                        pair.from.owner_id,
                        pair.from.point_id,
                        pair.to.owner_id,
                        pair.to.point_id,
                    ]);
                }
            }
            ids.extend(node.manual_points.keys().copied());
        });
    }
    ids
}

/// Allocator that avoids every id in the scene and in `trees`.
pub fn allocator_for(graph: &SceneGraph, trees: &[NodeTree]) -> IdAllocator {
    let mut taken = graph.all_ids();
    taken.extend(referenced_ids(trees));
    IdAllocator::new(taken)
}

/// Deep-copy `trees` into the main layer with fresh identifiers, shifting
/// each top-level clone by `offset` logical units on both axes.
///
/// Returns the ids of the new top-level nodes in input order. The caller
/// installs them as the selection.
pub fn duplicate(
    graph: &mut SceneGraph,
    trees: &[NodeTree],
    offset: f32,
    alloc: &mut IdAllocator,
) -> Vec<NodeId> {
    let remap = IdRemap::discover(trees, alloc);
    let mut roots = Vec::with_capacity(trees.len());

    for tree in trees {
        let mut clone = tree.clone();
        clone.walk_mut(&mut |node| {
            remap.rewrite(node, offset, offset);
            node.reset_interaction();
        });
        clone.node.position = clone.node.position.offset(offset, offset);
        roots.push(clone.node.id);
        graph.insert_tree(graph.root, clone);
    }

    log::debug!(
        "duplicated {} node(s), {} id(s) remapped, offset {offset}",
        roots.len(),
        remap.len()
    );
    roots
}

/// Copy/paste cache.
///
/// `copy_start` snapshots the selection; each `paste` duplicates the snapshot
/// one grid cell further away than the previous paste.
#[derive(Debug, Default)]
pub struct Clipboard {
    cache: Vec<NodeTree>,
    paste_count: u32,
}

impl Clipboard {
    /// Replace the cache with detached copies of `ids`.
    pub fn copy_start(&mut self, graph: &SceneGraph, ids: &[NodeId]) {
        self.cache = ids
            .iter()
            .filter_map(|&id| detached_copy(graph, id))
            .collect();
        self.paste_count = 1;
        log::debug!("copied {} node(s)", self.cache.len());
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    pub fn paste_count(&self) -> u32 {
        self.paste_count
    }

    pub fn cache(&self) -> &[NodeTree] {
        &self.cache
    }

    /// Offset for the next paste, then advance the repeat counter.
    /// `step` is one grid cell in logical units at the current zoom.
    pub fn next_offset(&mut self, step: f32) -> f32 {
        let offset = step * self.paste_count as f32;
        self.paste_count += 1;
        offset
    }
}
