//! Scene filter: which nodes are user assets and which are auxiliary geometry.

use crate::model::{NodeRole, SceneNode};

/// True only for asset root containers on the scene.
///
/// Primitive sub-shapes, selection helpers, overlay roots and link-rendering
/// primitives are never selectable and never take part in z-order bookkeeping.
pub fn is_selectable(node: &SceneNode) -> bool {
    node.kind.is_container() && matches!(node.role, NodeRole::Asset(_))
}

pub fn is_selection_helper(node: &SceneNode) -> bool {
    matches!(node.role, NodeRole::Helper(_))
}

pub fn is_overlay_root(node: &SceneNode) -> bool {
    matches!(node.role, NodeRole::Overlay(_))
}

pub fn is_link_primitive(node: &SceneNode) -> bool {
    matches!(node.role, NodeRole::Link(_))
}

/// Inverse of [`is_selectable`], for call sites that skip auxiliary nodes.
pub fn is_ignored(node: &SceneNode) -> bool {
    !is_selectable(node)
}
