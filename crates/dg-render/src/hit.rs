//! Hit testing: point → node and rectangle → nodes lookup.
//!
//! Candidates are scanned front-to-back by stacking key `(z_order,
//! stack_seq)`, so among equal z-order the node stacked last wins. Only
//! selectable asset roots are ever returned. All positions are logical.

use dg_core::geometry::{Bounds, Point};
use dg_core::{NodeIndex, SceneGraph, is_selectable};

/// Topmost selectable candidate whose bounds contain `point`.
/// Returns `None` if nothing is hit (background).
pub fn point_hit(graph: &SceneGraph, point: Point, candidates: &[NodeIndex]) -> Option<NodeIndex> {
    front_to_back(graph, candidates)
        .into_iter()
        .find(|&idx| graph.client_rect(idx).is_some_and(|b| b.contains(point)))
}

/// Every selectable candidate whose bounds intersect `rect`, touching
/// edges included. Used for marquee (box) selection.
pub fn rect_hit(graph: &SceneGraph, rect: &Bounds, candidates: &[NodeIndex]) -> Vec<NodeIndex> {
    candidates
        .iter()
        .copied()
        .filter(|&idx| graph.graph.contains_node(idx) && is_selectable(&graph.graph[idx]))
        .filter(|&idx| graph.client_rect(idx).is_some_and(|b| b.intersects(rect)))
        .collect()
}

/// Selectable nodes on the main layer, the usual candidate set.
pub fn selectable_layer(graph: &SceneGraph) -> Vec<NodeIndex> {
    graph
        .layer()
        .into_iter()
        .filter(|&idx| is_selectable(&graph.graph[idx]))
        .collect()
}

/// Topmost asset on the main layer under `point`.
pub fn hit_test(graph: &SceneGraph, point: Point) -> Option<NodeIndex> {
    point_hit(graph, point, &selectable_layer(graph))
}

/// All assets on the main layer intersecting `rect`.
pub fn hit_test_rect(graph: &SceneGraph, rect: &Bounds) -> Vec<NodeIndex> {
    let hits = rect_hit(graph, rect, &selectable_layer(graph));
    log::trace!("rect {rect:?} hit {} node(s)", hits.len());
    hits
}

/// Selectable candidates sorted topmost first.
pub fn front_to_back(graph: &SceneGraph, candidates: &[NodeIndex]) -> Vec<NodeIndex> {
    let mut sorted: Vec<NodeIndex> = candidates
        .iter()
        .copied()
        .filter(|&idx| graph.graph.contains_node(idx) && is_selectable(&graph.graph[idx]))
        .collect();
    sorted.sort_by_key(|&idx| std::cmp::Reverse(graph.graph[idx].stacking_key()));
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use dg_core::id::NodeId;
    use dg_core::model::*;
    use pretty_assertions::assert_eq;

    fn boxed(sg: &mut SceneGraph, id: &str, x: f32, y: f32, z: i32) -> NodeIndex {
        let group = sg.add_to_layer(
            SceneNode::asset(NodeId::intern(id), AssetKind::Image(ImageKind::Other))
                .at(x, y)
                .with_z(z),
        );
        let body = format!("{id}_body");
        sg.add_node(
            group,
            SceneNode::new(
                NodeId::intern(&body),
                NodeKind::Rect {
                    width: 50.0,
                    height: 50.0,
                },
            ),
        );
        group
    }

    #[test]
    fn point_hit_prefers_higher_z() {
        let mut sg = SceneGraph::new();
        let low = boxed(&mut sg, "hit_low", 0.0, 0.0, 5);
        let high = boxed(&mut sg, "hit_high", 20.0, 20.0, 1);
        sg.graph[high].z_order = 9;

        assert_eq!(hit_test(&sg, Point::new(30.0, 30.0)), Some(high));
        assert_eq!(hit_test(&sg, Point::new(5.0, 5.0)), Some(low));
        assert_eq!(hit_test(&sg, Point::new(500.0, 500.0)), None);
    }

    #[test]
    fn equal_z_prefers_later_stacked() {
        let mut sg = SceneGraph::new();
        let _first = boxed(&mut sg, "hit_tie_a", 0.0, 0.0, 2);
        let second = boxed(&mut sg, "hit_tie_b", 10.0, 10.0, 2);
        assert_eq!(hit_test(&sg, Point::new(25.0, 25.0)), Some(second));
    }

    #[test]
    fn rect_hit_includes_touching_edges() {
        let mut sg = SceneGraph::new();
        let a = boxed(&mut sg, "hit_rect_a", 0.0, 0.0, 0);
        let b = boxed(&mut sg, "hit_rect_b", 100.0, 0.0, 0);
        let _far = boxed(&mut sg, "hit_rect_far", 400.0, 400.0, 0);

        let mut hits = hit_test_rect(&sg, &Bounds::new(50.0, 10.0, 50.0, 10.0));
        hits.sort();
        assert_eq!(hits, vec![a, b]);
    }

    #[test]
    fn helpers_are_never_hit() {
        let mut sg = SceneGraph::new();
        let helper = sg.add_to_layer(
            SceneNode::new(NodeId::intern("hit_select_rect"), NodeKind::Group)
                .with_role(NodeRole::Helper(HelperKind::SelectRect))
                .with_z(100),
        );
        sg.add_node(
            helper,
            SceneNode::new(
                NodeId::intern("hit_select_rect_body"),
                NodeKind::Rect {
                    width: 1000.0,
                    height: 1000.0,
                },
            ),
        );
        let asset = boxed(&mut sg, "hit_under_helper", 0.0, 0.0, 0);

        assert_eq!(point_hit(&sg, Point::new(10.0, 10.0), &[helper, asset]), Some(asset));
        assert_eq!(
            rect_hit(&sg, &Bounds::new(0.0, 0.0, 10.0, 10.0), &[helper, asset]),
            vec![asset]
        );
    }
}
