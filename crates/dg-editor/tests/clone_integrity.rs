//! Integration tests: duplication and copy/paste (dg-editor).
//!
//! Clones must be self-consistent and share no identifier with anything
//! already in the scene.

use dg_core::*;
use dg_editor::*;
use pretty_assertions::assert_eq;
use std::collections::HashSet;

fn init() -> Editor {
    let _ = env_logger::builder().is_test(true).try_init();
    Editor::new(EditorConfig::default()).unwrap()
}

/// An asset with two connection points joined to each other by one pair.
fn self_linked(editor: &mut Editor, name: &str) -> NodeId {
    let owner = NodeId::intern(name);
    let p1 = NodeId::intern(&format!("{name}_p1"));
    let p2 = NodeId::intern(&format!("{name}_p2"));
    let mut pair = LinkPair::new(
        NodeId::intern(&format!("{name}_pair")),
        Endpoint {
            owner_id: owner,
            point_id: p1,
        },
        Endpoint {
            owner_id: owner,
            point_id: p2,
        },
    );
    pair.link_type = Some(LinkKind::Manual);

    let mut node = SceneNode::asset(owner, AssetKind::Graph(GraphKind::Rect)).at(40.0, 40.0);
    node.anchors.push(GraphAnchor {
        adjust_type: "top-left".into(),
        owner_id: owner,
    });
    let mut a = ConnectionPoint::new(p1, owner, 0.0, 20.0);
    a.visible = true;
    a.pairs.push(pair.clone());
    let mut b = ConnectionPoint::new(p2, owner, 40.0, 20.0);
    b.visible = true;
    b.pairs.push(pair.clone());
    node.points = vec![a, b];
    node.manual_points
        .insert(pair.id, vec![Point::new(60.0, 80.0), Point::new(80.0, 80.0)]);

    let group = editor.graph_mut().add_to_layer(node);
    editor.graph_mut().add_node(
        group,
        SceneNode::new(
            NodeId::intern(&format!("{name}_body")),
            NodeKind::Rect {
                width: 40.0,
                height: 40.0,
            },
        ),
    );
    owner
}

/// Every id a subtree owns or references.
fn ids_of(graph: &SceneGraph, root: NodeId) -> HashSet<NodeId> {
    let tree = graph.extract_tree(graph.index_of(root).unwrap());
    let mut ids = HashSet::new();
    tree.walk(&mut |node| {
        ids.insert(node.id);
        for point in &node.points {
            ids.insert(point.id);
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
    ids
}

#[test]
fn clone_pairs_resolve_within_the_clone() {
    let mut editor = init();
    let original = self_linked(&mut editor, "ci_self");
    let clones = editor.duplicate(&[original]);
    assert_eq!(clones.len(), 1);

    let graph = editor.graph();
    let clone = graph.get_by_id(clones[0]).unwrap();
    let source = graph.get_by_id(original).unwrap();
    let source_ids = ids_of(graph, original);

    for point in &clone.points {
        assert!(!point.visible);
        assert_eq!(point.owner_id, clone.id);
        assert!(!source_ids.contains(&point.id));
        for pair in &point.pairs {
            assert!(!source_ids.contains(&pair.id));
            for end in [pair.from, pair.to] {
                assert_eq!(end.owner_id, clone.id);
                assert!(clone.find_point(end.point_id).is_some());
            }
            assert_eq!(pair.link_type, Some(LinkKind::Manual));
        }
    }
    assert_eq!(clone.anchors[0].owner_id, clone.id);
    assert_eq!(graph.live_pairs(clone.id).len(), 2);

    // Source is untouched.
    assert!(source.points.iter().all(|p| p.visible));
    assert_eq!(source.position, Point::new(40.0, 40.0));
}

/// Two assets joined by one pair from `{name}_a` to `{name}_b`.
fn linked_pair(editor: &mut Editor, name: &str) -> (NodeId, NodeId, NodeId) {
    let a = NodeId::intern(&format!("{name}_a"));
    let b = NodeId::intern(&format!("{name}_b"));
    let pa = NodeId::intern(&format!("{name}_a_p"));
    let pb = NodeId::intern(&format!("{name}_b_p"));
    let pair = LinkPair::new(
        NodeId::intern(&format!("{name}_pair")),
        Endpoint {
            owner_id: a,
            point_id: pa,
        },
        Endpoint {
            owner_id: b,
            point_id: pb,
        },
    );

    for (owner, point_id, x) in [(a, pa, 0.0), (b, pb, 200.0)] {
        let mut node = SceneNode::asset(owner, AssetKind::Image(ImageKind::Other)).at(x, 0.0);
        let mut point = ConnectionPoint::new(point_id, owner, 40.0, 20.0);
        point.pairs.push(pair.clone());
        node.points.push(point);
        editor.graph_mut().add_to_layer(node);
    }
    (a, b, pair.id)
}

#[test]
fn linked_assets_cloned_together_link_to_each_other() {
    let mut editor = init();
    let (a, b, pair_id) = linked_pair(&mut editor, "ci_ab");
    let clones = editor.duplicate(&[a, b]);
    assert_eq!(clones.len(), 2);
    let (a2, b2) = (clones[0], clones[1]);
    assert!(![a, b].contains(&a2) && ![a, b].contains(&b2));

    let graph = editor.graph();
    let pair_a = &graph.get_by_id(a2).unwrap().points[0].pairs[0];
    let pair_b = &graph.get_by_id(b2).unwrap().points[0].pairs[0];
    assert_eq!(pair_a.id, pair_b.id);
    assert_ne!(pair_a.id, pair_id);
    assert_eq!(pair_a.from.owner_id, a2);
    assert_eq!(pair_a.to.owner_id, b2);
    assert_eq!((pair_b.from, pair_b.to), (pair_a.from, pair_a.to));
    assert!(graph.find_point(pair_a.from).is_some());
    assert!(graph.find_point(pair_a.to).is_some());
    assert_eq!(graph.live_pairs(a2).len(), 1);

    // The originals still link to each other only.
    let original = &graph.get_by_id(a).unwrap().points[0].pairs[0];
    assert_eq!(original.id, pair_id);
    assert_eq!(original.to.owner_id, b);
}

#[test]
fn manual_points_are_rekeyed_and_offset() {
    let mut editor = init();
    let original = self_linked(&mut editor, "ci_manual");
    let clone_id = editor.duplicate(&[original])[0];

    let clone = editor.graph().get_by_id(clone_id).unwrap();
    let pair_id = clone.points[0].pairs[0].id;
    assert_eq!(clone.manual_points.len(), 1);
    assert_eq!(
        clone.manual_points.get(&pair_id),
        Some(&vec![Point::new(80.0, 100.0), Point::new(100.0, 100.0)])
    );
}

#[test]
fn repeated_pastes_are_disjoint_and_step_by_grid() {
    let mut editor = init();
    let original = self_linked(&mut editor, "ci_twice");
    editor.select(&[original]);
    editor.copy_start();

    let first = editor.paste();
    let second = editor.paste();

    let ids0 = ids_of(editor.graph(), original);
    let ids1 = ids_of(editor.graph(), first[0]);
    let ids2 = ids_of(editor.graph(), second[0]);
    assert!(ids0.is_disjoint(&ids1));
    assert!(ids0.is_disjoint(&ids2));
    assert!(ids1.is_disjoint(&ids2));

    let pos = |id| editor.graph().get_by_id(id).unwrap().position;
    assert_eq!(pos(first[0]), Point::new(60.0, 60.0));
    assert_eq!(pos(second[0]), Point::new(80.0, 80.0));
    assert_eq!(editor.selected(), second.as_slice());
}

#[test]
fn new_copy_resets_paste_offset() {
    let mut editor = init();
    let original = self_linked(&mut editor, "ci_reset");
    editor.select(&[original]);
    editor.copy_start();
    editor.paste();
    editor.paste();

    editor.select(&[original]);
    editor.copy_start();
    let again = editor.paste();
    let pos = editor.graph().get_by_id(again[0]).unwrap().position;
    assert_eq!(pos, Point::new(60.0, 60.0));
}

#[test]
fn copy_snapshot_is_taken_unselected() {
    let mut editor = init();
    let original = self_linked(&mut editor, "ci_unsel");
    editor.select(&[original]);
    editor.copy_start();
    editor.clear_selection(false);

    let pasted = editor.paste();
    editor.clear_selection(false);
    let clone = editor.graph().get_by_id(pasted[0]).unwrap();
    assert_eq!(clone.opacity, 1.0);
    assert!(clone.listening);
    assert!(clone.selection.is_none());
}
