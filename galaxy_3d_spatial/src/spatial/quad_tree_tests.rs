/// Tests for QuadTree
///
/// These tests validate staged insertion, placement and subdivision,
/// removal with collapse, incremental reinsertion versus rebuild, queries
/// (sequential and fork/join) and the structural invariants of the tree.

use std::sync::Arc;
use glam::{Mat4, Vec2, Vec3};
use rustc_hash::FxHashSet;
use super::*;
use crate::shapes::{BoundingVolume, Frustum, OffsetBuffer, TransformBuffer};
use crate::spatial::debug_draw::{DebugLines, FOOTPRINT_COLOR, NODE_COLOR, CIRCLE_SEGMENTS};

// ============================================================================
// Helper Functions
// ============================================================================

fn sphere(x: f32, y: f32, z: f32, r: f32) -> BoundingShape {
    BoundingShape::sphere(Vec3::new(x, y, z), r)
}

fn rect(min: (f32, f32), max: (f32, f32)) -> Bounds<Vec2> {
    Bounds::new(Vec2::new(min.0, min.1), Vec2::new(max.0, max.1))
}

fn tree_with(config: QuadTreeConfig) -> QuadTree {
    QuadTree::with_config(config).unwrap()
}

fn root_node(tree: &QuadTree) -> &Node {
    tree.node(tree.root().unwrap()).unwrap()
}

fn child_of<'a>(tree: &'a QuadTree, parent: &Node, quadrant: Quadrant) -> &'a Node {
    tree.node(parent.child(quadrant).unwrap()).unwrap()
}

fn sorted(mut keys: Vec<ShapeKey>) -> Vec<ShapeKey> {
    keys.sort();
    keys
}

/// Every shape sits in exactly the leaves its footprint overlaps, and in at least one.
fn assert_coverage(tree: &QuadTree) {
    let leaves = tree.leaves();
    for (key, _) in tree.shapes() {
        let projection = tree.projection(key).unwrap();
        let mut expected: Vec<NodeId> = leaves
            .iter()
            .copied()
            .filter(|id| projection.intersects_rect(tree.node(*id).unwrap().bounds()))
            .collect();
        let mut actual = tree.shape_nodes(key).unwrap().to_vec();
        expected.sort();
        actual.sort();
        assert!(!actual.is_empty(), "shape {:?} is in no node", key);
        assert_eq!(actual, expected, "shape {:?} coverage mismatch", key);
    }
}

fn distinct_resident_count(tree: &QuadTree) -> usize {
    let mut seen = FxHashSet::default();
    for leaf in tree.leaves() {
        seen.extend(tree.node(leaf).unwrap().items().iter().copied());
    }
    seen.len()
}

/// Leaves as (bounds, sorted items), depth first
fn snapshot(tree: &QuadTree) -> Vec<(Bounds<Vec2>, Vec<ShapeKey>)> {
    tree.leaves()
        .into_iter()
        .map(|id| {
            let node = tree.node(id).unwrap();
            (*node.bounds(), sorted(node.items().to_vec()))
        })
        .collect()
}

fn mixed_shapes() -> Vec<BoundingShape> {
    let mut shapes = Vec::new();
    for i in 0..40 {
        let x = (i % 8) as f32 * 1.5;
        let z = (i / 8) as f32 * 1.7;
        let r = 0.3 + (i % 3) as f32 * 0.25;
        shapes.push(sphere(x, (i % 5) as f32, z, r));
    }
    for i in 0..6 {
        let base = Vec3::new(i as f32 * 2.0 - 1.0, 0.0, 3.0);
        shapes.push(BoundingShape::aabb(base, base + Vec3::new(0.8, 1.0, 2.5)));
    }
    let rotation = Mat4::from_rotation_y(0.6);
    let transforms = Arc::new(TransformBuffer::new(vec![
        Mat4::from_translation(Vec3::new(4.0, 0.0, 4.0)) * rotation,
        Mat4::from_translation(Vec3::new(9.0, 0.0, 1.0)) * rotation,
    ]));
    shapes.push(BoundingShape::obb(Vec3::splat(-1.0), Vec3::splat(1.0)).with_transform(transforms.clone(), 0));
    shapes.push(BoundingShape::obb(Vec3::splat(-0.5), Vec3::splat(0.5)).with_transform(transforms, 1));
    shapes.push(BoundingShape::frustum(
        Frustum::perspective(50.0, 1.3, 0.5, 6.0)
            .unwrap()
            .with_look_at(Vec3::new(2.0, 1.0, 2.0), Vec3::new(1.0, 0.0, 0.5)),
    ));
    shapes
}

fn queries() -> Vec<BoundingShape> {
    vec![
        sphere(3.0, 1.0, 3.0, 1.0),
        sphere(0.0, 0.0, 0.0, 0.2),
        sphere(20.0, 0.0, 20.0, 1.0),
        BoundingShape::aabb(Vec3::new(2.0, -1.0, 2.0), Vec3::new(6.0, 5.0, 4.0)),
        BoundingShape::frustum(
            Frustum::perspective(70.0, 1.0, 0.1, 8.0)
                .unwrap()
                .with_look_at(Vec3::new(-2.0, 1.0, 4.0), Vec3::X),
        ),
    ]
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn test_empty_tree() {
    let mut tree = QuadTree::new();
    assert!(tree.root().is_none());
    assert!(!tree.has_intersection(&sphere(0.0, 0.0, 0.0, 100.0)));
    tree.update(0.016);
    assert!(tree.root().is_none());
    assert_eq!(tree.num_nodes(), 0);
    assert_eq!(tree.num_intersections(&sphere(0.0, 0.0, 0.0, 100.0)), 0);
}

#[test]
fn test_single_sphere_root() {
    let mut tree = QuadTree::new();
    let key = tree.insert(sphere(0.0, 0.0, 0.0, 0.5));
    tree.update(0.016);

    let root = root_node(&tree);
    assert_eq!(*root.bounds(), rect((-0.5, -0.5), (0.5, 0.5)));
    assert!(root.is_leaf());
    assert_eq!(root.items(), &[key]);
    assert_eq!(tree.num_nodes(), 1);
}

#[test]
fn test_five_spheres_subdivide() {
    let mut tree = QuadTree::new();
    let a = tree.insert(sphere(1.0, 0.0, 1.0, 0.5));
    let b = tree.insert(sphere(2.0, 0.0, 3.0, 0.5));
    let c = tree.insert(sphere(2.0, 0.0, 2.0, 0.5));
    let d = tree.insert(sphere(3.0, 0.0, 1.0, 0.5));
    let e = tree.insert(sphere(3.0, 0.0, 4.0, 0.5));
    tree.update(0.016);

    let root = root_node(&tree);
    assert_eq!(*root.bounds(), rect((0.5, 0.5), (3.5, 4.5)));
    assert!(!root.is_leaf());

    let bottom_left = child_of(&tree, root, Quadrant::BottomLeft);
    let bottom_right = child_of(&tree, root, Quadrant::BottomRight);
    let top_right = child_of(&tree, root, Quadrant::TopRight);
    let top_left = child_of(&tree, root, Quadrant::TopLeft);

    assert_eq!(*bottom_left.bounds(), rect((0.5, 0.5), (2.0, 2.5)));
    assert!(bottom_left.is_leaf());
    assert_eq!(sorted(bottom_left.items().to_vec()), sorted(vec![a, c]));
    assert_eq!(sorted(bottom_right.items().to_vec()), sorted(vec![c, d]));
    assert_eq!(sorted(top_right.items().to_vec()), sorted(vec![b, e]));
    assert_eq!(top_left.items(), &[b]);
    assert_eq!(tree.num_nodes(), 5);
    assert_coverage(&tree);
}

#[test]
fn test_sphere_queries() {
    let mut tree = QuadTree::new();
    let a = tree.insert(sphere(0.0, 0.0, 0.0, 0.5));
    tree.update(0.016);

    assert!(tree.has_intersection(&sphere(0.5, 0.5, 0.5, 0.5)));
    assert!(!tree.has_intersection(&sphere(2.0, 2.0, 2.0, 0.5)));
    assert_eq!(tree.intersections(&sphere(0.5, 0.5, 0.5, 0.5)), vec![a]);
}

#[test]
fn test_remove_differentiating_shape_collapses() {
    let mut tree = tree_with(QuadTreeConfig { subdivide_threshold: 2, ..Default::default() });
    let a = tree.insert(sphere(0.0, 0.0, 0.0, 2.0));
    let b = tree.insert(sphere(0.1, 0.0, 0.1, 2.0));
    let c = tree.insert(sphere(-1.0, 0.0, -1.0, 0.2));
    tree.update(0.016);

    let root_id = tree.root().unwrap();
    let root = root_node(&tree);
    assert!(!root.is_leaf());
    assert_eq!(child_of(&tree, root, Quadrant::BottomLeft).items().len(), 3);
    for quadrant in [Quadrant::BottomRight, Quadrant::TopRight, Quadrant::TopLeft] {
        assert_eq!(sorted(child_of(&tree, root, quadrant).items().to_vec()), sorted(vec![a, b]));
    }

    assert!(tree.remove(c).is_some());

    assert_eq!(tree.root(), Some(root_id));
    let root = root_node(&tree);
    assert!(root.is_leaf());
    assert_eq!(sorted(root.items().to_vec()), sorted(vec![a, b]));
    assert_eq!(tree.num_nodes(), 1);
    assert_eq!(tree.stats().collapses, 1);
    assert_eq!(tree.shape_nodes(a).unwrap(), &[root_id]);
    assert_coverage(&tree);
}

#[test]
fn test_collapse_requires_identical_sets() {
    let mut tree = tree_with(QuadTreeConfig { subdivide_threshold: 2, ..Default::default() });
    let _a = tree.insert(sphere(0.0, 0.0, 0.0, 2.0));
    let _b = tree.insert(sphere(-1.0, 0.0, -1.0, 0.2));
    let c = tree.insert(sphere(1.0, 0.0, 1.0, 0.2));
    let _d = tree.insert(sphere(1.0, 0.0, -1.0, 0.2));
    tree.update(0.016);
    assert!(!root_node(&tree).is_leaf());

    // Two quadrants still hold a small sphere each
    tree.remove(c);
    assert!(!root_node(&tree).is_leaf());
    assert_eq!(tree.stats().collapses, 0);
}

// ============================================================================
// Staging and removal
// ============================================================================

#[test]
fn test_insert_is_staged_until_update() {
    let mut tree = QuadTree::new();
    let key = tree.insert(sphere(0.0, 0.0, 0.0, 1.0));
    assert_eq!(tree.len(), 1);
    assert!(tree.contains(key));
    assert_eq!(tree.shape_nodes(key).unwrap().len(), 0);
    assert!(!tree.has_intersection(&sphere(0.0, 0.0, 0.0, 1.0)));

    tree.update(0.016);
    assert!(tree.has_intersection(&sphere(0.0, 0.0, 0.0, 1.0)));
    assert_eq!(tree.shape_nodes(key).unwrap().len(), 1);
}

#[test]
fn test_remove_staged_shape() {
    let mut tree = QuadTree::new();
    let key = tree.insert(sphere(0.0, 0.0, 0.0, 1.0));
    let removed = tree.remove(key).unwrap();
    assert_eq!(removed.kind(), crate::shapes::ShapeKind::Sphere);
    tree.update(0.016);
    assert!(tree.is_empty());
    assert!(tree.root().is_none());
}

#[test]
fn test_remove_unknown_key_is_noop() {
    let mut tree = QuadTree::new();
    let key = tree.insert(sphere(0.0, 0.0, 0.0, 1.0));
    let other = tree.insert(sphere(3.0, 0.0, 0.0, 1.0));
    tree.update(0.016);
    assert!(tree.remove(key).is_some());

    let before = snapshot(&tree);
    assert!(tree.remove(key).is_none());
    assert_eq!(snapshot(&tree), before);
    assert!(tree.contains(other));
    assert_eq!(tree.len(), 1);
}

#[test]
fn test_removed_shape_never_reported() {
    let mut tree = QuadTree::new();
    let keep = tree.insert(sphere(0.0, 0.0, 0.0, 1.0));
    let gone = tree.insert(sphere(0.5, 0.0, 0.0, 1.0));
    tree.update(0.016);
    tree.remove(gone);
    assert_eq!(tree.intersections(&sphere(0.5, 0.0, 0.0, 0.1)), vec![keep]);
    tree.update(0.016);
    assert_eq!(tree.intersections(&sphere(0.5, 0.0, 0.0, 0.1)), vec![keep]);
}

#[test]
fn test_empty_after_removing_everything() {
    let mut tree = QuadTree::new();
    let key = tree.insert(sphere(0.0, 0.0, 0.0, 1.0));
    tree.update(0.016);
    tree.remove(key);
    tree.update(0.016);
    assert!(tree.root().is_none());
    assert_eq!(tree.num_nodes(), 0);
}

#[test]
fn test_clear() {
    let mut tree = QuadTree::new();
    for shape in mixed_shapes() {
        tree.insert(shape);
    }
    tree.update(0.016);
    assert!(tree.num_nodes() > 1);

    tree.clear();
    assert!(tree.is_empty());
    assert!(tree.root().is_none());
    assert_eq!(tree.num_nodes(), 0);
    let stats = tree.stats();
    assert_eq!(stats.nodes_allocated, stats.nodes_released);
}

// ============================================================================
// Structural properties
// ============================================================================

#[test]
fn test_coverage_and_distinct_count() {
    let mut tree = QuadTree::new();
    let shapes = mixed_shapes();
    let count = shapes.len();
    for shape in shapes {
        tree.insert(shape);
    }
    tree.update(0.016);

    assert!(!root_node(&tree).is_leaf());
    assert_coverage(&tree);
    assert_eq!(distinct_resident_count(&tree), count);
    assert_eq!(tree.len(), count);
}

#[test]
fn test_second_update_is_idempotent() {
    let mut tree = QuadTree::new();
    for shape in mixed_shapes() {
        tree.insert(shape);
    }
    tree.update(0.016);
    let stats = tree.stats();
    let before = snapshot(&tree);

    tree.update(0.016);
    assert_eq!(tree.stats(), stats);
    assert_eq!(snapshot(&tree), before);
}

#[test]
fn test_insert_remove_round_trip() {
    let mut tree = QuadTree::new();
    for shape in mixed_shapes() {
        tree.insert(shape);
    }
    tree.update(0.016);
    let before = snapshot(&tree);

    let outlier = tree.insert(sphere(30.0, 0.0, 30.0, 1.0));
    tree.update(0.016);
    assert!(tree.has_intersection(&sphere(30.0, 0.0, 30.0, 0.1)));

    tree.remove(outlier);
    tree.update(0.016);
    assert_eq!(snapshot(&tree), before);
    assert!(!tree.has_intersection(&sphere(30.0, 0.0, 30.0, 0.1)));
    for query in queries() {
        assert!(!tree.intersections(&query).contains(&outlier));
    }
}

#[test]
fn test_collapse_preserves_query_results() {
    let mut tree = tree_with(QuadTreeConfig { subdivide_threshold: 2, ..Default::default() });
    let _a = tree.insert(sphere(0.0, 0.0, 0.0, 2.0));
    let _b = tree.insert(sphere(0.1, 0.0, 0.1, 2.0));
    let c = tree.insert(sphere(-1.0, 0.0, -1.0, 0.2));
    tree.update(0.016);

    let samples: Vec<BoundingShape> = (0..5)
        .flat_map(|i| (0..5).map(move |j| sphere(i as f32 - 2.0, 0.0, j as f32 - 2.0, 0.3)))
        .collect();
    let before: Vec<Vec<ShapeKey>> = samples
        .iter()
        .map(|p| sorted(tree.intersections(p)).into_iter().filter(|k| *k != c).collect())
        .collect();

    tree.remove(c);
    assert_eq!(tree.stats().collapses, 1);

    let after: Vec<Vec<ShapeKey>> = samples.iter().map(|p| sorted(tree.intersections(p))).collect();
    assert_eq!(after, before);
}

#[test]
fn test_pool_accounting() {
    let mut tree = QuadTree::new();
    let transforms = Arc::new(TransformBuffer::single(Mat4::IDENTITY));
    tree.insert(sphere(8.0, 0.0, 8.0, 1.0).with_transform(transforms.clone(), 0));
    for shape in mixed_shapes() {
        tree.insert(shape);
    }
    for step in 0..5 {
        transforms.set(0, Mat4::from_translation(Vec3::new(step as f32 * 3.0, 0.0, 0.0))).unwrap();
        tree.update(0.016);
        let stats = tree.stats();
        assert_eq!(stats.nodes_allocated - stats.nodes_released, tree.num_nodes() as u64);
        assert_coverage(&tree);
    }
}

// ============================================================================
// Motion
// ============================================================================

#[test]
fn test_moved_shape_reinserted_without_rebuild() {
    let mut tree = QuadTree::new();
    tree.insert(sphere(0.0, 0.0, 0.0, 0.5));
    tree.insert(sphere(10.0, 0.0, 10.0, 0.5));
    for i in 0..6 {
        tree.insert(sphere(1.0 + i as f32 * 0.3, 0.0, 1.0, 0.2));
    }
    let transforms = Arc::new(TransformBuffer::single(Mat4::IDENTITY));
    let mover = tree.insert(sphere(2.0, 0.0, 2.0, 0.5).with_transform(transforms.clone(), 0));
    tree.update(0.016);
    let stats = tree.stats();

    transforms.set(0, Mat4::from_translation(Vec3::new(5.0, 0.0, 5.0))).unwrap();
    tree.update(0.016);

    assert_eq!(tree.stats().rebuilds, stats.rebuilds);
    assert_eq!(tree.stats().reinsertions, stats.reinsertions + 1);
    assert_eq!(tree.intersections(&sphere(7.0, 0.0, 7.0, 0.1)), vec![mover]);
    assert!(!tree.intersections(&sphere(2.0, 0.0, 2.0, 0.1)).contains(&mover));
    assert_coverage(&tree);
}

#[test]
fn test_offset_only_motion_is_reindexed() {
    let mut tree = QuadTree::new();
    tree.insert(sphere(0.0, 0.0, 0.0, 0.5));
    tree.insert(sphere(10.0, 0.0, 10.0, 0.5));
    let transforms = Arc::new(TransformBuffer::single(Mat4::IDENTITY));
    for _ in 0..5 {
        transforms.set(0, Mat4::IDENTITY).unwrap();
    }
    let offsets = Arc::new(OffsetBuffer::single(Vec3::ZERO));
    let mover = tree.insert(
        sphere(2.0, 0.0, 2.0, 0.5)
            .with_transform(transforms.clone(), 0)
            .with_offset(offsets.clone(), 0),
    );
    tree.update(0.016);
    assert_eq!(tree.intersections(&sphere(2.0, 0.0, 2.0, 0.1)), vec![mover]);
    let stats = tree.stats();

    offsets.set(0, Vec3::new(3.0, 0.0, 3.0)).unwrap();
    assert!(offsets.stamp() < transforms.stamp());
    tree.update(0.016);

    assert_eq!(tree.stats().reinsertions, stats.reinsertions + 1);
    assert_eq!(tree.intersections(&sphere(5.0, 0.0, 5.0, 0.1)), vec![mover]);
    assert!(tree.intersections(&sphere(2.0, 0.0, 2.0, 0.1)).is_empty());
    assert_coverage(&tree);
}

#[test]
fn test_vertical_motion_keeps_footprint() {
    let mut tree = QuadTree::new();
    tree.insert(sphere(0.0, 0.0, 0.0, 0.5));
    let transforms = Arc::new(TransformBuffer::single(Mat4::IDENTITY));
    tree.insert(sphere(3.0, 0.0, 3.0, 0.5).with_transform(transforms.clone(), 0));
    tree.update(0.016);
    let stats = tree.stats();

    transforms.set(0, Mat4::from_translation(Vec3::new(0.0, 7.0, 0.0))).unwrap();
    tree.update(0.016);
    assert_eq!(tree.stats(), stats);
}

#[test]
fn test_growing_union_triggers_rebuild() {
    let mut tree = QuadTree::new();
    tree.insert(sphere(0.0, 0.0, 0.0, 0.5));
    let transforms = Arc::new(TransformBuffer::single(Mat4::IDENTITY));
    tree.insert(sphere(5.0, 0.0, 0.0, 0.5).with_transform(transforms.clone(), 0));
    tree.update(0.016);
    let rebuilds = tree.stats().rebuilds;

    transforms.set(0, Mat4::from_translation(Vec3::new(3.0, 0.0, 0.0))).unwrap();
    tree.update(0.016);
    assert_eq!(tree.stats().rebuilds, rebuilds + 1);
    assert_eq!(root_node(&tree).bounds().max.x, 8.5);
}

#[test]
fn test_never_shrink_keeps_root() {
    let config = QuadTreeConfig { never_shrink: true, ..Default::default() };
    let mut tree = tree_with(config);
    tree.insert(sphere(0.0, 0.0, 0.0, 0.5));
    let transforms = Arc::new(TransformBuffer::single(Mat4::IDENTITY));
    tree.insert(sphere(5.0, 0.0, 0.0, 0.5).with_transform(transforms.clone(), 0));
    tree.update(0.016);
    let stats = tree.stats();

    transforms.set(0, Mat4::from_translation(Vec3::new(-3.0, 0.0, 0.0))).unwrap();
    tree.update(0.016);
    assert_eq!(tree.stats().rebuilds, stats.rebuilds);
    assert_eq!(tree.stats().reinsertions, stats.reinsertions + 1);
    assert_eq!(*root_node(&tree).bounds(), rect((-0.5, -0.5), (5.5, 0.5)));
}

#[test]
fn test_square_root() {
    let config = QuadTreeConfig { square_root: true, ..Default::default() };
    let mut tree = tree_with(config);
    tree.insert(sphere(0.0, 0.0, 0.0, 0.5));
    tree.insert(sphere(3.0, 0.0, 0.0, 0.5));
    tree.update(0.016);
    assert_eq!(*root_node(&tree).bounds(), rect((-0.5, -0.5), (3.5, 3.5)));
}

#[test]
fn test_edited_shape_is_reindexed() {
    let mut tree = QuadTree::new();
    tree.insert(sphere(0.0, 0.0, 0.0, 0.5));
    let key = tree.insert(sphere(3.0, 0.0, 0.0, 0.5));
    tree.update(0.016);
    assert!(!tree.has_intersection(&sphere(1.5, 0.0, 0.0, 0.1)));

    if let BoundingVolume::Sphere(s) = tree.shape_mut(key).unwrap().volume_mut() {
        s.set_radius(2.0);
    }
    tree.update(0.016);
    assert_eq!(tree.projection(key).unwrap().radius_sq(), 4.0);
    assert_eq!(tree.intersections(&sphere(1.5, 0.0, 0.0, 0.1)), vec![key]);
    assert_coverage(&tree);
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn test_min_node_size_stops_subdivision() {
    let config = QuadTreeConfig { min_node_size: 1.0, ..Default::default() };
    let mut tree = tree_with(config);
    for _ in 0..6 {
        tree.insert(sphere(0.0, 0.0, 0.0, 0.01));
    }
    tree.update(0.016);
    let root = root_node(&tree);
    assert!(root.is_leaf());
    assert_eq!(root.items().len(), 6);
}

#[test]
fn test_subdivide_threshold() {
    let config = QuadTreeConfig { subdivide_threshold: 1, ..Default::default() };
    let mut tree = tree_with(config);
    let near = tree.insert(sphere(0.0, 0.0, 0.0, 0.5));
    let far = tree.insert(sphere(4.0, 0.0, 4.0, 0.5));
    tree.update(0.016);

    let root = root_node(&tree);
    assert!(!root.is_leaf());
    assert_eq!(child_of(&tree, root, Quadrant::BottomLeft).items(), &[near]);
    assert_eq!(child_of(&tree, root, Quadrant::TopRight).items(), &[far]);
    assert!(child_of(&tree, root, Quadrant::BottomRight).items().is_empty());
    assert!(child_of(&tree, root, Quadrant::TopLeft).items().is_empty());
}

#[test]
fn test_invalid_config_rejected() {
    let config = QuadTreeConfig { subdivide_threshold: 0, ..Default::default() };
    assert!(matches!(QuadTree::with_config(config), Err(crate::error::Galaxy3dError::InvalidConfig(_))));
}

// ============================================================================
// Queries
// ============================================================================

#[test]
fn test_straddling_shape_reported_once() {
    let mut tree = QuadTree::new();
    for i in 0..8 {
        tree.insert(sphere(i as f32, 0.0, (i % 3) as f32, 0.2));
    }
    let wide = tree.insert(BoundingShape::aabb(Vec3::new(-1.0, 0.0, -1.0), Vec3::new(8.0, 1.0, 3.0)));
    tree.update(0.016);
    assert!(tree.shape_nodes(wide).unwrap().len() > 1);

    let mut hits = Vec::new();
    tree.foreach_intersection(&BoundingShape::aabb(Vec3::splat(-10.0), Vec3::splat(10.0)), |key, _| {
        hits.push(key)
    });
    assert_eq!(hits.len(), 9);
    assert_eq!(hits.iter().filter(|k| **k == wide).count(), 1);
    assert_eq!(tree.num_intersections(&sphere(3.0, 0.5, 1.0, 0.1)), 1);
}

#[test]
fn test_frustum_query_over_spheres() {
    let mut tree = QuadTree::new();
    let ahead = tree.insert(sphere(0.0, 0.0, -5.0, 0.5));
    let behind = tree.insert(sphere(0.0, 0.0, 5.0, 0.5));
    let aside = tree.insert(sphere(9.0, 0.0, -2.0, 0.5));
    tree.update(0.016);

    let camera = BoundingShape::frustum(Frustum::perspective(60.0, 1.0, 0.1, 20.0).unwrap());
    let hits = tree.intersections(&camera);
    assert!(hits.contains(&ahead));
    assert!(!hits.contains(&behind));
    assert!(!hits.contains(&aside));
}

#[test]
fn test_fork_join_matches_sequential() {
    let mut sequential = QuadTree::new();
    let mut parallel = tree_with(QuadTreeConfig {
        query_strategy: QueryStrategy::ForkJoin,
        ..Default::default()
    });
    for shape in mixed_shapes() {
        sequential.insert(shape.clone());
        parallel.insert(shape);
    }
    sequential.update(0.016);
    parallel.update(0.016);

    for query in queries() {
        let expected = sorted(sequential.intersections(&query));
        let actual = parallel.intersections(&query);
        assert_eq!(actual, expected);
        assert_eq!(parallel.num_intersections(&query), expected.len());
        assert_eq!(parallel.has_intersection(&query), !expected.is_empty());
    }
}

#[test]
fn test_spatial_index_trait_object() {
    let mut tree = QuadTree::new();
    let index: &mut dyn SpatialIndex = &mut tree;
    let key = index.insert(sphere(1.0, 0.0, 1.0, 1.0));
    index.update(0.016);
    assert!(index.has_intersection(&sphere(1.5, 0.0, 1.0, 0.1)));
    assert_eq!(index.num_intersections(&sphere(1.5, 0.0, 1.0, 0.1)), 1);

    let mut seen = Vec::new();
    index.foreach_intersection(&sphere(1.5, 0.0, 1.0, 0.1), &mut |k, _| seen.push(k));
    assert_eq!(seen, vec![key]);

    assert!(index.remove(key).is_some());
    index.clear();
    assert!(tree.is_empty());
}

// ============================================================================
// Debug draw
// ============================================================================

#[test]
fn test_debug_draw_lines() {
    let mut tree = QuadTree::new();
    tree.insert(sphere(1.0, 0.0, 1.0, 0.5));
    tree.insert(sphere(2.0, 0.0, 3.0, 0.5));
    tree.insert(sphere(2.0, 0.0, 2.0, 0.5));
    tree.insert(sphere(3.0, 0.0, 1.0, 0.5));
    tree.insert(sphere(3.0, 0.0, 4.0, 0.5));
    tree.insert(BoundingShape::aabb(Vec3::new(1.0, 0.0, 1.0), Vec3::new(2.0, 1.0, 2.0)));
    tree.update(0.016);

    let mut lines = DebugLines::default();
    tree.debug_draw(&mut lines);
    assert_eq!(lines.count_with_color(NODE_COLOR), 4 * tree.num_nodes());
    assert_eq!(lines.count_with_color(FOOTPRINT_COLOR), 5 * CIRCLE_SEGMENTS + 4);
    assert!(lines
        .lines
        .iter()
        .filter(|line| line.color == NODE_COLOR)
        .all(|line| line.from.y == 0.0 && line.to.y == 0.0));
}

// ============================================================================
// Cameras
// ============================================================================

#[test]
fn test_camera_visibility() {
    let mut tree = QuadTree::new();
    tree.insert(sphere(0.0, 0.0, -5.0, 0.5).with_name("crate").with_instance_id(3));
    tree.insert(sphere(1.0, 0.0, -6.0, 0.5).with_name("crate").with_instance_id(1));
    tree.insert(sphere(0.0, 0.0, 5.0, 0.5).with_name("barrel").with_instance_id(0));
    tree.insert(sphere(-1.0, 0.0, -4.0, 0.5));
    let camera = tree.add_camera(BoundingShape::frustum(Frustum::perspective(60.0, 1.0, 0.1, 20.0).unwrap()));

    assert!(!tree.is_visible(camera, "crate"));
    tree.update(0.016);

    assert!(tree.is_visible(camera, "crate"));
    assert!(!tree.is_visible(camera, "barrel"));
    assert_eq!(tree.visible_instances(camera, "crate"), &[1, 3]);
    assert!(tree.visible_instances(camera, "barrel").is_empty());
    assert!(!tree.is_visible(camera, ""));
}

#[test]
fn test_camera_turn_updates_visibility() {
    let mut tree = QuadTree::new();
    tree.insert(sphere(0.0, 0.0, -5.0, 0.5).with_name("front"));
    tree.insert(sphere(0.0, 0.0, 5.0, 0.5).with_name("back"));
    let camera = tree.add_camera(BoundingShape::frustum(Frustum::perspective(60.0, 1.0, 0.1, 20.0).unwrap()));
    tree.update(0.016);
    assert!(tree.is_visible(camera, "front"));

    if let BoundingVolume::Frustum(frustum) = tree.camera_mut(camera).unwrap().volume_mut() {
        frustum.look_at(Vec3::ZERO, Vec3::Z);
    }
    tree.update(0.016);
    assert!(!tree.is_visible(camera, "front"));
    assert!(tree.is_visible(camera, "back"));
}

#[test]
fn test_remove_camera() {
    let mut tree = QuadTree::new();
    let camera = tree.add_camera(sphere(0.0, 0.0, 0.0, 1.0));
    assert_eq!(tree.visibility().len(), 1);
    assert!(tree.remove_camera(camera).is_some());
    assert!(tree.remove_camera(camera).is_none());
    assert!(tree.visibility().is_empty());
    assert!(tree.camera(camera).is_none());
}
