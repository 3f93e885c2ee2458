/// Spatial acceleration structures over bounding shapes.
///
/// A SpatialIndex owns the shapes inserted into it and answers
/// broad-then-narrow intersection queries against its state as of the last
/// `update`. Implementations include the loose quad tree.
///
/// Ownership: the caller creates and owns the index. Mutation happens from
/// one thread per tick; queries run against a quiescent index.

use crate::shapes::BoundingShape;
use super::debug_draw::DebugDraw;
use super::quad_tree::ShapeKey;

/// Trait for spatial indexing of bounding shapes.
pub trait SpatialIndex: Send + Sync {
    /// Stage a shape. It becomes visible to queries after the next `update`.
    fn insert(&mut self, shape: BoundingShape) -> ShapeKey;

    /// Remove a shape, returning it. Unknown keys are logged and ignored.
    fn remove(&mut self, key: ShapeKey) -> Option<BoundingShape>;

    /// Refresh shapes from their transforms and restructure the index.
    /// Must run once per tick before queries.
    fn update(&mut self, dt: f32);

    /// True if any indexed shape intersects `shape`.
    fn has_intersection(&self, shape: &BoundingShape) -> bool;

    /// Number of distinct indexed shapes intersecting `shape`.
    fn num_intersections(&self, shape: &BoundingShape) -> usize;

    /// Invoke `callback` once per distinct indexed shape intersecting `shape`.
    fn foreach_intersection(
        &self,
        shape: &BoundingShape,
        callback: &mut dyn FnMut(ShapeKey, &BoundingShape),
    );

    /// Draw nodes and shape footprints.
    fn debug_draw(&self, debug: &mut dyn DebugDraw);

    /// Remove all shapes from the index.
    fn clear(&mut self);
}
