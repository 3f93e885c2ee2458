/// QuadTree: loose quad tree over the XZ footprints of bounding shapes.
///
/// Node bounds are strict quarters of their parent, but an item is stored
/// in every leaf its footprint overlaps rather than being pushed up to a
/// common ancestor. A moving shape therefore only touches the leaves it
/// leaves and enters.
///
/// The tree owns its shapes in a slot map addressed by [`ShapeKey`]. Nodes
/// live in a [`NodePool`] addressed by [`NodeId`]; items hold the ids of the
/// nodes they occupy and nodes hold the keys of their items, and every
/// insert, remove and collapse keeps both sides in sync.
///
/// Per tick:
/// 1. `insert` stages shapes (constant time).
/// 2. `update` refreshes every shape, rebuilds the tree when the root
///    rectangle changes, otherwise reinserts only moved shapes, then places
///    staged shapes and refreshes camera visibility.
/// 3. Queries run against the quiescent tree.

use std::mem;
use std::ops::ControlFlow;
use std::sync::{Mutex, PoisonError};
use glam::Vec2;
use rustc_hash::FxHashSet;
use slotmap::{new_key_type, SlotMap};
use crate::error::Galaxy3dResult;
use crate::shapes::{BoundingShape, Bounds};
use crate::utils::NodePool;
use crate::{spatial_trace, spatial_warn};
use super::debug_draw::{self, DebugDraw};
use super::node::{Node, NodeId, Quadrant};
use super::orthogonal_projection::OrthogonalProjection;
use super::quad_tree_config::{QuadTreeConfig, QueryStrategy};
use super::spatial_index::SpatialIndex;
use super::visibility::{CameraId, Visibility};

const SOURCE: &str = "galaxy3d::QuadTree";

new_key_type! {
    /// Key of a shape owned by a [`QuadTree`]
    pub struct ShapeKey;
}

/// Bookkeeping wrapper around one shape.
struct Item {
    shape: BoundingShape,
    projection: OrthogonalProjection,
    /// Nodes this item currently occupies
    nodes: Vec<NodeId>,
    /// False while the item is only staged
    resident: bool,
}

/// Structural counters, cumulative since construction.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TreeStats {
    /// Nodes taken from the pool
    pub nodes_allocated: u64,
    /// Nodes returned to the pool
    pub nodes_released: u64,
    /// Full rebuilds caused by a new root rectangle
    pub rebuilds: u64,
    /// Moved items removed and reinserted without a rebuild
    pub reinsertions: u64,
    /// Four-leaf merges into a parent
    pub collapses: u64,
}

/// Result of testing one node against a query footprint.
enum Visit<'a> {
    Skip,
    Leaf(&'a [ShapeKey]),
    Descend([NodeId; 4]),
}

/// Loose quad tree spatial index.
pub struct QuadTree {
    config: QuadTreeConfig,
    items: SlotMap<ShapeKey, Item>,
    staged: Vec<ShapeKey>,
    nodes: NodePool<Node>,
    root: Option<NodeId>,
    visibility: Visibility,
    stats: TreeStats,
}

impl QuadTree {
    /// Empty tree with the default configuration.
    pub fn new() -> Self {
        Self::build(QuadTreeConfig::default())
    }

    /// Empty tree with a custom configuration.
    ///
    /// # Errors
    ///
    /// Returns `Galaxy3dError::InvalidConfig` if the configuration does not validate.
    pub fn with_config(config: QuadTreeConfig) -> Galaxy3dResult<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: QuadTreeConfig) -> Self {
        Self {
            config,
            items: SlotMap::with_key(),
            staged: Vec::new(),
            nodes: NodePool::new(),
            root: None,
            visibility: Visibility::default(),
            stats: TreeStats::default(),
        }
    }

    // ===== ACCESSORS =====

    /// Tree configuration
    pub fn config(&self) -> &QuadTreeConfig {
        &self.config
    }

    /// Number of live shapes (staged included)
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the tree holds no shapes
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether `key` refers to a live shape
    pub fn contains(&self, key: ShapeKey) -> bool {
        self.items.contains_key(key)
    }

    /// Shape by key
    pub fn shape(&self, key: ShapeKey) -> Option<&BoundingShape> {
        self.items.get(key).map(|item| &item.shape)
    }

    /// Shape by key, for editing. Changes are picked up by the next `update`.
    pub fn shape_mut(&mut self, key: ShapeKey) -> Option<&mut BoundingShape> {
        self.items.get_mut(key).map(|item| &mut item.shape)
    }

    /// All live shapes
    pub fn shapes(&self) -> impl Iterator<Item = (ShapeKey, &BoundingShape)> {
        self.items.iter().map(|(key, item)| (key, &item.shape))
    }

    /// Footprint of a shape as of the last `update`
    pub fn projection(&self, key: ShapeKey) -> Option<&OrthogonalProjection> {
        self.items.get(key).map(|item| &item.projection)
    }

    /// Nodes a shape currently occupies (empty while staged)
    pub fn shape_nodes(&self, key: ShapeKey) -> Option<&[NodeId]> {
        self.items.get(key).map(|item| item.nodes.as_slice())
    }

    /// Root node, `None` for an empty tree
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Live node by id
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    /// Number of live nodes
    pub fn num_nodes(&self) -> usize {
        self.nodes.len() as usize
    }

    /// Ids of all live leaves, depth first
    pub fn leaves(&self) -> Vec<NodeId> {
        let mut leaves = Vec::new();
        let mut stack: Vec<NodeId> = self.root.into_iter().collect();
        while let Some(id) = stack.pop() {
            match self.node(id).map(|node| node.children) {
                Some(Some(children)) => stack.extend(children),
                Some(None) => leaves.push(id),
                None => {}
            }
        }
        leaves
    }

    /// Structural counters
    pub fn stats(&self) -> TreeStats {
        self.stats
    }

    // ===== MUTATION =====

    /// Stage a shape. It is placed by the next `update`.
    pub fn insert(&mut self, shape: BoundingShape) -> ShapeKey {
        let projection = OrthogonalProjection::new(&shape);
        let key = self.items.insert(Item {
            shape,
            projection,
            nodes: Vec::new(),
            resident: false,
        });
        self.staged.push(key);
        key
    }

    /// Remove a shape from every node holding it and collapse upward.
    ///
    /// Unknown keys are logged at warning level and ignored.
    pub fn remove(&mut self, key: ShapeKey) -> Option<BoundingShape> {
        let Some(resident) = self.items.get(key).map(|item| item.resident) else {
            spatial_warn!(SOURCE, "Shape {:?} not found in quad tree", key);
            return None;
        };
        if resident {
            self.detach(key);
        } else {
            self.staged.retain(|staged| *staged != key);
        }
        self.items.remove(key).map(|item| item.shape)
    }

    /// Remove every shape and release every node. Cameras stay registered.
    pub fn clear(&mut self) {
        self.stats.nodes_released += u64::from(self.nodes.len());
        self.nodes.release_all();
        self.root = None;
        self.items.clear();
        self.staged.clear();
        self.visibility.clear();
    }

    /// Per-tick refresh.
    ///
    /// Runs every shape's geometry/transform check, recomputes the footprint
    /// of changed shapes and derives the root rectangle from the union of all
    /// footprints. A different root triggers a full rebuild; otherwise only
    /// shapes whose footprint changed are reinserted. Staged shapes are
    /// placed last, then camera visibility is refreshed.
    pub fn update(&mut self, _dt: f32) {
        let mut moved = Vec::new();
        let mut candidate: Option<Bounds<Vec2>> = None;
        for (key, item) in self.items.iter_mut() {
            let changed = item.shape.update();
            if changed || !item.resident {
                let projection = OrthogonalProjection::new(&item.shape);
                if projection != item.projection {
                    item.projection = projection;
                    if item.resident {
                        moved.push(key);
                    }
                }
            }
            let footprint = *item.projection.bounds();
            candidate = Some(candidate.map_or(footprint, |c| c.union(&footprint)));
        }

        match candidate {
            None => self.release_tree(),
            Some(mut bounds) => {
                if self.config.square_root {
                    bounds = bounds.squared();
                }
                let current = self.root.and_then(|root| self.node(root)).map(|node| node.bounds);
                if self.config.never_shrink {
                    if let Some(current) = current {
                        bounds = bounds.union(&current);
                    }
                }
                if current != Some(bounds) {
                    self.rebuild(bounds);
                } else {
                    for key in moved {
                        self.detach(key);
                        self.place(key);
                        self.stats.reinsertions += 1;
                    }
                }
            }
        }

        for key in mem::take(&mut self.staged) {
            if self.items.contains_key(key) {
                self.place(key);
            }
        }

        let mut visibility = mem::take(&mut self.visibility);
        visibility.refresh(self);
        self.visibility = visibility;
    }

    /// Release the whole tree to the pool.
    fn release_tree(&mut self) {
        let Some(root) = self.root.take() else {
            return;
        };
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if let Some(children) = self.node(id).and_then(|node| node.children) {
                stack.extend(children);
            }
            if self.nodes.release(id.0) {
                self.stats.nodes_released += 1;
            }
        }
        for item in self.items.values_mut() {
            item.nodes.clear();
        }
    }

    /// Free the tree and reinsert every resident shape under a fresh root.
    fn rebuild(&mut self, bounds: Bounds<Vec2>) {
        self.release_tree();
        self.root = Some(self.alloc_node(bounds, None));
        self.stats.rebuilds += 1;
        spatial_trace!(
            SOURCE,
            "Rebuilding quad tree with root ({}, {})..({}, {})",
            bounds.min.x, bounds.min.y, bounds.max.x, bounds.max.y
        );

        let residents: Vec<ShapeKey> = self
            .items
            .iter()
            .filter(|(_, item)| item.resident)
            .map(|(key, _)| key)
            .collect();
        for key in residents {
            self.place(key);
        }
    }

    fn alloc_node(&mut self, bounds: Bounds<Vec2>, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.acquire());
        self.stats.nodes_allocated += 1;
        if let Some(node) = self.nodes.get_mut(id.0) {
            node.bounds = bounds;
            node.parent = parent;
        }
        id
    }

    /// Insert a shape starting at the root, subdivision allowed.
    fn place(&mut self, key: ShapeKey) -> bool {
        if let Some(item) = self.items.get_mut(key) {
            item.resident = true;
        }
        let placed = match self.root {
            Some(root) => self.insert_resident(root, key, true),
            None => false,
        };
        if !placed {
            spatial_warn!(SOURCE, "Failed to place shape {:?} in quad tree", key);
        }
        placed
    }

    /// Insert below `node` if the shape's footprint overlaps it.
    fn insert_at(&mut self, node: NodeId, key: ShapeKey, allow_subdivision: bool) -> bool {
        let overlaps = match (self.nodes.get(node.0), self.items.get(key)) {
            (Some(node), Some(item)) => item.projection.intersects_rect(&node.bounds),
            _ => false,
        };
        overlaps && self.insert_resident(node, key, allow_subdivision)
    }

    /// Insert below `node` without testing it first.
    fn insert_resident(&mut self, node_id: NodeId, key: ShapeKey, allow_subdivision: bool) -> bool {
        let Some(node) = self.nodes.get(node_id.0) else {
            return false;
        };
        if let Some(children) = node.children {
            // Footprints may overlap several quadrants
            let mut inserted = false;
            for child in children {
                inserted |= self.insert_at(child, key, allow_subdivision);
            }
            return inserted;
        }

        let accept = !allow_subdivision
            || node.items.len() < self.config.subdivide_threshold
            || node.bounds.max_extent() <= self.config.min_node_size;
        if accept {
            self.attach(node_id, key);
            return true;
        }

        let children = self.subdivide(node_id);
        let existing = self
            .nodes
            .get_mut(node_id.0)
            .map(|node| mem::take(&mut node.items))
            .unwrap_or_default();
        for moved in existing {
            if let Some(item) = self.items.get_mut(moved) {
                item.nodes.retain(|n| *n != node_id);
            }
            let mut reinserted = false;
            for child in children {
                reinserted |= self.insert_at(child, moved, false);
            }
            if !reinserted {
                spatial_warn!(SOURCE, "Shape {:?} lost its node while splitting {:?}", moved, node_id);
            }
        }
        let mut inserted = false;
        for child in children {
            inserted |= self.insert_at(child, key, false);
        }
        inserted
    }

    fn attach(&mut self, node_id: NodeId, key: ShapeKey) {
        if let Some(node) = self.nodes.get_mut(node_id.0) {
            node.items.push(key);
        }
        if let Some(item) = self.items.get_mut(key) {
            item.nodes.push(node_id);
        }
    }

    fn subdivide(&mut self, node_id: NodeId) -> [NodeId; 4] {
        let bounds = self.node(node_id).map_or(Bounds::new(Vec2::ZERO, Vec2::ZERO), |n| n.bounds);
        let mut children = [node_id; 4];
        for (slot, quadrant) in children.iter_mut().zip(Quadrant::ALL) {
            *slot = self.alloc_node(quadrant.bounds(&bounds), Some(node_id));
        }
        if let Some(node) = self.nodes.get_mut(node_id.0) {
            node.children = Some(children);
        }
        spatial_trace!(SOURCE, "Subdivided node {:?}", node_id);
        children
    }

    /// Remove a resident shape from all its nodes, collapsing upward from each.
    fn detach(&mut self, key: ShapeKey) {
        let nodes = match self.items.get_mut(key) {
            Some(item) => mem::take(&mut item.nodes),
            None => return,
        };
        for node_id in nodes {
            let Some(node) = self.nodes.get_mut(node_id.0) else {
                continue;
            };
            if let Some(pos) = node.items.iter().position(|k| *k == key) {
                node.items.remove(pos);
                self.collapse(node_id);
            }
        }
    }

    /// Merge `node` and its three siblings into their parent when all four
    /// are leaves within the collapse threshold holding the same item set,
    /// then retry one level up.
    fn collapse(&mut self, node_id: NodeId) {
        let Some(parent_id) = self.node(node_id).and_then(|node| node.parent) else {
            return;
        };
        let Some(children) = self.node(parent_id).and_then(|node| node.children) else {
            return;
        };

        let mut siblings = Vec::with_capacity(4);
        for child in children {
            match self.node(child) {
                Some(node) if node.is_leaf() && node.items.len() <= self.config.collapse_threshold => {
                    siblings.push(node)
                }
                _ => return,
            }
        }
        let first = siblings[0].items.as_slice();
        let identical = siblings[1..].iter().all(|node| {
            node.items.len() == first.len() && first.iter().all(|key| node.items.contains(key))
        });
        if !identical {
            return;
        }
        let merged = first.to_vec();

        for key in &merged {
            if let Some(item) = self.items.get_mut(*key) {
                item.nodes.retain(|n| !children.contains(n));
                item.nodes.push(parent_id);
            }
        }
        for child in children {
            if self.nodes.release(child.0) {
                self.stats.nodes_released += 1;
            }
        }
        if let Some(parent) = self.nodes.get_mut(parent_id.0) {
            parent.children = None;
            parent.items = merged;
        }
        self.stats.collapses += 1;
        spatial_trace!(SOURCE, "Collapsed children of node {:?}", parent_id);

        self.collapse(parent_id);
    }

    // ===== QUERIES =====

    fn visit(&self, node_id: NodeId, projection: &OrthogonalProjection) -> Visit<'_> {
        let Some(node) = self.node(node_id) else {
            return Visit::Skip;
        };
        // Empty leaves cannot produce hits
        if node.is_leaf() && node.items.is_empty() {
            return Visit::Skip;
        }
        if !projection.intersects_rect(&node.bounds) {
            return Visit::Skip;
        }
        match node.children {
            Some(children) => Visit::Descend(children),
            None => Visit::Leaf(&node.items),
        }
    }

    /// Sequential walk with an explicit stack. Each item is tested at most once.
    fn walk<F>(&self, shape: &BoundingShape, mut on_hit: F)
    where
        F: FnMut(ShapeKey, &BoundingShape) -> ControlFlow<()>,
    {
        let Some(root) = self.root else {
            return;
        };
        let projection = OrthogonalProjection::new(shape);
        let mut visited = FxHashSet::default();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            match self.visit(id, &projection) {
                Visit::Skip => {}
                Visit::Descend(children) => stack.extend(children),
                Visit::Leaf(keys) => {
                    for &key in keys {
                        if !visited.insert(key) {
                            continue;
                        }
                        let Some(item) = self.items.get(key) else {
                            continue;
                        };
                        if item.shape.has_intersection_with(shape) && on_hit(key, &item.shape).is_break() {
                            return;
                        }
                    }
                }
            }
        }
    }

    /// Fork/join walk: one task per child node, joined before returning.
    ///
    /// Hits are sorted by key so the result does not depend on scheduling.
    fn collect_fork_join(&self, shape: &BoundingShape) -> Vec<ShapeKey> {
        let Some(root) = self.root else {
            return Vec::new();
        };
        let projection = OrthogonalProjection::new(shape);
        let visited = Mutex::new(FxHashSet::default());
        let hits = Mutex::new(Vec::new());
        rayon::scope(|scope| self.fork(scope, root, shape, &projection, &visited, &hits));
        let mut hits = hits.into_inner().unwrap_or_else(PoisonError::into_inner);
        hits.sort_unstable();
        hits
    }

    fn fork<'s>(
        &'s self,
        scope: &rayon::Scope<'s>,
        node_id: NodeId,
        shape: &'s BoundingShape,
        projection: &'s OrthogonalProjection,
        visited: &'s Mutex<FxHashSet<ShapeKey>>,
        hits: &'s Mutex<Vec<ShapeKey>>,
    ) {
        match self.visit(node_id, projection) {
            Visit::Skip => {}
            Visit::Descend(children) => {
                for child in children {
                    scope.spawn(move |scope| self.fork(scope, child, shape, projection, visited, hits));
                }
            }
            Visit::Leaf(keys) => {
                for &key in keys {
                    let first_visit = visited
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .insert(key);
                    if !first_visit {
                        continue;
                    }
                    let hit = self
                        .items
                        .get(key)
                        .map_or(false, |item| item.shape.has_intersection_with(shape));
                    if hit {
                        hits.lock().unwrap_or_else(PoisonError::into_inner).push(key);
                    }
                }
            }
        }
    }

    /// True if any shape intersects `shape`. Stops at the first hit.
    pub fn has_intersection(&self, shape: &BoundingShape) -> bool {
        let mut found = false;
        self.walk(shape, |_, _| {
            found = true;
            ControlFlow::Break(())
        });
        found
    }

    /// Number of distinct shapes intersecting `shape`.
    pub fn num_intersections(&self, shape: &BoundingShape) -> usize {
        let mut count = 0;
        self.foreach_intersection(shape, |_, _| count += 1);
        count
    }

    /// Invoke `callback` once per distinct shape intersecting `shape`.
    ///
    /// With [`QueryStrategy::ForkJoin`] the tree is walked in parallel and
    /// the callback runs on the calling thread after all tasks joined.
    pub fn foreach_intersection<F>(&self, shape: &BoundingShape, mut callback: F)
    where
        F: FnMut(ShapeKey, &BoundingShape),
    {
        match self.config.query_strategy {
            QueryStrategy::Sequential => self.walk(shape, |key, hit| {
                callback(key, hit);
                ControlFlow::Continue(())
            }),
            QueryStrategy::ForkJoin => {
                for key in self.collect_fork_join(shape) {
                    if let Some(item) = self.items.get(key) {
                        callback(key, &item.shape);
                    }
                }
            }
        }
    }

    /// Keys of all shapes intersecting `shape`.
    pub fn intersections(&self, shape: &BoundingShape) -> Vec<ShapeKey> {
        let mut keys = Vec::new();
        self.foreach_intersection(shape, |key, _| keys.push(key));
        keys
    }

    // ===== CAMERAS =====

    /// Register a camera. Its visibility is computed by every `update`.
    pub fn add_camera(&mut self, shape: BoundingShape) -> CameraId {
        self.visibility.add(shape)
    }

    /// Unregister a camera. Unknown ids are logged and ignored.
    pub fn remove_camera(&mut self, camera: CameraId) -> Option<BoundingShape> {
        let removed = self.visibility.remove(camera);
        if removed.is_none() {
            spatial_warn!(SOURCE, "Camera {:?} not found in quad tree", camera);
        }
        removed
    }

    /// Camera shape by id
    pub fn camera(&self, camera: CameraId) -> Option<&BoundingShape> {
        self.visibility.shape(camera)
    }

    /// Camera shape by id, for editing. Picked up by the next `update`.
    pub fn camera_mut(&mut self, camera: CameraId) -> Option<&mut BoundingShape> {
        self.visibility.shape_mut(camera)
    }

    /// Camera visibility as of the last `update`
    pub fn visibility(&self) -> &Visibility {
        &self.visibility
    }

    /// Whether `camera` saw any shape named `name` at the last `update`
    pub fn is_visible(&self, camera: CameraId, name: &str) -> bool {
        self.visibility.is_visible(camera, name)
    }

    /// Instance ids of shapes named `name` seen by `camera` at the last `update`
    pub fn visible_instances(&self, camera: CameraId, name: &str) -> &[u32] {
        self.visibility.visible_instances(camera, name)
    }

    // ===== DEBUG =====

    /// Draw node rectangles and shape footprints.
    pub fn debug_draw(&self, debug: &mut dyn DebugDraw) {
        let mut stack: Vec<NodeId> = self.root.into_iter().collect();
        while let Some(id) = stack.pop() {
            let Some(node) = self.node(id) else {
                continue;
            };
            debug_draw::draw_node(debug, &node.bounds);
            if let Some(children) = node.children {
                stack.extend(children);
            }
        }
        for item in self.items.values() {
            debug_draw::draw_footprint(debug, &item.projection);
        }
    }
}

impl Default for QuadTree {
    fn default() -> Self {
        Self::new()
    }
}

impl SpatialIndex for QuadTree {
    fn insert(&mut self, shape: BoundingShape) -> ShapeKey {
        QuadTree::insert(self, shape)
    }

    fn remove(&mut self, key: ShapeKey) -> Option<BoundingShape> {
        QuadTree::remove(self, key)
    }

    fn update(&mut self, dt: f32) {
        QuadTree::update(self, dt)
    }

    fn has_intersection(&self, shape: &BoundingShape) -> bool {
        QuadTree::has_intersection(self, shape)
    }

    fn num_intersections(&self, shape: &BoundingShape) -> usize {
        QuadTree::num_intersections(self, shape)
    }

    fn foreach_intersection(
        &self,
        shape: &BoundingShape,
        callback: &mut dyn FnMut(ShapeKey, &BoundingShape),
    ) {
        QuadTree::foreach_intersection(self, shape, |key, hit| callback(key, hit))
    }

    fn debug_draw(&self, debug: &mut dyn DebugDraw) {
        QuadTree::debug_draw(self, debug)
    }

    fn clear(&mut self) {
        QuadTree::clear(self)
    }
}

#[cfg(test)]
#[path = "quad_tree_tests.rs"]
mod tests;
