/// Per-camera visibility cache.
///
/// Cameras are bounding shapes (usually frustums) registered with a quad
/// tree. After every `update` the tree queries each camera once and records
/// which named shapes it sees, and which instances of each.

use rustc_hash::FxHashMap;
use slotmap::{new_key_type, SlotMap};
use crate::shapes::BoundingShape;
use super::quad_tree::QuadTree;

new_key_type! {
    /// Key of a camera registered with a quad tree
    pub struct CameraId;
}

struct CameraView {
    shape: BoundingShape,
    /// Shape name → visible instance ids (sorted, unique)
    visible: FxHashMap<String, Vec<u32>>,
}

/// Cameras and what they saw at the last update.
#[derive(Default)]
pub struct Visibility {
    cameras: SlotMap<CameraId, CameraView>,
}

impl Visibility {
    pub(crate) fn add(&mut self, shape: BoundingShape) -> CameraId {
        self.cameras.insert(CameraView { shape, visible: FxHashMap::default() })
    }

    pub(crate) fn remove(&mut self, camera: CameraId) -> Option<BoundingShape> {
        self.cameras.remove(camera).map(|view| view.shape)
    }

    pub(crate) fn shape(&self, camera: CameraId) -> Option<&BoundingShape> {
        self.cameras.get(camera).map(|view| &view.shape)
    }

    pub(crate) fn shape_mut(&mut self, camera: CameraId) -> Option<&mut BoundingShape> {
        self.cameras.get_mut(camera).map(|view| &mut view.shape)
    }

    /// Number of registered cameras
    pub fn len(&self) -> usize {
        self.cameras.len()
    }

    /// Whether no camera is registered
    pub fn is_empty(&self) -> bool {
        self.cameras.is_empty()
    }

    /// Whether `camera` saw any instance named `name`
    pub fn is_visible(&self, camera: CameraId, name: &str) -> bool {
        self.cameras
            .get(camera)
            .map_or(false, |view| view.visible.contains_key(name))
    }

    /// Instance ids named `name` seen by `camera`, sorted.
    pub fn visible_instances(&self, camera: CameraId, name: &str) -> &[u32] {
        self.cameras
            .get(camera)
            .and_then(|view| view.visible.get(name))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Re-run every camera query against `tree`. Unnamed shapes are not tracked.
    pub(crate) fn refresh(&mut self, tree: &QuadTree) {
        for view in self.cameras.values_mut() {
            view.shape.update();
            view.visible.clear();
            let visible = &mut view.visible;
            tree.foreach_intersection(&view.shape, |_, shape| {
                if shape.name().is_empty() {
                    return;
                }
                visible
                    .entry(shape.name().to_string())
                    .or_default()
                    .push(shape.instance_id());
            });
            for instances in view.visible.values_mut() {
                instances.sort_unstable();
                instances.dedup();
            }
        }
    }

    pub(crate) fn clear(&mut self) {
        for view in self.cameras.values_mut() {
            view.visible.clear();
        }
    }
}
