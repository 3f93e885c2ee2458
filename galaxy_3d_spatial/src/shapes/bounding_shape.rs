/// BoundingShape: one bounding volume bound to externally owned data.
///
/// A shape reads its model transform (and an optional model offset) from
/// shared [`InstanceBuffer`]s at a fixed instance index, and optionally
/// derives its model-space extents from a mesh it references weakly. World
/// state is cached and refreshed by [`BoundingShape::update`], which the
/// quad tree runs once per tick:
///
/// ```text
/// update_geometry() -> geometry changed?
/// update_transform(force = geometry changed) -> moved?
/// ```
///
/// Stamps make both checks a single integer comparison when nothing moved.

use std::fmt;
use std::sync::{Arc, Weak};
use glam::{Mat4, Vec3};
use super::aabb::AxisAlignedBox;
use super::bounds::Bounds;
use super::frustum::Frustum;
use super::geometry_source::GeometrySource;
use super::instance_buffer::{InstanceBuffer, OffsetBuffer, TransformBuffer};
use super::intersection;
use super::obb::OrientedBox;
use super::sphere::BoundingSphere;

/// Shape type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    Sphere,
    Aabb,
    Obb,
    Frustum,
}

/// The closed set of supported volumes.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundingVolume {
    Sphere(BoundingSphere),
    Aabb(AxisAlignedBox),
    Obb(OrientedBox),
    Frustum(Frustum),
}

impl BoundingVolume {
    /// Type tag of the volume
    pub fn kind(&self) -> ShapeKind {
        match self {
            BoundingVolume::Sphere(_) => ShapeKind::Sphere,
            BoundingVolume::Aabb(_) => ShapeKind::Aabb,
            BoundingVolume::Obb(_) => ShapeKind::Obb,
            BoundingVolume::Frustum(_) => ShapeKind::Frustum,
        }
    }
}

#[derive(Clone)]
struct InstanceBinding<T> {
    buffer: Arc<InstanceBuffer<T>>,
    index: usize,
}

impl<T: Copy> InstanceBinding<T> {
    fn value(&self) -> Option<T> {
        self.buffer.get(self.index)
    }
}

/// A bounding volume plus its bindings and cached world state.
#[derive(Clone)]
pub struct BoundingShape {
    volume: BoundingVolume,
    name: String,
    instance_id: u32,
    transform: Option<InstanceBinding<Mat4>>,
    offset: Option<InstanceBinding<Vec3>>,
    mesh: Option<Weak<dyn GeometrySource>>,
    last_transform_stamp: Option<u32>,
    last_offset_stamp: Option<u32>,
    last_mesh_stamp: Option<u32>,
    geometry_stamp: u32,
    last_geometry_stamp: u32,
    transform_dirty: bool,
}

impl BoundingShape {
    /// Wrap a volume. World state is computed immediately with no transform.
    pub fn new(volume: BoundingVolume) -> Self {
        let mut shape = Self {
            volume,
            name: String::new(),
            instance_id: 0,
            transform: None,
            offset: None,
            mesh: None,
            last_transform_stamp: None,
            last_offset_stamp: None,
            last_mesh_stamp: None,
            geometry_stamp: 0,
            last_geometry_stamp: 0,
            transform_dirty: true,
        };
        shape.refresh_world();
        shape
    }

    /// Sphere around a model-space center
    pub fn sphere(center: Vec3, radius: f32) -> Self {
        Self::new(BoundingVolume::Sphere(BoundingSphere::new(center, radius)))
    }

    /// Axis-aligned box, translated but never rotated
    pub fn aabb(min: Vec3, max: Vec3) -> Self {
        Self::new(BoundingVolume::Aabb(AxisAlignedBox::new(min, max)))
    }

    /// Oriented box, carried through the full model matrix
    pub fn obb(min: Vec3, max: Vec3) -> Self {
        Self::new(BoundingVolume::Obb(OrientedBox::new(min, max)))
    }

    /// View frustum
    pub fn frustum(frustum: Frustum) -> Self {
        Self::new(BoundingVolume::Frustum(frustum))
    }

    // ===== BUILDERS =====

    /// Set the name used by the visibility cache.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the instance id reported by the visibility cache.
    pub fn with_instance_id(mut self, instance_id: u32) -> Self {
        self.instance_id = instance_id;
        self
    }

    /// Bind to one instance of a shared transform buffer.
    pub fn with_transform(mut self, buffer: Arc<TransformBuffer>, index: usize) -> Self {
        self.set_transform(buffer, index);
        self
    }

    /// Bind to one instance of a shared model offset buffer.
    pub fn with_offset(mut self, buffer: Arc<OffsetBuffer>, index: usize) -> Self {
        self.set_offset(buffer, index);
        self
    }

    /// Derive geometry from a mesh (weak reference).
    pub fn with_mesh<G: GeometrySource + 'static>(mut self, mesh: &Arc<G>) -> Self {
        self.set_mesh(mesh);
        self
    }

    // ===== BINDINGS =====

    /// Rebind the transform. The next `update_transform` recomputes.
    pub fn set_transform(&mut self, buffer: Arc<TransformBuffer>, index: usize) {
        self.transform = Some(InstanceBinding { buffer, index });
        self.transform_dirty = true;
    }

    /// Rebind the model offset. The next `update_transform` recomputes.
    pub fn set_offset(&mut self, buffer: Arc<OffsetBuffer>, index: usize) {
        self.offset = Some(InstanceBinding { buffer, index });
        self.transform_dirty = true;
    }

    /// Attach a mesh. The next `update_geometry` reads its extents.
    pub fn set_mesh<G: GeometrySource + 'static>(&mut self, mesh: &Arc<G>) {
        let mesh: Arc<dyn GeometrySource> = mesh.clone();
        self.mesh = Some(Arc::downgrade(&mesh));
        self.last_mesh_stamp = None;
    }

    // ===== ACCESSORS =====

    /// Shape name (may be empty)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Instance id
    pub fn instance_id(&self) -> u32 {
        self.instance_id
    }

    /// Type tag
    pub fn kind(&self) -> ShapeKind {
        self.volume.kind()
    }

    /// The wrapped volume
    pub fn volume(&self) -> &BoundingVolume {
        &self.volume
    }

    /// Edit the wrapped volume. Counts as a geometry change.
    pub fn volume_mut(&mut self) -> &mut BoundingVolume {
        self.geometry_stamp = self.geometry_stamp.wrapping_add(1);
        &mut self.volume
    }

    /// Number of instances in the bound transform buffer (1 when unbound).
    pub fn num_instances(&self) -> usize {
        self.transform
            .as_ref()
            .map_or(1, |binding| binding.buffer.num_instances())
    }

    /// Stamp of the bound transform buffer, 0 when unbound.
    pub fn transform_stamp(&self) -> u32 {
        self.transform.as_ref().map_or(0, |b| b.buffer.stamp())
    }

    /// Stamp of the bound offset buffer, 0 when unbound.
    ///
    /// Counted independently of `transform_stamp`, so the two are only ever
    /// compared against their own cached values.
    pub fn offset_stamp(&self) -> u32 {
        self.offset.as_ref().map_or(0, |b| b.buffer.stamp())
    }

    /// Transform translation plus model offset.
    pub fn translation(&self) -> Vec3 {
        let transform = self
            .transform
            .as_ref()
            .and_then(InstanceBinding::value)
            .map_or(Vec3::ZERO, |m| m.w_axis.truncate());
        transform + self.model_offset()
    }

    /// Full model matrix: bound transform with the offset added to its translation.
    pub fn model_matrix(&self) -> Mat4 {
        let mut model = self
            .transform
            .as_ref()
            .and_then(InstanceBinding::value)
            .unwrap_or(Mat4::IDENTITY);
        model.w_axis += self.model_offset().extend(0.0);
        model
    }

    fn model_offset(&self) -> Vec3 {
        self.offset
            .as_ref()
            .and_then(InstanceBinding::value)
            .unwrap_or(Vec3::ZERO)
    }

    /// World-space center of the volume.
    pub fn center_position(&self) -> Vec3 {
        match &self.volume {
            BoundingVolume::Sphere(sphere) => sphere.world_center(),
            BoundingVolume::Aabb(aabb) => aabb.world_bounds().center(),
            BoundingVolume::Obb(obb) => obb.frame().center,
            BoundingVolume::Frustum(frustum) => frustum.center(),
        }
    }

    /// World-space axis-aligned envelope of the volume.
    pub fn world_bounds(&self) -> Bounds<Vec3> {
        match &self.volume {
            BoundingVolume::Sphere(sphere) => {
                let r = Vec3::splat(sphere.radius());
                Bounds::new(sphere.world_center() - r, sphere.world_center() + r)
            }
            BoundingVolume::Aabb(aabb) => *aabb.world_bounds(),
            BoundingVolume::Obb(obb) => Bounds::from_points(obb.corners().iter().copied()),
            BoundingVolume::Frustum(frustum) => Bounds::from_points(frustum.points().iter().copied()),
        }
    }

    // ===== PER-TICK UPDATE =====

    /// Geometry check followed by a transform check forced by a geometry change.
    pub fn update(&mut self) -> bool {
        let geometry_changed = self.update_geometry();
        let transform_changed = self.update_transform(geometry_changed);
        geometry_changed || transform_changed
    }

    /// Re-read the mesh extents if the mesh changed, and pick up local edits.
    ///
    /// Returns true if the model-space geometry changed.
    pub fn update_geometry(&mut self) -> bool {
        let mut changed = false;
        if self.geometry_stamp != self.last_geometry_stamp {
            self.last_geometry_stamp = self.geometry_stamp;
            changed = true;
        }
        let mesh = self.mesh.as_ref().and_then(Weak::upgrade);
        if let Some(mesh) = mesh {
            let stamp = mesh.geometry_stamp();
            if self.last_mesh_stamp != Some(stamp) {
                self.last_mesh_stamp = Some(stamp);
                self.apply_bounds(mesh.min_position(), mesh.max_position());
                changed = true;
            }
        }
        changed
    }

    /// Recompute world state if the bound transform or offset moved (or when forced).
    ///
    /// Returns true if the world state was recomputed.
    pub fn update_transform(&mut self, force: bool) -> bool {
        let transform_stamp = self.transform_stamp();
        let offset_stamp = self.offset_stamp();
        let moved = self.last_transform_stamp != Some(transform_stamp)
            || self.last_offset_stamp != Some(offset_stamp);
        if !force && !self.transform_dirty && !moved {
            return false;
        }
        self.last_transform_stamp = Some(transform_stamp);
        self.last_offset_stamp = Some(offset_stamp);
        self.transform_dirty = false;
        self.refresh_world();
        true
    }

    /// Fit the model-space geometry to a box. Frustums ignore this.
    pub fn update_bounds(&mut self, min: Vec3, max: Vec3) {
        self.apply_bounds(min, max);
        self.geometry_stamp = self.geometry_stamp.wrapping_add(1);
    }

    fn apply_bounds(&mut self, min: Vec3, max: Vec3) {
        match &mut self.volume {
            BoundingVolume::Sphere(sphere) => sphere.fit_bounds(min, max),
            BoundingVolume::Aabb(aabb) => aabb.set_local(min, max),
            BoundingVolume::Obb(obb) => obb.set_local(min, max),
            BoundingVolume::Frustum(_) => {}
        }
    }

    fn refresh_world(&mut self) {
        // Spheres and axis-aligned boxes only follow the translation
        let translation = self.translation();
        let model = self.model_matrix();
        match &mut self.volume {
            BoundingVolume::Sphere(sphere) => sphere.refresh(translation),
            BoundingVolume::Aabb(aabb) => aabb.refresh(translation),
            BoundingVolume::Obb(obb) => obb.refresh(&model),
            BoundingVolume::Frustum(frustum) => frustum.refresh(&model),
        }
    }

    // ===== QUERIES =====

    /// Exact overlap test against another shape's cached world state.
    pub fn has_intersection_with(&self, other: &BoundingShape) -> bool {
        match (&self.volume, &other.volume) {
            (BoundingVolume::Sphere(a), BoundingVolume::Sphere(b)) => {
                intersection::sphere_sphere(a, b)
            }
            (BoundingVolume::Sphere(s), BoundingVolume::Aabb(b))
            | (BoundingVolume::Aabb(b), BoundingVolume::Sphere(s)) => {
                intersection::sphere_box(s, &b.frame())
            }
            (BoundingVolume::Sphere(s), BoundingVolume::Obb(b))
            | (BoundingVolume::Obb(b), BoundingVolume::Sphere(s)) => {
                intersection::sphere_box(s, b.frame())
            }
            (BoundingVolume::Sphere(s), BoundingVolume::Frustum(f))
            | (BoundingVolume::Frustum(f), BoundingVolume::Sphere(s)) => {
                intersection::sphere_frustum(s, f)
            }
            (BoundingVolume::Aabb(a), BoundingVolume::Aabb(b)) => {
                a.world_bounds().intersects(b.world_bounds())
            }
            (BoundingVolume::Aabb(a), BoundingVolume::Obb(b))
            | (BoundingVolume::Obb(b), BoundingVolume::Aabb(a)) => {
                intersection::box_box(&a.frame(), b.frame())
            }
            (BoundingVolume::Obb(a), BoundingVolume::Obb(b)) => {
                intersection::box_box(a.frame(), b.frame())
            }
            (BoundingVolume::Aabb(a), BoundingVolume::Frustum(f))
            | (BoundingVolume::Frustum(f), BoundingVolume::Aabb(a)) => {
                intersection::box_frustum(&a.frame(), f)
            }
            (BoundingVolume::Obb(b), BoundingVolume::Frustum(f))
            | (BoundingVolume::Frustum(f), BoundingVolume::Obb(b)) => {
                intersection::box_frustum(b.frame(), f)
            }
            (BoundingVolume::Frustum(a), BoundingVolume::Frustum(b)) => {
                intersection::frustum_frustum(a, b)
            }
        }
    }

    /// Point on the shape surface closest to `point`.
    pub fn closest_point_on_surface(&self, point: Vec3) -> Vec3 {
        match &self.volume {
            BoundingVolume::Sphere(sphere) => sphere.closest_point_on_surface(point),
            BoundingVolume::Aabb(aabb) => aabb.closest_point_on_surface(point),
            BoundingVolume::Obb(obb) => obb.closest_point_on_surface(point),
            BoundingVolume::Frustum(frustum) => frustum.closest_point_on_surface(point),
        }
    }
}

impl fmt::Debug for BoundingShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundingShape")
            .field("volume", &self.volume)
            .field("name", &self.name)
            .field("instance_id", &self.instance_id)
            .field("transform_stamp", &self.last_transform_stamp)
            .field("offset_stamp", &self.last_offset_stamp)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "bounding_shape_tests.rs"]
mod tests;
