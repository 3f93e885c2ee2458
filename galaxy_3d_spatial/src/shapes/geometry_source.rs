//! Geometry sources: meshes whose vertex extents drive shape geometry.
//!
//! A shape keeps only a `Weak` reference to its mesh. When the mesh is
//! dropped the shape keeps its last extents.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{PoisonError, RwLock};
use glam::Vec3;
use super::bounds::Bounds;

/// Anything that exposes stamped vertex extents.
pub trait GeometrySource: Send + Sync {
    /// Changes whenever the vertex data changes.
    fn geometry_stamp(&self) -> u32;

    /// Minimum vertex position (model space)
    fn min_position(&self) -> Vec3;

    /// Maximum vertex position (model space)
    fn max_position(&self) -> Vec3;
}

/// Stamped model-space extents of a mesh.
#[derive(Debug)]
pub struct MeshExtents {
    extents: RwLock<Bounds<Vec3>>,
    stamp: AtomicU32,
}

impl MeshExtents {
    /// Extents given directly.
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self {
            extents: RwLock::new(Bounds::new(min, max)),
            stamp: AtomicU32::new(1),
        }
    }

    /// Extents of a vertex position list. An empty list yields a point at the origin.
    pub fn from_positions(positions: &[Vec3]) -> Self {
        let bounds = Self::bounds_of(positions);
        Self::new(bounds.min, bounds.max)
    }

    /// Replace the vertex positions.
    pub fn set_positions(&self, positions: &[Vec3]) {
        let bounds = Self::bounds_of(positions);
        self.set_extents(bounds.min, bounds.max);
    }

    /// Replace the extents.
    pub fn set_extents(&self, min: Vec3, max: Vec3) {
        let mut extents = self.extents.write().unwrap_or_else(PoisonError::into_inner);
        *extents = Bounds::new(min, max);
        self.stamp.fetch_add(1, Ordering::AcqRel);
    }

    fn bounds_of(positions: &[Vec3]) -> Bounds<Vec3> {
        if positions.is_empty() {
            return Bounds::new(Vec3::ZERO, Vec3::ZERO);
        }
        Bounds::from_points(positions.iter().copied())
    }

    fn extents(&self) -> Bounds<Vec3> {
        *self.extents.read().unwrap_or_else(PoisonError::into_inner)
    }
}

impl GeometrySource for MeshExtents {
    fn geometry_stamp(&self) -> u32 {
        self.stamp.load(Ordering::Acquire)
    }

    fn min_position(&self) -> Vec3 {
        self.extents().min
    }

    fn max_position(&self) -> Vec3 {
        self.extents().max
    }
}

#[cfg(test)]
#[path = "geometry_source_tests.rs"]
mod tests;
