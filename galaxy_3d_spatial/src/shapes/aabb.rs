/// AxisAlignedBox: model-space min/max, only translated so it stays axis aligned.

use glam::Vec3;
use super::bounds::Bounds;
use super::obb::BoxFrame;

/// Axis-aligned box volume.
#[derive(Debug, Clone, PartialEq)]
pub struct AxisAlignedBox {
    local: Bounds<Vec3>,
    world: Bounds<Vec3>,
}

impl AxisAlignedBox {
    /// Box from model-space corners.
    pub fn new(min: Vec3, max: Vec3) -> Self {
        let local = Bounds::new(min.min(max), min.max(max));
        Self { local, world: local }
    }

    /// Model-space extents
    pub fn local_bounds(&self) -> &Bounds<Vec3> {
        &self.local
    }

    /// World-space extents after the last transform update
    pub fn world_bounds(&self) -> &Bounds<Vec3> {
        &self.world
    }

    pub(crate) fn set_local(&mut self, min: Vec3, max: Vec3) {
        self.local = Bounds::new(min.min(max), min.max(max));
    }

    pub(crate) fn refresh(&mut self, translation: Vec3) {
        self.world = Bounds::new(self.local.min + translation, self.local.max + translation);
    }

    /// The world box as a generic box frame (identity axes).
    pub(crate) fn frame(&self) -> BoxFrame {
        BoxFrame::from_bounds(&self.world)
    }

    /// Point on the box surface closest to `point`.
    ///
    /// Outside points are clamped onto the box; inside points are pushed to
    /// the nearest face.
    pub fn closest_point_on_surface(&self, point: Vec3) -> Vec3 {
        self.frame().closest_point_on_surface(point)
    }
}
