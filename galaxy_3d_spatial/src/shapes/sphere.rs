/// BoundingSphere: center and radius; only translated, never rotated or scaled.

use glam::Vec3;

/// Sphere volume. `center` is in model space, `world_center` is cached.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundingSphere {
    center: Vec3,
    radius: f32,
    world_center: Vec3,
}

impl BoundingSphere {
    /// Sphere around a model-space center.
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius: radius.abs(), world_center: center }
    }

    /// Model-space center
    pub fn center(&self) -> Vec3 {
        self.center
    }

    /// Radius
    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Center after the last transform update
    pub fn world_center(&self) -> Vec3 {
        self.world_center
    }

    /// Change the radius. Edit through `BoundingShape::volume_mut` so the change is picked up.
    pub fn set_radius(&mut self, radius: f32) {
        self.radius = radius.abs();
    }

    /// Fit the sphere around a model-space box.
    pub(crate) fn fit_bounds(&mut self, min: Vec3, max: Vec3) {
        self.center = (min + max) * 0.5;
        self.radius = (max - min).length() * 0.5;
    }

    pub(crate) fn refresh(&mut self, translation: Vec3) {
        self.world_center = self.center + translation;
    }

    /// Point on the sphere surface closest to `point`.
    ///
    /// For the center itself every surface point is equally close; the +X
    /// pole is returned.
    pub fn closest_point_on_surface(&self, point: Vec3) -> Vec3 {
        let dir = (point - self.world_center).try_normalize().unwrap_or(Vec3::X);
        self.world_center + dir * self.radius
    }
}
