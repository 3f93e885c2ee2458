/// OrientedBox: model-space min/max carried through the full model matrix.
///
/// The model matrix is expected to be a composition of translation,
/// rotation and (possibly non-uniform) scale, so the world box keeps three
/// orthogonal axes.

use glam::{Mat4, Vec3};
use super::bounds::Bounds;

/// World-space box described by center, unit axes and half extents.
///
/// Shared by the axis-aligned and the oriented box for the narrow phase.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxFrame {
    /// Box center
    pub center: Vec3,
    /// Unit axes (box X, Y, Z)
    pub axes: [Vec3; 3],
    /// Half extent along each axis
    pub half_extents: Vec3,
    /// Corners, bit 0 = X, bit 1 = Y, bit 2 = Z (0 = negative side)
    pub corners: [Vec3; 8],
}

impl BoxFrame {
    /// Frame of an axis-aligned box.
    pub fn from_bounds(bounds: &Bounds<Vec3>) -> Self {
        Self {
            center: bounds.center(),
            axes: [Vec3::X, Vec3::Y, Vec3::Z],
            half_extents: bounds.size() * 0.5,
            corners: bounds.corners(),
        }
    }

    /// Frame of a model-space box under `model`.
    pub fn from_transformed(bounds: &Bounds<Vec3>, model: &Mat4) -> Self {
        let center = model.transform_point3(bounds.center());
        let half = bounds.size() * 0.5;
        let mut axes = [Vec3::X, Vec3::Y, Vec3::Z];
        let mut half_extents = Vec3::ZERO;
        for i in 0..3 {
            let image = model.transform_vector3(axes[i]);
            let length = image.length();
            // A collapsed axis keeps its model direction and gets zero extent
            if length > f32::EPSILON {
                axes[i] = image / length;
            }
            half_extents[i] = half[i] * length;
        }
        let corners = bounds.corners().map(|c| model.transform_point3(c));
        Self { center, axes, half_extents, corners }
    }

    /// Point of the box (interior included) closest to `point`.
    pub fn clamp_point(&self, point: Vec3) -> Vec3 {
        let d = point - self.center;
        let mut result = self.center;
        for i in 0..3 {
            let extent = self.half_extents[i];
            result += self.axes[i] * d.dot(self.axes[i]).clamp(-extent, extent);
        }
        result
    }

    /// Point on the box surface closest to `point`.
    pub fn closest_point_on_surface(&self, point: Vec3) -> Vec3 {
        let d = point - self.center;
        let local = Vec3::new(d.dot(self.axes[0]), d.dot(self.axes[1]), d.dot(self.axes[2]));
        let inside = (0..3).all(|i| local[i].abs() <= self.half_extents[i]);
        if !inside {
            return self.clamp_point(point);
        }
        // Push the coordinate with the smallest face distance onto its face
        let mut best_axis = 0;
        let mut best_gap = f32::MAX;
        for i in 0..3 {
            let gap = self.half_extents[i] - local[i].abs();
            if gap < best_gap {
                best_gap = gap;
                best_axis = i;
            }
        }
        let mut snapped = local;
        snapped[best_axis] = self.half_extents[best_axis].copysign(local[best_axis]);
        self.center
            + self.axes[0] * snapped.x
            + self.axes[1] * snapped.y
            + self.axes[2] * snapped.z
    }
}

/// Oriented box volume.
#[derive(Debug, Clone, PartialEq)]
pub struct OrientedBox {
    local: Bounds<Vec3>,
    frame: BoxFrame,
}

impl OrientedBox {
    /// Box from model-space corners.
    pub fn new(min: Vec3, max: Vec3) -> Self {
        let local = Bounds::new(min.min(max), min.max(max));
        Self { local, frame: BoxFrame::from_bounds(&local) }
    }

    /// Model-space extents
    pub fn local_bounds(&self) -> &Bounds<Vec3> {
        &self.local
    }

    /// World-space frame after the last transform update
    pub fn frame(&self) -> &BoxFrame {
        &self.frame
    }

    /// World-space corners
    pub fn corners(&self) -> &[Vec3; 8] {
        &self.frame.corners
    }

    pub(crate) fn set_local(&mut self, min: Vec3, max: Vec3) {
        self.local = Bounds::new(min.min(max), min.max(max));
    }

    pub(crate) fn refresh(&mut self, model: &Mat4) {
        self.frame = BoxFrame::from_transformed(&self.local, model);
    }

    /// Axis-clamped projection of `point` onto the box surface.
    pub fn closest_point_on_surface(&self, point: Vec3) -> Vec3 {
        self.frame.closest_point_on_surface(point)
    }
}
