/// Narrow-phase tests between world-space volumes.
///
/// All tests are conservative in the same direction: they may report an
/// overlap for shapes that only nearly touch, never the opposite.

use glam::Vec3;
use super::frustum::Frustum;
use super::obb::BoxFrame;
use super::sphere::BoundingSphere;

/// Cross products shorter than this are not usable as separating axes.
const DEGENERATE_AXIS: f32 = 1e-6;

pub(crate) fn sphere_sphere(a: &BoundingSphere, b: &BoundingSphere) -> bool {
    let reach = a.radius() + b.radius();
    if a.world_center().distance_squared(b.world_center()) <= reach * reach {
        return true;
    }
    let surface = b.closest_point_on_surface(a.world_center());
    surface.distance_squared(a.world_center()) <= a.radius() * a.radius()
}

pub(crate) fn sphere_box(sphere: &BoundingSphere, frame: &BoxFrame) -> bool {
    let center = sphere.world_center();
    let nearest = frame.clamp_point(center);
    nearest.distance_squared(center) <= sphere.radius() * sphere.radius()
}

pub(crate) fn sphere_frustum(sphere: &BoundingSphere, frustum: &Frustum) -> bool {
    frustum.intersects_sphere(sphere.world_center(), sphere.radius())
}

fn interval(points: &[Vec3], axis: Vec3) -> (f32, f32) {
    points.iter().fold((f32::MAX, f32::MIN), |(lo, hi), p| {
        let t = p.dot(axis);
        (lo.min(t), hi.max(t))
    })
}

fn separated_on(axis: Vec3, a: &[Vec3], b: &[Vec3]) -> bool {
    let (a_min, a_max) = interval(a, axis);
    let (b_min, b_max) = interval(b, axis);
    a_max < b_min || b_max < a_min
}

/// Separating-axis test over the 15 candidate axes of two boxes.
pub(crate) fn box_box(a: &BoxFrame, b: &BoxFrame) -> bool {
    for axis in a.axes.iter().chain(b.axes.iter()) {
        if separated_on(*axis, &a.corners, &b.corners) {
            return false;
        }
    }
    for ea in &a.axes {
        for eb in &b.axes {
            let axis = ea.cross(*eb);
            // Parallel edges, the face axes above already cover this
            if axis.length_squared() < DEGENERATE_AXIS {
                continue;
            }
            if separated_on(axis, &a.corners, &b.corners) {
                return false;
            }
        }
    }
    true
}

pub(crate) fn box_frustum(frame: &BoxFrame, frustum: &Frustum) -> bool {
    if !frustum.intersects_points(&frame.corners) {
        return false;
    }
    !frame
        .axes
        .iter()
        .any(|axis| separated_on(*axis, &frame.corners, frustum.points()))
}

pub(crate) fn frustum_frustum(a: &Frustum, b: &Frustum) -> bool {
    a.intersects_points(b.points()) && b.intersects_points(a.points())
}

#[cfg(test)]
#[path = "intersection_tests.rs"]
mod tests;
