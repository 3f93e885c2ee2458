/// OrthogonalProjection: 2D footprint of a bounding shape on the XZ plane.
///
/// A world point `(x, y, z)` maps to `Vec2(x, z)`. The footprint is a
/// circle (spheres), a rectangle (boxes, orthographic frustums) or a
/// triangle (perspective frustums). Polygon footprints cache their
/// separating axes together with their own projection interval, so a node
/// test only has to project the four node corners.

use glam::{Vec2, Vec3};
use crate::shapes::{BoundingShape, BoundingVolume, Bounds, BoxFrame, Frustum};

/// Axes shorter than this are dropped from the separating-axis set.
const DEGENERATE_AXIS: f32 = 1e-6;

/// Alignment needed to treat a box axis as the world up axis.
const UP_ALIGNMENT: f32 = 1.0 - 1e-4;

/// Footprint type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectionKind {
    Circle,
    Rectangle,
    Triangle,
}

/// A separating-axis candidate with the footprint's interval on it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectionAxis {
    /// Unit direction
    pub direction: Vec2,
    /// Smallest projection of the footprint
    pub min: f32,
    /// Largest projection of the footprint
    pub max: f32,
}

/// 2D footprint snapshot of one shape.
#[derive(Debug, Clone, PartialEq)]
pub struct OrthogonalProjection {
    kind: ProjectionKind,
    points: Vec<Vec2>,
    radius_sq: f32,
    axes: Vec<ProjectionAxis>,
    bounds: Bounds<Vec2>,
}

/// Map a world point onto the reference plane.
#[inline]
pub fn to_plane(point: Vec3) -> Vec2 {
    Vec2::new(point.x, point.z)
}

impl OrthogonalProjection {
    /// Footprint of a shape's cached world state.
    pub fn new(shape: &BoundingShape) -> Self {
        match shape.volume() {
            BoundingVolume::Sphere(sphere) => {
                Self::circle(to_plane(sphere.world_center()), sphere.radius())
            }
            BoundingVolume::Aabb(aabb) => {
                let b = aabb.world_bounds();
                let rect = Bounds::new(to_plane(b.min), to_plane(b.max));
                Self::polygon(ProjectionKind::Rectangle, rect.corners().to_vec())
            }
            BoundingVolume::Obb(obb) => Self::from_box(obb.frame()),
            BoundingVolume::Frustum(frustum) => Self::from_frustum(frustum),
        }
    }

    /// Circle footprint.
    pub fn circle(center: Vec2, radius: f32) -> Self {
        let r = Vec2::splat(radius.abs());
        Self {
            kind: ProjectionKind::Circle,
            points: vec![center],
            radius_sq: radius * radius,
            axes: Vec::new(),
            bounds: Bounds::new(center - r, center + r),
        }
    }

    /// Polygon footprint from its vertices in order.
    ///
    /// Axes: the two world axes, then one normal per distinct edge direction.
    pub fn polygon(kind: ProjectionKind, points: Vec<Vec2>) -> Self {
        let mut directions = vec![Vec2::X, Vec2::Y];
        let edges = match kind {
            // Opposite rectangle edges are parallel
            ProjectionKind::Rectangle => 2,
            _ => points.len(),
        };
        for i in 0..edges.min(points.len()) {
            let edge = points[(i + 1) % points.len()] - points[i];
            if edge.length_squared() < DEGENERATE_AXIS {
                continue;
            }
            directions.push(edge.perp().normalize());
        }
        let axes = directions
            .into_iter()
            .map(|direction| {
                let (min, max) = interval(&points, direction);
                ProjectionAxis { direction, min, max }
            })
            .collect();
        let bounds = Bounds::from_points(points.iter().copied());
        Self { kind, points, radius_sq: 0.0, axes, bounds }
    }

    fn envelope(points: impl IntoIterator<Item = Vec3>) -> Self {
        let rect = Bounds::from_points(points.into_iter().map(to_plane));
        Self::polygon(ProjectionKind::Rectangle, rect.corners().to_vec())
    }

    fn from_box(frame: &BoxFrame) -> Self {
        // Exact quad when one box axis is vertical, envelope otherwise
        let up = (0..3).find(|&i| frame.axes[i].dot(Vec3::Y).abs() >= UP_ALIGNMENT);
        let Some(up) = up else {
            return Self::envelope(frame.corners);
        };
        let (i, j) = ((up + 1) % 3, (up + 2) % 3);
        let u = to_plane(frame.axes[i]) * frame.half_extents[i];
        let v = to_plane(frame.axes[j]) * frame.half_extents[j];
        let c = to_plane(frame.center);
        Self::polygon(ProjectionKind::Rectangle, vec![c - u - v, c + u - v, c + u + v, c - u + v])
    }

    fn from_frustum(frustum: &Frustum) -> Self {
        let points = frustum.points();
        if frustum.is_perspective() {
            Self::perspective_footprint(frustum, points)
        } else {
            Self::orthographic_footprint(frustum, points)
        }
    }

    /// Triangle with the eye as apex, widened until it encloses every corner.
    ///
    /// This is a deliberate superset of the triangle spanned by the eye and
    /// the two far-plane corners subtending the widest angle from the
    /// far-plane centroid. The sides follow the extreme corner slopes around
    /// the eye-to-centroid axis and the base sits at the deepest corner, so
    /// all eight projected corners are inside. The broad phase can then
    /// report a node the exact frustum misses, never the reverse.
    /// Falls back to the 2D envelope when the eye looks straight up or down
    /// or a corner lies beside or behind it.
    fn perspective_footprint(frustum: &Frustum, points: &[Vec3; 8]) -> Self {
        let apex = to_plane(frustum.eye());
        let far_center = points[4..].iter().map(|&p| to_plane(p)).sum::<Vec2>() * 0.25;
        let Some(forward) = (far_center - apex).try_normalize() else {
            return Self::envelope(points.iter().copied());
        };
        let side = forward.perp();

        let mut depth = 0.0f32;
        let mut min_slope = f32::MAX;
        let mut max_slope = f32::MIN;
        for &p in points {
            let rel = to_plane(p) - apex;
            let along = rel.dot(forward);
            let across = rel.dot(side);
            if along <= DEGENERATE_AXIS {
                if across.abs() <= DEGENERATE_AXIS {
                    continue;
                }
                // Corner beside or behind the eye, no enclosing triangle
                return Self::envelope(points.iter().copied());
            }
            depth = depth.max(along);
            min_slope = min_slope.min(across / along);
            max_slope = max_slope.max(across / along);
        }
        if depth <= DEGENERATE_AXIS {
            return Self::envelope(points.iter().copied());
        }
        let base = apex + forward * depth;
        Self::polygon(
            ProjectionKind::Triangle,
            vec![apex, base + side * (min_slope * depth), base + side * (max_slope * depth)],
        )
    }

    /// Rectangle aligned with the view direction enclosing every corner.
    fn orthographic_footprint(frustum: &Frustum, points: &[Vec3; 8]) -> Self {
        let Some(forward) = to_plane(frustum.direction()).try_normalize() else {
            return Self::envelope(points.iter().copied());
        };
        let side = forward.perp();
        let flat: Vec<Vec2> = points.iter().map(|&p| to_plane(p)).collect();
        let (a0, a1) = interval(&flat, forward);
        let (s0, s1) = interval(&flat, side);
        Self::polygon(
            ProjectionKind::Rectangle,
            vec![
                forward * a0 + side * s0,
                forward * a1 + side * s0,
                forward * a1 + side * s1,
                forward * a0 + side * s1,
            ],
        )
    }

    /// Footprint type
    pub fn kind(&self) -> ProjectionKind {
        self.kind
    }

    /// Circle center, or polygon vertices
    pub fn points(&self) -> &[Vec2] {
        &self.points
    }

    /// Squared circle radius (0 for polygons)
    pub fn radius_sq(&self) -> f32 {
        self.radius_sq
    }

    /// Cached separating axes (empty for circles)
    pub fn axes(&self) -> &[ProjectionAxis] {
        &self.axes
    }

    /// Axis-aligned 2D envelope
    pub fn bounds(&self) -> &Bounds<Vec2> {
        &self.bounds
    }

    /// Two-phase overlap test against an axis-aligned rectangle.
    ///
    /// The envelope is checked first. Circles then use the squared distance
    /// from the center to the rectangle (strictly less than the squared
    /// radius, a center inside always counts); polygons run the
    /// separating-axis test over the cached axes.
    pub fn intersects_rect(&self, rect: &Bounds<Vec2>) -> bool {
        if !self.bounds.intersects(rect) {
            return false;
        }
        match self.kind {
            ProjectionKind::Circle => {
                let center = self.points[0];
                let sq_dist = center.distance_squared(center.clamp(rect.min, rect.max));
                sq_dist <= 0.0 || sq_dist < self.radius_sq
            }
            ProjectionKind::Rectangle | ProjectionKind::Triangle => {
                let corners = rect.corners();
                self.axes.iter().all(|axis| {
                    let (min, max) = interval(&corners, axis.direction);
                    !(max < axis.min || axis.max < min)
                })
            }
        }
    }
}

fn interval(points: &[Vec2], axis: Vec2) -> (f32, f32) {
    points.iter().fold((f32::MAX, f32::MIN), |(lo, hi), p| {
        let t = p.dot(axis);
        (lo.min(t), hi.max(t))
    })
}

#[cfg(test)]
#[path = "orthogonal_projection_tests.rs"]
mod tests;
