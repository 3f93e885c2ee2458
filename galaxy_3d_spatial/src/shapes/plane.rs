/// Plane: `dot(normal, p) + d = 0`, normal unit length.

use glam::Vec3;

/// Oriented plane. Positive distances are on the side the normal points to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    /// Unit normal
    pub normal: Vec3,
    /// Signed offset
    pub d: f32,
}

impl Plane {
    /// Plane through three points, normal = (b - a) x (c - a).
    ///
    /// Returns `None` for collinear points.
    pub fn from_points(a: Vec3, b: Vec3, c: Vec3) -> Option<Self> {
        let normal = (b - a).cross(c - a).try_normalize()?;
        Some(Self { normal, d: -normal.dot(a) })
    }

    /// Signed distance of `point`.
    pub fn distance(&self, point: Vec3) -> f32 {
        self.normal.dot(point) + self.d
    }

    /// Orthogonal projection of `point` onto the plane.
    pub fn closest_point(&self, point: Vec3) -> Vec3 {
        point - self.normal * self.distance(point)
    }

    /// Same plane, opposite orientation.
    pub fn flipped(&self) -> Self {
        Self { normal: -self.normal, d: -self.d }
    }
}

impl Default for Plane {
    fn default() -> Self {
        Self { normal: Vec3::Y, d: 0.0 }
    }
}
