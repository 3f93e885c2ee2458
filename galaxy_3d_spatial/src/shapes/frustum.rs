/// Frustum: view volume described by a projection, a near/far range and a
/// view origin/direction.
///
/// Corner layout (`points()`): 0..3 near plane, 4..7 far plane, each as
/// left-bottom, right-bottom, right-top, left-top when looking down the
/// view direction.
///
/// Plane layout (`planes()`): left, right, bottom, top, near, far. Normals
/// point inward, so a point is inside iff every distance is `>= 0`.

use glam::{Mat4, Vec3};
use crate::error::{Galaxy3dError, Galaxy3dResult};
use super::plane::Plane;

/// Frustum plane indices
pub const PLANE_LEFT: usize = 0;
pub const PLANE_RIGHT: usize = 1;
pub const PLANE_BOTTOM: usize = 2;
pub const PLANE_TOP: usize = 3;
pub const PLANE_NEAR: usize = 4;
pub const PLANE_FAR: usize = 5;

/// How the view volume widens with distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrustumProjection {
    /// Finite field of view. `fov_degrees` is the vertical angle.
    Perspective { fov_degrees: f32, aspect: f32 },
    /// Parallel projection with fixed extents around the view axis.
    Orthographic { left: f32, right: f32, bottom: f32, top: f32 },
}

/// View frustum volume.
#[derive(Debug, Clone, PartialEq)]
pub struct Frustum {
    projection: FrustumProjection,
    near: f32,
    far: f32,
    eye: Vec3,
    direction: Vec3,
    model: Mat4,
    world_eye: Vec3,
    world_direction: Vec3,
    points: [Vec3; 8],
    planes: [Plane; 6],
}

impl Frustum {
    /// Perspective frustum at the origin looking down -Z.
    ///
    /// # Errors
    ///
    /// Returns `Galaxy3dError::InvalidShape` unless `0 < fov_degrees < 180`,
    /// `aspect > 0` and `0 < near < far`.
    pub fn perspective(fov_degrees: f32, aspect: f32, near: f32, far: f32) -> Galaxy3dResult<Self> {
        if !(fov_degrees > 0.0 && fov_degrees < 180.0) {
            return Err(Galaxy3dError::InvalidShape(format!(
                "frustum field of view must be in (0, 180) degrees, got {}", fov_degrees
            )));
        }
        if !(aspect > 0.0) {
            return Err(Galaxy3dError::InvalidShape(format!(
                "frustum aspect ratio must be positive, got {}", aspect
            )));
        }
        if !(near > 0.0) {
            return Err(Galaxy3dError::InvalidShape(format!(
                "perspective near distance must be positive, got {}", near
            )));
        }
        Self::build(FrustumProjection::Perspective { fov_degrees, aspect }, near, far)
    }

    /// Orthographic frustum at the origin looking down -Z.
    ///
    /// # Errors
    ///
    /// Returns `Galaxy3dError::InvalidShape` for empty extents or unless `0 <= near < far`.
    pub fn orthographic(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Galaxy3dResult<Self> {
        if !(right > left && top > bottom) {
            return Err(Galaxy3dError::InvalidShape(format!(
                "orthographic extents are empty: left {} right {} bottom {} top {}",
                left, right, bottom, top
            )));
        }
        if !(near >= 0.0) {
            return Err(Galaxy3dError::InvalidShape(format!(
                "orthographic near distance must not be negative, got {}", near
            )));
        }
        Self::build(FrustumProjection::Orthographic { left, right, bottom, top }, near, far)
    }

    fn build(projection: FrustumProjection, near: f32, far: f32) -> Galaxy3dResult<Self> {
        if !(far > near) || !far.is_finite() {
            return Err(Galaxy3dError::InvalidShape(format!(
                "frustum far distance must be finite and beyond near ({}), got {}", near, far
            )));
        }
        let mut frustum = Self {
            projection,
            near,
            far,
            eye: Vec3::ZERO,
            direction: Vec3::NEG_Z,
            model: Mat4::IDENTITY,
            world_eye: Vec3::ZERO,
            world_direction: Vec3::NEG_Z,
            points: [Vec3::ZERO; 8],
            planes: [Plane::default(); 6],
        };
        frustum.refresh(&Mat4::IDENTITY);
        Ok(frustum)
    }

    /// Builder form of [`Frustum::look_at`].
    pub fn with_look_at(mut self, eye: Vec3, direction: Vec3) -> Self {
        self.look_at(eye, direction);
        self
    }

    /// Move the view origin and direction (model space).
    ///
    /// A zero direction keeps the previous one.
    pub fn look_at(&mut self, eye: Vec3, direction: Vec3) {
        self.eye = eye;
        if let Some(d) = direction.try_normalize() {
            self.direction = d;
        }
        let model = self.model;
        self.refresh(&model);
    }

    /// Projection parameters
    pub fn projection(&self) -> FrustumProjection {
        self.projection
    }

    /// True for a finite field of view
    pub fn is_perspective(&self) -> bool {
        matches!(self.projection, FrustumProjection::Perspective { .. })
    }

    /// Near distance
    pub fn near(&self) -> f32 {
        self.near
    }

    /// Far distance
    pub fn far(&self) -> f32 {
        self.far
    }

    /// World-space view origin
    pub fn eye(&self) -> Vec3 {
        self.world_eye
    }

    /// World-space unit view direction
    pub fn direction(&self) -> Vec3 {
        self.world_direction
    }

    /// World-space corners
    pub fn points(&self) -> &[Vec3; 8] {
        &self.points
    }

    /// World-space inward planes
    pub fn planes(&self) -> &[Plane; 6] {
        &self.planes
    }

    /// Midpoint of the view axis between near and far.
    pub fn center(&self) -> Vec3 {
        self.world_eye + self.world_direction * (self.near + (self.far - self.near) * 0.5)
    }

    /// Set the near/far range, keeping the projection.
    ///
    /// # Errors
    ///
    /// Same range rules as the constructors.
    pub fn set_range(&mut self, near: f32, far: f32) -> Galaxy3dResult<()> {
        let valid_near = if self.is_perspective() { near > 0.0 } else { near >= 0.0 };
        if !valid_near || !(far > near) || !far.is_finite() {
            return Err(Galaxy3dError::InvalidShape(format!(
                "invalid frustum range: near {} far {}", near, far
            )));
        }
        self.near = near;
        self.far = far;
        let model = self.model;
        self.refresh(&model);
        Ok(())
    }

    /// Cascade split along the view axis.
    ///
    /// Split distances blend a logarithmic and a uniform distribution:
    /// `c_i = weight * near * (far / near)^(i / count) + (1 - weight) * (near + (far - near) * i / count)`.
    /// Each cascade except the last overlaps the next one by half a percent.
    ///
    /// # Errors
    ///
    /// Returns `Galaxy3dError::InvalidShape` if `count` is zero or `near` is zero.
    pub fn split(&self, count: usize, weight: f32) -> Galaxy3dResult<Vec<Frustum>> {
        if count == 0 {
            return Err(Galaxy3dError::InvalidShape("frustum split count must be at least 1".to_string()));
        }
        if !(self.near > 0.0) {
            return Err(Galaxy3dError::InvalidShape("cannot split a frustum with a zero near distance".to_string()));
        }
        let n = self.near as f64;
        let f = self.far as f64;
        let w = weight.clamp(0.0, 1.0) as f64;
        let ratio = f / n;

        let mut cascades = Vec::with_capacity(count);
        let mut last_near = n;
        for i in 1..count {
            let si = i as f64 / count as f64;
            let current_near = w * (n * ratio.powf(si)) + (1.0 - w) * (n + (f - n) * si);
            let current_far = current_near * 1.005;
            cascades.push(self.with_range(last_near as f32, current_far as f32));
            last_near = current_near;
        }
        cascades.push(self.with_range(last_near as f32, self.far));
        Ok(cascades)
    }

    fn with_range(&self, near: f32, far: f32) -> Frustum {
        let mut cascade = self.clone();
        cascade.near = near;
        cascade.far = far;
        cascade.refresh(&self.model);
        cascade
    }

    /// Recompute world corners and planes under `model`.
    pub(crate) fn refresh(&mut self, model: &Mat4) {
        self.model = *model;
        self.world_eye = model.transform_point3(self.eye);
        self.world_direction = model
            .transform_vector3(self.direction)
            .try_normalize()
            .unwrap_or(self.direction);

        let d = self.world_direction;
        let right = d.cross(Vec3::Y).try_normalize()
            .or_else(|| d.cross(Vec3::Z).try_normalize())
            .unwrap_or(Vec3::X);
        let up = right.cross(d).normalize_or_zero();

        let near_rect = self.rect_at(self.near);
        let far_rect = self.rect_at(self.far);
        let near_center = self.world_eye + d * self.near;
        let far_center = self.world_eye + d * self.far;
        let corners = |center: Vec3, [l, r, b, t]: [f32; 4]| {
            [
                center + right * l + up * b,
                center + right * r + up * b,
                center + right * r + up * t,
                center + right * l + up * t,
            ]
        };
        let near_points = corners(near_center, near_rect);
        let far_points = corners(far_center, far_rect);
        self.points[..4].copy_from_slice(&near_points);
        self.points[4..].copy_from_slice(&far_points);

        let p = &self.points;
        let centroid = p.iter().copied().sum::<Vec3>() / 8.0;
        let triples = [
            (p[0], p[3], p[7]), // left
            (p[1], p[2], p[6]), // right
            (p[0], p[1], p[5]), // bottom
            (p[3], p[2], p[6]), // top
            (p[0], p[1], p[2]), // near
            (p[4], p[5], p[6]), // far
        ];
        let fallback_normals = [right, -right, up, -up, d, -d];
        for (i, (a, b, c)) in triples.into_iter().enumerate() {
            let plane = Plane::from_points(a, b, c).unwrap_or_else(|| {
                let normal = fallback_normals[i];
                Plane { normal, d: -normal.dot(a) }
            });
            self.planes[i] = if plane.distance(centroid) < 0.0 { plane.flipped() } else { plane };
        }
    }

    /// Plane extents [left, right, bottom, top] at `distance` along the view axis.
    fn rect_at(&self, distance: f32) -> [f32; 4] {
        match self.projection {
            FrustumProjection::Perspective { fov_degrees, aspect } => {
                let h = (fov_degrees.to_radians() * 0.5).tan() * distance;
                let w = h * aspect;
                [-w, w, -h, h]
            }
            FrustumProjection::Orthographic { left, right, bottom, top } => [left, right, bottom, top],
        }
    }

    /// True unless the sphere lies entirely behind one of the planes.
    pub fn intersects_sphere(&self, center: Vec3, radius: f32) -> bool {
        self.planes.iter().all(|plane| plane.distance(center) >= -radius)
    }

    /// True unless every point lies behind one and the same plane.
    pub fn intersects_points(&self, points: &[Vec3]) -> bool {
        !self.planes.iter().any(|plane| points.iter().all(|&p| plane.distance(p) < 0.0))
    }

    /// True if `point` is inside or on the frustum.
    pub fn contains_point(&self, point: Vec3) -> bool {
        self.planes.iter().all(|plane| plane.distance(point) >= 0.0)
    }

    /// Projection of `point` onto the nearest of the six planes.
    pub fn closest_point_on_surface(&self, point: Vec3) -> Vec3 {
        let mut closest = point;
        let mut best = f32::MAX;
        for plane in &self.planes {
            let candidate = plane.closest_point(point);
            let distance = (candidate - point).length_squared();
            if distance < best {
                best = distance;
                closest = candidate;
            }
        }
        closest
    }
}

#[cfg(test)]
#[path = "frustum_tests.rs"]
mod tests;
