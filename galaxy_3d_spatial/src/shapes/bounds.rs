/// Bounds: min/max corner pair in 2D or 3D.
///
/// A pure value type. The quadtree uses `Bounds<Vec2>` for node rectangles
/// and projection envelopes; shapes use `Bounds<Vec3>` for mesh extents.

use std::fmt::Debug;
use std::ops::{Add, Mul, Sub};
use glam::{Vec2, Vec3};

/// Vector types usable as a bounds corner.
pub trait BoundsVector:
    Copy + PartialEq + Debug + Add<Output = Self> + Sub<Output = Self> + Mul<f32, Output = Self>
{
    /// Component-wise most negative value
    const LOWEST: Self;
    /// Component-wise most positive value
    const HIGHEST: Self;

    /// Component-wise minimum
    fn component_min(self, other: Self) -> Self;
    /// Component-wise maximum
    fn component_max(self, other: Self) -> Self;
    /// `true` if every component of `self` is `<=` the matching one of `other`
    fn all_le(self, other: Self) -> bool;
    /// Largest component
    fn largest(self) -> f32;
    /// Smallest component
    fn smallest(self) -> f32;
}

impl BoundsVector for Vec2 {
    const LOWEST: Self = Vec2::MIN;
    const HIGHEST: Self = Vec2::MAX;

    fn component_min(self, other: Self) -> Self { self.min(other) }
    fn component_max(self, other: Self) -> Self { self.max(other) }
    fn all_le(self, other: Self) -> bool { self.cmple(other).all() }
    fn largest(self) -> f32 { self.max_element() }
    fn smallest(self) -> f32 { self.min_element() }
}

impl BoundsVector for Vec3 {
    const LOWEST: Self = Vec3::MIN;
    const HIGHEST: Self = Vec3::MAX;

    fn component_min(self, other: Self) -> Self { self.min(other) }
    fn component_max(self, other: Self) -> Self { self.max(other) }
    fn all_le(self, other: Self) -> bool { self.cmple(other).all() }
    fn largest(self) -> f32 { self.max_element() }
    fn smallest(self) -> f32 { self.min_element() }
}

/// Axis-aligned min/max pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds<T: BoundsVector> {
    /// Minimum corner
    pub min: T,
    /// Maximum corner
    pub max: T,
}

impl<T: BoundsVector> Bounds<T> {
    /// Create bounds from two corners. The corners are not reordered.
    pub fn new(min: T, max: T) -> Self {
        Self { min, max }
    }

    /// Inverted bounds that any `extend` or `union` overwrites.
    pub fn empty() -> Self {
        Self { min: T::HIGHEST, max: T::LOWEST }
    }

    /// Smallest bounds containing every point of the iterator.
    pub fn from_points<I: IntoIterator<Item = T>>(points: I) -> Self {
        let mut bounds = Self::empty();
        for p in points {
            bounds.extend(p);
        }
        bounds
    }

    /// `true` if min is not below max on some axis.
    pub fn is_empty(&self) -> bool {
        !self.min.all_le(self.max)
    }

    /// Grow to include a point.
    pub fn extend(&mut self, point: T) {
        self.min = self.min.component_min(point);
        self.max = self.max.component_max(point);
    }

    /// Smallest bounds containing both.
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: self.min.component_min(other.min),
            max: self.max.component_max(other.max),
        }
    }

    /// Test if the two bounds overlap or touch.
    pub fn intersects(&self, other: &Self) -> bool {
        self.min.all_le(other.max) && other.min.all_le(self.max)
    }

    /// Test if `other` lies entirely within `self`.
    pub fn contains(&self, other: &Self) -> bool {
        self.min.all_le(other.min) && other.max.all_le(self.max)
    }

    /// Test if a point lies within `self` (boundary included).
    pub fn contains_point(&self, point: T) -> bool {
        self.min.all_le(point) && point.all_le(self.max)
    }

    /// Center point
    pub fn center(&self) -> T {
        (self.min + self.max) * 0.5
    }

    /// Extent along each axis
    pub fn size(&self) -> T {
        self.max - self.min
    }

    /// Length of the longest edge
    pub fn max_extent(&self) -> f32 {
        self.size().largest()
    }

    /// Length of the shortest edge
    pub fn min_extent(&self) -> f32 {
        self.size().smallest()
    }
}

impl Bounds<Vec2> {
    /// Extend `max` so that both edges have the length of the longest one.
    pub fn squared(&self) -> Self {
        let edge = self.max_extent();
        Self { min: self.min, max: self.min + Vec2::splat(edge) }
    }

    /// The four corners, counter-clockwise from `min`.
    pub fn corners(&self) -> [Vec2; 4] {
        [
            self.min,
            Vec2::new(self.max.x, self.min.y),
            self.max,
            Vec2::new(self.min.x, self.max.y),
        ]
    }
}

impl Bounds<Vec3> {
    /// The eight corners. Bit 0 selects X, bit 1 Y, bit 2 Z (0 = min, 1 = max).
    pub fn corners(&self) -> [Vec3; 8] {
        let mut corners = [Vec3::ZERO; 8];
        for (i, corner) in corners.iter_mut().enumerate() {
            *corner = Vec3::new(
                if i & 1 == 0 { self.min.x } else { self.max.x },
                if i & 2 == 0 { self.min.y } else { self.max.y },
                if i & 4 == 0 { self.min.z } else { self.max.z },
            );
        }
        corners
    }
}

#[cfg(test)]
#[path = "bounds_tests.rs"]
mod tests;
