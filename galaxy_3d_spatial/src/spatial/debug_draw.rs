/// Debug drawing hook: node rectangles and shape footprints as line segments.

use std::f32::consts::TAU;
use glam::{Vec2, Vec3};
use crate::shapes::Bounds;
use super::orthogonal_projection::{OrthogonalProjection, ProjectionKind};

/// Color of node rectangles
pub const NODE_COLOR: Vec3 = Vec3::new(1.0, 0.0, 0.0);

/// Color of shape footprints
pub const FOOTPRINT_COLOR: Vec3 = Vec3::new(0.0, 1.0, 0.0);

/// Height of footprints above the XZ plane, so they do not hide node lines
pub const FOOTPRINT_HEIGHT: f32 = 0.1;

/// Segments used to approximate a circle
pub const CIRCLE_SEGMENTS: usize = 32;

/// Receiver of debug line segments.
pub trait DebugDraw {
    /// Draw one line segment.
    fn draw_line(&mut self, from: Vec3, to: Vec3, color: Vec3);

    /// Draw a circle in the horizontal plane through `center`.
    fn draw_circle(&mut self, center: Vec3, radius: f32, color: Vec3) {
        let point = |i: usize| {
            let angle = TAU * i as f32 / CIRCLE_SEGMENTS as f32;
            center + Vec3::new(angle.cos() * radius, 0.0, angle.sin() * radius)
        };
        for i in 0..CIRCLE_SEGMENTS {
            self.draw_line(point(i), point(i + 1), color);
        }
    }
}

/// A recorded line segment
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DebugLine {
    pub from: Vec3,
    pub to: Vec3,
    pub color: Vec3,
}

/// [`DebugDraw`] that records every segment, for tests and offline dumps.
#[derive(Debug, Default, Clone)]
pub struct DebugLines {
    pub lines: Vec<DebugLine>,
}

impl DebugLines {
    /// Number of segments drawn with `color`
    pub fn count_with_color(&self, color: Vec3) -> usize {
        self.lines.iter().filter(|line| line.color == color).count()
    }
}

impl DebugDraw for DebugLines {
    fn draw_line(&mut self, from: Vec3, to: Vec3, color: Vec3) {
        self.lines.push(DebugLine { from, to, color });
    }
}

fn lift(point: Vec2, height: f32) -> Vec3 {
    Vec3::new(point.x, height, point.y)
}

fn draw_loop(debug: &mut dyn DebugDraw, points: &[Vec2], height: f32, color: Vec3) {
    for (i, &p) in points.iter().enumerate() {
        let next = points[(i + 1) % points.len()];
        debug.draw_line(lift(p, height), lift(next, height), color);
    }
}

/// Outline of a node rectangle at ground level.
pub(crate) fn draw_node(debug: &mut dyn DebugDraw, bounds: &Bounds<Vec2>) {
    draw_loop(debug, &bounds.corners(), 0.0, NODE_COLOR);
}

/// Outline of a footprint slightly above ground level.
pub(crate) fn draw_footprint(debug: &mut dyn DebugDraw, projection: &OrthogonalProjection) {
    match projection.kind() {
        ProjectionKind::Circle => {
            let center = lift(projection.points()[0], FOOTPRINT_HEIGHT);
            debug.draw_circle(center, projection.radius_sq().sqrt(), FOOTPRINT_COLOR);
        }
        ProjectionKind::Rectangle | ProjectionKind::Triangle => {
            draw_loop(debug, projection.points(), FOOTPRINT_HEIGHT, FOOTPRINT_COLOR);
        }
    }
}
