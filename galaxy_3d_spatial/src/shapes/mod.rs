//! Bounding shapes
//!
//! Value types (bounds, planes), the externally owned data shapes read
//! (instance buffers, geometry sources) and the four bounding volumes with
//! their pairwise narrow-phase tests.

mod bounds;
mod plane;
mod instance_buffer;
mod geometry_source;
mod sphere;
mod aabb;
mod obb;
mod frustum;
mod intersection;
mod bounding_shape;

pub use bounds::{Bounds, BoundsVector};
pub use plane::Plane;
pub use instance_buffer::{InstanceBuffer, TransformBuffer, OffsetBuffer};
pub use geometry_source::{GeometrySource, MeshExtents};
pub use sphere::BoundingSphere;
pub use aabb::AxisAlignedBox;
pub use obb::{OrientedBox, BoxFrame};
pub use frustum::{
    Frustum, FrustumProjection,
    PLANE_LEFT, PLANE_RIGHT, PLANE_BOTTOM, PLANE_TOP, PLANE_NEAR, PLANE_FAR,
};
pub use bounding_shape::{BoundingShape, BoundingVolume, ShapeKind};
