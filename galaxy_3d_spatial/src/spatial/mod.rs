//! Spatial index
//!
//! The loose quad tree, the footprints it indexes, its configuration and
//! the camera visibility cache and debug hook it drives.

mod orthogonal_projection;
mod quad_tree_config;
mod node;
mod quad_tree;
mod spatial_index;
mod visibility;
mod debug_draw;

pub use orthogonal_projection::{OrthogonalProjection, ProjectionAxis, ProjectionKind, to_plane};
pub use quad_tree_config::{QuadTreeConfig, QueryStrategy};
pub use node::{Node, NodeId, Quadrant};
pub use quad_tree::{QuadTree, ShapeKey, TreeStats};
pub use spatial_index::SpatialIndex;
pub use visibility::{CameraId, Visibility};
pub use debug_draw::{
    DebugDraw, DebugLine, DebugLines,
    NODE_COLOR, FOOTPRINT_COLOR, FOOTPRINT_HEIGHT, CIRCLE_SEGMENTS,
};
