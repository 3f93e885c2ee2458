/*!
# Galaxy 3D Spatial

Dynamic spatial index for the Galaxy 3D toolkit: a loose quad tree over the
XZ-plane footprints of heterogeneous bounding volumes that move every tick.

## Architecture

- **Bounds**: min/max value type in 2D and 3D
- **BoundingShape**: sphere, axis-aligned box, oriented box or frustum, bound
  to externally owned per-instance transforms and optional mesh extents
- **OrthogonalProjection**: 2D footprint (circle, rectangle, triangle) with
  cached separating axes, used for the broad phase
- **QuadTree**: pooled node arena with staged insertion, incremental
  reinsertion of moved shapes, conservative collapse and optional fork/join
  queries

Shapes are refreshed and the tree is restructured by `QuadTree::update`,
called once per tick before any query.
*/

// Internal modules
mod error;
mod diagnostics;
pub mod log;
pub mod shapes;
pub mod spatial;
pub mod utils;

// Main galaxy3d namespace module
pub mod galaxy3d {
    // Error types
    pub use crate::error::{Galaxy3dError, Galaxy3dResult};

    // Logger singleton
    pub use crate::diagnostics::Diagnostics;

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
        // Note: spatial_* macros are NOT re-exported here - they are internal only
    }

    // Bounding shapes sub-module
    pub mod shapes {
        pub use crate::shapes::*;
    }

    // Spatial index sub-module
    pub mod spatial {
        pub use crate::spatial::*;
    }
}

// Re-export math library at crate root
pub use glam;
