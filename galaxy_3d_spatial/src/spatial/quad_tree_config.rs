/// Per-tree tuning.
///
/// Several trees with different tuning may coexist; each one validates its
/// own configuration at construction.

use crate::error::{Galaxy3dError, Galaxy3dResult};

/// How a query walks the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryStrategy {
    /// Single thread, explicit stack
    #[default]
    Sequential,
    /// One task per child node, joined before the query returns
    ForkJoin,
}

/// Quad tree configuration
#[derive(Debug, Clone, PartialEq)]
pub struct QuadTreeConfig {
    /// A leaf accepts items while it holds fewer than this many
    pub subdivide_threshold: usize,
    /// Siblings merge only if each holds at most this many items
    pub collapse_threshold: usize,
    /// Leaves with an edge at or below this size never subdivide
    pub min_node_size: f32,
    /// Extend the root rectangle to a square
    pub square_root: bool,
    /// Never let the root rectangle shrink
    pub never_shrink: bool,
    /// Query traversal strategy
    pub query_strategy: QueryStrategy,
}

impl Default for QuadTreeConfig {
    fn default() -> Self {
        Self {
            subdivide_threshold: 4,
            collapse_threshold: 4,
            min_node_size: 0.1,
            square_root: false,
            never_shrink: false,
            query_strategy: QueryStrategy::Sequential,
        }
    }
}

impl QuadTreeConfig {
    /// Check the configuration.
    ///
    /// # Errors
    ///
    /// Returns `Galaxy3dError::InvalidConfig` for zero thresholds or a negative,
    /// infinite or NaN minimum node size.
    pub fn validate(&self) -> Galaxy3dResult<()> {
        if self.subdivide_threshold == 0 {
            return Err(Galaxy3dError::InvalidConfig("subdivide_threshold must be at least 1".to_string()));
        }
        if self.collapse_threshold == 0 {
            return Err(Galaxy3dError::InvalidConfig("collapse_threshold must be at least 1".to_string()));
        }
        if !(self.min_node_size >= 0.0) || !self.min_node_size.is_finite() {
            return Err(Galaxy3dError::InvalidConfig(format!(
                "min_node_size must be finite and not negative, got {}",
                self.min_node_size
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "quad_tree_config_tests.rs"]
mod tests;
