//! Error types for the Galaxy3D spatial index
//!
//! Errors only surface at configuration edges (tree configuration, shape
//! parameters, per-instance buffer writes). Mutation and query entry points
//! of the index log misuse instead of failing.

use std::fmt;

/// Result type for Galaxy3D spatial operations
pub type Galaxy3dResult<T> = Result<T, Galaxy3dError>;

/// Galaxy3D spatial errors
#[derive(Debug, Clone, PartialEq)]
pub enum Galaxy3dError {
    /// A tree configuration value is out of its valid range
    InvalidConfig(String),

    /// Shape parameters do not describe a valid volume
    InvalidShape(String),

    /// Per-instance buffer access past the end of the buffer
    IndexOutOfRange {
        /// Requested instance index
        index: usize,
        /// Number of instances in the buffer
        len: usize,
    },
}

impl fmt::Display for Galaxy3dError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Galaxy3dError::InvalidConfig(msg) => write!(f, "Invalid configuration: {}", msg),
            Galaxy3dError::InvalidShape(msg) => write!(f, "Invalid shape: {}", msg),
            Galaxy3dError::IndexOutOfRange { index, len } => {
                write!(f, "Instance index {} out of range (len {})", index, len)
            }
        }
    }
}

impl std::error::Error for Galaxy3dError {}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
