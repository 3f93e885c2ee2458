/// InstanceBuffer: externally owned per-instance data read by shapes.
///
/// The animation/render side owns model transforms and model offsets and
/// writes them every tick. Shapes hold an `Arc` to the buffer plus an
/// instance index and only ever read. Every write bumps a stamp so that a
/// shape can detect motion by comparing a single integer.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{PoisonError, RwLock};
use glam::{Mat4, Vec3};
use crate::error::{Galaxy3dError, Galaxy3dResult};

/// Per-instance model matrices
pub type TransformBuffer = InstanceBuffer<Mat4>;

/// Per-instance model offsets (added to the translation)
pub type OffsetBuffer = InstanceBuffer<Vec3>;

/// Shared, stamped array of per-instance values.
#[derive(Debug)]
pub struct InstanceBuffer<T> {
    values: RwLock<Vec<T>>,
    stamp: AtomicU32,
}

impl<T: Copy> InstanceBuffer<T> {
    /// Create a buffer with one value per instance.
    pub fn new(values: Vec<T>) -> Self {
        Self {
            values: RwLock::new(values),
            stamp: AtomicU32::new(1),
        }
    }

    /// Create a single-instance buffer.
    pub fn single(value: T) -> Self {
        Self::new(vec![value])
    }

    /// Value of one instance, `None` if the index is past the end.
    pub fn get(&self, index: usize) -> Option<T> {
        let values = self.values.read().unwrap_or_else(PoisonError::into_inner);
        values.get(index).copied()
    }

    /// Overwrite one instance and bump the stamp.
    ///
    /// # Errors
    ///
    /// Returns `Galaxy3dError::IndexOutOfRange` if `index` is past the end.
    pub fn set(&self, index: usize, value: T) -> Galaxy3dResult<()> {
        let mut values = self.values.write().unwrap_or_else(PoisonError::into_inner);
        let len = values.len();
        let slot = values.get_mut(index).ok_or(Galaxy3dError::IndexOutOfRange { index, len })?;
        *slot = value;
        self.stamp.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }

    /// Replace all instances and bump the stamp.
    pub fn set_all(&self, new_values: Vec<T>) {
        let mut values = self.values.write().unwrap_or_else(PoisonError::into_inner);
        *values = new_values;
        self.stamp.fetch_add(1, Ordering::AcqRel);
    }

    /// Current stamp. Changes on every write.
    pub fn stamp(&self) -> u32 {
        self.stamp.load(Ordering::Acquire)
    }

    /// Number of instances stored.
    pub fn num_instances(&self) -> usize {
        self.values.read().unwrap_or_else(PoisonError::into_inner).len()
    }
}

#[cfg(test)]
#[path = "instance_buffer_tests.rs"]
mod tests;
