/// Pooled arena addressed by stable `u32` indices.
///
/// Slots are never dropped individually: a released slot goes back to a
/// free list and is reset when it is handed out again. Access through a
/// released index returns `None`, so a stale index can never observe a
/// reused slot's new contents without the caller noticing.
///
/// # Example
///
/// ```ignore
/// let mut pool = NodePool::<Node>::new();
/// let a = pool.acquire();  // 0
/// let b = pool.acquire();  // 1
/// pool.release(a);         // 0 is now pooled
/// let c = pool.acquire();  // 0 (reset, recycled)
/// ```
pub struct NodePool<T> {
    slots: Vec<T>,
    live: Vec<bool>,
    free_list: Vec<u32>,
    len: u32,
}

/// Values that can be recycled by a [`NodePool`].
pub trait Poolable: Default {
    /// Return the value to its freshly constructed state, keeping allocations.
    fn reset(&mut self);
}

impl<T: Poolable> NodePool<T> {
    /// Create a new empty pool
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            live: Vec::new(),
            free_list: Vec::new(),
            len: 0,
        }
    }

    /// Hand out a reset slot, recycling a released one if available.
    pub fn acquire(&mut self) -> u32 {
        self.len += 1;
        match self.free_list.pop() {
            Some(id) => {
                self.slots[id as usize].reset();
                self.live[id as usize] = true;
                id
            }
            None => {
                self.slots.push(T::default());
                self.live.push(true);
                (self.slots.len() - 1) as u32
            }
        }
    }

    /// Return a slot to the pool. Returns false if it was not live.
    pub fn release(&mut self, id: u32) -> bool {
        match self.live.get_mut(id as usize) {
            Some(live) if *live => {
                *live = false;
                self.len -= 1;
                self.free_list.push(id);
                true
            }
            _ => false,
        }
    }

    /// Release every live slot.
    pub fn release_all(&mut self) {
        for id in 0..self.slots.len() as u32 {
            self.release(id);
        }
    }

    /// Live slot by index
    pub fn get(&self, id: u32) -> Option<&T> {
        if self.is_live(id) { self.slots.get(id as usize) } else { None }
    }

    /// Live slot by index (mutable)
    pub fn get_mut(&mut self, id: u32) -> Option<&mut T> {
        if self.is_live(id) { self.slots.get_mut(id as usize) } else { None }
    }

    /// Whether `id` refers to a live slot
    pub fn is_live(&self, id: u32) -> bool {
        self.live.get(id as usize).copied().unwrap_or(false)
    }

    /// Number of live slots
    pub fn len(&self) -> u32 {
        self.len
    }

    /// Whether no slots are live
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of released slots waiting for reuse
    pub fn pooled(&self) -> usize {
        self.free_list.len()
    }

    /// Highest index ever handed out + 1.
    pub fn high_water_mark(&self) -> u32 {
        self.slots.len() as u32
    }
}

impl<T: Poolable> Default for NodePool<T> {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "node_pool_tests.rs"]
mod tests;
