//! Two fixed slots whose read/write roles swap once per step.
//!
//! Used for both the software texel buffers and the GPU state textures, so
//! the "which one is current" bookkeeping lives in exactly one place.

/// A pair of equally shaped resources plus a flag naming the current one.
#[derive(Debug, Clone)]
pub struct PingPong<T> {
    slots: [T; 2],
    /// Which slot holds the most recent output (false = A, true = B)
    current_is_b: bool,
}

impl<T> PingPong<T> {
    /// Create a pair where `a` is current and `b` is the next write target.
    pub fn new(a: T, b: T) -> Self {
        Self {
            slots: [a, b],
            current_is_b: false,
        }
    }

    /// Most recently written slot.
    pub fn current(&self) -> &T {
        &self.slots[self.current_index()]
    }

    /// Slot the next step writes into.
    pub fn target(&self) -> &T {
        &self.slots[1 - self.current_index()]
    }

    /// Index (0 = A, 1 = B) of the current slot.
    pub fn current_index(&self) -> usize {
        self.current_is_b as usize
    }

    /// Borrow the current slot for reading and the target slot for writing.
    pub fn split_mut(&mut self) -> (&T, &mut T) {
        let [a, b] = &mut self.slots;
        if self.current_is_b {
            (b, a)
        } else {
            (a, b)
        }
    }

    /// Make the target slot current. Call exactly once after each write.
    pub fn swap(&mut self) {
        self.current_is_b = !self.current_is_b;
    }
}
