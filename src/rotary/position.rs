//! position.rs — signed detent counter shared by the handlers and readers

use portable_atomic::{AtomicI32, Ordering};

/// Net count of channel-A edges since the last reset.
///
/// Every operation is a single atomic word access, so it is safe from
/// interrupt context and never blocks. Ordering is relaxed: a reader racing
/// an update sees either the old or the new value. Arithmetic wraps at the
/// ends of the `i32` range.
#[derive(Debug)]
pub struct Position(AtomicI32);

impl Position {
    pub const fn new() -> Self {
        Self(AtomicI32::new(0))
    }

    /// Add one; returns the new value.
    pub fn increment(&self) -> i32 {
        self.0.fetch_add(1, Ordering::Relaxed).wrapping_add(1)
    }

    /// Subtract one; returns the new value.
    pub fn decrement(&self) -> i32 {
        self.0.fetch_sub(1, Ordering::Relaxed).wrapping_sub(1)
    }

    pub fn reset(&self) {
        self.0.store(0, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> i32 {
        self.0.load(Ordering::Relaxed)
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::new()
    }
}
