//! Shared tick source for simulated hardware.

use std::cell::Cell;
use std::rc::Rc;

/// Monotonic tick count shared between the simulated bus, which advances it,
/// and any timers that read it.
///
/// Clones observe the same count.
#[derive(Debug, Clone, Default)]
pub struct SimClock {
    ticks: Rc<Cell<u64>>,
}

impl SimClock {
    /// Creates a clock at tick zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ticks elapsed so far.
    #[inline]
    pub fn now(&self) -> u64 {
        self.ticks.get()
    }

    pub(crate) fn advance(&self) {
        self.ticks.set(self.ticks.get() + 1);
    }
}
