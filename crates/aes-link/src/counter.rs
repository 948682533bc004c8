//! Cycle counters used to time an operation.

use aes_accel::SimClock;

/// A free-running hardware counter.
pub trait CycleCounter {
    /// Current counter value.
    fn read(&mut self) -> u32;
}

impl<F: FnMut() -> u32> CycleCounter for F {
    fn read(&mut self) -> u32 {
        self()
    }
}

/// Down-counter over a [`SimClock`], reloading at `0xFFFF_FFFF` like a
/// free-running timer with auto-reload.
#[derive(Debug, Clone)]
pub struct DownCounter {
    clock: SimClock,
}

impl DownCounter {
    /// Counts down from `0xFFFF_FFFF` as `clock` advances.
    pub fn new(clock: SimClock) -> Self {
        Self { clock }
    }
}

impl CycleCounter for DownCounter {
    fn read(&mut self) -> u32 {
        // Truncation is the reload: the counter period is 2^32 ticks.
        u32::MAX.wrapping_sub(self.clock.now() as u32)
    }
}

/// Ticks between two readings of a down-counter, across one reload.
#[inline]
pub fn elapsed(start: u32, end: u32) -> u32 {
    start.wrapping_sub(end)
}
