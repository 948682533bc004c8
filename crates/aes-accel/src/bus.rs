//! Host-side view of the accelerator's register interface.

use crate::clock::SimClock;
use crate::controller::Controller;
use crate::error::RegisterError;

/// Word-wide register bus to an accelerator.
///
/// Each access completes with a one-tick handshake: the request is
/// acknowledged one tick after it is issued, and read data is sampled at
/// acknowledgement.
pub trait RegisterBus {
    /// Writes one register word.
    fn write_word(&mut self, offset: u32, value: u32) -> Result<(), RegisterError>;

    /// Reads one register word.
    fn read_word(&mut self, offset: u32) -> Result<u32, RegisterError>;

    /// Lets one tick pass without a bus access.
    fn idle(&mut self);

    /// Consumes a latched completion interrupt, returning whether one was pending.
    fn take_interrupt(&mut self) -> bool;
}

/// A [`RegisterBus`] wired to an in-process [`Controller`].
///
/// Every access ticks the controller exactly once. Interrupt pulses are latched
/// until [`RegisterBus::take_interrupt`] consumes them.
#[derive(Debug, Clone)]
pub struct SimBus {
    controller: Controller,
    clock: SimClock,
    irq_latched: bool,
}

impl SimBus {
    /// Wraps a controller with a fresh clock.
    pub fn new(controller: Controller) -> Self {
        Self::with_clock(controller, SimClock::new())
    }

    /// Wraps a controller, advancing `clock` on every tick.
    pub fn with_clock(controller: Controller, clock: SimClock) -> Self {
        Self {
            controller,
            clock,
            irq_latched: false,
        }
    }

    /// Handle to the clock this bus advances.
    pub fn clock(&self) -> SimClock {
        self.clock.clone()
    }

    /// The controller behind the bus.
    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    fn cycle(&mut self) {
        self.controller.tick();
        self.clock.advance();
        self.irq_latched |= self.controller.irq();
    }
}

impl Default for SimBus {
    fn default() -> Self {
        Self::new(Controller::new())
    }
}

impl RegisterBus for SimBus {
    fn write_word(&mut self, offset: u32, value: u32) -> Result<(), RegisterError> {
        self.controller.write(offset, value)?;
        self.cycle();
        Ok(())
    }

    fn read_word(&mut self, offset: u32) -> Result<u32, RegisterError> {
        self.cycle();
        self.controller.read(offset)
    }

    fn idle(&mut self) {
        self.cycle();
    }

    fn take_interrupt(&mut self) -> bool {
        std::mem::take(&mut self.irq_latched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::LATENCY_STEPS;
    use crate::regs::{CTRL_IRQ_ENABLE, CTRL_OFFSET, CTRL_START, STATUS_BUSY, STATUS_DONE};

    #[test]
    fn every_access_costs_one_tick() {
        let mut bus = SimBus::default();
        let clock = bus.clock();
        bus.write_word(0x00, 0xdead_beef).unwrap();
        assert_eq!(clock.now(), 1);
        bus.read_word(CTRL_OFFSET).unwrap();
        assert_eq!(clock.now(), 2);
        bus.idle();
        assert_eq!(clock.now(), 3);
        assert_eq!(bus.controller().steps(), 3);
    }

    #[test]
    fn start_is_accepted_at_acknowledgement() {
        let mut bus = SimBus::default();
        bus.write_word(CTRL_OFFSET, CTRL_START).unwrap();
        assert!(bus.controller().is_busy());

        let mut polls = 0;
        loop {
            polls += 1;
            let status = bus.read_word(CTRL_OFFSET).unwrap();
            if status & STATUS_DONE != 0 {
                assert_eq!(status & STATUS_BUSY, 0);
                break;
            }
        }
        assert_eq!(polls, LATENCY_STEPS);
    }

    #[test]
    fn interrupt_is_latched_until_taken() {
        let mut bus = SimBus::default();
        bus.write_word(CTRL_OFFSET, CTRL_START | CTRL_IRQ_ENABLE)
            .unwrap();
        for _ in 0..LATENCY_STEPS + 3 {
            bus.idle();
        }
        assert!(bus.take_interrupt());
        assert!(!bus.take_interrupt());
    }

    #[test]
    fn rejected_write_does_not_tick() {
        let mut bus = SimBus::default();
        assert!(bus.write_word(0x20, 1).is_err());
        assert_eq!(bus.clock().now(), 0);
    }
}
