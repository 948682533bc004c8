//! Cycle-stepped model of a register-mapped AES-128 accelerator.
//!
//! The [`Controller`] owns a small register file (key, plaintext, ciphertext,
//! control/status) and walks a fixed schedule of seventeen steps per
//! encryption: five key-expansion steps of two round keys each, the initial
//! round, nine middle rounds, the final round and an output latch. Time only
//! moves when [`Controller::tick`] is called, so tests and simulations can drive
//! it one step at a time.
//!
//! [`SimBus`] puts the controller behind the [`RegisterBus`] trait with a
//! one-tick handshake per access, which is the seam host-side drivers use.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod bus;
mod clock;
mod controller;
mod error;
pub mod regs;
mod state;

pub use crate::bus::{RegisterBus, SimBus};
pub use crate::clock::SimClock;
pub use crate::controller::{Controller, LATENCY_STEPS};
pub use crate::error::RegisterError;
pub use crate::regs::Register;
pub use crate::state::ControllerState;
