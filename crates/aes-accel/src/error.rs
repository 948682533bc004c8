//! Register access errors.

use thiserror::Error;

use crate::regs::Register;

/// Failure of a single register access on the accelerator bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RegisterError {
    /// The offset is not a multiple of four.
    #[error("unaligned register offset {0:#04x}")]
    Unaligned(u32),
    /// The offset lies outside the register map.
    #[error("no register at offset {0:#04x}")]
    Unmapped(u32),
    /// A write targeted a read-only register.
    #[error("register {0} is read-only")]
    ReadOnly(Register),
    /// A read targeted a write-only register.
    #[error("register {0} is write-only")]
    WriteOnly(Register),
}
