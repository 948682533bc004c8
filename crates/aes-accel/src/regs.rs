//! Register map of the accelerator.
//!
//! | Offset      | Access | Meaning                                  |
//! |-------------|--------|------------------------------------------|
//! | 0x00..=0x0C | W      | key words 0..3 (big-endian)              |
//! | 0x10..=0x1C | W      | plaintext words 0..3 (big-endian)        |
//! | 0x20..=0x2C | R      | ciphertext words 0..3 (big-endian)       |
//! | 0x30        | R/W    | control (write) / status (read)          |

use core::fmt;

use crate::error::RegisterError;

/// Offset of key word 0.
pub const KEY_OFFSET: u32 = 0x00;
/// Offset of plaintext word 0.
pub const PLAINTEXT_OFFSET: u32 = 0x10;
/// Offset of ciphertext word 0.
pub const CIPHERTEXT_OFFSET: u32 = 0x20;
/// Offset of the control/status register.
pub const CTRL_OFFSET: u32 = 0x30;

/// Control bit: start an encryption.
pub const CTRL_START: u32 = 0x01;
/// Control bit: clear the completion flag.
pub const CTRL_CLEAR_DONE: u32 = 0x02;
/// Control bit: enable the completion interrupt.
pub const CTRL_IRQ_ENABLE: u32 = 0x04;

/// Status bit: an operation is in flight.
pub const STATUS_BUSY: u32 = 0x01;
/// Status bit: an operation completed and the flag has not been cleared.
pub const STATUS_DONE: u32 = 0x02;
/// Status bit: the completion interrupt is enabled.
pub const STATUS_IRQ_ENABLE: u32 = 0x04;

/// A decoded register address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Register {
    /// Key word `n` (0..4), write-only.
    Key(usize),
    /// Plaintext word `n` (0..4), write-only.
    Plaintext(usize),
    /// Ciphertext word `n` (0..4), read-only.
    Ciphertext(usize),
    /// Control on write, status on read.
    Control,
}

impl Register {
    /// Decodes a byte offset into a register.
    pub fn decode(offset: u32) -> Result<Self, RegisterError> {
        if offset % 4 != 0 {
            return Err(RegisterError::Unaligned(offset));
        }
        let word = ((offset & 0x0f) / 4) as usize;
        match offset & !0x0f {
            KEY_OFFSET => Ok(Register::Key(word)),
            PLAINTEXT_OFFSET => Ok(Register::Plaintext(word)),
            CIPHERTEXT_OFFSET => Ok(Register::Ciphertext(word)),
            CTRL_OFFSET if offset == CTRL_OFFSET => Ok(Register::Control),
            _ => Err(RegisterError::Unmapped(offset)),
        }
    }

    /// Byte offset of the register.
    pub fn offset(self) -> u32 {
        match self {
            Register::Key(n) => KEY_OFFSET + 4 * n as u32,
            Register::Plaintext(n) => PLAINTEXT_OFFSET + 4 * n as u32,
            Register::Ciphertext(n) => CIPHERTEXT_OFFSET + 4 * n as u32,
            Register::Control => CTRL_OFFSET,
        }
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Register::Key(n) => write!(f, "KEY{n}"),
            Register::Plaintext(n) => write!(f, "PT{n}"),
            Register::Ciphertext(n) => write!(f, "CT{n}"),
            Register::Control => f.write_str("CTRL"),
        }
    }
}

/// A decoded control-register write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ControlWrite {
    /// Request a start.
    pub start: bool,
    /// Clear the completion flag.
    pub clear_done: bool,
    /// New value of the interrupt-enable field.
    pub irq_enable: bool,
}

impl From<u32> for ControlWrite {
    fn from(value: u32) -> Self {
        Self {
            start: value & CTRL_START != 0,
            clear_done: value & CTRL_CLEAR_DONE != 0,
            irq_enable: value & CTRL_IRQ_ENABLE != 0,
        }
    }
}

/// Host-visible register storage.
#[derive(Debug, Clone, Default)]
pub(crate) struct RegisterFile {
    pub key: [u32; 4],
    pub plaintext: [u32; 4],
    pub ciphertext: [u32; 4],
}
