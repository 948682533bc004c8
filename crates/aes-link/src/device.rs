//! Register-level driver for the accelerator.

use aes_accel::regs::{
    CIPHERTEXT_OFFSET, CTRL_CLEAR_DONE, CTRL_IRQ_ENABLE, CTRL_OFFSET, CTRL_START, KEY_OFFSET,
    PLAINTEXT_OFFSET, STATUS_BUSY, STATUS_DONE,
};
use aes_accel::{RegisterBus, RegisterError};
use aes_core::{block_to_words, words_to_block, Block};

/// Thin driver over a [`RegisterBus`]: blocks go out as four big-endian words.
///
/// The interrupt-enable field is rewritten by every control write, so the
/// driver remembers it and ORs it into each one.
#[derive(Debug)]
pub struct AesDevice<B> {
    bus: B,
    irq_enable: bool,
}

impl<B: RegisterBus> AesDevice<B> {
    /// Wraps a bus with the interrupt disabled.
    pub fn new(bus: B) -> Self {
        Self {
            bus,
            irq_enable: false,
        }
    }

    /// Loads the key registers.
    pub fn write_key(&mut self, key: &Block) -> Result<(), RegisterError> {
        self.write_block(KEY_OFFSET, key)
    }

    /// Loads the plaintext registers.
    pub fn write_plaintext(&mut self, plaintext: &Block) -> Result<(), RegisterError> {
        self.write_block(PLAINTEXT_OFFSET, plaintext)
    }

    /// Reads the four ciphertext words.
    pub fn read_ciphertext(&mut self) -> Result<Block, RegisterError> {
        let mut words = [0u32; 4];
        for (i, word) in words.iter_mut().enumerate() {
            *word = self.bus.read_word(CIPHERTEXT_OFFSET + 4 * i as u32)?;
        }
        Ok(words_to_block(&words))
    }

    /// Requests a start; ignored by the accelerator while busy.
    pub fn start(&mut self) -> Result<(), RegisterError> {
        self.control(CTRL_START)
    }

    /// Clears the completion flag.
    pub fn clear_done(&mut self) -> Result<(), RegisterError> {
        self.control(CTRL_CLEAR_DONE)
    }

    /// Enables or disables the completion interrupt.
    pub fn set_irq_enable(&mut self, enable: bool) -> Result<(), RegisterError> {
        self.irq_enable = enable;
        self.control(0)
    }

    /// Raw status register.
    pub fn status(&mut self) -> Result<u32, RegisterError> {
        self.bus.read_word(CTRL_OFFSET)
    }

    /// Whether an operation is in flight.
    pub fn is_busy(&mut self) -> Result<bool, RegisterError> {
        Ok(self.status()? & STATUS_BUSY != 0)
    }

    /// Whether the completion flag is set.
    pub fn is_done(&mut self) -> Result<bool, RegisterError> {
        Ok(self.status()? & STATUS_DONE != 0)
    }

    /// The underlying bus.
    pub fn bus(&self) -> &B {
        &self.bus
    }

    /// Mutable access to the underlying bus.
    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    fn control(&mut self, bits: u32) -> Result<(), RegisterError> {
        let irq = if self.irq_enable { CTRL_IRQ_ENABLE } else { 0 };
        self.bus.write_word(CTRL_OFFSET, bits | irq)
    }

    fn write_block(&mut self, base: u32, block: &Block) -> Result<(), RegisterError> {
        for (i, word) in block_to_words(block).into_iter().enumerate() {
            self.bus.write_word(base + 4 * i as u32, word)?;
        }
        Ok(())
    }
}
