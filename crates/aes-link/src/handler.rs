//! The host protocol loop: frames in, accelerator transaction, frames out.

use std::io::{BufReader, Read, Write};

use aes_accel::RegisterBus;
use log::{debug, info};

use crate::config::{CompletionMode, HandlerConfig};
use crate::counter::{elapsed, CycleCounter};
use crate::device::AesDevice;
use crate::error::{LinkError, Result};
use crate::frame::{FrameAssembler, RequestFrame, ResponseFrame};

/// Running totals for one handler.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HandlerStats {
    /// Frames answered.
    pub frames: u64,
    /// Resynchronizations performed.
    pub resyncs: u64,
    /// Bytes dropped while resynchronizing.
    pub discarded_bytes: u64,
}

/// Drives one accelerator from an inbound byte stream.
///
/// Frames are handled strictly one at a time: a request is fully processed,
/// including waiting for completion, before the next byte is consumed.
pub struct ProtocolHandler<B, C> {
    device: AesDevice<B>,
    counter: C,
    assembler: FrameAssembler,
    config: HandlerConfig,
    frames: u64,
}

impl<B: RegisterBus, C: CycleCounter> ProtocolHandler<B, C> {
    /// Brings up the handler, enabling the completion interrupt when configured.
    pub fn new(bus: B, counter: C, config: HandlerConfig) -> Result<Self> {
        let mut device = AesDevice::new(bus);
        if config.completion == CompletionMode::Interrupt {
            device.set_irq_enable(true)?;
        }
        Ok(Self {
            device,
            counter,
            assembler: FrameAssembler::new(),
            config,
            frames: 0,
        })
    }

    /// Consumes one inbound byte, returning a response when it completed a frame.
    pub fn feed(&mut self, byte: u8) -> Result<Option<ResponseFrame>> {
        match self.assembler.push(byte) {
            Some(request) => self.process(&request).map(Some),
            None => Ok(None),
        }
    }

    /// Runs one request through the accelerator and times it.
    pub fn process(&mut self, request: &RequestFrame) -> Result<ResponseFrame> {
        self.device.write_key(&request.key)?;
        self.device.write_plaintext(&request.plaintext)?;
        self.wait_while_busy()?;

        // Drop a notification left over from an operation we did not start.
        self.device.bus_mut().take_interrupt();

        let start = self.counter.read();
        self.device.start()?;
        self.wait_for_completion()?;
        let end = self.counter.read();
        let cycles = elapsed(start, end);

        let ciphertext = self.device.read_ciphertext()?;
        self.device.clear_done()?;

        self.frames += 1;
        debug!("frame {}: {} cycles", self.frames, cycles);
        Ok(ResponseFrame { ciphertext, cycles })
    }

    /// Serves frames from `input` until it ends, writing each response to `output`.
    pub fn run<R: Read, W: Write>(&mut self, input: R, mut output: W) -> Result<()> {
        if self.config.banner {
            self.write_banner(&mut output)?;
        }
        for byte in BufReader::new(input).bytes() {
            if let Some(response) = self.feed(byte?)? {
                output.write_all(&response.encode())?;
                output.flush()?;
            }
        }
        let stats = self.stats();
        info!(
            "input closed after {} frames ({} resyncs, {} bytes discarded)",
            stats.frames, stats.resyncs, stats.discarded_bytes
        );
        Ok(())
    }

    /// Writes the startup banner describing the protocol.
    pub fn write_banner<W: Write>(&self, output: &mut W) -> Result<()> {
        write!(
            output,
            "AES-128 Hardware Accelerator Ready\r\n\
             Protocol: Send 34 bytes = [16B key] + [16B plaintext] + [0xFFFF]\r\n\
             Response: 20 bytes = [16B ciphertext] + [4B cycles]\r\n\
             Mode: {}\r\n",
            self.config.completion
        )?;
        output.flush()?;
        Ok(())
    }

    /// Totals so far.
    pub fn stats(&self) -> HandlerStats {
        HandlerStats {
            frames: self.frames,
            resyncs: self.assembler.resyncs(),
            discarded_bytes: self.assembler.discarded(),
        }
    }

    /// The driver, for inspecting the bus.
    pub fn device(&self) -> &AesDevice<B> {
        &self.device
    }

    fn wait_while_busy(&mut self) -> Result<()> {
        let mut waited = 0;
        while self.device.is_busy()? {
            waited += 1;
            self.check_budget(waited)?;
        }
        Ok(())
    }

    fn wait_for_completion(&mut self) -> Result<()> {
        let mut waited = 0;
        match self.config.completion {
            CompletionMode::Polled => {
                while !self.device.is_done()? {
                    waited += 1;
                    self.check_budget(waited)?;
                }
            }
            CompletionMode::Interrupt => {
                let bus = self.device.bus_mut();
                while !bus.take_interrupt() {
                    bus.idle();
                    waited += 1;
                    if let Some(budget) = self.config.wait_budget.filter(|&b| waited > b) {
                        return Err(LinkError::CompletionTimeout(budget));
                    }
                }
            }
        }
        Ok(())
    }

    fn check_budget(&self, waited: u64) -> Result<()> {
        match self.config.wait_budget {
            Some(budget) if waited > budget => Err(LinkError::CompletionTimeout(budget)),
            _ => Ok(()),
        }
    }
}
