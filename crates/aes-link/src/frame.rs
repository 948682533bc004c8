//! Wire frames and the inbound frame assembler.
//!
//! Inbound: `key[16] ‖ plaintext[16] ‖ 0xFF 0xFF` (34 bytes).
//! Outbound: `ciphertext[16] ‖ elapsed cycles as u32 little-endian` (20 bytes).

use aes_core::Block;
use log::warn;

use crate::error::{LinkError, Result};

/// Two-byte frame terminator.
pub const MARKER: [u8; 2] = [0xff, 0xff];
/// Length of the key field.
pub const KEY_LEN: usize = 16;
/// Length of the plaintext and ciphertext fields.
pub const BLOCK_LEN: usize = 16;
/// Length of a request frame.
pub const REQUEST_FRAME_LEN: usize = KEY_LEN + BLOCK_LEN + MARKER.len();
/// Length of a response frame.
pub const RESPONSE_FRAME_LEN: usize = BLOCK_LEN + 4;

const MARKER_AT: usize = KEY_LEN + BLOCK_LEN;

/// One encryption request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestFrame {
    /// AES-128 key.
    pub key: Block,
    /// Block to encrypt.
    pub plaintext: Block,
}

impl RequestFrame {
    /// Builds a request from its two fields.
    pub fn new(key: Block, plaintext: Block) -> Self {
        Self { key, plaintext }
    }

    /// Serializes the frame, marker included.
    pub fn encode(&self) -> [u8; REQUEST_FRAME_LEN] {
        let mut out = [0u8; REQUEST_FRAME_LEN];
        out[..KEY_LEN].copy_from_slice(&self.key);
        out[KEY_LEN..MARKER_AT].copy_from_slice(&self.plaintext);
        out[MARKER_AT..].copy_from_slice(&MARKER);
        out
    }

    /// Parses a full buffer, returning `None` when the marker is not at the end.
    pub fn parse(bytes: &[u8; REQUEST_FRAME_LEN]) -> Option<Self> {
        if bytes[MARKER_AT..] != MARKER {
            return None;
        }
        let mut key = [0u8; KEY_LEN];
        let mut plaintext = [0u8; BLOCK_LEN];
        key.copy_from_slice(&bytes[..KEY_LEN]);
        plaintext.copy_from_slice(&bytes[KEY_LEN..MARKER_AT]);
        Some(Self { key, plaintext })
    }
}

/// One encryption result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseFrame {
    /// Encrypted block.
    pub ciphertext: Block,
    /// Counter ticks between triggering the start and observing completion.
    pub cycles: u32,
}

impl ResponseFrame {
    /// Serializes the frame with the cycle count little-endian.
    pub fn encode(&self) -> [u8; RESPONSE_FRAME_LEN] {
        let mut out = [0u8; RESPONSE_FRAME_LEN];
        out[..BLOCK_LEN].copy_from_slice(&self.ciphertext);
        out[BLOCK_LEN..].copy_from_slice(&self.cycles.to_le_bytes());
        out
    }

    /// Parses exactly [`RESPONSE_FRAME_LEN`] bytes.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != RESPONSE_FRAME_LEN {
            return Err(LinkError::FrameLength {
                expected: RESPONSE_FRAME_LEN,
                got: bytes.len(),
            });
        }
        let mut ciphertext = [0u8; BLOCK_LEN];
        ciphertext.copy_from_slice(&bytes[..BLOCK_LEN]);
        let mut cycles = [0u8; 4];
        cycles.copy_from_slice(&bytes[BLOCK_LEN..]);
        Ok(Self {
            ciphertext,
            cycles: u32::from_le_bytes(cycles),
        })
    }
}

/// Accumulates inbound bytes into request frames.
///
/// When the buffer fills without a trailing marker, it resynchronizes: if a
/// marker appears anywhere in the buffer, everything up to and including the
/// first one is dropped and the rest becomes the start of the next frame;
/// otherwise only the last byte is kept, in case it begins a marker.
#[derive(Debug, Clone)]
pub struct FrameAssembler {
    buf: [u8; REQUEST_FRAME_LEN],
    len: usize,
    resyncs: u64,
    discarded: u64,
}

impl Default for FrameAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameAssembler {
    /// An empty assembler.
    pub fn new() -> Self {
        Self {
            buf: [0u8; REQUEST_FRAME_LEN],
            len: 0,
            resyncs: 0,
            discarded: 0,
        }
    }

    /// Appends one byte, returning a frame once a well-formed one is complete.
    pub fn push(&mut self, byte: u8) -> Option<RequestFrame> {
        self.buf[self.len] = byte;
        self.len += 1;
        if self.len < REQUEST_FRAME_LEN {
            return None;
        }

        match RequestFrame::parse(&self.buf) {
            Some(frame) => {
                self.len = 0;
                Some(frame)
            }
            None => {
                self.resync();
                None
            }
        }
    }

    fn resync(&mut self) {
        let drop = match find_marker(&self.buf[..self.len]) {
            Some(pos) => pos + MARKER.len(),
            None => self.len - 1,
        };
        self.buf.copy_within(drop..self.len, 0);
        self.len -= drop;
        self.resyncs += 1;
        self.discarded += drop as u64;
        warn!(
            "frame marker missing, dropped {drop} bytes ({} kept)",
            self.len
        );
    }

    /// Bytes waiting for the rest of their frame.
    pub fn buffered(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    /// Times the buffer filled without a trailing marker.
    pub fn resyncs(&self) -> u64 {
        self.resyncs
    }

    /// Total bytes dropped while resynchronizing.
    pub fn discarded(&self) -> u64 {
        self.discarded
    }
}

fn find_marker(bytes: &[u8]) -> Option<usize> {
    bytes.windows(MARKER.len()).position(|pair| pair == MARKER)
}
