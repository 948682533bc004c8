//! Host side of the AES-128 accelerator link.
//!
//! A [`ProtocolHandler`] reads 34-byte request frames off a byte stream,
//! drives the accelerator through an [`AesDevice`], and answers each frame
//! with the ciphertext and the number of counter ticks the operation took.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod config;
mod counter;
mod device;
mod error;
mod frame;
mod handler;

pub use config::{CompletionMode, HandlerConfig, LinkConfig, Parity, SerialSettings};
pub use counter::{elapsed, CycleCounter, DownCounter};
pub use device::AesDevice;
pub use error::{LinkError, Result};
pub use frame::{
    FrameAssembler, RequestFrame, ResponseFrame, BLOCK_LEN, KEY_LEN, MARKER, REQUEST_FRAME_LEN,
    RESPONSE_FRAME_LEN,
};
pub use handler::{HandlerStats, ProtocolHandler};
