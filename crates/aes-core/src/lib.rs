//! AES-128 cipher primitives shared by the accelerator model and the host tooling.
//!
//! This crate mirrors the FIPS-197 specification and provides:
//! - The S-box, round transformations and GF(2^8) column mixing.
//! - The AES-128 key schedule, both whole and one round key at a time.
//! - A reference single-block encryption used as an oracle.
//!
//! The implementation aims for clarity and testability rather than constant-time
//! guarantees; it should not be treated as side-channel hardened.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod block;
mod cipher;
mod key;
mod round;
mod sbox;

pub use crate::block::{block_to_words, column, words_to_block, xor_in_place, Block, Word};
pub use crate::cipher::{encrypt_block, expand_key, next_round_key, rot_word, sub_word};
pub use crate::key::{Aes128Key, RoundKeys, ROUND_KEY_COUNT};
pub use crate::round::{
    add_round_key, cipher_round, mix_column, mix_columns, shift_rows, sub_bytes, xtime,
};
pub use crate::sbox::sbox;
