//! Key types for AES-128.

use crate::block::Block;

/// AES-128 key wrapper.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Aes128Key(pub [u8; 16]);

impl From<[u8; 16]> for Aes128Key {
    fn from(value: [u8; 16]) -> Self {
        Self(value)
    }
}

impl Aes128Key {
    /// Returns the key bytes, which double as round key 0.
    #[inline]
    pub fn as_block(&self) -> &Block {
        &self.0
    }
}

/// Number of round keys in an AES-128 schedule.
pub const ROUND_KEY_COUNT: usize = 11;

/// Expanded round keys for AES-128 (the key schedule).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RoundKeys(pub [Block; ROUND_KEY_COUNT]);

impl RoundKeys {
    /// Returns the round key at the requested index (0..=10).
    #[inline]
    pub fn get(&self, round: usize) -> &Block {
        &self.0[round]
    }
}
