//! AES-128 key schedule and block encryption.

use crate::block::{block_to_words, words_to_block, Block, Word};
use crate::key::{Aes128Key, RoundKeys, ROUND_KEY_COUNT};
use crate::round::{add_round_key, cipher_round};
use crate::sbox::sbox;

/// Round constants; `RCON[i - 1]` is used while deriving round key `i`.
const RCON: [u8; 10] = [0x01, 0x02, 0x04, 0x08, 0x10, 0x20, 0x40, 0x80, 0x1b, 0x36];

/// Rotates a word left by one byte: `[a0, a1, a2, a3] -> [a1, a2, a3, a0]`.
#[inline]
pub fn rot_word(word: Word) -> Word {
    word.rotate_left(8)
}

/// Applies the S-box to each byte of a word.
#[inline]
pub fn sub_word(word: Word) -> Word {
    Word::from_be_bytes(word.to_be_bytes().map(sbox))
}

#[inline]
fn rcon_word(round: usize) -> Word {
    Word::from(RCON[round - 1]) << 24
}

/// Derives round key `round` (1..=10) from round key `round - 1`.
///
/// This is four consecutive steps of the word recurrence, the first of which
/// applies `RotWord`, `SubWord` and the round constant.
///
/// # Panics
///
/// Panics if `round` is not in `1..=10`.
pub fn next_round_key(prev: &Block, round: usize) -> Block {
    assert!(
        (1..ROUND_KEY_COUNT).contains(&round),
        "round key index {round} out of range 1..=10"
    );
    let w = block_to_words(prev);
    let mut next = [0 as Word; 4];
    next[0] = w[0] ^ sub_word(rot_word(w[3])) ^ rcon_word(round);
    for i in 1..4 {
        next[i] = w[i] ^ next[i - 1];
    }
    words_to_block(&next)
}

/// Expands a 128-bit key into 11 round keys.
pub fn expand_key(key: &Aes128Key) -> RoundKeys {
    let mut w = [0 as Word; 4 * ROUND_KEY_COUNT];
    w[..4].copy_from_slice(&block_to_words(key.as_block()));

    for i in 4..w.len() {
        let mut temp = w[i - 1];
        if i % 4 == 0 {
            temp = sub_word(rot_word(temp)) ^ rcon_word(i / 4);
        }
        w[i] = w[i - 4] ^ temp;
    }

    let mut round_keys = [[0u8; 16]; ROUND_KEY_COUNT];
    for (round, words) in w.chunks_exact(4).enumerate() {
        let words: [Word; 4] = [words[0], words[1], words[2], words[3]];
        round_keys[round] = words_to_block(&words);
    }

    RoundKeys(round_keys)
}

/// Encrypts a single 16-byte block with pre-expanded round keys.
pub fn encrypt_block(block: &Block, round_keys: &RoundKeys) -> Block {
    let mut state = add_round_key(*block, round_keys.get(0));

    for round in 1..10 {
        state = cipher_round(state, round_keys.get(round), false);
    }

    cipher_round(state, round_keys.get(10), true)
}
