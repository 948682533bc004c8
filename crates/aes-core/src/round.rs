//! AES round transformations.
//!
//! Every transformation takes the state by value and returns the new state.

use crate::block::{column, xor_in_place, Block, Word};
use crate::sbox::sbox;

/// Source index for each output byte of ShiftRows.
///
/// Row `r` of column `c` lives at `4c + r`; after the shift it holds the byte
/// from column `(c + r) mod 4` of the same row.
const SHIFT_ROWS: [usize; 16] = [0, 5, 10, 15, 4, 9, 14, 3, 8, 13, 2, 7, 12, 1, 6, 11];

/// Applies SubBytes: the S-box on every byte of the state.
#[inline]
pub fn sub_bytes(state: Block) -> Block {
    state.map(sbox)
}

/// Performs ShiftRows: row `r` rotates left by `r` positions.
#[inline]
pub fn shift_rows(state: Block) -> Block {
    std::array::from_fn(|i| state[SHIFT_ROWS[i]])
}

/// Multiplies by `x` (i.e. 2) in GF(2^8) modulo `x^8 + x^4 + x^3 + x + 1`.
#[inline]
pub fn xtime(byte: u8) -> u8 {
    let shifted = byte << 1;
    if byte & 0x80 != 0 {
        shifted ^ 0x1b
    } else {
        shifted
    }
}

/// MixColumns on a single column packed as a big-endian word.
pub fn mix_column(word: Word) -> Word {
    let [a0, a1, a2, a3] = word.to_be_bytes();
    Word::from_be_bytes([
        xtime(a0) ^ (xtime(a1) ^ a1) ^ a2 ^ a3,
        a0 ^ xtime(a1) ^ (xtime(a2) ^ a2) ^ a3,
        a0 ^ a1 ^ xtime(a2) ^ (xtime(a3) ^ a3),
        (xtime(a0) ^ a0) ^ a1 ^ a2 ^ xtime(a3),
    ])
}

/// MixColumns over all four columns.
#[inline]
pub fn mix_columns(state: Block) -> Block {
    let mut out = state;
    for (col, chunk) in out.chunks_exact_mut(4).enumerate() {
        chunk.copy_from_slice(&mix_column(column(&state, col)).to_be_bytes());
    }
    out
}

/// Adds (XORs) a round key into the state.
#[inline]
pub fn add_round_key(state: Block, round_key: &Block) -> Block {
    let mut out = state;
    xor_in_place(&mut out, round_key);
    out
}

/// One cipher round: SubBytes, ShiftRows, MixColumns (skipped when `is_final`),
/// then AddRoundKey.
pub fn cipher_round(state: Block, round_key: &Block, is_final: bool) -> Block {
    let shifted = shift_rows(sub_bytes(state));
    let mixed = if is_final {
        shifted
    } else {
        mix_columns(shifted)
    };
    add_round_key(mixed, round_key)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gmul(mut a: u8, mut b: u8) -> u8 {
        let mut product = 0u8;
        while b != 0 {
            if b & 1 != 0 {
                product ^= a;
            }
            a = xtime(a);
            b >>= 1;
        }
        product
    }

    fn inv_mix_columns(state: Block) -> Block {
        let mut out = state;
        for chunk in out.chunks_exact_mut(4) {
            let [a0, a1, a2, a3] = [chunk[0], chunk[1], chunk[2], chunk[3]];
            chunk[0] = gmul(a0, 0x0e) ^ gmul(a1, 0x0b) ^ gmul(a2, 0x0d) ^ gmul(a3, 0x09);
            chunk[1] = gmul(a0, 0x09) ^ gmul(a1, 0x0e) ^ gmul(a2, 0x0b) ^ gmul(a3, 0x0d);
            chunk[2] = gmul(a0, 0x0d) ^ gmul(a1, 0x09) ^ gmul(a2, 0x0e) ^ gmul(a3, 0x0b);
            chunk[3] = gmul(a0, 0x0b) ^ gmul(a1, 0x0d) ^ gmul(a2, 0x09) ^ gmul(a3, 0x0e);
        }
        out
    }

    #[test]
    fn xtime_known_values() {
        // FIPS-197 §4.2.1
        assert_eq!(xtime(0x57), 0xae);
        assert_eq!(xtime(0xae), 0x47);
        assert_eq!(xtime(0x47), 0x8e);
        assert_eq!(xtime(0x8e), 0x07);
    }

    #[test]
    fn mix_column_known_vectors() {
        assert_eq!(mix_column(0xdb13_5345), 0x8e4d_a1bc);
        assert_eq!(mix_column(0xf20a_225c), 0x9fdc_589d);
        assert_eq!(mix_column(0x0101_0101), 0x0101_0101);
        assert_eq!(mix_column(0xc6c6_c6c6), 0xc6c6_c6c6);
    }

    #[test]
    fn shift_rows_moves_rows_left() {
        let state: Block = std::array::from_fn(|i| i as u8);
        let shifted = shift_rows(state);
        // Row 0 untouched, row 1 rotated by one column, and so on.
        assert_eq!(
            [shifted[0], shifted[4], shifted[8], shifted[12]],
            [0, 4, 8, 12]
        );
        assert_eq!(
            [shifted[1], shifted[5], shifted[9], shifted[13]],
            [5, 9, 13, 1]
        );
        assert_eq!(
            [shifted[2], shifted[6], shifted[10], shifted[14]],
            [10, 14, 2, 6]
        );
        assert_eq!(
            [shifted[3], shifted[7], shifted[11], shifted[15]],
            [15, 3, 7, 11]
        );
    }

    #[test]
    fn inverse_mix_columns_recovers_state() {
        let state: Block = std::array::from_fn(|i| (i as u8).wrapping_mul(37) ^ 0x5a);
        assert_eq!(inv_mix_columns(mix_columns(state)), state);
    }

    #[test]
    fn final_round_skips_mix_columns() {
        let state: Block = std::array::from_fn(|i| i as u8 * 3);
        let key = [0u8; 16];
        assert_eq!(
            cipher_round(state, &key, true),
            shift_rows(sub_bytes(state))
        );
        assert_eq!(
            cipher_round(state, &key, false),
            mix_columns(shift_rows(sub_bytes(state)))
        );
    }
}
