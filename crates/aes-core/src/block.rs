//! Block and word representation helpers.
//!
//! A block is 16 bytes in column-major order: bytes `4c..4c+4` form column `c`,
//! and the byte at row `r` of column `c` sits at index `4c + r`. A word is one
//! column packed big-endian into a `u32` (row 0 is the most significant byte).

/// AES block of 16 bytes.
pub type Block = [u8; 16];

/// Four bytes packed big-endian.
pub type Word = u32;

/// XORs two blocks, writing the result into `dst`.
#[inline]
pub fn xor_in_place(dst: &mut Block, rhs: &Block) {
    for (d, r) in dst.iter_mut().zip(rhs.iter()) {
        *d ^= *r;
    }
}

/// Returns column `col` (0..4) of the block as a word.
#[inline]
pub fn column(block: &Block, col: usize) -> Word {
    let idx = col * 4;
    Word::from_be_bytes([block[idx], block[idx + 1], block[idx + 2], block[idx + 3]])
}

/// Splits a block into its four columns.
pub fn block_to_words(block: &Block) -> [Word; 4] {
    std::array::from_fn(|col| column(block, col))
}

/// Packs four words into a block, word `i` becoming column `i`.
pub fn words_to_block(words: &[Word; 4]) -> Block {
    let mut block = [0u8; 16];
    for (chunk, word) in block.chunks_exact_mut(4).zip(words.iter()) {
        chunk.copy_from_slice(&word.to_be_bytes());
    }
    block
}
