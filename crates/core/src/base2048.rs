//! Packing between 8-bit bytes and the 11-bit index space used by
//! 2048-word mnemonic dictionaries.
//!
//! Bits flow high-to-low within bytes and indexes. Packing pads the final
//! index with trailing zero bits; unpacking emits only whole bytes, so the
//! two directions round-trip exactly when no padding is required.

use bitvec::prelude::*;

/// Number of bits per base2048 index.
pub const INDEX_BITS: usize = 11;

/// Pack a byte sequence into 11-bit indexes, high-to-low, padding the final
/// index with trailing zero bits as needed.
pub fn pack(bytes: &[u8]) -> Vec<u16> {
    let bits = bytes.view_bits::<Msb0>();
    bits.chunks(INDEX_BITS)
        .map(|chunk| {
            let mut index = 0u16;
            for bit in chunk.iter().by_vals() {
                index = (index << 1) | (bit as u16);
            }
            // A short tail chunk is padded with low zero bits.
            index << (INDEX_BITS - chunk.len())
        })
        .collect()
}

/// Unpack 11-bit indexes into bytes, high-to-low, emitting exactly
/// `indexes.len() * 11 / 8` bytes. Residual bits beyond the last whole byte
/// are discarded. Bits above the low 11 of each index are ignored.
pub fn unpack(indexes: &[u16]) -> Vec<u8> {
    let mut bits = BitVec::<u8, Msb0>::with_capacity(indexes.len() * INDEX_BITS);
    for index in indexes {
        for position in (0..INDEX_BITS).rev() {
            bits.push(index & (1 << position) != 0);
        }
    }

    bits.chunks_exact(8)
        .map(|byte| {
            let mut out = 0u8;
            for bit in byte.iter().by_vals() {
                out = (out << 1) | (bit as u8);
            }
            out
        })
        .collect()
}
