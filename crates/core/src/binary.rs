//! A sized bit-string packed MSB-first with zeroed trailing bits.

use bitvec::prelude::*;
use std::{fmt, str::FromStr};
use thiserror::Error;

/// Error returned when parsing a `Binary` from text.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("binary strings may contain only '0' and '1' characters")]
pub struct ParseBinaryError;

/// A bit-string with explicit size. Bits are stored most-significant first,
/// so `blocks()` packs them big-endian with any trailing bits in the final
/// byte zeroed.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Binary {
    bits: BitVec<u8, Msb0>,
}

impl Binary {
    /// An empty bit-string.
    pub fn new() -> Self {
        Self::default()
    }

    /// Construct from a size in bits and a packed big-endian byte source.
    /// Returns `None` if the source holds fewer than `size` bits.
    pub fn from_bits(size: usize, bytes: &[u8]) -> Option<Self> {
        if bytes.len() * 8 < size {
            return None;
        }
        let slice = &bytes.view_bits::<Msb0>()[..size];
        Some(Self {
            bits: slice.to_bitvec(),
        })
    }

    /// The size of the bit-string in bits.
    pub fn size(&self) -> usize {
        self.bits.len()
    }

    /// True if the bit-string holds no bits.
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// The bit at `index`, counting from the left. `None` past the end.
    pub fn get(&self, index: usize) -> Option<bool> {
        self.bits.get(index).map(|bit| *bit)
    }

    /// Append a single bit on the right.
    pub fn push(&mut self, bit: bool) {
        self.bits.push(bit);
    }

    /// Drop the first `shift` bits, reducing the size accordingly. Shifting
    /// by the full size or more empties the bit-string.
    pub fn shift_left(&mut self, shift: usize) {
        if shift >= self.bits.len() {
            self.bits.clear();
        } else {
            self.bits.drain(..shift);
        }
    }

    /// Prepend `shift` zero bits, growing the size accordingly.
    pub fn shift_right(&mut self, shift: usize) {
        let mut shifted = BitVec::<u8, Msb0>::repeat(false, shift);
        shifted.extend_from_bitslice(&self.bits);
        self.bits = shifted;
    }

    /// Append another bit-string on the right, bit-aligned.
    pub fn append(&mut self, other: &Binary) {
        self.bits.extend_from_bitslice(&other.bits);
    }

    /// Prepend another bit-string on the left, bit-aligned.
    pub fn prepend(&mut self, other: &Binary) {
        let mut joined = other.bits.clone();
        joined.extend_from_bitslice(&self.bits);
        self.bits = joined;
    }

    /// The sub-bit-string starting at `start` of at most `length` bits. A
    /// start past the end yields the empty bit-string; a length past the end
    /// truncates.
    pub fn substring(&self, start: usize, length: usize) -> Binary {
        if start >= self.bits.len() {
            return Binary::new();
        }
        let end = start.saturating_add(length).min(self.bits.len());
        Binary {
            bits: self.bits[start..end].to_bitvec(),
        }
    }

    /// The minimal packed byte form: `ceil(size / 8)` bytes, MSB-first, with
    /// trailing bits in the final byte zeroed.
    pub fn blocks(&self) -> Vec<u8> {
        let mut out = vec![0u8; (self.bits.len() + 7) / 8];
        for (index, bit) in self.bits.iter().by_vals().enumerate() {
            if bit {
                out[index / 8] |= 0x80 >> (index % 8);
            }
        }
        out
    }

    /// The ASCII `"01"` rendering of the bit-string.
    pub fn encoded(&self) -> String {
        self.bits
            .iter()
            .by_vals()
            .map(|bit| if bit { '1' } else { '0' })
            .collect()
    }
}

impl fmt::Display for Binary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encoded())
    }
}

impl FromStr for Binary {
    type Err = ParseBinaryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bits = BitVec::with_capacity(s.len());
        for c in s.chars() {
            match c {
                '0' => bits.push(false),
                '1' => bits.push(true),
                _ => return Err(ParseBinaryError),
            }
        }
        Ok(Self { bits })
    }
}
