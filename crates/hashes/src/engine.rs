//! The shared streaming accumulator over block-oriented compression
//! functions.
//!
//! Each algorithm supplies its block and digest geometry, initial chaining
//! value, and compression function; the [`Accumulator`] layers buffering,
//! Merkle–Damgård padding, and finalization on top. SHA-family algorithms
//! serialize the trailing bit count big-endian, RIPEMD-160 little-endian.

use std::fmt;

use digest::{
    crypto_common::BlockSizeUser, FixedOutput, FixedOutputReset, HashMarker, Output,
    OutputSizeUser, Reset, Update,
};
use generic_array::{typenum::Unsigned, ArrayLength, GenericArray};
use thiserror::Error;

/// Errors produced by hashing constructions.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HashError {
    /// A checked write would push the hashed length past the algorithm's
    /// bit-count limit.
    #[error("accumulated input would exceed the algorithm length limit")]
    Overflow,
}

/// A block-oriented compression algorithm.
///
/// Implementations define geometry and the raw state transition; all
/// streaming behavior lives in [`Accumulator`].
pub trait Algorithm: 'static {
    /// Compression block length.
    type BlockSize: ArrayLength<u8>;
    /// Digest length.
    type OutputSize: ArrayLength<u8>;
    /// The running chaining value.
    type State: Copy;

    /// The specified initial chaining value.
    const INITIAL: Self::State;
    /// Width of the serialized bit count in the padding block: 8 bytes for
    /// the 64-byte-block algorithms, 16 for SHA-512.
    const COUNT_BYTES: usize;
    /// Bit-count byte order: big-endian for the SHA family, little-endian
    /// for RIPEMD-160.
    const COUNT_BIG_ENDIAN: bool;

    /// Run the compression function over one full block.
    fn compress(state: &mut Self::State, block: &GenericArray<u8, Self::BlockSize>);

    /// Serialize the chaining value in the algorithm's digest byte order.
    fn write_digest(state: &Self::State, out: &mut GenericArray<u8, Self::OutputSize>);
}

/// A streaming hash context: chaining state, an incomplete block buffer,
/// and the total byte count. The buffered byte count is always
/// `size % block_size`.
pub struct Accumulator<A: Algorithm> {
    state: A::State,
    buffer: GenericArray<u8, A::BlockSize>,
    size: u64,
}

impl<A: Algorithm> Accumulator<A> {
    /// The checked-mode input limit in bytes: the maximum representable bit
    /// count less room for the count serialization itself. Two million
    /// terabytes for the 64-bit-count algorithms.
    pub const LIMIT_BYTES: u64 = u64::MAX / 8 - A::COUNT_BYTES as u64;

    /// Construct an empty accumulator.
    pub fn new() -> Self {
        Self {
            state: A::INITIAL,
            buffer: GenericArray::default(),
            size: 0,
        }
    }

    fn block_len() -> usize {
        A::BlockSize::USIZE
    }

    /// Total bytes written since construction or the last flush.
    pub fn written(&self) -> u64 {
        self.size
    }

    /// Return the accumulator to its initial state.
    pub fn reset(&mut self) {
        self.state = A::INITIAL;
        self.size = 0;
    }

    /// Accept input of any length, compressing whole blocks as they fill.
    /// Unchecked: the length limit exceeds any realistic input, and the
    /// counter simply wraps past it.
    pub fn write(&mut self, mut data: &[u8]) {
        let block = Self::block_len();
        let buffered = (self.size % block as u64) as usize;
        self.size = self.size.wrapping_add(data.len() as u64);

        if buffered != 0 {
            let need = block - buffered;
            if data.len() < need {
                self.buffer[buffered..buffered + data.len()].copy_from_slice(data);
                return;
            }
            self.buffer[buffered..].copy_from_slice(&data[..need]);
            A::compress(&mut self.state, &self.buffer);
            data = &data[need..];
        }

        // Whole blocks compress straight from the input.
        let mut chunks = data.chunks_exact(block);
        for chunk in &mut chunks {
            A::compress(&mut self.state, GenericArray::from_slice(chunk));
        }

        let remainder = chunks.remainder();
        self.buffer[..remainder.len()].copy_from_slice(remainder);
    }

    /// Checked write: fails with [`HashError::Overflow`] when the total
    /// input would exceed [`Self::LIMIT_BYTES`].
    pub fn try_write(&mut self, data: &[u8]) -> Result<(), HashError> {
        match self.size.checked_add(data.len() as u64) {
            Some(total) if total <= Self::LIMIT_BYTES => {
                self.write(data);
                Ok(())
            }
            _ => Err(HashError::Overflow),
        }
    }

    /// Apply padding (a single 0x80 bit, zero fill, and the serialized bit
    /// count), compress the final block or blocks, and emit the digest. The
    /// accumulator is left empty, ready for reuse.
    pub fn flush(&mut self) -> GenericArray<u8, A::OutputSize> {
        let block = Self::block_len();
        let buffered = (self.size % block as u64) as usize;
        let bits = self.size.wrapping_mul(8);

        self.buffer[buffered] = 0x80;
        for byte in self.buffer[buffered + 1..].iter_mut() {
            *byte = 0;
        }

        // One padding block if the count fits after the 0x80 marker, two
        // otherwise.
        if buffered + 1 + A::COUNT_BYTES > block {
            A::compress(&mut self.state, &self.buffer);
            for byte in self.buffer.iter_mut() {
                *byte = 0;
            }
        }

        // A 16-byte count keeps its high half zero: the counter is 64-bit.
        let count = if A::COUNT_BIG_ENDIAN {
            bits.to_be_bytes()
        } else {
            bits.to_le_bytes()
        };
        self.buffer[block - 8..].copy_from_slice(&count);
        A::compress(&mut self.state, &self.buffer);

        let mut out = GenericArray::default();
        A::write_digest(&self.state, &mut out);
        self.reset();
        out
    }

    /// Flush, then re-hash the digest with a fresh state. The second pass
    /// is always a single compression: every supported digest fits in one
    /// block alongside its padding and count.
    pub fn double_flush(&mut self) -> GenericArray<u8, A::OutputSize> {
        let digest = self.flush();
        let block = Self::block_len();
        let digest_len = A::OutputSize::USIZE;

        let mut state = A::INITIAL;
        let mut pad = GenericArray::<u8, A::BlockSize>::default();
        pad[..digest_len].copy_from_slice(&digest);
        pad[digest_len] = 0x80;
        let bits = digest_len as u64 * 8;
        let count = if A::COUNT_BIG_ENDIAN {
            bits.to_be_bytes()
        } else {
            bits.to_le_bytes()
        };
        pad[block - 8..].copy_from_slice(&count);
        A::compress(&mut state, &pad);

        let mut out = GenericArray::default();
        A::write_digest(&state, &mut out);
        out
    }
}

impl<A: Algorithm> Default for Accumulator<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: Algorithm> Clone for Accumulator<A> {
    fn clone(&self) -> Self {
        Self {
            state: self.state,
            buffer: self.buffer.clone(),
            size: self.size,
        }
    }
}

impl<A: Algorithm> fmt::Debug for Accumulator<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Accumulator")
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

impl<A: Algorithm> Update for Accumulator<A> {
    fn update(&mut self, data: &[u8]) {
        self.write(data);
    }
}

impl<A: Algorithm> OutputSizeUser for Accumulator<A> {
    type OutputSize = A::OutputSize;
}

impl<A: Algorithm> BlockSizeUser for Accumulator<A> {
    type BlockSize = A::BlockSize;
}

impl<A: Algorithm> FixedOutput for Accumulator<A> {
    fn finalize_into(mut self, out: &mut Output<Self>) {
        *out = self.flush();
    }
}

impl<A: Algorithm> FixedOutputReset for Accumulator<A> {
    fn finalize_into_reset(&mut self, out: &mut Output<Self>) {
        *out = self.flush();
    }
}

impl<A: Algorithm> Reset for Accumulator<A> {
    fn reset(&mut self) {
        Accumulator::reset(self);
    }
}

impl<A: Algorithm> HashMarker for Accumulator<A> {}
