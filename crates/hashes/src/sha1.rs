//! SHA-1 (FIPS 180-4). Broken for collision resistance; retained because
//! legacy KDF constructions still reference it.

use digest::consts::{U20, U64};
use generic_array::GenericArray;

use crate::engine::{Accumulator, Algorithm};

const INITIAL: [u32; 5] = [0x67452301, 0xefcdab89, 0x98badcfe, 0x10325476, 0xc3d2e1f0];

/// The SHA-1 block compression algorithm. The streaming interface is
/// [`Sha1`].
pub struct Sha1Engine;

impl Algorithm for Sha1Engine {
    type BlockSize = U64;
    type OutputSize = U20;
    type State = [u32; 5];

    const INITIAL: [u32; 5] = INITIAL;
    const COUNT_BYTES: usize = 8;
    const COUNT_BIG_ENDIAN: bool = true;

    fn compress(state: &mut [u32; 5], block: &GenericArray<u8, U64>) {
        let mut w = [0u32; 80];
        for (i, word) in block.chunks_exact(4).enumerate() {
            w[i] = u32::from_be_bytes([word[0], word[1], word[2], word[3]]);
        }
        for i in 16..80 {
            w[i] = (w[i - 3] ^ w[i - 8] ^ w[i - 14] ^ w[i - 16]).rotate_left(1);
        }

        let [mut a, mut b, mut c, mut d, mut e] = *state;

        for (i, word) in w.iter().enumerate() {
            let (f, k) = match i / 20 {
                0 => ((b & c) | (!b & d), 0x5a827999),
                1 => (b ^ c ^ d, 0x6ed9eba1),
                2 => ((b & c) | (b & d) | (c & d), 0x8f1bbcdc),
                _ => (b ^ c ^ d, 0xca62c1d6),
            };
            let t = a
                .rotate_left(5)
                .wrapping_add(f)
                .wrapping_add(e)
                .wrapping_add(k)
                .wrapping_add(*word);
            e = d;
            d = c;
            c = b.rotate_left(30);
            b = a;
            a = t;
        }

        state[0] = state[0].wrapping_add(a);
        state[1] = state[1].wrapping_add(b);
        state[2] = state[2].wrapping_add(c);
        state[3] = state[3].wrapping_add(d);
        state[4] = state[4].wrapping_add(e);
    }

    fn write_digest(state: &[u32; 5], out: &mut GenericArray<u8, U20>) {
        for (chunk, word) in out.chunks_exact_mut(4).zip(state.iter()) {
            chunk.copy_from_slice(&word.to_be_bytes());
        }
    }
}

/// A streaming SHA-1 context.
pub type Sha1 = Accumulator<Sha1Engine>;

/// One-shot SHA-1.
pub fn sha1(data: &[u8]) -> [u8; 20] {
    let mut acc = Sha1::new();
    acc.write(data);
    let mut out = [0u8; 20];
    out.copy_from_slice(&acc.flush());
    out
}
