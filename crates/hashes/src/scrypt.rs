//! Scrypt (RFC 7914): PBKDF2-HMAC-SHA-256 around the salsa20/8 ROMix core.
//!
//! The outer loop over the `p` blocks is data-independent, so it is
//! dispatched across scoped threads when `p > 1`. Arena allocation is
//! fallible: callers get an error and can retry with smaller parameters
//! rather than aborting.

use thiserror::Error;

use crate::kdf::pbkdf2_hmac_sha256;

/// Errors produced by scrypt parameterization or execution.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScryptError {
    /// The cost factor `n` must be a power of two greater than one.
    #[error("scrypt cost must be a power of two greater than one")]
    BadCost,

    /// `r` and `p` must be nonzero with `r * p < 2^30`.
    #[error("scrypt block and parallelization parameters out of range")]
    BadParameters,

    /// A working arena could not be allocated.
    #[error("failed to allocate a {0}-byte scrypt arena")]
    Allocation(usize),
}

/// Validated scrypt parameters `(n, r, p)`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ScryptParams {
    n: u32,
    r: u32,
    p: u32,
}

impl ScryptParams {
    /// Validate `(n, r, p)` per RFC 7914.
    pub fn new(n: u32, r: u32, p: u32) -> Result<Self, ScryptError> {
        if n < 2 || !n.is_power_of_two() {
            return Err(ScryptError::BadCost);
        }
        if r == 0 || p == 0 || (r as u64) * (p as u64) >= (1 << 30) {
            return Err(ScryptError::BadParameters);
        }
        Ok(Self { n, r, p })
    }

    /// The CPU/memory cost factor.
    pub fn n(&self) -> u32 {
        self.n
    }

    /// The block size factor.
    pub fn r(&self) -> u32 {
        self.r
    }

    /// The parallelization factor.
    pub fn p(&self) -> u32 {
        self.p
    }
}

/// Derive `out.len()` bytes of key material from the password and salt.
pub fn scrypt(
    password: &[u8],
    salt: &[u8],
    params: ScryptParams,
    out: &mut [u8],
) -> Result<(), ScryptError> {
    let block_len = 128 * params.r as usize;
    let n = params.n as usize;
    let r = params.r as usize;

    let mut blocks = try_alloc(block_len * params.p as usize)?;
    pbkdf2_hmac_sha256(password, salt, 1, &mut blocks);

    if params.p == 1 {
        rom_mix(r, n, &mut blocks)?;
    } else {
        // Each worker mixes its own disjoint block with its own arena; the
        // merge is deterministic.
        std::thread::scope(|scope| {
            let workers: Vec<_> = blocks
                .chunks_mut(block_len)
                .map(|block| scope.spawn(move || rom_mix(r, n, block)))
                .collect();
            for worker in workers {
                worker.join().expect("scrypt workers do not panic")?;
            }
            Ok(())
        })?;
    }

    pbkdf2_hmac_sha256(password, &blocks, 1, out);
    Ok(())
}

fn try_alloc(len: usize) -> Result<Vec<u8>, ScryptError> {
    let mut arena = Vec::new();
    arena
        .try_reserve_exact(len)
        .map_err(|_| ScryptError::Allocation(len))?;
    arena.resize(len, 0);
    Ok(arena)
}

/// RFC 7914 scryptROMix over a single `128 * r` byte block.
fn rom_mix(r: usize, n: usize, block: &mut [u8]) -> Result<(), ScryptError> {
    let len = 128 * r;
    let mut arena = try_alloc(len.checked_mul(n).ok_or(ScryptError::BadParameters)?)?;
    let mut x = block.to_vec();
    let mut y = vec![0u8; len];

    for i in 0..n {
        arena[i * len..(i + 1) * len].copy_from_slice(&x);
        block_mix(r, &x, &mut y);
        std::mem::swap(&mut x, &mut y);
    }

    for _ in 0..n {
        let j = (integerify(&x, r) % n as u64) as usize;
        for (byte, v) in x.iter_mut().zip(&arena[j * len..(j + 1) * len]) {
            *byte ^= v;
        }
        block_mix(r, &x, &mut y);
        std::mem::swap(&mut x, &mut y);
    }

    block.copy_from_slice(&x);
    Ok(())
}

/// RFC 7914 scryptBlockMix: salsa20/8 chaining over the 2r 64-byte
/// sub-blocks, with even outputs packed first and odd outputs second.
fn block_mix(r: usize, input: &[u8], out: &mut [u8]) {
    let mut x = load_words(&input[(2 * r - 1) * 64..]);

    for i in 0..2 * r {
        let sub = load_words(&input[i * 64..]);
        for (word, v) in x.iter_mut().zip(sub.iter()) {
            *word ^= v;
        }
        salsa20_8(&mut x);

        let slot = if i % 2 == 0 { i / 2 } else { r + i / 2 };
        store_words(&x, &mut out[slot * 64..(slot + 1) * 64]);
    }
}

/// The low 64 bits of the final 64-byte sub-block, little-endian.
fn integerify(block: &[u8], r: usize) -> u64 {
    let tail = &block[(2 * r - 1) * 64..];
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&tail[..8]);
    u64::from_le_bytes(bytes)
}

fn load_words(bytes: &[u8]) -> [u32; 16] {
    let mut words = [0u32; 16];
    for (word, chunk) in words.iter_mut().zip(bytes.chunks_exact(4)) {
        *word = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
    }
    words
}

fn store_words(words: &[u32; 16], out: &mut [u8]) {
    for (chunk, word) in out.chunks_exact_mut(4).zip(words.iter()) {
        chunk.copy_from_slice(&word.to_le_bytes());
    }
}

/// The salsa20/8 core: four double-rounds plus the feed-forward.
fn salsa20_8(x: &mut [u32; 16]) {
    let input = *x;

    for _ in 0..4 {
        // column rounds
        x[4] ^= x[0].wrapping_add(x[12]).rotate_left(7);
        x[8] ^= x[4].wrapping_add(x[0]).rotate_left(9);
        x[12] ^= x[8].wrapping_add(x[4]).rotate_left(13);
        x[0] ^= x[12].wrapping_add(x[8]).rotate_left(18);
        x[9] ^= x[5].wrapping_add(x[1]).rotate_left(7);
        x[13] ^= x[9].wrapping_add(x[5]).rotate_left(9);
        x[1] ^= x[13].wrapping_add(x[9]).rotate_left(13);
        x[5] ^= x[1].wrapping_add(x[13]).rotate_left(18);
        x[14] ^= x[10].wrapping_add(x[6]).rotate_left(7);
        x[2] ^= x[14].wrapping_add(x[10]).rotate_left(9);
        x[6] ^= x[2].wrapping_add(x[14]).rotate_left(13);
        x[10] ^= x[6].wrapping_add(x[2]).rotate_left(18);
        x[3] ^= x[15].wrapping_add(x[11]).rotate_left(7);
        x[7] ^= x[3].wrapping_add(x[15]).rotate_left(9);
        x[11] ^= x[7].wrapping_add(x[3]).rotate_left(13);
        x[15] ^= x[11].wrapping_add(x[7]).rotate_left(18);

        // row rounds
        x[1] ^= x[0].wrapping_add(x[3]).rotate_left(7);
        x[2] ^= x[1].wrapping_add(x[0]).rotate_left(9);
        x[3] ^= x[2].wrapping_add(x[1]).rotate_left(13);
        x[0] ^= x[3].wrapping_add(x[2]).rotate_left(18);
        x[6] ^= x[5].wrapping_add(x[4]).rotate_left(7);
        x[7] ^= x[6].wrapping_add(x[5]).rotate_left(9);
        x[4] ^= x[7].wrapping_add(x[6]).rotate_left(13);
        x[5] ^= x[4].wrapping_add(x[7]).rotate_left(18);
        x[11] ^= x[10].wrapping_add(x[9]).rotate_left(7);
        x[8] ^= x[11].wrapping_add(x[10]).rotate_left(9);
        x[9] ^= x[8].wrapping_add(x[11]).rotate_left(13);
        x[10] ^= x[9].wrapping_add(x[8]).rotate_left(18);
        x[12] ^= x[15].wrapping_add(x[14]).rotate_left(7);
        x[13] ^= x[12].wrapping_add(x[15]).rotate_left(9);
        x[14] ^= x[13].wrapping_add(x[12]).rotate_left(13);
        x[15] ^= x[14].wrapping_add(x[13]).rotate_left(18);
    }

    for (word, v) in x.iter_mut().zip(input.iter()) {
        *word = word.wrapping_add(*v);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn it_rejects_bad_parameters() {
        assert_eq!(ScryptParams::new(0, 1, 1), Err(ScryptError::BadCost));
        assert_eq!(ScryptParams::new(1, 1, 1), Err(ScryptError::BadCost));
        assert_eq!(ScryptParams::new(15, 1, 1), Err(ScryptError::BadCost));
        assert_eq!(ScryptParams::new(16, 0, 1), Err(ScryptError::BadParameters));
        assert_eq!(ScryptParams::new(16, 1, 0), Err(ScryptError::BadParameters));
        assert!(ScryptParams::new(16, 1, 1).is_ok());
    }

    // RFC 7914 section 8: the salsa20/8 core vector.
    #[test]
    fn it_matches_the_salsa_core_vector() {
        let input = hex::decode(
            "7e879a214f3ec9867ca940e641718f26baee555b8c61c1b50df846116dcd3b1d\
             ee24f319df9b3d8514121e4b5ac5aa3276021d2909c74829edebc68db8b8c25e",
        )
        .unwrap();
        let expected = hex::decode(
            "a41f859c6608cc993b81cacb020cef05044b2181a2fd337dfd7b1c6396682f29\
             b4393168e3c9e6bcfe6bc5b7a06d96bae424cc102c91745c24ad673dc7618f81",
        )
        .unwrap();

        let mut x = load_words(&input);
        salsa20_8(&mut x);
        let mut out = [0u8; 64];
        store_words(&x, &mut out);
        assert_eq!(&out[..], &expected[..]);
    }

    // RFC 7914 section 12 vectors.
    #[test]
    fn it_matches_the_rfc_vectors() {
        let mut out = [0u8; 64];
        scrypt(b"", b"", ScryptParams::new(16, 1, 1).unwrap(), &mut out).unwrap();
        assert_eq!(
            hex::encode(out),
            "77d6576238657b203b19ca42c18a0497f16b4844e3074ae8dfdffa3fede21442\
             fcd0069ded0948f8326a753a0fc81f17e8d3e0fb2e0d3628cf35e20c38d18906"
        );

        let mut out = [0u8; 64];
        scrypt(
            b"password",
            b"NaCl",
            ScryptParams::new(1024, 8, 16).unwrap(),
            &mut out,
        )
        .unwrap();
        assert_eq!(
            hex::encode(out),
            "fdbabe1c9d3472007856e7190d01e9fe7c6ad7cbc8237830e77376634b373162\
             2eaf30d92e22a3886ff109279d9830dac727afb94a83ee6d8360cbdfa2cc0640"
        );
    }

    // Randomized agreement with the RustCrypto reference for small params.
    #[test]
    fn it_agrees_with_the_reference_implementation() {
        let params = ScryptParams::new(8, 2, 2).unwrap();
        let reference = ::scrypt::Params::new(3, 2, 2, 32).unwrap();

        for seed in 0u8..8 {
            let password = [seed; 13];
            let salt = [seed ^ 0xff; 7];

            let mut ours = [0u8; 32];
            scrypt(&password, &salt, params, &mut ours).unwrap();

            let mut theirs = [0u8; 32];
            ::scrypt::scrypt(&password, &salt, &reference, &mut theirs).unwrap();

            assert_eq!(ours, theirs);
        }
    }
}
