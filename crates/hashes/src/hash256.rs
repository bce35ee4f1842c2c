//! Bitcoin's composed digests: double-SHA-256 (`hash256`) and
//! RIPEMD-160-of-SHA-256 (`hash160`), with `std::io::Write` sinks for
//! streaming use in txid and sighash computation.

use std::io::{Result as IOResult, Write};

use crate::{
    marked::MarkedDigestWriter,
    sha256::{sha256, Sha256},
    Ripemd160,
};

/// A 32-byte digest. Marked newtypes disambiguate its many uses.
pub type Hash256Digest = [u8; 32];

/// A 20-byte digest, produced by RIPEMD-160 or SHA-1.
pub type Hash160Digest = [u8; 20];

/// The all-zero 32-byte digest, used as the "absent" hash in sighash
/// serialization.
pub const NULL_HASH: Hash256Digest = [0u8; 32];

/// One-shot Bitcoin-style double-SHA-256, using the half-block second-pass
/// fast path.
pub fn hash256(data: &[u8]) -> Hash256Digest {
    let mut acc = Sha256::new();
    acc.write(data);
    let mut out = [0u8; 32];
    out.copy_from_slice(&acc.double_flush());
    out
}

/// Double-SHA-256 over the concatenation of two slices. The merkle pair
/// primitive.
pub fn hash256_pair(left: &[u8], right: &[u8]) -> Hash256Digest {
    let mut acc = Sha256::new();
    acc.write(left);
    acc.write(right);
    let mut out = [0u8; 32];
    out.copy_from_slice(&acc.double_flush());
    out
}

/// One-shot Bitcoin-style `ripemd160(sha256(x))`.
pub fn hash160(data: &[u8]) -> Hash160Digest {
    let mut acc = Ripemd160::new();
    acc.write(&sha256(data));
    let mut out = [0u8; 20];
    out.copy_from_slice(&acc.flush());
    out
}

/// A struct that exposes a Bitcoin-style double-SHA-256 `Write` interface by
/// wrapping an internal SHA-256 accumulator.
///
/// ```
/// # use std::io::{Result, Write};
/// use keel_hashes::{Hash256Writer, MarkedDigestWriter};
///
/// # fn main() -> Result<()> {
/// let mut w = Hash256Writer::default();
/// # let data = [0u8; 32];
///
/// // Writing more than once will update the hasher.
/// w.write(&data)?;
///
/// // Call finish to consume the hasher and produce the digest.
/// let digest = w.finish();
/// # Ok(())
/// # }
/// ```
#[derive(Default, Clone)]
pub struct Hash256Writer {
    internal: Sha256,
}

impl Write for Hash256Writer {
    fn write(&mut self, buf: &[u8]) -> IOResult<usize> {
        self.internal.write(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> IOResult<()> {
        Ok(())
    }
}

impl MarkedDigestWriter<Hash256Digest> for Hash256Writer {
    fn finish(mut self) -> Hash256Digest {
        let mut digest = Hash256Digest::default();
        digest.copy_from_slice(&self.internal.double_flush());
        digest
    }
}

/// A single-SHA-256 `Write` sink, used where a protocol (BIP341) calls for
/// plain SHA-256 midstates rather than Bitcoin's double hash.
#[derive(Default, Clone)]
pub struct Sha256Writer {
    internal: Sha256,
}

impl Write for Sha256Writer {
    fn write(&mut self, buf: &[u8]) -> IOResult<usize> {
        self.internal.write(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> IOResult<()> {
        Ok(())
    }
}

impl MarkedDigestWriter<Hash256Digest> for Sha256Writer {
    fn finish(mut self) -> Hash256Digest {
        let mut digest = Hash256Digest::default();
        digest.copy_from_slice(&self.internal.flush());
        digest
    }
}
