//! BIP340 tagged hashes: `sha256(sha256(tag) || sha256(tag) || msg)`.
//!
//! The tag prefix is a fixed 64-byte block, so its midstate is one
//! compression that can be computed once and cloned per message. The
//! `TapSighash` midstate used by every taproot signature hash is
//! precomputed.

use std::io::{Result as IOResult, Write};

use once_cell::sync::Lazy;

use crate::{
    hash256::Hash256Digest,
    marked::MarkedDigestWriter,
    sha256::{sha256, Sha256},
};

/// The tag binding taproot signature hash preimages (BIP341).
pub const TAP_SIGHASH_TAG: &str = "TapSighash";

static TAP_SIGHASH_MIDSTATE: Lazy<Sha256> = Lazy::new(|| midstate(TAP_SIGHASH_TAG));

/// An accumulator primed with the 64-byte tag prefix: exactly one
/// compression of `sha256(tag) || sha256(tag)`.
fn midstate(tag: &str) -> Sha256 {
    let tag_digest = sha256(tag.as_bytes());
    let mut acc = Sha256::new();
    acc.write(&tag_digest);
    acc.write(&tag_digest);
    acc
}

/// One-shot tagged hash.
pub fn tagged_hash(tag: &str, data: &[u8]) -> Hash256Digest {
    let mut acc = if tag == TAP_SIGHASH_TAG {
        TAP_SIGHASH_MIDSTATE.clone()
    } else {
        midstate(tag)
    };
    acc.write(data);
    let mut out = [0u8; 32];
    out.copy_from_slice(&acc.flush());
    out
}

/// A tagged-hash `Write` sink for streaming preimage construction.
#[derive(Clone)]
pub struct TaggedWriter {
    internal: Sha256,
}

impl TaggedWriter {
    /// A writer primed with the given tag.
    pub fn new(tag: &str) -> Self {
        let internal = if tag == TAP_SIGHASH_TAG {
            TAP_SIGHASH_MIDSTATE.clone()
        } else {
            midstate(tag)
        };
        Self { internal }
    }

    /// A writer primed with the precomputed `TapSighash` midstate.
    pub fn tap_sighash() -> Self {
        Self {
            internal: TAP_SIGHASH_MIDSTATE.clone(),
        }
    }

    /// Bytes written past the tag prefix.
    pub fn message_len(&self) -> u64 {
        self.internal.written() - 64
    }

    /// Consume the writer and produce the tagged digest.
    pub fn finish(mut self) -> Hash256Digest {
        let mut out = [0u8; 32];
        out.copy_from_slice(&self.internal.flush());
        out
    }
}

impl Default for TaggedWriter {
    fn default() -> Self {
        Self::tap_sighash()
    }
}

impl Write for TaggedWriter {
    fn write(&mut self, buf: &[u8]) -> IOResult<usize> {
        self.internal.write(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> IOResult<()> {
        Ok(())
    }
}

impl MarkedDigestWriter<Hash256Digest> for TaggedWriter {
    fn finish(self) -> Hash256Digest {
        TaggedWriter::finish(self)
    }
}
