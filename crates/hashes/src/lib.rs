//! # Keel Hashes
//!
//! `keel-hashes` holds the hash engines the rest of the keel crates depend
//! on: block-oriented SHA-1, SHA-256, SHA-512, and RIPEMD-160 behind a
//! shared streaming [`Accumulator`](engine::Accumulator), plus the derived
//! constructions Bitcoin needs: double-SHA-256, `hash160`, BIP340 tagged
//! hashes, the Merkle pair kernel, HMAC, PBKDF2, and scrypt.
//!
//! The engines implement the `digest` crate's traits, so RustCrypto
//! consumers (`hmac::SimpleHmac`, `pbkdf2`) run directly over them. The
//! scalar compression functions are authoritative; the batched Merkle
//! kernel routes through a single dispatch seam where vectorized kernels
//! can be slotted in and checked against the scalar path.
//!
//! ## Marked digests
//!
//! Digests are wrapped in marked newtypes (`mark_32_byte_hash!`) by
//! downstream crates to prevent type confusion between TXIDs, block hashes,
//! and other 32-byte values.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(unused_extern_crates)]

pub use keel_core::ser;

#[macro_use]
pub mod macros;

pub mod engine;
pub mod hash256;
pub mod kdf;
pub mod marked;
pub mod merkle;
pub mod ripemd160;
pub mod scrypt;
pub mod sha1;
pub mod sha256;
pub mod sha512;
pub mod tagged;

pub use engine::{Accumulator, Algorithm, HashError};
pub use hash256::{
    hash160, hash256, hash256_pair, Hash160Digest, Hash256Digest, Hash256Writer, Sha256Writer,
    NULL_HASH,
};
pub use kdf::{
    hmac_sha256, hmac_sha512, pbkdf2_hmac_sha1, pbkdf2_hmac_sha256, pbkdf2_hmac_sha512,
};
pub use marked::{Digest as MarkedDigestBase, MarkedDigest, MarkedDigestWriter};
pub use merkle::merkle_root;
pub use ripemd160::{ripemd160, Ripemd160};
pub use scrypt::{scrypt, ScryptError, ScryptParams};
pub use sha1::{sha1, Sha1};
pub use sha256::{sha256, Sha256};
pub use sha512::{sha512, Sha512};
pub use tagged::{tagged_hash, TaggedWriter};
