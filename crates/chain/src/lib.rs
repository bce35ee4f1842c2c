//! # Keel Chain
//!
//! Bitcoin chain objects and consensus-serialization for the keel crates:
//! outpoints, inputs, outputs, witnesses, transactions (legacy and BIP144
//! forms), headers, and blocks, together with the script model (opcodes,
//! patterns, sigop counting), all three signature-hash versions
//! (unversioned, BIP143, BIP341/342), BIP68 relative locktime, and
//! endorsement creation/checking over `keel-secp`.
//!
//! Every wire type implements `keel_core::ser::ByteFormat` and round-trips
//! its network serialization. Parse failures surface as errors, except for
//! scripts, which preserve their source bytes and carry a sticky
//! `is_valid()` flag, as consensus requires.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(unused_extern_crates)]

pub mod hashes;
pub mod prelude;
pub mod sign;
pub mod types;
