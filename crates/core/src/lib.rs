//! # Keel Core
//!
//! `keel-core` contains the byte, bit, and stream primitives shared by the
//! `keel-hashes`, `keel-chain`, and `keel-p2p` crates.
//!
//! ## Crate Layout
//!
//! ### Ser
//!
//! The `ByteFormat` trait is a simple wire (de)serialization API using
//! `std::io::{Read, Write}`. Implementers define the binary serialization
//! format of the type. It carries convenience helpers for the fixed-width
//! little/big-endian integers, Bitcoin-style compact ints (varints), and
//! length-prefixed vectors that the Bitcoin wire formats are built from.
//!
//! `ByteFormat` has an associated `Error` type. Most basic types can simply
//! use the provided `SerError`. More complex (de)serialization will want a
//! custom error type that is easily instantiated from a `SerError` or an
//! `std::io::Error`.
//!
//! ### Bits
//!
//! Endian-free bit manipulation over the unsigned integer widths: bit
//! widths, run counts, masks, getters/setters, overflow-aware shifts, and
//! word decomposition.
//!
//! ### Binary and base2048
//!
//! `Binary` is a sized bit-string packed MSB-first, with shift, append,
//! prepend, and substring operations. The `base2048` module packs byte
//! sequences into the 11-bit index space shared by mnemonic wordlists.
//!
//! ### Words
//!
//! Delimiter, join, split, and normalization behavior shared by mnemonic
//! dictionary implementations.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(unused_extern_crates)]

#[macro_use]
pub mod macros;

pub mod base2048;
pub mod binary;
pub mod bits;
pub mod ser;
pub mod words;
