//! # Keel P2P
//!
//! The Bitcoin peer-to-peer message codecs: the framing envelope
//! (magic, command, length, checksum) and the payload catalogue the core
//! protocol exchanges. This crate is a codec layer only; sockets,
//! handshakes, and peer management belong to a networking stack built on
//! top of it.
//!
//! Payloads implement [`Payload`](envelope::Payload), which threads the
//! negotiated protocol version through (de)serialization for the fields
//! that appeared over the protocol's history (ping nonces, relay flags,
//! witness inventory types).

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(unused_extern_crates)]

pub mod envelope;
pub mod messages;

pub use envelope::{Command, Envelope, MessageError, MessageResult, Payload};

/// The mainnet wire magic.
pub const MAINNET_MAGIC: u32 = 0xd9b4_bef9;

/// The testnet3 wire magic.
pub const TESTNET_MAGIC: u32 = 0x0709_110b;

/// The highest protocol version this codec set understands.
pub const PROTOCOL_VERSION: u32 = 70015;

/// Protocol versions at which wire features appeared.
pub mod min_version {
    /// BIP31: ping carries a nonce and pong exists.
    pub const NONCED_PING: u32 = 60001;
    /// Timestamps accompany addresses in `addr` payloads.
    pub const ADDRESS_TIME: u32 = 31402;
    /// BIP37: the version message carries the relay flag.
    pub const RELAY: u32 = 70001;
    /// BIP61: the reject message.
    pub const REJECT: u32 = 70002;
    /// BIP130: sendheaders.
    pub const SEND_HEADERS: u32 = 70012;
    /// BIP133: feefilter.
    pub const FEE_FILTER: u32 = 70013;
    /// BIP152: compact blocks.
    pub const COMPACT: u32 = 70014;
}
