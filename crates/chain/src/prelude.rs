//! Common imports for chain consumers.

pub use crate::{
    hashes::{BlockHash, SigHash, TXID, WTXID},
    sign::{
        check_legacy_endorsement, check_taproot_signature, check_witness_endorsement,
        create_legacy_endorsement, create_taproot_signature, create_witness_endorsement,
    },
    types::*,
};

pub use keel_core::ser::ByteFormat;
pub use keel_hashes::{MarkedDigest, MarkedDigestWriter};
