//! Marked digest types for the chain objects.

use keel_hashes::mark_32_byte_hash;

mark_32_byte_hash!(
    /// A transaction identifier: double-SHA-256 of the transaction's
    /// nominal (non-witness) serialization.
    TXID
);

mark_32_byte_hash!(
    /// A witness transaction identifier: double-SHA-256 of the witnessed
    /// serialization (BIP141).
    WTXID
);

mark_32_byte_hash!(
    /// A block identifier: double-SHA-256 of the 80-byte header.
    BlockHash
);

mark_32_byte_hash!(
    /// A signature hash: the digest a signer commits to.
    SigHash
);
