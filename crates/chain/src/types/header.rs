//! Block headers.

use std::io::{Read, Write};

use keel_core::ser::{ByteFormat, SerError, SerResult};
use keel_hashes::{Hash256Digest, Hash256Writer, MarkedDigestWriter};

use crate::hashes::BlockHash;

/// A block header. The hash is always the double-SHA-256 of the 80-byte
/// serialization.
#[derive(serde::Serialize, serde::Deserialize, Copy, Clone, Debug, Eq, PartialEq, Default, Hash)]
pub struct Header {
    /// The block version signaling field.
    pub version: u32,
    /// The previous block's hash.
    pub previous_block_hash: BlockHash,
    /// The merkle root of the block's transaction ids.
    pub merkle_root: Hash256Digest,
    /// The miner's timestamp.
    pub timestamp: u32,
    /// The compact difficulty target.
    pub bits: u32,
    /// The proof-of-work nonce.
    pub nonce: u32,
}

/// The serialized header length.
pub const HEADER_SIZE: usize = 80;

impl Header {
    /// Instantiate a new header from parts.
    pub fn new(
        version: u32,
        previous_block_hash: BlockHash,
        merkle_root: Hash256Digest,
        timestamp: u32,
        bits: u32,
        nonce: u32,
    ) -> Self {
        Header {
            version,
            previous_block_hash,
            merkle_root,
            timestamp,
            bits,
            nonce,
        }
    }

    /// The header's block hash.
    pub fn hash(&self) -> BlockHash {
        let mut writer = Hash256Writer::default();
        self.write_to(&mut writer).expect("no IOError from hashing");
        writer.finish_marked()
    }
}

impl ByteFormat for Header {
    type Error = SerError;

    fn serialized_length(&self) -> usize {
        HEADER_SIZE
    }

    fn read_from<R>(reader: &mut R, _limit: usize) -> SerResult<Self>
    where
        R: Read,
        Self: std::marker::Sized,
    {
        Ok(Header {
            version: Self::read_u32_le(reader)?,
            previous_block_hash: BlockHash::read_from(reader, 0)?,
            merkle_root: <Hash256Digest as ByteFormat>::read_from(reader, 0)?,
            timestamp: Self::read_u32_le(reader)?,
            bits: Self::read_u32_le(reader)?,
            nonce: Self::read_u32_le(reader)?,
        })
    }

    fn write_to<W>(&self, writer: &mut W) -> SerResult<usize>
    where
        W: Write,
    {
        let mut len = Self::write_u32_le(writer, self.version)?;
        len += self.previous_block_hash.write_to(writer)?;
        len += self.merkle_root.write_to(writer)?;
        len += Self::write_u32_le(writer, self.timestamp)?;
        len += Self::write_u32_le(writer, self.bits)?;
        len += Self::write_u32_le(writer, self.nonce)?;
        Ok(len)
    }
}
