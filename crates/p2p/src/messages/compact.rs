//! BIP152 compact block relay payloads.

use std::io::{Read, Write};

use keel_chain::{
    hashes::BlockHash,
    types::{Header, Transaction},
};
use keel_core::ser::{ByteFormat, SerError, SerResult};

use crate::envelope::{MessageError, MessageResult, Payload};

/// A 6-byte SipHash-derived transaction short id.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct ShortId(pub [u8; 6]);

impl ByteFormat for ShortId {
    type Error = SerError;

    fn serialized_length(&self) -> usize {
        6
    }

    fn read_from<R>(reader: &mut R, _limit: usize) -> SerResult<Self>
    where
        R: Read,
        Self: std::marker::Sized,
    {
        let mut bytes = [0u8; 6];
        reader.read_exact(&mut bytes)?;
        Ok(ShortId(bytes))
    }

    fn write_to<W>(&self, writer: &mut W) -> SerResult<usize>
    where
        W: Write,
    {
        Ok(writer.write(&self.0)?)
    }
}

/// A transaction sent along with a compact block, keyed by its absolute
/// index in the block.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PrefilledTransaction {
    /// The transaction's index in the block. Serialized as a varint;
    /// BIP152's differential encoding is applied by the assembler above
    /// this codec.
    pub index: u64,
    /// The transaction.
    pub transaction: Transaction,
}

impl ByteFormat for PrefilledTransaction {
    type Error = MessageError;

    fn serialized_length(&self) -> usize {
        keel_core::ser::prefix_byte_len(self.index) as usize
            + self.transaction.serialized_length()
    }

    fn read_from<R>(reader: &mut R, _limit: usize) -> MessageResult<Self>
    where
        R: Read,
        Self: std::marker::Sized,
    {
        Ok(PrefilledTransaction {
            index: Self::read_compact_int(reader)?,
            transaction: Transaction::read_from(reader, 0)?,
        })
    }

    fn write_to<W>(&self, writer: &mut W) -> MessageResult<usize>
    where
        W: Write,
    {
        let mut len = Self::write_compact_int(writer, self.index)?;
        len += self.transaction.write_to(writer)?;
        Ok(len)
    }
}

/// The `cmpctblock` payload: a header, the sender's short-id nonce, the
/// short ids, and the prefilled transactions (at least the coinbase).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CompactBlock {
    /// The block header.
    pub header: Header,
    /// The salt for short id computation.
    pub nonce: u64,
    /// Short ids of the non-prefilled transactions.
    pub short_ids: Vec<ShortId>,
    /// Transactions the sender predicts the receiver lacks.
    pub transactions: Vec<PrefilledTransaction>,
}

impl Payload for CompactBlock {
    const COMMAND: &'static str = "cmpctblock";

    fn read_payload<R: Read>(reader: &mut R, _version: u32) -> MessageResult<Self> {
        Ok(CompactBlock {
            header: Header::read_from(reader, 0)?,
            nonce: <Self as ByteFormat>::read_u64_le(reader)?,
            short_ids: <Self as ByteFormat>::read_prefix_vec(reader)?,
            transactions: <Self as ByteFormat>::read_prefix_vec(reader)?,
        })
    }

    fn write_payload<W: Write>(&self, writer: &mut W, _version: u32) -> MessageResult<usize> {
        let mut len = self.header.write_to(writer).map_err(SerError::from)?;
        len += <Self as ByteFormat>::write_u64_le(writer, self.nonce)?;
        len += <Self as ByteFormat>::write_prefix_vec(writer, &self.short_ids)?;
        len += <Self as ByteFormat>::write_prefix_vec(writer, &self.transactions)?;
        Ok(len)
    }
}

impl ByteFormat for CompactBlock {
    type Error = MessageError;

    fn serialized_length(&self) -> usize {
        let mut len = 80 + 8;
        len += keel_core::ser::prefix_byte_len(self.short_ids.len() as u64) as usize;
        len += self.short_ids.serialized_length();
        len += keel_core::ser::prefix_byte_len(self.transactions.len() as u64) as usize;
        len += self.transactions.serialized_length();
        len
    }

    fn read_from<R>(reader: &mut R, _limit: usize) -> MessageResult<Self>
    where
        R: Read,
        Self: std::marker::Sized,
    {
        Self::read_payload(reader, 0)
    }

    fn write_to<W>(&self, writer: &mut W) -> MessageResult<usize>
    where
        W: Write,
    {
        self.write_payload(writer, 0)
    }
}

/// The `getblocktxn` payload: request transactions of a block by index.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct GetBlockTransactions {
    /// The block being reconstructed.
    pub block_hash: BlockHash,
    /// The requested indexes. Serialized as varints; differential
    /// encoding is applied by the assembler above this codec.
    pub indexes: Vec<u64>,
}

impl Payload for GetBlockTransactions {
    const COMMAND: &'static str = "getblocktxn";

    fn read_payload<R: Read>(reader: &mut R, _version: u32) -> MessageResult<Self> {
        let block_hash = BlockHash::read_from(reader, 0)?;
        let count = <Self as ByteFormat>::read_compact_int(reader)?;
        let mut indexes = Vec::new();
        for _ in 0..count {
            indexes.push(<Self as ByteFormat>::read_compact_int(reader)?);
        }
        Ok(GetBlockTransactions {
            block_hash,
            indexes,
        })
    }

    fn write_payload<W: Write>(&self, writer: &mut W, _version: u32) -> MessageResult<usize> {
        let mut len = self.block_hash.write_to(writer).map_err(SerError::from)?;
        len += <Self as ByteFormat>::write_compact_int(writer, self.indexes.len() as u64)?;
        for index in &self.indexes {
            len += <Self as ByteFormat>::write_compact_int(writer, *index)?;
        }
        Ok(len)
    }
}

impl ByteFormat for GetBlockTransactions {
    type Error = MessageError;

    fn serialized_length(&self) -> usize {
        let mut len = 32;
        len += keel_core::ser::prefix_byte_len(self.indexes.len() as u64) as usize;
        len += self
            .indexes
            .iter()
            .map(|index| keel_core::ser::prefix_byte_len(*index) as usize)
            .sum::<usize>();
        len
    }

    fn read_from<R>(reader: &mut R, _limit: usize) -> MessageResult<Self>
    where
        R: Read,
        Self: std::marker::Sized,
    {
        Self::read_payload(reader, 0)
    }

    fn write_to<W>(&self, writer: &mut W) -> MessageResult<usize>
    where
        W: Write,
    {
        self.write_payload(writer, 0)
    }
}

/// The `blocktxn` payload: the requested block transactions.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct BlockTransactions {
    /// The block being reconstructed.
    pub block_hash: BlockHash,
    /// The requested transactions, in request order.
    pub transactions: Vec<Transaction>,
}

impl Payload for BlockTransactions {
    const COMMAND: &'static str = "blocktxn";

    fn read_payload<R: Read>(reader: &mut R, _version: u32) -> MessageResult<Self> {
        Ok(BlockTransactions {
            block_hash: BlockHash::read_from(reader, 0)?,
            transactions: <Self as ByteFormat>::read_prefix_vec(reader)?,
        })
    }

    fn write_payload<W: Write>(&self, writer: &mut W, _version: u32) -> MessageResult<usize> {
        let mut len = self.block_hash.write_to(writer).map_err(SerError::from)?;
        len += <Self as ByteFormat>::write_prefix_vec(writer, &self.transactions)?;
        Ok(len)
    }
}

impl ByteFormat for BlockTransactions {
    type Error = MessageError;

    fn serialized_length(&self) -> usize {
        let mut len = 32;
        len += keel_core::ser::prefix_byte_len(self.transactions.len() as u64) as usize;
        len += self
            .transactions
            .iter()
            .map(ByteFormat::serialized_length)
            .sum::<usize>();
        len
    }

    fn read_from<R>(reader: &mut R, _limit: usize) -> MessageResult<Self>
    where
        R: Read,
        Self: std::marker::Sized,
    {
        Self::read_payload(reader, 0)
    }

    fn write_to<W>(&self, writer: &mut W) -> MessageResult<usize>
    where
        W: Write,
    {
        self.write_payload(writer, 0)
    }
}
