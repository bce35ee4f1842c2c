//! Blocks: a header plus ordered transactions.

use std::io::{Read, Write};

use keel_core::ser::ByteFormat;
use keel_hashes::{merkle_root, Hash256Digest, MarkedDigest};

use crate::{
    hashes::BlockHash,
    types::{
        header::Header,
        transactions::{Transaction, TxError, TxResult},
    },
};

/// A block: header plus transactions. The merkle root is computed over
/// the transaction ids (non-witness) in declaration order.
#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, Eq, PartialEq, Default)]
pub struct Block {
    /// The block header.
    pub header: Header,
    /// The ordered transactions, coinbase first.
    pub transactions: Vec<Transaction>,
}

impl Block {
    /// Instantiate a new block from parts.
    pub fn new(header: Header, transactions: Vec<Transaction>) -> Self {
        Block {
            header,
            transactions,
        }
    }

    /// The header's block hash.
    pub fn hash(&self) -> BlockHash {
        self.header.hash()
    }

    /// Compute the merkle root of the transaction ids.
    pub fn generate_merkle_root(&self) -> Hash256Digest {
        let txids = self
            .transactions
            .iter()
            .map(|tx| tx.txid().internal())
            .collect();
        merkle_root(txids)
    }

    /// True when the header commits to the computed merkle root.
    pub fn is_valid_merkle_root(&self) -> bool {
        self.header.merkle_root == self.generate_merkle_root()
    }

    /// True when the first transaction (and only the first) is a coinbase.
    pub fn has_coinbase(&self) -> bool {
        self.transactions
            .first()
            .map(Transaction::is_coinbase)
            .unwrap_or(false)
            && self.transactions[1..].iter().all(|tx| !tx.is_coinbase())
    }

    /// The serialized size with or without witness data.
    pub fn serialized_size(&self, witness: bool) -> usize {
        let mut len = self.header.serialized_length();
        len += keel_core::ser::prefix_byte_len(self.transactions.len() as u64) as usize;
        len += self
            .transactions
            .iter()
            .map(|tx| tx.serialized_size(witness))
            .sum::<usize>();
        len
    }
}

impl ByteFormat for Block {
    type Error = TxError;

    fn serialized_length(&self) -> usize {
        self.serialized_size(true)
    }

    fn read_from<R>(reader: &mut R, _limit: usize) -> TxResult<Self>
    where
        R: Read,
        Self: std::marker::Sized,
    {
        let header = Header::read_from(reader, 0)?;
        let transactions = Self::read_prefix_vec(reader)?;
        Ok(Block {
            header,
            transactions,
        })
    }

    fn write_to<W>(&self, writer: &mut W) -> TxResult<usize>
    where
        W: Write,
    {
        let mut len = self.header.write_to(writer)?;
        len += Self::write_prefix_vec(writer, &self.transactions)?;
        Ok(len)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    // The mainnet genesis block.
    const GENESIS: &str = "0100000000000000000000000000000000000000000000000000000000000000000000003ba3edfd7a7b12b27ac72c3e67768f617fc81bc3888a51323a9fb8aa4b1e5e4a29ab5f49ffff001d1dac2b7c0101000000010000000000000000000000000000000000000000000000000000000000000000ffffffff4d04ffff001d0104455468652054696d65732030332f4a616e2f32303039204368616e63656c6c6f72206f6e206272696e6b206f66207365636f6e64206261696c6f757420666f722062616e6b73ffffffff0100f2052a01000000434104678afdb0fe5548271967f1a67130b7105cd6a828e03909a67962e0ea1f61deb649f6bc3f4cef38c4f35504e51ec112de5c384df7ba0b8d578a4c702b6bf11d5fac00000000";

    #[test]
    fn it_round_trips_the_genesis_block() {
        let block = Block::deserialize_hex(GENESIS).unwrap();
        assert_eq!(block.serialize_hex(), GENESIS);
        assert_eq!(block.serialized_size(true), GENESIS.len() / 2);
        assert_eq!(block.transactions.len(), 1);
        assert!(block.transactions[0].is_coinbase());
        assert!(block.has_coinbase());
    }

    #[test]
    fn it_validates_the_genesis_merkle_root() {
        let block = Block::deserialize_hex(GENESIS).unwrap();

        // A single transaction is its own merkle root.
        assert!(block.is_valid_merkle_root());
        assert_eq!(
            block.generate_merkle_root(),
            block.transactions[0].txid().internal()
        );
        assert_eq!(
            block.transactions[0].txid().to_be_hex(),
            "4a5e1e4baab89f3a32518a88c31bc87f618f76673e2cc77ab2127b7afdeda33b"
        );
    }

    #[test]
    fn it_hashes_the_genesis_block() {
        let block = Block::deserialize_hex(GENESIS).unwrap();
        assert_eq!(
            block.hash().to_be_hex(),
            "000000000019d6689c085ae165831e934ff763ae46a2a6c172b3f1b60a8ce26f"
        );
    }

    #[test]
    fn it_detects_merkle_mismatches() {
        let mut block = Block::deserialize_hex(GENESIS).unwrap();
        block.header.merkle_root[0] ^= 1;
        assert!(!block.is_valid_merkle_root());
    }
}
