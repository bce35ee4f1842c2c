//! Payload impls for the chain data types themselves: `block` and `tx`.
//!
//! Witness inclusion is not gated by protocol version: BIP144 negotiates
//! it through the witness service bit and witness-flagged inventory
//! types, and the serializations are self-describing (the marker byte).
//! A peer that wants the nominal form serializes it explicitly.

use std::io::{Read, Write};

use keel_chain::types::{Block, Transaction};
use keel_core::ser::ByteFormat;

use crate::envelope::{MessageResult, Payload};

impl Payload for Transaction {
    const COMMAND: &'static str = "tx";

    fn read_payload<R: Read>(reader: &mut R, _version: u32) -> MessageResult<Self> {
        Ok(Transaction::read_from(reader, 0)?)
    }

    fn write_payload<W: Write>(&self, writer: &mut W, _version: u32) -> MessageResult<usize> {
        Ok(self.write_to(writer)?)
    }
}

impl Payload for Block {
    const COMMAND: &'static str = "block";

    fn read_payload<R: Read>(reader: &mut R, _version: u32) -> MessageResult<Self> {
        Ok(Block::read_from(reader, 0)?)
    }

    fn write_payload<W: Write>(&self, writer: &mut W, _version: u32) -> MessageResult<usize> {
        Ok(self.write_to(writer)?)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{Envelope, MAINNET_MAGIC, PROTOCOL_VERSION};

    const GENESIS: &str = "0100000000000000000000000000000000000000000000000000000000000000000000003ba3edfd7a7b12b27ac72c3e67768f617fc81bc3888a51323a9fb8aa4b1e5e4a29ab5f49ffff001d1dac2b7c0101000000010000000000000000000000000000000000000000000000000000000000000000ffffffff4d04ffff001d0104455468652054696d65732030332f4a616e2f32303039204368616e63656c6c6f72206f6e206272696e6b206f66207365636f6e64206261696c6f757420666f722062616e6b73ffffffff0100f2052a01000000434104678afdb0fe5548271967f1a67130b7105cd6a828e03909a67962e0ea1f61deb649f6bc3f4cef38c4f35504e51ec112de5c384df7ba0b8d578a4c702b6bf11d5fac00000000";

    #[test]
    fn it_frames_the_genesis_block() {
        let block = Block::deserialize_hex(GENESIS).unwrap();
        let envelope = Envelope::seal(MAINNET_MAGIC, PROTOCOL_VERSION, &block).unwrap();

        assert_eq!(envelope.command.as_str(), "block");
        assert_eq!(hex::encode(&envelope.payload), GENESIS);
        assert_eq!(
            envelope.payload.len(),
            block.serialized_size(true)
        );

        let reopened: Block = envelope.open(PROTOCOL_VERSION).unwrap();
        assert_eq!(reopened, block);

        // The whole frame round-trips.
        let frame_hex = envelope.serialize_hex();
        let reparsed = Envelope::deserialize_hex(&frame_hex).unwrap();
        assert_eq!(reparsed, envelope);
    }

    #[test]
    fn it_frames_transactions() {
        let block = Block::deserialize_hex(GENESIS).unwrap();
        let tx = block.transactions[0].clone();
        let envelope = Envelope::seal(MAINNET_MAGIC, PROTOCOL_VERSION, &tx).unwrap();

        assert_eq!(envelope.command.as_str(), "tx");
        let reopened: Transaction = envelope.open(PROTOCOL_VERSION).unwrap();
        assert_eq!(reopened.txid(), tx.txid());
    }
}
