//! The `getblocks` and `getheaders` locator payloads.

use std::io::{Read, Write};

use keel_chain::hashes::BlockHash;
use keel_core::ser::ByteFormat;

use crate::envelope::{MessageError, MessageResult, Payload};

macro_rules! locator_payload {
    (
        $(#[$outer:meta])*
        $name:ident, $command:literal
    ) => {
        $(#[$outer])*
        #[derive(Clone, Debug, Default, Eq, PartialEq)]
        pub struct $name {
            /// The sender's protocol version.
            pub version: u32,
            /// Block hashes sampling the sender's main chain, newest
            /// first with exponentially increasing gaps.
            pub locator: Vec<BlockHash>,
            /// Stop at this hash, or continue to the response limit when
            /// zero.
            pub stop: BlockHash,
        }

        impl $name {
            /// Assemble a locator request.
            pub fn new(version: u32, locator: Vec<BlockHash>, stop: BlockHash) -> Self {
                Self {
                    version,
                    locator,
                    stop,
                }
            }
        }

        impl Payload for $name {
            const COMMAND: &'static str = $command;

            fn read_payload<R: Read>(reader: &mut R, _version: u32) -> MessageResult<Self> {
                Ok(Self {
                    version: <Self as ByteFormat>::read_u32_le(reader)?,
                    locator: <Self as ByteFormat>::read_prefix_vec(reader)?,
                    stop: BlockHash::read_from(reader, 0)?,
                })
            }

            fn write_payload<W: Write>(
                &self,
                writer: &mut W,
                _version: u32,
            ) -> MessageResult<usize> {
                let mut len = <Self as ByteFormat>::write_u32_le(writer, self.version)?;
                len += <Self as ByteFormat>::write_prefix_vec(writer, &self.locator)?;
                len += self.stop.write_to(writer)?;
                Ok(len)
            }
        }

        impl ByteFormat for $name {
            type Error = MessageError;

            fn serialized_length(&self) -> usize {
                let mut len = 4;
                len += keel_core::ser::prefix_byte_len(self.locator.len() as u64) as usize;
                len += self.locator.serialized_length();
                len += 32;
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
    };
}

locator_payload!(
    /// Request block inventory along a chain locator.
    GetBlocks,
    "getblocks"
);
locator_payload!(
    /// Request headers along a chain locator (BIP130-era sync).
    GetHeaders,
    "getheaders"
);

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn it_round_trips_locator_payloads() {
        let request = GetHeaders::new(
            70015,
            vec![BlockHash::from([0x11; 32]), BlockHash::from([0x22; 32])],
            BlockHash::default(),
        );
        let hex_form = request.serialize_hex();
        assert_eq!(request.serialized_length(), hex_form.len() / 2);
        assert_eq!(request.serialized_length(), 4 + 1 + 64 + 32);
        assert_eq!(GetHeaders::deserialize_hex(&hex_form).unwrap(), request);

        assert!(hex_form.starts_with("7f110100")); // 70015 LE
        assert_eq!(GetBlocks::COMMAND, "getblocks");
    }
}
