//! Small control payloads: the empty acknowledgements and the one-field
//! settings messages.

use std::io::{Read, Write};

use keel_core::ser::ByteFormat;

use crate::envelope::{MessageError, MessageResult, Payload};

macro_rules! empty_payload {
    (
        $(#[$outer:meta])*
        $name:ident, $command:literal
    ) => {
        $(#[$outer])*
        #[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
        pub struct $name;

        impl Payload for $name {
            const COMMAND: &'static str = $command;

            fn read_payload<R: Read>(_reader: &mut R, _version: u32) -> MessageResult<Self> {
                Ok($name)
            }

            fn write_payload<W: Write>(
                &self,
                _writer: &mut W,
                _version: u32,
            ) -> MessageResult<usize> {
                Ok(0)
            }
        }
    };
}

empty_payload!(
    /// Acknowledge a version handshake.
    Verack,
    "verack"
);
empty_payload!(
    /// Request the peer's mempool contents (BIP35).
    Mempool,
    "mempool"
);
empty_payload!(
    /// Ask the peer to announce blocks by header (BIP130).
    SendHeaders,
    "sendheaders"
);

/// The BIP133 fee filter: do not announce transactions paying below this
/// feerate (satoshi per kilobyte).
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct FeeFilter {
    /// Minimum feerate, satoshi per kilobyte.
    pub min_fee_rate: u64,
}

impl Payload for FeeFilter {
    const COMMAND: &'static str = "feefilter";

    fn read_payload<R: Read>(reader: &mut R, _version: u32) -> MessageResult<Self> {
        Ok(FeeFilter {
            min_fee_rate: <Self as ByteFormat>::read_u64_le(reader)?,
        })
    }

    fn write_payload<W: Write>(&self, writer: &mut W, _version: u32) -> MessageResult<usize> {
        <Self as ByteFormat>::write_u64_le(writer, self.min_fee_rate)
    }
}

impl ByteFormat for FeeFilter {
    type Error = MessageError;

    fn serialized_length(&self) -> usize {
        8
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

/// BIP152 compact-block negotiation: announce mode and supported
/// compact-block version.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct SendCompact {
    /// High-bandwidth mode: push compact blocks unsolicited.
    pub high_bandwidth: bool,
    /// The compact block protocol version (1, or 2 with witnesses).
    pub version: u64,
}

impl Payload for SendCompact {
    const COMMAND: &'static str = "sendcmpct";

    fn read_payload<R: Read>(reader: &mut R, _version: u32) -> MessageResult<Self> {
        Ok(SendCompact {
            high_bandwidth: <Self as ByteFormat>::read_u8(reader)? != 0,
            version: <Self as ByteFormat>::read_u64_le(reader)?,
        })
    }

    fn write_payload<W: Write>(&self, writer: &mut W, _version: u32) -> MessageResult<usize> {
        let mut len = <Self as ByteFormat>::write_u8(writer, self.high_bandwidth as u8)?;
        len += <Self as ByteFormat>::write_u64_le(writer, self.version)?;
        Ok(len)
    }
}

impl ByteFormat for SendCompact {
    type Error = MessageError;

    fn serialized_length(&self) -> usize {
        9
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
