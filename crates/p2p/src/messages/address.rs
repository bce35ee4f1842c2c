//! The `addr` gossip payload.

use std::io::{Read, Write};

use keel_core::ser::{ByteFormat, SerError, SerResult};

use crate::{
    envelope::{MessageError, MessageResult, Payload},
};
pub use crate::messages::version::NetworkAddress;

/// A gossiped address with its last-seen timestamp. The timestamp field
/// has accompanied addresses since protocol 31402; this codec's floor is
/// above that, so it is always present.
#[derive(serde::Serialize, serde::Deserialize, Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct AddressEntry {
    /// Last-seen unix time, seconds.
    pub timestamp: u32,
    /// The peer address.
    pub address: NetworkAddress,
}

impl ByteFormat for AddressEntry {
    type Error = SerError;

    fn serialized_length(&self) -> usize {
        4 + self.address.serialized_length()
    }

    fn read_from<R>(reader: &mut R, _limit: usize) -> SerResult<Self>
    where
        R: Read,
        Self: std::marker::Sized,
    {
        Ok(AddressEntry {
            timestamp: Self::read_u32_le(reader)?,
            address: NetworkAddress::read_from(reader, 0)?,
        })
    }

    fn write_to<W>(&self, writer: &mut W) -> SerResult<usize>
    where
        W: Write,
    {
        let mut len = Self::write_u32_le(writer, self.timestamp)?;
        len += self.address.write_to(writer)?;
        Ok(len)
    }
}

/// The `addr` payload: a prefixed vector of timestamped addresses.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Addr {
    /// The gossiped addresses.
    pub addresses: Vec<AddressEntry>,
}

impl Payload for Addr {
    const COMMAND: &'static str = "addr";

    fn read_payload<R: Read>(reader: &mut R, _version: u32) -> MessageResult<Self> {
        Ok(Addr {
            addresses: <Self as ByteFormat>::read_prefix_vec(reader)?,
        })
    }

    fn write_payload<W: Write>(&self, writer: &mut W, _version: u32) -> MessageResult<usize> {
        <Self as ByteFormat>::write_prefix_vec(writer, &self.addresses)
    }
}

impl ByteFormat for Addr {
    type Error = MessageError;

    fn serialized_length(&self) -> usize {
        let mut len = keel_core::ser::prefix_byte_len(self.addresses.len() as u64) as usize;
        len += self.addresses.serialized_length();
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
