//! The `version` handshake payload and its network-address field.

use std::io::{ErrorKind, Read, Write};

use keel_core::ser::{ByteFormat, SerError, SerResult};

use crate::{
    envelope::{MessageError, MessageResult, Payload},
    min_version,
};

/// A services-ip-port triple. The `addr` message prepends a timestamp;
/// the version handshake does not.
#[derive(serde::Serialize, serde::Deserialize, Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct NetworkAddress {
    /// The advertised service bits.
    pub services: u64,
    /// The ipv6 (or v4-mapped) address.
    pub ip: [u8; 16],
    /// The port, serialized big-endian.
    pub port: u16,
}

impl NetworkAddress {
    /// An address from a v4-mapped ipv4 quad.
    pub fn from_ipv4(services: u64, octets: [u8; 4], port: u16) -> Self {
        let mut ip = [0u8; 16];
        ip[10] = 0xff;
        ip[11] = 0xff;
        ip[12..].copy_from_slice(&octets);
        NetworkAddress { services, ip, port }
    }
}

impl ByteFormat for NetworkAddress {
    type Error = SerError;

    fn serialized_length(&self) -> usize {
        26
    }

    fn read_from<R>(reader: &mut R, _limit: usize) -> SerResult<Self>
    where
        R: Read,
        Self: std::marker::Sized,
    {
        Ok(NetworkAddress {
            services: Self::read_u64_le(reader)?,
            ip: <[u8; 16] as ByteFormat>::read_from(reader, 0)?,
            port: Self::read_u16_be(reader)?,
        })
    }

    fn write_to<W>(&self, writer: &mut W) -> SerResult<usize>
    where
        W: Write,
    {
        let mut len = Self::write_u64_le(writer, self.services)?;
        len += self.ip.write_to(writer)?;
        len += Self::write_u16_be(writer, self.port)?;
        Ok(len)
    }
}

/// The `version` payload.
///
/// The relay flag (BIP37) serializes only when the message's own version
/// field reaches the relay era; a missing byte on the wire means relay.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Version {
    /// The sender's highest protocol version.
    pub version: u32,
    /// The sender's service bits.
    pub services: u64,
    /// The sender's unix timestamp.
    pub timestamp: i64,
    /// The receiving peer's address as seen by the sender.
    pub receiver: NetworkAddress,
    /// The sender's own address.
    pub sender: NetworkAddress,
    /// Random nonce for self-connection detection.
    pub nonce: u64,
    /// The sender's user agent string.
    pub user_agent: String,
    /// The sender's best block height.
    pub start_height: u32,
    /// BIP37: whether the peer should relay transactions unfiltered.
    pub relay: bool,
}

impl Payload for Version {
    const COMMAND: &'static str = "version";

    fn read_payload<R: Read>(reader: &mut R, _version: u32) -> MessageResult<Self> {
        Self::read_from(reader, 0)
    }

    fn write_payload<W: Write>(&self, writer: &mut W, _version: u32) -> MessageResult<usize> {
        self.write_to(writer)
    }
}

impl ByteFormat for Version {
    type Error = MessageError;

    fn serialized_length(&self) -> usize {
        let mut len = 4 + 8 + 8 + 26 + 26 + 8 + 4;
        len += keel_core::ser::prefix_byte_len(self.user_agent.len() as u64) as usize;
        len += self.user_agent.len();
        if self.version >= min_version::RELAY {
            len += 1;
        }
        len
    }

    fn read_from<R>(reader: &mut R, _limit: usize) -> MessageResult<Self>
    where
        R: Read,
        Self: std::marker::Sized,
    {
        let version = Self::read_u32_le(reader)?;
        let services = Self::read_u64_le(reader)?;
        let timestamp = Self::read_u64_le(reader)? as i64;
        let receiver = NetworkAddress::read_from(reader, 0)?;
        let sender = NetworkAddress::read_from(reader, 0)?;
        let nonce = Self::read_u64_le(reader)?;
        let user_agent = Self::read_string(reader)?;
        let start_height = Self::read_u32_le(reader)?;

        let relay = if version >= min_version::RELAY {
            let mut byte = [0u8; 1];
            match reader.read_exact(&mut byte) {
                Ok(()) => byte[0] != 0,
                // An absent relay byte means relay.
                Err(error) if error.kind() == ErrorKind::UnexpectedEof => true,
                Err(error) => return Err(error.into()),
            }
        } else {
            true
        };

        Ok(Version {
            version,
            services,
            timestamp,
            receiver,
            sender,
            nonce,
            user_agent,
            start_height,
            relay,
        })
    }

    fn write_to<W>(&self, writer: &mut W) -> MessageResult<usize>
    where
        W: Write,
    {
        let mut len = Self::write_u32_le(writer, self.version)?;
        len += Self::write_u64_le(writer, self.services)?;
        len += Self::write_u64_le(writer, self.timestamp as u64)?;
        len += self.receiver.write_to(writer)?;
        len += self.sender.write_to(writer)?;
        len += Self::write_u64_le(writer, self.nonce)?;
        len += Self::write_string(writer, &self.user_agent)?;
        len += Self::write_u32_le(writer, self.start_height)?;
        if self.version >= min_version::RELAY {
            len += Self::write_u8(writer, self.relay as u8)?;
        }
        Ok(len)
    }
}
