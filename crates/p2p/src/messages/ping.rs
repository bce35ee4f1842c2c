//! `ping` and `pong` keepalives.

use std::io::{Read, Write};

use keel_core::ser::ByteFormat;

use crate::{
    envelope::{MessageError, MessageResult, Payload},
    min_version,
};

/// A keepalive probe. The nonce exists from BIP31 on; earlier protocol
/// versions serialize an empty payload (and have no pong at all).
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct Ping {
    /// The nonce the pong must echo.
    pub nonce: u64,
}

/// The BIP31 keepalive reply.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct Pong {
    /// The echoed ping nonce.
    pub nonce: u64,
}

impl Payload for Ping {
    const COMMAND: &'static str = "ping";

    fn read_payload<R: Read>(reader: &mut R, version: u32) -> MessageResult<Self> {
        let nonce = if version >= min_version::NONCED_PING {
            <Self as ByteFormat>::read_u64_le(reader)?
        } else {
            0
        };
        Ok(Ping { nonce })
    }

    fn write_payload<W: Write>(&self, writer: &mut W, version: u32) -> MessageResult<usize> {
        if version >= min_version::NONCED_PING {
            <Self as ByteFormat>::write_u64_le(writer, self.nonce)
        } else {
            Ok(0)
        }
    }
}

impl Payload for Pong {
    const COMMAND: &'static str = "pong";

    fn read_payload<R: Read>(reader: &mut R, _version: u32) -> MessageResult<Self> {
        Ok(Pong {
            nonce: <Self as ByteFormat>::read_u64_le(reader)?,
        })
    }

    fn write_payload<W: Write>(&self, writer: &mut W, _version: u32) -> MessageResult<usize> {
        <Self as ByteFormat>::write_u64_le(writer, self.nonce)
    }
}

// The ByteFormat impls exist to borrow the integer helpers; the payload
// trait is the codec surface.
macro_rules! nonce_byte_format {
    ($name:ident) => {
        impl ByteFormat for $name {
            type Error = MessageError;

            fn serialized_length(&self) -> usize {
                8
            }

            fn read_from<R>(reader: &mut R, _limit: usize) -> MessageResult<Self>
            where
                R: Read,
                Self: std::marker::Sized,
            {
                Ok($name {
                    nonce: Self::read_u64_le(reader)?,
                })
            }

            fn write_to<W>(&self, writer: &mut W) -> MessageResult<usize>
            where
                W: Write,
            {
                Self::write_u64_le(writer, self.nonce)
            }
        }
    };
}

nonce_byte_format!(Ping);
nonce_byte_format!(Pong);
