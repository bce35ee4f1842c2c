//! The BIP61 `reject` payload.

use std::io::{Read, Write};

use keel_core::ser::ByteFormat;
use keel_hashes::Hash256Digest;

use crate::envelope::{MessageError, MessageResult, Payload};

/// The single-byte rejection reason taxonomy.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum RejectCode {
    /// No reason given. Not produced by well-behaved peers.
    Undefined,
    /// The message could not be decoded.
    Malformed,
    /// The object failed consensus validation.
    Invalid,
    /// The protocol version or message is obsolete.
    Obsolete,
    /// The object duplicates one already seen.
    Duplicate,
    /// The transaction is nonstandard by policy.
    Nonstandard,
    /// An output is below the dust threshold.
    Dust,
    /// The fee does not meet the relay minimum.
    InsufficientFee,
    /// The block conflicts with a checkpoint.
    Checkpoint,
}

impl RejectCode {
    /// The wire byte.
    pub fn to_u8(self) -> u8 {
        match self {
            RejectCode::Undefined => 0x00,
            RejectCode::Malformed => 0x01,
            RejectCode::Invalid => 0x10,
            RejectCode::Obsolete => 0x11,
            RejectCode::Duplicate => 0x12,
            RejectCode::Nonstandard => 0x40,
            RejectCode::Dust => 0x41,
            RejectCode::InsufficientFee => 0x42,
            RejectCode::Checkpoint => 0x43,
        }
    }

    /// Decode a wire byte. Unknown values map to `Undefined`.
    pub fn from_u8(byte: u8) -> RejectCode {
        match byte {
            0x01 => RejectCode::Malformed,
            0x10 => RejectCode::Invalid,
            0x11 => RejectCode::Obsolete,
            0x12 => RejectCode::Duplicate,
            0x40 => RejectCode::Nonstandard,
            0x41 => RejectCode::Dust,
            0x42 => RejectCode::InsufficientFee,
            0x43 => RejectCode::Checkpoint,
            _ => RejectCode::Undefined,
        }
    }
}

/// The `reject` payload: the rejected command, a reason code, free text,
/// and (for `block` and `tx` rejections) the object hash.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Reject {
    /// The command of the rejected message.
    pub message: String,
    /// The reason taxonomy byte.
    pub code: RejectCode,
    /// Free-form reason text.
    pub reason: String,
    /// The rejected object's hash, for block and tx rejections.
    pub hash: Option<Hash256Digest>,
}

impl Reject {
    /// True when the rejected command carries an object hash.
    fn carries_hash(message: &str) -> bool {
        message == "block" || message == "tx"
    }
}

impl Payload for Reject {
    const COMMAND: &'static str = "reject";

    fn read_payload<R: Read>(reader: &mut R, _version: u32) -> MessageResult<Self> {
        let message = <Self as ByteFormat>::read_string(reader)?;
        let code = RejectCode::from_u8(<Self as ByteFormat>::read_u8(reader)?);
        let reason = <Self as ByteFormat>::read_string(reader)?;
        let hash = if Self::carries_hash(&message) {
            Some(<Hash256Digest as ByteFormat>::read_from(reader, 0)?)
        } else {
            None
        };
        Ok(Reject {
            message,
            code,
            reason,
            hash,
        })
    }

    fn write_payload<W: Write>(&self, writer: &mut W, _version: u32) -> MessageResult<usize> {
        let mut len = <Self as ByteFormat>::write_string(writer, &self.message)?;
        len += <Self as ByteFormat>::write_u8(writer, self.code.to_u8())?;
        len += <Self as ByteFormat>::write_string(writer, &self.reason)?;
        if let Some(hash) = &self.hash {
            len += hash.write_to(writer)?;
        }
        Ok(len)
    }
}

impl ByteFormat for Reject {
    type Error = MessageError;

    fn serialized_length(&self) -> usize {
        let mut len = keel_core::ser::prefix_byte_len(self.message.len() as u64) as usize;
        len += self.message.len();
        len += 1;
        len += keel_core::ser::prefix_byte_len(self.reason.len() as u64) as usize;
        len += self.reason.len();
        if self.hash.is_some() {
            len += 32;
        }
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
