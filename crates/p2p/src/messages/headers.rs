//! The `headers` payload.

use std::io::{Read, Write};

use keel_chain::types::Header;
use keel_core::ser::{ByteFormat, SerError};

use crate::envelope::{MessageError, MessageResult, Payload};

/// The `headers` payload: each header is followed by a transaction count
/// varint, always zero in practice (the structure predates header-only
/// sync).
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Headers {
    /// The announced headers.
    pub headers: Vec<Header>,
}

impl Headers {
    /// A payload from a vector of headers.
    pub fn new(headers: Vec<Header>) -> Self {
        Headers { headers }
    }
}

impl Payload for Headers {
    const COMMAND: &'static str = "headers";

    fn read_payload<R: Read>(reader: &mut R, _version: u32) -> MessageResult<Self> {
        let count = <Self as ByteFormat>::read_compact_int(reader)?;
        let mut headers = Vec::new();
        for _ in 0..count {
            headers.push(Header::read_from(reader, 0)?);
            // The trailing per-header transaction count, discarded.
            <Self as ByteFormat>::read_compact_int(reader)?;
        }
        Ok(Headers { headers })
    }

    fn write_payload<W: Write>(&self, writer: &mut W, _version: u32) -> MessageResult<usize> {
        let mut len =
            <Self as ByteFormat>::write_compact_int(writer, self.headers.len() as u64)?;
        for header in &self.headers {
            len += header.write_to(writer).map_err(SerError::from)?;
            len += <Self as ByteFormat>::write_compact_int(writer, 0)?;
        }
        Ok(len)
    }
}

impl ByteFormat for Headers {
    type Error = MessageError;

    fn serialized_length(&self) -> usize {
        let mut len = keel_core::ser::prefix_byte_len(self.headers.len() as u64) as usize;
        len += self.headers.len() * 81;
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
