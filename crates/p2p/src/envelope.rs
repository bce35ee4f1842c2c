//! The message envelope: framing, commands, and checksums.

use std::{
    fmt,
    io::{Cursor, Error as IOError, Read, Write},
};

use thiserror::Error;

use keel_chain::types::TxError;
use keel_core::ser::{ByteFormat, SerError, SerResult};
use keel_hashes::hash256;

/// The fixed width of the command field.
pub const COMMAND_SIZE: usize = 12;

/// Errors related to message framing and payload codecs.
#[derive(Debug, Error)]
pub enum MessageError {
    /// Serialization-related errors.
    #[error(transparent)]
    SerError(#[from] SerError),

    /// IOError bubbled up from a `Read` or `Write`.
    #[error(transparent)]
    IOError(#[from] IOError),

    /// A chain object embedded in a payload failed to (de)serialize.
    #[error(transparent)]
    TxError(#[from] TxError),

    /// The envelope checksum did not match its payload.
    #[error("bad payload checksum: expected {expected:02x?}, got {got:02x?}")]
    BadChecksum {
        /// The checksum computed over the payload.
        expected: [u8; 4],
        /// The checksum carried by the envelope.
        got: [u8; 4],
    },

    /// A command field held bytes after its NUL padding began, or was not
    /// ascii.
    #[error("malformed command field")]
    BadCommand,

    /// Opened an envelope against the wrong payload type.
    #[error("wrong command: expected {expected}, got {got}")]
    WrongCommand {
        /// The command of the requested payload type.
        expected: String,
        /// The command carried by the envelope.
        got: String,
    },

    /// A payload deserializer left bytes unconsumed.
    #[error("{0} trailing payload bytes")]
    TrailingBytes(usize),
}

/// Type alias for result with MessageError.
pub type MessageResult<T> = Result<T, MessageError>;

/// A payload codec, parameterized by the negotiated protocol version.
pub trait Payload: Sized {
    /// The payload's wire command string.
    const COMMAND: &'static str;

    /// Deserialize the payload under the given protocol version.
    fn read_payload<R: Read>(reader: &mut R, version: u32) -> MessageResult<Self>;

    /// Serialize the payload under the given protocol version.
    fn write_payload<W: Write>(&self, writer: &mut W, version: u32) -> MessageResult<usize>;

    /// The payload's command field.
    fn command() -> Command {
        Command::from_str(Self::COMMAND).expect("payload commands fit the command field")
    }
}

/// A 12-byte, NUL-padded ascii command name.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct Command([u8; COMMAND_SIZE]);

impl Command {
    /// Build a command from an ascii string of at most twelve bytes.
    pub fn from_str(name: &str) -> MessageResult<Command> {
        if name.len() > COMMAND_SIZE || !name.bytes().all(|b| b.is_ascii() && b != 0) {
            return Err(MessageError::BadCommand);
        }
        let mut bytes = [0u8; COMMAND_SIZE];
        bytes[..name.len()].copy_from_slice(name.as_bytes());
        Ok(Command(bytes))
    }

    /// The command as a string slice.
    pub fn as_str(&self) -> &str {
        let end = self.0.iter().position(|&b| b == 0).unwrap_or(COMMAND_SIZE);
        // Construction and parsing both enforce ascii.
        std::str::from_utf8(&self.0[..end]).unwrap_or("")
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Command({})", self.as_str())
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ByteFormat for Command {
    type Error = SerError;

    fn serialized_length(&self) -> usize {
        COMMAND_SIZE
    }

    fn read_from<R>(reader: &mut R, _limit: usize) -> SerResult<Self>
    where
        R: Read,
        Self: std::marker::Sized,
    {
        let mut bytes = [0u8; COMMAND_SIZE];
        reader.read_exact(&mut bytes)?;
        Ok(Command(bytes))
    }

    fn write_to<W>(&self, writer: &mut W) -> SerResult<usize>
    where
        W: Write,
    {
        Ok(writer.write(&self.0)?)
    }
}

/// A framed message: magic, command, and the raw payload bytes. The
/// length and checksum fields are derived on write and verified on read.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Envelope {
    /// The network wire magic.
    pub magic: u32,
    /// The payload's command.
    pub command: Command,
    /// The serialized payload.
    pub payload: Vec<u8>,
}

impl Envelope {
    /// The payload checksum: the first four bytes of the payload's
    /// double-SHA-256.
    pub fn checksum(payload: &[u8]) -> [u8; 4] {
        let digest = hash256(payload);
        let mut out = [0u8; 4];
        out.copy_from_slice(&digest[..4]);
        out
    }

    /// Frame a payload under the given magic and protocol version.
    pub fn seal<P: Payload>(magic: u32, version: u32, payload: &P) -> MessageResult<Envelope> {
        let mut bytes = vec![];
        payload.write_payload(&mut bytes, version)?;
        Ok(Envelope {
            magic,
            command: P::command(),
            payload: bytes,
        })
    }

    /// Unframe a payload, checking the command and requiring the payload
    /// to be fully consumed.
    pub fn open<P: Payload>(&self, version: u32) -> MessageResult<P> {
        if self.command != P::command() {
            return Err(MessageError::WrongCommand {
                expected: P::COMMAND.to_owned(),
                got: self.command.to_string(),
            });
        }
        let mut cursor = Cursor::new(&self.payload);
        let payload = P::read_payload(&mut cursor, version)?;
        let consumed = cursor.position() as usize;
        if consumed != self.payload.len() {
            return Err(MessageError::TrailingBytes(self.payload.len() - consumed));
        }
        Ok(payload)
    }
}

impl ByteFormat for Envelope {
    type Error = MessageError;

    fn serialized_length(&self) -> usize {
        4 + COMMAND_SIZE + 4 + 4 + self.payload.len()
    }

    fn read_from<R>(reader: &mut R, _limit: usize) -> MessageResult<Self>
    where
        R: Read,
        Self: std::marker::Sized,
    {
        let magic = Self::read_u32_le(reader)?;
        let command = Command::read_from(reader, 0)?;
        let length = Self::read_u32_le(reader)?;
        let mut checksum = [0u8; 4];
        reader.read_exact(&mut checksum)?;

        let mut payload = vec![0u8; length as usize];
        reader.read_exact(&mut payload)?;

        let expected = Self::checksum(&payload);
        if expected != checksum {
            return Err(MessageError::BadChecksum {
                expected,
                got: checksum,
            });
        }

        Ok(Envelope {
            magic,
            command,
            payload,
        })
    }

    fn write_to<W>(&self, writer: &mut W) -> MessageResult<usize>
    where
        W: Write,
    {
        let mut len = Self::write_u32_le(writer, self.magic)?;
        len += self.command.write_to(writer)?;
        len += Self::write_u32_le(writer, self.payload.len() as u32)?;
        len += writer.write(&Self::checksum(&self.payload))?;
        len += writer.write(&self.payload)?;
        Ok(len)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{messages::Verack, MAINNET_MAGIC, PROTOCOL_VERSION};

    #[test]
    fn it_builds_and_prints_commands() {
        let command = Command::from_str("verack").unwrap();
        assert_eq!(command.as_str(), "verack");
        assert_eq!(command.to_string(), "verack");
        assert_eq!(command.serialized_length(), COMMAND_SIZE);
        assert_eq!(command.serialize_hex(), "76657261636b000000000000");

        assert!(Command::from_str("much-too-long-name").is_err());
        assert!(Command::from_str("nul\0byte").is_err());
    }

    #[test]
    fn it_frames_an_empty_payload() {
        // The canonical mainnet verack frame, with the empty-payload
        // checksum 5df6e0e2.
        let envelope = Envelope::seal(MAINNET_MAGIC, PROTOCOL_VERSION, &Verack).unwrap();
        assert_eq!(
            envelope.serialize_hex(),
            "f9beb4d976657261636b000000000000000000005df6e0e2"
        );
        let opened: Verack = envelope.open(PROTOCOL_VERSION).unwrap();
        assert_eq!(opened, Verack);
    }

    #[test]
    fn it_round_trips_well_formed_frames() {
        let hex_frame = "f9beb4d976657261636b000000000000000000005df6e0e2";
        let envelope = Envelope::deserialize_hex(hex_frame).unwrap();
        assert_eq!(envelope.magic, MAINNET_MAGIC);
        assert_eq!(envelope.command.as_str(), "verack");
        assert!(envelope.payload.is_empty());
        assert_eq!(envelope.serialize_hex(), hex_frame);
    }

    #[test]
    fn it_rejects_bad_checksums() {
        let hex_frame = "f9beb4d976657261636b000000000000000000005df6e0e3";
        match Envelope::deserialize_hex(hex_frame) {
            Err(MessageError::BadChecksum { .. }) => {}
            other => panic!("expected BadChecksum, got {:?}", other),
        }
    }

    #[test]
    fn it_rejects_wrong_commands_and_trailing_bytes() {
        let envelope = Envelope {
            magic: MAINNET_MAGIC,
            command: Command::from_str("ping").unwrap(),
            payload: vec![],
        };
        match envelope.open::<Verack>(PROTOCOL_VERSION) {
            Err(MessageError::WrongCommand { .. }) => {}
            other => panic!("expected WrongCommand, got {:?}", other),
        }

        let envelope = Envelope {
            magic: MAINNET_MAGIC,
            command: Command::from_str("verack").unwrap(),
            payload: vec![0xff],
        };
        match envelope.open::<Verack>(PROTOCOL_VERSION) {
            Err(MessageError::TrailingBytes(1)) => {}
            other => panic!("expected TrailingBytes, got {:?}", other),
        }
    }
}
