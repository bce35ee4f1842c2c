//! The script model: parsed operation lists with sticky invalidity.
//!
//! A script parses greedily into operations. A push truncated by the end
//! of the script marks the script invalid, but the consumed bytes are
//! preserved so the on-wire form round-trips exactly. We count sigops and
//! detect output patterns here; stack evaluation belongs to the consensus
//! evaluation layer and is out of scope.

use std::io::{Read, Write};

use keel_core::{
    impl_hex_serde,
    ser::{ByteFormat, SerError, SerResult},
};

use crate::types::opcode::{Opcode, PushLength};

/// Consensus limit on script byte length.
pub const MAX_SCRIPT_SIZE: usize = 10_000;

/// The sigop weight of an unaccompanied `CHECKMULTISIG`.
pub const MULTISIG_DEFAULT_SIGOPS: usize = 20;

/// A single parsed operation: an opcode and the data it pushes.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Operation {
    code: Opcode,
    data: Vec<u8>,
    underflow: bool,
}

impl Operation {
    /// An operation with no pushed data.
    pub fn from_opcode(code: Opcode) -> Operation {
        Operation {
            code,
            data: vec![],
            underflow: false,
        }
    }

    /// The minimal push of `data`. `None` if the payload exceeds the
    /// four-byte push range.
    pub fn push(data: Vec<u8>) -> Option<Operation> {
        let code = Opcode::data_to_opcode(data.len())?;
        Some(Operation {
            code,
            data,
            underflow: false,
        })
    }

    /// An underflow operation: the unparseable remainder of a truncated
    /// script, preserved verbatim for round-trip serialization.
    fn from_underflow(data: Vec<u8>) -> Operation {
        let code = Opcode::from_u8(data[0]);
        Operation {
            code,
            data,
            underflow: true,
        }
    }

    /// The opcode.
    pub fn code(&self) -> Opcode {
        self.code
    }

    /// The pushed data (empty unless the opcode pushes from the stream).
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// True if this operation is the preserved tail of a truncated push.
    pub fn is_underflow(&self) -> bool {
        self.underflow
    }

    /// Serialized byte length within a script.
    pub fn serialized_size(&self) -> usize {
        if self.underflow {
            return self.data.len();
        }
        let prefix = match self.code.push_length() {
            None | Some(PushLength::Direct(_)) => 0,
            Some(PushLength::OneByte) => 1,
            Some(PushLength::TwoBytes) => 2,
            Some(PushLength::FourBytes) => 4,
        };
        1 + prefix + self.data.len()
    }

    fn write_into(&self, buf: &mut Vec<u8>) {
        if self.underflow {
            buf.extend_from_slice(&self.data);
            return;
        }
        buf.push(self.code.to_u8());
        match self.code.push_length() {
            None | Some(PushLength::Direct(_)) => {}
            Some(PushLength::OneByte) => buf.push(self.data.len() as u8),
            Some(PushLength::TwoBytes) => {
                buf.extend_from_slice(&(self.data.len() as u16).to_le_bytes())
            }
            Some(PushLength::FourBytes) => {
                buf.extend_from_slice(&(self.data.len() as u32).to_le_bytes())
            }
        }
        buf.extend_from_slice(&self.data);
    }
}

/// A parsed script.
///
/// `Script::default()` is the empty script. Parsing never fails: a script
/// that ends mid-push keeps its consumed bytes in an underflow operation
/// and reports `is_valid() == false`.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Script {
    ops: Vec<Operation>,
    valid: bool,
}

impl Default for Script {
    fn default() -> Self {
        Script::null()
    }
}

impl Script {
    /// The empty script.
    pub fn null() -> Script {
        Script {
            ops: vec![],
            valid: true,
        }
    }

    /// A script from an operation list.
    pub fn from_ops(ops: Vec<Operation>) -> Script {
        let valid = ops.iter().all(|op| !op.is_underflow());
        Script { ops, valid }
    }

    /// Greedily parse raw (unprefixed) script bytes.
    pub fn from_bytes(bytes: &[u8]) -> Script {
        let mut ops = vec![];
        let mut valid = true;
        let mut cursor = 0usize;

        while cursor < bytes.len() {
            let start = cursor;
            let code = Opcode::from_u8(bytes[cursor]);
            cursor += 1;

            let data_len = match code.push_length() {
                None => 0,
                Some(PushLength::Direct(n)) => n,
                Some(prefixed) => {
                    let width = match prefixed {
                        PushLength::OneByte => 1,
                        PushLength::TwoBytes => 2,
                        PushLength::FourBytes => 4,
                        PushLength::Direct(_) => unreachable!("direct handled above"),
                    };
                    if cursor + width > bytes.len() {
                        ops.push(Operation::from_underflow(bytes[start..].to_vec()));
                        valid = false;
                        break;
                    }
                    let mut len_bytes = [0u8; 4];
                    len_bytes[..width].copy_from_slice(&bytes[cursor..cursor + width]);
                    cursor += width;
                    u32::from_le_bytes(len_bytes) as usize
                }
            };

            if cursor + data_len > bytes.len() {
                ops.push(Operation::from_underflow(bytes[start..].to_vec()));
                valid = false;
                break;
            }

            ops.push(Operation {
                code,
                data: bytes[cursor..cursor + data_len].to_vec(),
                underflow: false,
            });
            cursor += data_len;
        }

        Script { ops, valid }
    }

    /// The parsed operation list.
    pub fn ops(&self) -> &[Operation] {
        &self.ops
    }

    /// False when parsing hit a truncated push. Sticky: the script still
    /// serializes as the bytes it was read from.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// True when the script has no operations.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// The raw (unprefixed) serialization.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.byte_len());
        for op in &self.ops {
            op.write_into(&mut buf);
        }
        buf
    }

    /// Serialization with an optional varint length prefix.
    pub fn to_data(&self, prefixed: bool) -> Vec<u8> {
        let body = self.to_bytes();
        if !prefixed {
            return body;
        }
        let mut buf = Vec::with_capacity(body.len() + 9);
        keel_core::ser::write_compact_int(&mut buf, body.len() as u64)
            .expect("no IOError writing to a Vec");
        buf.extend_from_slice(&body);
        buf
    }

    /// The unprefixed byte length.
    pub fn byte_len(&self) -> usize {
        self.ops.iter().map(Operation::serialized_size).sum()
    }

    /// The serialized size, with or without the varint prefix.
    pub fn serialized_size(&self, prefixed: bool) -> usize {
        let body = self.byte_len();
        if prefixed {
            body + keel_core::ser::prefix_byte_len(body as u64) as usize
        } else {
            body
        }
    }

    /// True if the script exceeds the consensus size limit.
    pub fn is_oversized(&self) -> bool {
        self.byte_len() > MAX_SCRIPT_SIZE
    }

    /// `HASH160 <20 bytes> EQUAL` (BIP16).
    pub fn is_pay_script_hash_pattern(&self) -> bool {
        self.valid
            && self.ops.len() == 3
            && self.ops[0].code() == Opcode::HASH160
            && self.ops[1].code() == Opcode::from_u8(0x14)
            && self.ops[2].code() == Opcode::EQUAL
    }

    /// `DUP HASH160 <20 bytes> EQUAL_VERIFY CHECKSIG`.
    pub fn is_pay_key_hash_pattern(&self) -> bool {
        self.valid
            && self.ops.len() == 5
            && self.ops[0].code() == Opcode::DUP
            && self.ops[1].code() == Opcode::HASH160
            && self.ops[2].code() == Opcode::from_u8(0x14)
            && self.ops[3].code() == Opcode::EQUAL_VERIFY
            && self.ops[4].code() == Opcode::CHECKSIG
    }

    /// `0 <20 bytes>`: a version-zero witness key hash program (BIP141).
    pub fn is_pay_witness_key_hash_pattern(&self) -> bool {
        self.valid
            && self.ops.len() == 2
            && self.ops[0].code() == Opcode::PUSH_SIZE_0
            && self.ops[1].code() == Opcode::from_u8(0x14)
    }

    /// `0 <32 bytes>`: a version-zero witness script hash program (BIP141).
    pub fn is_pay_witness_script_hash_pattern(&self) -> bool {
        self.valid
            && self.ops.len() == 2
            && self.ops[0].code() == Opcode::PUSH_SIZE_0
            && self.ops[1].code() == Opcode::from_u8(0x20)
    }

    /// True when every operation is within the push range (at or below
    /// `PUSH_POSITIVE_16`), the BIP16 input-script requirement.
    pub fn is_relaxed_push_pattern(&self) -> bool {
        self.valid && self.ops.iter().all(|op| op.code().is_relaxed_push())
    }

    /// True when every operation pushes stream data (at or below
    /// `PUSH_FOUR_SIZE`).
    pub fn is_push_only_pattern(&self) -> bool {
        self.valid
            && self
                .ops
                .iter()
                .all(|op| op.code().to_u8() <= Opcode::PUSH_FOUR_SIZE.to_u8())
    }

    /// True for scripts that re-roll the signature hash: an
    /// `OP_CODESEPARATOR` with a signature-check operation after it forces
    /// a fresh subscript digest per check.
    pub fn is_roller(&self) -> bool {
        let Some(separator) = self
            .ops
            .iter()
            .position(|op| op.code() == Opcode::CODESEPARATOR)
        else {
            return false;
        };
        self.ops[separator..]
            .iter()
            .any(|op| op.code().is_sigop() || op.code().is_multisig_sigop())
    }

    /// Count signature operations. `CHECKSIG(VERIFY)` counts one;
    /// `CHECKMULTISIG(VERIFY)` counts its literal key count when
    /// `accurate` and a `PUSH_POSITIVE_N` precedes it, twenty otherwise.
    pub fn signature_operations(&self, accurate: bool) -> usize {
        let mut total = 0usize;
        let mut preceding: Option<Opcode> = None;

        for op in &self.ops {
            let code = op.code();
            if code.is_sigop() {
                total += 1;
            } else if code.is_multisig_sigop() {
                total += match (accurate, preceding.and_then(Opcode::to_positive_number)) {
                    (true, Some(keys)) => keys as usize,
                    _ => MULTISIG_DEFAULT_SIGOPS,
                };
            }
            preceding = Some(code);
        }
        total
    }
}

impl From<&[u8]> for Script {
    fn from(bytes: &[u8]) -> Self {
        Script::from_bytes(bytes)
    }
}

impl From<Vec<u8>> for Script {
    fn from(bytes: Vec<u8>) -> Self {
        Script::from_bytes(&bytes)
    }
}

impl ByteFormat for Script {
    type Error = SerError;

    fn serialized_length(&self) -> usize {
        self.serialized_size(true)
    }

    fn read_from<R>(reader: &mut R, _limit: usize) -> SerResult<Self>
    where
        R: Read,
        Self: std::marker::Sized,
    {
        let length = Self::read_compact_int(reader)?;
        let mut bytes = vec![0u8; length as usize];
        reader.read_exact(&mut bytes)?;
        Ok(Script::from_bytes(&bytes))
    }

    fn write_to<W>(&self, writer: &mut W) -> SerResult<usize>
    where
        W: Write,
    {
        let body = self.to_bytes();
        let mut written = Self::write_compact_int(writer, body.len() as u64)?;
        written += writer.write(&body)?;
        Ok(written)
    }
}

impl_hex_serde!(Script);
