//! The BIP141 witness: a per-input stack of byte strings.

use std::io::{Read, Write};

use keel_core::{
    ser::{ByteFormat, SerError, SerResult},
    wrap_prefixed_byte_vector,
};

use crate::types::{opcode::Opcode, script::{Operation, Script}};

/// The annex marker byte (BIP341).
pub const ANNEX_PREFIX: u8 = 0x50;

wrap_prefixed_byte_vector!(
    /// A single element of a witness stack, serialized as a varint-prefixed
    /// byte string.
    WitnessStackItem
);

/// A witness is the ordered stack of byte strings attached to one input.
///
/// Serialization is `varint(stack_size)` followed by each item in its
/// prefixed form. The transaction serializes one witness per input, with no
/// outer prefix.
#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct Witness {
    stack: Vec<WitnessStackItem>,
}

impl Witness {
    /// A witness from a stack of items.
    pub fn new(stack: Vec<WitnessStackItem>) -> Witness {
        Witness { stack }
    }

    /// The empty witness.
    pub fn null() -> Witness {
        Witness::default()
    }

    /// The stack, bottom first.
    pub fn stack(&self) -> &[WitnessStackItem] {
        &self.stack
    }

    /// Append an item to the stack.
    pub fn push<T: Into<WitnessStackItem>>(&mut self, item: T) {
        self.stack.push(item.into());
    }

    /// Number of stack items.
    pub fn len(&self) -> usize {
        self.stack.len()
    }

    /// True for the empty stack. An input with an empty witness is not
    /// segregated.
    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    /// BIP341: with at least two items, a final item beginning `0x50` is
    /// the annex.
    pub fn is_annex_pattern(&self) -> bool {
        self.stack.len() > 1
            && self
                .stack
                .last()
                .map(|item| item.items().first() == Some(&ANNEX_PREFIX))
                .unwrap_or(false)
    }

    /// The annex bytes, when present.
    pub fn annex(&self) -> Option<&[u8]> {
        if self.is_annex_pattern() {
            self.stack.last().map(WitnessStackItem::items)
        } else {
            None
        }
    }

    /// A single 32-byte stack item: the commitment-reservation shape.
    pub fn is_reserved_pattern(&self) -> bool {
        self.stack.len() == 1 && self.stack[0].len() == 32
    }

    /// The script whose sigops a version-zero witness program contributes
    /// (BIP141): a synthetic single `CHECKSIG` for a key-hash program, the
    /// final stack item reparsed for a script-hash program.
    pub fn extract_sigop_script(&self, prevout_script: &Script) -> Option<Script> {
        if prevout_script.is_pay_witness_key_hash_pattern() {
            return Some(Script::from_ops(vec![Operation::from_opcode(
                Opcode::CHECKSIG,
            )]));
        }
        if prevout_script.is_pay_witness_script_hash_pattern() {
            return self
                .stack
                .last()
                .map(|item| Script::from_bytes(item.items()));
        }
        None
    }
}

impl From<Vec<Vec<u8>>> for Witness {
    fn from(stack: Vec<Vec<u8>>) -> Self {
        Witness::new(stack.into_iter().map(WitnessStackItem::from).collect())
    }
}

impl ByteFormat for Witness {
    type Error = SerError;

    fn serialized_length(&self) -> usize {
        let mut length = keel_core::ser::prefix_byte_len(self.stack.len() as u64) as usize;
        length += self.stack.serialized_length();
        length
    }

    fn read_from<R>(reader: &mut R, _limit: usize) -> SerResult<Self>
    where
        R: Read,
        Self: std::marker::Sized,
    {
        Ok(Witness {
            stack: Self::read_prefix_vec(reader)?,
        })
    }

    fn write_to<W>(&self, writer: &mut W) -> SerResult<usize>
    where
        W: Write,
    {
        Self::write_prefix_vec(writer, &self.stack)
    }
}
