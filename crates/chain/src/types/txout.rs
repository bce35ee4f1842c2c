//! Transaction outputs.

use std::io::{Read, Write};

use keel_core::ser::{ByteFormat, SerError, SerResult};

use crate::types::script::Script;

/// An output: a satoshi value and the script that encumbers it.
#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, Eq, PartialEq, Default, Hash)]
pub struct TxOut {
    /// The value of the output in satoshi.
    pub value: u64,
    /// The script controlling spend authorization.
    pub script_pubkey: Script,
}

/// Vout is a transaction's Vector of OUTputs.
pub type Vout = Vec<TxOut>;

impl TxOut {
    /// Instantiate a new output.
    pub fn new<T: Into<Script>>(value: u64, script_pubkey: T) -> Self {
        TxOut {
            value,
            script_pubkey: script_pubkey.into(),
        }
    }

    /// The null output: maximum value (the serialization of -1) and an
    /// empty script. Historic sighash serialization writes this for
    /// outputs dropped by `SIGHASH_SINGLE`.
    pub fn null() -> Self {
        TxOut {
            value: 0xffff_ffff_ffff_ffff,
            script_pubkey: Script::null(),
        }
    }
}

impl ByteFormat for TxOut {
    type Error = SerError;

    fn serialized_length(&self) -> usize {
        let mut len = 8; // value
        len += self.script_pubkey.serialized_size(true);
        len
    }

    fn read_from<R>(reader: &mut R, _limit: usize) -> SerResult<Self>
    where
        R: Read,
        Self: std::marker::Sized,
    {
        Ok(TxOut {
            value: Self::read_u64_le(reader)?,
            script_pubkey: Script::read_from(reader, 0)?,
        })
    }

    fn write_to<W>(&self, writer: &mut W) -> SerResult<usize>
    where
        W: Write,
    {
        let mut len = Self::write_u64_le(writer, self.value)?;
        len += self.script_pubkey.write_to(writer)?;
        Ok(len)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn it_serializes_and_deserializes_outputs() {
        let cases = [
            (
                TxOut::new(
                    0x01ef35a1,
                    hex::decode("76a914bc3b654dca7e56b04dca18f2566cdaf02e8d9ada88ac").unwrap(),
                ),
                "a135ef01000000001976a914bc3b654dca7e56b04dca18f2566cdaf02e8d9ada88ac",
            ),
            (TxOut::new(0, vec![]), "000000000000000000"),
            (
                TxOut::null(),
                "ffffffffffffffff00",
            ),
        ];

        for (output, expected) in cases.iter() {
            assert_eq!(output.serialized_length(), expected.len() / 2);
            assert_eq!(output.serialize_hex(), *expected);
            assert_eq!(&TxOut::deserialize_hex(expected).unwrap(), output);
        }
    }
}
