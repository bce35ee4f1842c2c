//! Inventory vectors and the `inv`/`getdata`/`notfound` payloads.

use std::io::{Read, Write};

use keel_core::ser::{ByteFormat, SerError, SerResult};
use keel_hashes::Hash256Digest;

use crate::envelope::{MessageError, MessageResult, Payload};

/// BIP144: bit 30 of the type id requests witness serialization.
pub const WITNESS_TYPE_BIT: u32 = 1 << 30;

/// The known inventory object types.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum InventoryType {
    /// An error placeholder; ignored on the wire.
    Error,
    /// A transaction.
    Transaction,
    /// A block.
    Block,
    /// A BIP37 filtered block.
    FilteredBlock,
    /// A BIP152 compact block.
    CompactBlock,
    /// A type id this codec does not recognize.
    Unknown(u32),
}

impl InventoryType {
    /// Decode a type id, ignoring the witness bit.
    pub fn from_id(id: u32) -> InventoryType {
        match id & !WITNESS_TYPE_BIT {
            0 => InventoryType::Error,
            1 => InventoryType::Transaction,
            2 => InventoryType::Block,
            3 => InventoryType::FilteredBlock,
            4 => InventoryType::CompactBlock,
            other => InventoryType::Unknown(other),
        }
    }

    /// The bare type id, without the witness bit.
    pub fn to_id(self) -> u32 {
        match self {
            InventoryType::Error => 0,
            InventoryType::Transaction => 1,
            InventoryType::Block => 2,
            InventoryType::FilteredBlock => 3,
            InventoryType::CompactBlock => 4,
            InventoryType::Unknown(other) => other,
        }
    }
}

/// One inventory vector: a type id and an object hash. The raw id is
/// preserved so unknown and witness-flagged ids round-trip.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct InventoryVector {
    /// The raw type id as serialized.
    pub type_id: u32,
    /// The object hash.
    pub hash: Hash256Digest,
}

impl InventoryVector {
    /// An inventory vector from a decoded type.
    pub fn new(inventory_type: InventoryType, hash: Hash256Digest) -> Self {
        InventoryVector {
            type_id: inventory_type.to_id(),
            hash,
        }
    }

    /// The same vector with the witness bit set (BIP144).
    pub fn with_witness(self) -> Self {
        InventoryVector {
            type_id: self.type_id | WITNESS_TYPE_BIT,
            hash: self.hash,
        }
    }

    /// The decoded type, witness bit ignored.
    pub fn inventory_type(&self) -> InventoryType {
        InventoryType::from_id(self.type_id)
    }

    /// True when the witness bit is set.
    pub fn is_witness(&self) -> bool {
        self.type_id & WITNESS_TYPE_BIT != 0
    }
}

impl ByteFormat for InventoryVector {
    type Error = SerError;

    fn serialized_length(&self) -> usize {
        36
    }

    fn read_from<R>(reader: &mut R, _limit: usize) -> SerResult<Self>
    where
        R: Read,
        Self: std::marker::Sized,
    {
        Ok(InventoryVector {
            type_id: Self::read_u32_le(reader)?,
            hash: <Hash256Digest as ByteFormat>::read_from(reader, 0)?,
        })
    }

    fn write_to<W>(&self, writer: &mut W) -> SerResult<usize>
    where
        W: Write,
    {
        let mut len = Self::write_u32_le(writer, self.type_id)?;
        len += self.hash.write_to(writer)?;
        Ok(len)
    }
}

macro_rules! inventory_payload {
    (
        $(#[$outer:meta])*
        $name:ident, $command:literal
    ) => {
        $(#[$outer])*
        #[derive(Clone, Debug, Default, Eq, PartialEq)]
        pub struct $name {
            /// The carried inventory vectors.
            pub inventory: Vec<InventoryVector>,
        }

        impl $name {
            /// A payload from a vector of inventory entries.
            pub fn new(inventory: Vec<InventoryVector>) -> Self {
                Self { inventory }
            }
        }

        impl Payload for $name {
            const COMMAND: &'static str = $command;

            fn read_payload<R: Read>(reader: &mut R, _version: u32) -> MessageResult<Self> {
                Ok(Self {
                    inventory: <Self as ByteFormat>::read_prefix_vec(reader)?,
                })
            }

            fn write_payload<W: Write>(
                &self,
                writer: &mut W,
                _version: u32,
            ) -> MessageResult<usize> {
                <Self as ByteFormat>::write_prefix_vec(writer, &self.inventory)
            }
        }

        impl ByteFormat for $name {
            type Error = MessageError;

            fn serialized_length(&self) -> usize {
                let mut len =
                    keel_core::ser::prefix_byte_len(self.inventory.len() as u64) as usize;
                len += self.inventory.serialized_length();
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
    };
}

inventory_payload!(
    /// Announce objects to a peer.
    Inv,
    "inv"
);
inventory_payload!(
    /// Request announced objects.
    GetData,
    "getdata"
);
inventory_payload!(
    /// Report requested objects this node does not have.
    NotFound,
    "notfound"
);

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn it_round_trips_inventory_vectors() {
        let vector = InventoryVector::new(InventoryType::Block, [0xab; 32]);
        let hex_form = vector.serialize_hex();
        assert!(hex_form.starts_with("02000000"));
        assert_eq!(InventoryVector::deserialize_hex(&hex_form).unwrap(), vector);
    }

    #[test]
    fn it_sets_and_strips_the_witness_bit() {
        let plain = InventoryVector::new(InventoryType::Transaction, [0x01; 32]);
        let witness = plain.with_witness();

        assert!(!plain.is_witness());
        assert!(witness.is_witness());
        assert_eq!(witness.type_id, 0x4000_0001);
        assert_eq!(witness.inventory_type(), InventoryType::Transaction);
    }

    #[test]
    fn it_preserves_unknown_type_ids() {
        let hex_form = {
            let vector = InventoryVector {
                type_id: 0x0000_0009,
                hash: [0; 32],
            };
            vector.serialize_hex()
        };
        let parsed = InventoryVector::deserialize_hex(&hex_form).unwrap();
        assert_eq!(parsed.inventory_type(), InventoryType::Unknown(9));
        assert_eq!(parsed.serialize_hex(), hex_form);
    }

    #[test]
    fn it_round_trips_inv_payloads() {
        let inv = Inv::new(vec![
            InventoryVector::new(InventoryType::Transaction, [0x11; 32]).with_witness(),
            InventoryVector::new(InventoryType::Block, [0x22; 32]),
        ]);
        let hex_form = inv.serialize_hex();
        assert_eq!(inv.serialized_length(), hex_form.len() / 2);
        assert_eq!(Inv::deserialize_hex(&hex_form).unwrap(), inv);

        assert_eq!(Inv::default().serialize_hex(), "00");
        assert_eq!(GetData::COMMAND, "getdata");
        assert_eq!(NotFound::COMMAND, "notfound");
    }
}
