//! Script opcodes.
//!
//! Every byte is an opcode; the named constants cover the table the
//! consensus rules reference. Values `0x01..=0x4b` push that many
//! following bytes directly, and the three `PUSH_*_SIZE` opcodes carry a
//! little-endian length prefix.

use std::fmt;

/// A script opcode.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Opcode(u8);

/// The byte lengths a push opcode's length-prefix occupies, when it has
/// one.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PushLength {
    /// `0x01..=0x4b`: the opcode itself is the data length.
    Direct(usize),
    /// `OP_PUSHDATA1`: one length byte follows.
    OneByte,
    /// `OP_PUSHDATA2`: two little-endian length bytes follow.
    TwoBytes,
    /// `OP_PUSHDATA4`: four little-endian length bytes follow.
    FourBytes,
}

impl Opcode {
    /// Push an empty vector (numeric zero, boolean false).
    pub const PUSH_SIZE_0: Opcode = Opcode(0x00);
    /// The largest direct push: 75 bytes of data follow.
    pub const PUSH_SIZE_75: Opcode = Opcode(0x4b);
    /// Push with a one-byte length prefix.
    pub const PUSH_ONE_SIZE: Opcode = Opcode(0x4c);
    /// Push with a two-byte length prefix.
    pub const PUSH_TWO_SIZE: Opcode = Opcode(0x4d);
    /// Push with a four-byte length prefix.
    pub const PUSH_FOUR_SIZE: Opcode = Opcode(0x4e);
    /// Push numeric negative one.
    pub const PUSH_NEGATIVE_1: Opcode = Opcode(0x4f);
    /// Reserved.
    pub const RESERVED_80: Opcode = Opcode(0x50);
    /// Push numeric one.
    pub const PUSH_POSITIVE_1: Opcode = Opcode(0x51);
    /// Push numeric sixteen.
    pub const PUSH_POSITIVE_16: Opcode = Opcode(0x60);

    /// No operation.
    pub const NOP: Opcode = Opcode(0x61);
    /// Reserved (`op_ver`).
    pub const RESERVED_98: Opcode = Opcode(0x62);
    /// Conditional.
    pub const IF: Opcode = Opcode(0x63);
    /// Negated conditional.
    pub const NOTIF: Opcode = Opcode(0x64);
    /// Disallowed (`op_verif`).
    pub const DISALLOWED_101: Opcode = Opcode(0x65);
    /// Disallowed (`op_vernotif`).
    pub const DISALLOWED_102: Opcode = Opcode(0x66);
    /// Conditional else branch.
    pub const ELSE: Opcode = Opcode(0x67);
    /// Conditional close.
    pub const ENDIF: Opcode = Opcode(0x68);
    /// Fail unless the top stack item is true.
    pub const VERIFY: Opcode = Opcode(0x69);
    /// Fail the script; later outputs are provably unspendable.
    pub const RETURN: Opcode = Opcode(0x6a);

    /// Move to the alt stack.
    pub const TO_ALT_STACK: Opcode = Opcode(0x6b);
    /// Move from the alt stack.
    pub const FROM_ALT_STACK: Opcode = Opcode(0x6c);
    /// Drop two items.
    pub const DROP2: Opcode = Opcode(0x6d);
    /// Duplicate two items.
    pub const DUP2: Opcode = Opcode(0x6e);
    /// Duplicate three items.
    pub const DUP3: Opcode = Opcode(0x6f);
    /// Copy the pair two back.
    pub const OVER2: Opcode = Opcode(0x70);
    /// Rotate three pairs.
    pub const ROT2: Opcode = Opcode(0x71);
    /// Swap two pairs.
    pub const SWAP2: Opcode = Opcode(0x72);
    /// Duplicate the top item if it is not zero.
    pub const IF_DUP: Opcode = Opcode(0x73);
    /// Push the stack depth.
    pub const DEPTH: Opcode = Opcode(0x74);
    /// Drop the top item.
    pub const DROP: Opcode = Opcode(0x75);
    /// Duplicate the top item.
    pub const DUP: Opcode = Opcode(0x76);
    /// Remove the second item.
    pub const NIP: Opcode = Opcode(0x77);
    /// Copy the second item.
    pub const OVER: Opcode = Opcode(0x78);
    /// Copy the nth item.
    pub const PICK: Opcode = Opcode(0x79);
    /// Move the nth item.
    pub const ROLL: Opcode = Opcode(0x7a);
    /// Rotate the top three items.
    pub const ROT: Opcode = Opcode(0x7b);
    /// Swap the top two items.
    pub const SWAP: Opcode = Opcode(0x7c);
    /// Copy the top item behind the second.
    pub const TUCK: Opcode = Opcode(0x7d);

    /// Push the item size.
    pub const SIZE: Opcode = Opcode(0x82);
    /// Byte equality.
    pub const EQUAL: Opcode = Opcode(0x87);
    /// Byte equality, then verify.
    pub const EQUAL_VERIFY: Opcode = Opcode(0x88);
    /// Reserved.
    pub const RESERVED_137: Opcode = Opcode(0x89);
    /// Reserved.
    pub const RESERVED_138: Opcode = Opcode(0x8a);

    /// Increment.
    pub const ADD1: Opcode = Opcode(0x8b);
    /// Decrement.
    pub const SUB1: Opcode = Opcode(0x8c);
    /// Numeric negation.
    pub const NEGATE: Opcode = Opcode(0x8f);
    /// Absolute value.
    pub const ABS: Opcode = Opcode(0x90);
    /// Boolean negation.
    pub const NOT: Opcode = Opcode(0x91);
    /// Nonzero test.
    pub const NONZERO: Opcode = Opcode(0x92);
    /// Addition.
    pub const ADD: Opcode = Opcode(0x93);
    /// Subtraction.
    pub const SUB: Opcode = Opcode(0x94);
    /// Boolean conjunction.
    pub const BOOL_AND: Opcode = Opcode(0x9a);
    /// Boolean disjunction.
    pub const BOOL_OR: Opcode = Opcode(0x9b);
    /// Numeric equality.
    pub const NUM_EQUAL: Opcode = Opcode(0x9c);
    /// Numeric equality, then verify.
    pub const NUM_EQUAL_VERIFY: Opcode = Opcode(0x9d);
    /// Numeric inequality.
    pub const NUM_NOT_EQUAL: Opcode = Opcode(0x9e);
    /// Less-than.
    pub const LESS_THAN: Opcode = Opcode(0x9f);
    /// Greater-than.
    pub const GREATER_THAN: Opcode = Opcode(0xa0);
    /// Less-than-or-equal.
    pub const LESS_THAN_OR_EQUAL: Opcode = Opcode(0xa1);
    /// Greater-than-or-equal.
    pub const GREATER_THAN_OR_EQUAL: Opcode = Opcode(0xa2);
    /// Minimum.
    pub const MIN: Opcode = Opcode(0xa3);
    /// Maximum.
    pub const MAX: Opcode = Opcode(0xa4);
    /// Range test.
    pub const WITHIN: Opcode = Opcode(0xa5);

    /// RIPEMD-160 of the top item.
    pub const RIPEMD160: Opcode = Opcode(0xa6);
    /// SHA-1 of the top item.
    pub const SHA1: Opcode = Opcode(0xa7);
    /// SHA-256 of the top item.
    pub const SHA256: Opcode = Opcode(0xa8);
    /// `ripemd160(sha256(x))` of the top item.
    pub const HASH160: Opcode = Opcode(0xa9);
    /// Double-SHA-256 of the top item.
    pub const HASH256: Opcode = Opcode(0xaa);
    /// Sets the subscript boundary for subsequent signature checks.
    pub const CODESEPARATOR: Opcode = Opcode(0xab);
    /// ECDSA signature check.
    pub const CHECKSIG: Opcode = Opcode(0xac);
    /// ECDSA signature check, then verify.
    pub const CHECKSIG_VERIFY: Opcode = Opcode(0xad);
    /// M-of-N ECDSA signature check.
    pub const CHECKMULTISIG: Opcode = Opcode(0xae);
    /// M-of-N ECDSA signature check, then verify.
    pub const CHECKMULTISIG_VERIFY: Opcode = Opcode(0xaf);

    /// No operation (upgrade slot).
    pub const NOP1: Opcode = Opcode(0xb0);
    /// BIP65 absolute locktime check.
    pub const CHECKLOCKTIMEVERIFY: Opcode = Opcode(0xb1);
    /// BIP112 relative locktime check.
    pub const CHECKSEQUENCEVERIFY: Opcode = Opcode(0xb2);
    /// No operation (upgrade slot).
    pub const NOP10: Opcode = Opcode(0xb9);
    /// BIP342 batch-verifiable signature accumulation.
    pub const CHECKSIGADD: Opcode = Opcode(0xba);

    /// Wrap a raw byte. Every byte is an opcode.
    pub const fn from_u8(value: u8) -> Opcode {
        Opcode(value)
    }

    /// The raw byte.
    pub const fn to_u8(self) -> u8 {
        self.0
    }

    /// The minimal push opcode for a payload of `size` bytes: the direct
    /// push below 76, then the smallest length-prefixed form. `None` when
    /// the size exceeds `u32::MAX`.
    pub fn data_to_opcode(size: usize) -> Option<Opcode> {
        if size < 0x4c {
            Some(Opcode(size as u8))
        } else if size <= u8::MAX as usize {
            Some(Self::PUSH_ONE_SIZE)
        } else if size <= u16::MAX as usize {
            Some(Self::PUSH_TWO_SIZE)
        } else if size <= u32::MAX as usize {
            Some(Self::PUSH_FOUR_SIZE)
        } else {
            None
        }
    }

    /// How this opcode encodes the length of pushed data, if it pushes
    /// data from the script stream.
    pub fn push_length(self) -> Option<PushLength> {
        match self.0 {
            0x01..=0x4b => Some(PushLength::Direct(self.0 as usize)),
            0x4c => Some(PushLength::OneByte),
            0x4d => Some(PushLength::TwoBytes),
            0x4e => Some(PushLength::FourBytes),
            _ => None,
        }
    }

    /// True for every opcode at or below `PUSH_POSITIVE_16`: the push
    /// range, including the implicit-constant pushes.
    pub fn is_relaxed_push(self) -> bool {
        self.0 <= Self::PUSH_POSITIVE_16.0
    }

    /// True for opcodes that push data bytes from the script stream.
    pub fn is_push_data(self) -> bool {
        matches!(self.0, 0x01..=0x4e)
    }

    /// The numeric value of a `PUSH_POSITIVE_*` opcode.
    pub fn to_positive_number(self) -> Option<u8> {
        if (Self::PUSH_POSITIVE_1.0..=Self::PUSH_POSITIVE_16.0).contains(&self.0) {
            Some(self.0 - Self::PUSH_POSITIVE_1.0 + 1)
        } else {
            None
        }
    }

    /// True for the single-signature check opcodes.
    pub fn is_sigop(self) -> bool {
        self == Self::CHECKSIG || self == Self::CHECKSIG_VERIFY
    }

    /// True for the multisig check opcodes.
    pub fn is_multisig_sigop(self) -> bool {
        self == Self::CHECKMULTISIG || self == Self::CHECKMULTISIG_VERIFY
    }

    /// True for conditional-flow opcodes.
    pub fn is_conditional(self) -> bool {
        matches!(
            *self.as_ref(),
            0x63 | 0x64 | 0x67 | 0x68
        )
    }

    fn name(self) -> Option<&'static str> {
        let name = match self.0 {
            0x00 => "push_size_0",
            0x4c => "pushdata1",
            0x4d => "pushdata2",
            0x4e => "pushdata4",
            0x4f => "push_negative_1",
            0x50 => "reserved_80",
            0x61 => "nop",
            0x63 => "if",
            0x64 => "notif",
            0x67 => "else",
            0x68 => "endif",
            0x69 => "verify",
            0x6a => "return",
            0x6b => "toaltstack",
            0x6c => "fromaltstack",
            0x6d => "drop2",
            0x6e => "dup2",
            0x6f => "dup3",
            0x70 => "over2",
            0x71 => "rot2",
            0x72 => "swap2",
            0x73 => "ifdup",
            0x74 => "depth",
            0x75 => "drop",
            0x76 => "dup",
            0x77 => "nip",
            0x78 => "over",
            0x79 => "pick",
            0x7a => "roll",
            0x7b => "rot",
            0x7c => "swap",
            0x7d => "tuck",
            0x82 => "size",
            0x87 => "equal",
            0x88 => "equalverify",
            0x8b => "add1",
            0x8c => "sub1",
            0x8f => "negate",
            0x90 => "abs",
            0x91 => "not",
            0x92 => "nonzero",
            0x93 => "add",
            0x94 => "sub",
            0x9a => "booland",
            0x9b => "boolor",
            0x9c => "numequal",
            0x9d => "numequalverify",
            0x9e => "numnotequal",
            0x9f => "lessthan",
            0xa0 => "greaterthan",
            0xa1 => "lessthanorequal",
            0xa2 => "greaterthanorequal",
            0xa3 => "min",
            0xa4 => "max",
            0xa5 => "within",
            0xa6 => "ripemd160",
            0xa7 => "sha1",
            0xa8 => "sha256",
            0xa9 => "hash160",
            0xaa => "hash256",
            0xab => "codeseparator",
            0xac => "checksig",
            0xad => "checksigverify",
            0xae => "checkmultisig",
            0xaf => "checkmultisigverify",
            0xb0 => "nop1",
            0xb1 => "checklocktimeverify",
            0xb2 => "checksequenceverify",
            0xba => "checksigadd",
            _ => return None,
        };
        Some(name)
    }
}

impl AsRef<u8> for Opcode {
    fn as_ref(&self) -> &u8 {
        &self.0
    }
}

impl From<u8> for Opcode {
    fn from(value: u8) -> Self {
        Opcode(value)
    }
}

impl From<Opcode> for u8 {
    fn from(value: Opcode) -> Self {
        value.0
    }
}

impl fmt::Debug for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.name(), self.0) {
            (Some(name), _) => f.write_str(name),
            (None, 0x01..=0x4b) => write!(f, "push_size_{}", self.0),
            (None, 0x51..=0x60) => write!(f, "push_positive_{}", self.0 - 0x50),
            (None, 0xb3..=0xb9) => write!(f, "nop{}", self.0 - 0xb0 + 1),
            (None, value) => write!(f, "op_0x{:02x}", value),
        }
    }
}
