//! Outpoints, transaction inputs, prevout metadata, and the BIP68
//! relative-locktime rule.

use std::io::{Read, Write};

use keel_core::{
    bits::{get_right, mask_left, shift_left},
    ser::{ByteFormat, SerError, SerResult},
};

use crate::{
    hashes::TXID,
    types::{script::Script, witness::Witness},
};

/// The sequence value that opts out of all locktime semantics.
pub const MAX_INPUT_SEQUENCE: u32 = 0xffff_ffff;

/// BIP68: bit 31 of the sequence disables relative locktime.
pub const RELATIVE_LOCKTIME_DISABLED_BIT: u32 = 31;

/// BIP68: bit 22 selects time-based (set) or block-based (clear) locks.
pub const RELATIVE_LOCKTIME_TIME_LOCKED_BIT: u32 = 22;

/// BIP68: the lock magnitude is the low 16 bits (the left 16 are masked).
pub const RELATIVE_LOCKTIME_MASK_LEFT: u32 = 16;

/// BIP68: time-based magnitudes shift up 9 bits (512-second granules).
pub const RELATIVE_LOCKTIME_SECONDS_SHIFT: u32 = 9;

/// BIP141: input-script sigops weigh four times witness sigops.
pub const HEAVY_SIGOPS_FACTOR: usize = 4;

/// An outpoint: the unique identifier of a UTXO, composed of the creating
/// transaction's ID (in Bitcoin-style internal byte order) and the index
/// of the output within that transaction's output vector.
///
/// `Outpoint::null()` and `Outpoint::default()` return the null outpoint
/// (zero txid, index 0xffff_ffff) used by every coinbase input.
#[derive(serde::Serialize, serde::Deserialize, Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct Outpoint {
    /// The txid that created the UTXO being pointed to.
    pub txid: TXID,
    /// The index of that UTXO in the transaction's output vector.
    pub idx: u32,
}

impl Outpoint {
    /// Returns a new outpoint from a txid and index.
    pub fn new(txid: TXID, idx: u32) -> Self {
        Outpoint { txid, idx }
    }

    /// The null outpoint, used in the coinbase input.
    pub fn null() -> Self {
        Outpoint {
            txid: TXID::default(),
            idx: 0xffff_ffff,
        }
    }

    /// True for the coinbase marker outpoint.
    pub fn is_null(&self) -> bool {
        *self == Outpoint::null()
    }

    /// Instantiate from the block-explorer (big-endian) txid form.
    pub fn from_explorer_format(txid_be: TXID, idx: u32) -> Self {
        use keel_hashes::MarkedDigest;
        Outpoint {
            txid: txid_be.reversed(),
            idx,
        }
    }
}

impl Default for Outpoint {
    fn default() -> Self {
        Outpoint::null()
    }
}

impl ByteFormat for Outpoint {
    type Error = SerError;

    fn serialized_length(&self) -> usize {
        36
    }

    fn read_from<R>(reader: &mut R, _limit: usize) -> SerResult<Self>
    where
        R: Read,
        Self: std::marker::Sized,
    {
        Ok(Outpoint {
            txid: TXID::read_from(reader, 0)?,
            idx: Self::read_u32_le(reader)?,
        })
    }

    fn write_to<W>(&self, writer: &mut W) -> SerResult<usize>
    where
        W: Write,
    {
        let mut len = self.txid.write_to(writer)?;
        len += Self::write_u32_le(writer, self.idx)?;
        Ok(len)
    }
}

/// The spent output's data and confirmation metadata. An input borrows
/// this from an external output store; it is never serialized with the
/// input.
#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, Eq, PartialEq, Default, Hash)]
pub struct Prevout {
    /// The spent output's value in satoshi.
    pub value: u64,
    /// The spent output's script.
    pub script: Script,
    /// Height of the block containing the spent output.
    pub height: u32,
    /// Median time past of the block containing the spent output (BIP113).
    pub median_time_past: u32,
}

/// A transaction input.
///
/// The input owns its outpoint reference, script, witness, and sequence.
/// The `script_sig` is empty for native witness prevouts. An input
/// serialized alone always omits its witness; the transaction appends
/// witnesses per BIP144.
///
/// Sequence encoding also carries relative-locktime and RBF signaling.
#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, Eq, PartialEq, Default, Hash)]
pub struct TxInput {
    /// The outpoint identifying the UTXO being spent.
    pub outpoint: Outpoint,
    /// Spend authorization for legacy and P2SH-wrapped prevouts.
    pub script_sig: Script,
    /// The BIP141 witness stack. Not serialized with the input.
    pub witness: Witness,
    /// The nSequence field.
    pub sequence: u32,
    /// Borrowed prevout data and metadata, populated by the caller from
    /// its output store. Not serialized.
    #[serde(skip)]
    pub prevout: Option<Prevout>,
}

/// Vin is a transaction's Vector of INputs.
pub type Vin = Vec<TxInput>;

impl TxInput {
    /// Instantiate a new input with an empty witness.
    pub fn new<T>(outpoint: Outpoint, script_sig: T, sequence: u32) -> Self
    where
        T: Into<Script>,
    {
        TxInput {
            outpoint,
            script_sig: script_sig.into(),
            witness: Witness::null(),
            sequence,
            prevout: None,
        }
    }

    /// Instantiate a new segregated input.
    pub fn new_witness<T>(outpoint: Outpoint, script_sig: T, witness: Witness, sequence: u32) -> Self
    where
        T: Into<Script>,
    {
        TxInput {
            outpoint,
            script_sig: script_sig.into(),
            witness,
            sequence,
            prevout: None,
        }
    }

    /// Copy the input, stripping the script_sig and witness.
    pub fn unsigned(&self) -> TxInput {
        TxInput {
            outpoint: self.outpoint,
            script_sig: Script::null(),
            witness: Witness::null(),
            sequence: self.sequence,
            prevout: self.prevout.clone(),
        }
    }

    /// True when the witness carries stack items.
    pub fn is_segregated(&self) -> bool {
        !self.witness.is_empty()
    }

    /// True when the sequence opts out of locktime semantics.
    pub fn is_final(&self) -> bool {
        self.sequence == MAX_INPUT_SEQUENCE
    }

    /// BIP68: relative locktime has consensus meaning only with bit 31
    /// clear (and transaction version 2+, which the caller enforces).
    pub fn is_relative_locktime_applied(sequence: u32) -> bool {
        !get_right(sequence, RELATIVE_LOCKTIME_DISABLED_BIT)
    }

    /// BIP68: true while the input's relative lock has not yet matured at
    /// the given height and median time past.
    pub fn is_relative_locked(
        sequence: u32,
        height: u32,
        median_time_past: u32,
        prevout_height: u32,
        prevout_median_time_past: u32,
    ) -> bool {
        if !Self::is_relative_locktime_applied(sequence) {
            return false;
        }

        // The low 16 bits of the sequence are the lock magnitude.
        let blocks = sequence & mask_left::<u32>(RELATIVE_LOCKTIME_MASK_LEFT);

        // Bit 22 selects time-based locks, in 512-second granules.
        if get_right(sequence, RELATIVE_LOCKTIME_TIME_LOCKED_BIT) {
            let time = shift_left(blocks, RELATIVE_LOCKTIME_SECONDS_SHIFT, true);
            let age = median_time_past.saturating_sub(prevout_median_time_past);
            return age < time;
        }

        let age = height.saturating_sub(prevout_height);
        age < blocks
    }

    /// BIP68 against this input's attached prevout metadata. An input with
    /// no prevout attached (coinbase, or metadata not populated) is not
    /// locked.
    pub fn is_locked(&self, height: u32, median_time_past: u32) -> bool {
        match &self.prevout {
            Some(prevout) => Self::is_relative_locked(
                self.sequence,
                height,
                median_time_past,
                prevout.height,
                prevout.median_time_past,
            ),
            None => false,
        }
    }

    /// True when this input's script or its prevout's script re-rolls the
    /// signature hash with `OP_CODESEPARATOR`.
    pub fn is_roller(&self) -> bool {
        self.script_sig.is_roller()
            || self
                .prevout
                .as_ref()
                .map(|prevout| prevout.script.is_roller())
                .unwrap_or(false)
    }

    /// The BIP16 embedded script, when the prevout is P2SH and the input
    /// script is push-only: the final pushed item reparsed as a script.
    fn extract_sigop_script(&self, prevout_script: &Script) -> Option<Script> {
        if !prevout_script.is_pay_script_hash_pattern() {
            return None;
        }
        let ops = self.script_sig.ops();
        if ops.is_empty() || !self.script_sig.is_relaxed_push_pattern() {
            return None;
        }
        ops.last().map(|op| Script::from_bytes(op.data()))
    }

    /// Count this input's signature operations under the given fork rules.
    ///
    /// Input-script sigops (and BIP16 embedded sigops) are weighted by the
    /// heavy factor under BIP141; witness sigops count accurately and
    /// unweighted. A coinbase input cannot execute, but its sigops are
    /// counted anyway.
    pub fn signature_operations(&self, bip16: bool, bip141: bool) -> usize {
        let factor = if bip141 { HEAVY_SIGOPS_FACTOR } else { 1 };
        let sigops = self.script_sig.signature_operations(false) * factor;

        let Some(prevout) = &self.prevout else {
            return sigops;
        };

        if bip141 {
            if let Some(witness_script) = self.witness.extract_sigop_script(&prevout.script) {
                return sigops.saturating_add(witness_script.signature_operations(true));
            }
        }

        if bip16 {
            if let Some(embedded) = self.extract_sigop_script(&prevout.script) {
                if bip141 {
                    if let Some(witness_script) = self.witness.extract_sigop_script(&embedded) {
                        return sigops
                            .saturating_add(witness_script.signature_operations(true));
                    }
                }
                return sigops.saturating_add(embedded.signature_operations(true) * factor);
            }
        }

        sigops
    }
}

impl ByteFormat for TxInput {
    type Error = SerError;

    fn serialized_length(&self) -> usize {
        let mut len = self.outpoint.serialized_length();
        len += self.script_sig.serialized_size(true);
        len += 4; // sequence
        len
    }

    fn read_from<R>(reader: &mut R, _limit: usize) -> SerResult<Self>
    where
        R: Read,
        Self: std::marker::Sized,
    {
        Ok(TxInput {
            outpoint: Outpoint::read_from(reader, 0)?,
            script_sig: Script::read_from(reader, 0)?,
            witness: Witness::null(),
            sequence: Self::read_u32_le(reader)?,
            prevout: None,
        })
    }

    fn write_to<W>(&self, writer: &mut W) -> SerResult<usize>
    where
        W: Write,
    {
        let mut len = self.outpoint.write_to(writer)?;
        len += self.script_sig.write_to(writer)?;
        len += Self::write_u32_le(writer, self.sequence)?;
        Ok(len)
    }
}
