//! Bitcoin transactions: legacy and BIP144 serialization, txid/wtxid, the
//! unversioned and BIP143 signature hashes, and the per-transaction
//! sighash midstate cache.

use std::io::{Error as IOError, Read, Write};

use once_cell::sync::OnceCell;
use thiserror::Error;

use keel_core::ser::{ByteFormat, SerError};
use keel_hashes::{Hash256Digest, Hash256Writer, MarkedDigestWriter, NULL_HASH};

use crate::{
    hashes::{SigHash, TXID, WTXID},
    types::{
        script::Script,
        txin::{TxInput, Vin},
        txout::{TxOut, Vout},
        witness::Witness,
    },
};

/// The sentinel digest consensus returns for a `SIGHASH_SINGLE` whose
/// input index has no matching output: the value one, big-endian.
pub const ONE_HASH: Hash256Digest = {
    let mut hash = [0u8; 32];
    hash[31] = 1;
    hash
};

/// An error type for transaction objects.
#[derive(Debug, Error)]
pub enum TxError {
    /// Serialization-related errors.
    #[error(transparent)]
    SerError(#[from] SerError),

    /// IOError bubbled up from a `Write` passed to a `ByteFormat`
    /// implementation.
    #[error(transparent)]
    IOError(#[from] IOError),

    /// Got an unknown flag where we expected the witness flag. May
    /// indicate a non-witness transaction.
    #[error("witness flag not as expected. Got {:?}. Expected {:?}.", .0, [0u8, 1u8])]
    BadWitnessFlag([u8; 2]),

    /// A sighash was requested for an input index the transaction does not
    /// have.
    #[error("no input at index {0}")]
    MissingInput(usize),

    /// A taproot `SIGHASH_SINGLE` was requested with no output at the
    /// input's index. BIP341 rejects this outright; there is no sentinel.
    #[error("no output at index {0}")]
    MissingOutput(usize),

    /// A taproot sighash needs every spent output, but the provided
    /// prevout set is short.
    #[error("no prevout provided for input {0}")]
    MissingPrevout(usize),
}

/// Type alias for result with TxError.
pub type TxResult<T> = Result<T, TxError>;

/// The sighash flag byte is masked to five bits for coverage; anything
/// that is not `SINGLE` or `NONE` means `ALL`.
pub const SIGHASH_MASK: u8 = 0x1f;

/// Sign all outputs.
pub const SIGHASH_ALL: u8 = 0x01;

/// Sign no outputs.
pub const SIGHASH_NONE: u8 = 0x02;

/// Sign the output at the signing input's index.
pub const SIGHASH_SINGLE: u8 = 0x03;

/// Sign only the signing input, letting others attach value.
pub const SIGHASH_ANYONE_CAN_PAY: u8 = 0x80;

/// Which outputs a signature commits to.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Coverage {
    /// Commit to all outputs.
    All,
    /// Commit to no outputs.
    None,
    /// Commit to the output paired with the signing input.
    Single,
}

/// A sighash flag byte.
///
/// Every byte value is meaningful on the wire: masking bits 6/7 leaves
/// four values that select single, four that select none, and everything
/// else selects all. The raw byte is preserved because the preimage
/// serializes it (widened to four bytes), not the decoded coverage.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Sighash {
    raw: u8,
}

impl Sighash {
    /// `SIGHASH_ALL`.
    pub const ALL: Sighash = Sighash { raw: SIGHASH_ALL };
    /// `SIGHASH_NONE`.
    pub const NONE: Sighash = Sighash { raw: SIGHASH_NONE };
    /// `SIGHASH_SINGLE`.
    pub const SINGLE: Sighash = Sighash { raw: SIGHASH_SINGLE };
    /// `SIGHASH_ALL | ANYONE_CAN_PAY`.
    pub const ALL_ANYONE_CAN_PAY: Sighash = Sighash { raw: 0x81 };
    /// `SIGHASH_NONE | ANYONE_CAN_PAY`.
    pub const NONE_ANYONE_CAN_PAY: Sighash = Sighash { raw: 0x82 };
    /// `SIGHASH_SINGLE | ANYONE_CAN_PAY`.
    pub const SINGLE_ANYONE_CAN_PAY: Sighash = Sighash { raw: 0x83 };

    /// Wrap a raw flag byte. Total: every value decodes.
    pub fn from_u8(raw: u8) -> Sighash {
        Sighash { raw }
    }

    /// The raw flag byte as serialized in endorsements and preimages.
    pub fn raw(&self) -> u8 {
        self.raw
    }

    /// The masked output coverage.
    pub fn coverage(&self) -> Coverage {
        match self.raw & SIGHASH_MASK {
            SIGHASH_NONE => Coverage::None,
            SIGHASH_SINGLE => Coverage::Single,
            _ => Coverage::All,
        }
    }

    /// True when bit 7 limits the commitment to the signing input.
    pub fn anyone_can_pay(&self) -> bool {
        self.raw & SIGHASH_ANYONE_CAN_PAY != 0
    }
}

impl From<u8> for Sighash {
    fn from(raw: u8) -> Self {
        Sighash::from_u8(raw)
    }
}

/// The three BIP143 midstate digests, computed once per transaction and
/// reused across its inputs.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct SighashCache {
    /// Double-SHA-256 of all input outpoints.
    pub points: Hash256Digest,
    /// Double-SHA-256 of all input sequence fields.
    pub sequences: Hash256Digest,
    /// Double-SHA-256 of all outputs.
    pub outputs: Hash256Digest,
}

/// Arguments required to serialize the transaction to create the sighash
/// digest, for the unversioned (pre-BIP143) algorithm.
///
/// The `prevout_script` is the subscript under signature: the script code
/// of the prevout, trimmed after `OP_CODESEPARATOR` handling by the
/// caller.
///
/// # Note
///
/// After signing the digest, you MUST append the sighash flag byte to the
/// resulting signature.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LegacySighashArgs<'a> {
    /// The index of the input we'd like to sign.
    pub index: usize,
    /// The sighash flags to use.
    pub sighash_flags: Sighash,
    /// The subscript committed to by the signature.
    pub prevout_script: &'a Script,
}

/// Arguments required to serialize the transaction to create the BIP143
/// (witness v0) sighash digest.
///
/// # Note
///
/// After signing the digest, you MUST append the sighash flag byte to the
/// resulting signature.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct WitnessSighashArgs<'a> {
    /// The index of the input we'd like to sign.
    pub index: usize,
    /// The sighash flags to use.
    pub sighash_flags: Sighash,
    /// The script code committed to by the signature.
    pub prevout_script: &'a Script,
    /// The value of the prevout.
    pub prevout_value: u64,
}

/// A Bitcoin transaction.
///
/// One type covers both serializations: the `0x0001` marker-flag and the
/// per-input witness stacks are emitted iff any input carries a non-empty
/// witness (the `segregated` flag, cached at construction). An input
/// serialized alone always omits its witness.
#[derive(Clone, Debug, Default)]
pub struct Transaction {
    version: u32,
    vin: Vin,
    vout: Vout,
    locktime: u32,
    segregated: bool,
    sighash_cache: OnceCell<SighashCache>,
}

impl PartialEq for Transaction {
    fn eq(&self, other: &Self) -> bool {
        // The midstate cache is derived state, not identity.
        self.version == other.version
            && self.vin == other.vin
            && self.vout == other.vout
            && self.locktime == other.locktime
    }
}

impl Eq for Transaction {}

impl Transaction {
    /// Instantiate a new transaction. The segregated flag is computed from
    /// the inputs' witnesses.
    pub fn new<I, O>(version: u32, vin: I, vout: O, locktime: u32) -> Self
    where
        I: Into<Vin>,
        O: Into<Vout>,
    {
        let vin = vin.into();
        let segregated = vin.iter().any(TxInput::is_segregated);
        Self {
            version,
            vin,
            vout: vout.into(),
            locktime,
            segregated,
            sighash_cache: OnceCell::new(),
        }
    }

    /// The version number. Usually 1 or 2.
    pub fn version(&self) -> u32 {
        self.version
    }

    /// The nLocktime field.
    pub fn locktime(&self) -> u32 {
        self.locktime
    }

    /// The inputs.
    pub fn inputs(&self) -> &[TxInput] {
        &self.vin
    }

    /// The outputs.
    pub fn outputs(&self) -> &[TxOut] {
        &self.vout
    }

    /// True iff any input carries a non-empty witness.
    pub fn is_segregated(&self) -> bool {
        self.segregated
    }

    /// True iff the transaction has exactly one input spending the null
    /// point.
    pub fn is_coinbase(&self) -> bool {
        self.vin.len() == 1 && self.vin[0].outpoint.is_null()
    }

    /// Replace the input set. Clears the sighash cache and recomputes the
    /// segregated flag.
    pub fn set_inputs<I: Into<Vin>>(&mut self, vin: I) {
        self.sighash_cache = OnceCell::new();
        self.vin = vin.into();
        self.segregated = self.vin.iter().any(TxInput::is_segregated);
    }

    /// Replace the output set. Clears the sighash cache.
    pub fn set_outputs<O: Into<Vout>>(&mut self, vout: O) {
        self.sighash_cache = OnceCell::new();
        self.vout = vout.into();
    }

    /// Replace one input's witness. Clears the sighash cache and
    /// recomputes the segregated flag. False if the index is out of range.
    pub fn set_witness(&mut self, index: usize, witness: Witness) -> bool {
        let Some(input) = self.vin.get_mut(index) else {
            return false;
        };
        input.witness = witness;
        self.sighash_cache = OnceCell::new();
        self.segregated = self.vin.iter().any(TxInput::is_segregated);
        true
    }

    /// Attach prevout metadata to one input. Does not affect any cache or
    /// serialization. False if the index is out of range.
    pub fn set_prevout(&mut self, index: usize, prevout: crate::types::txin::Prevout) -> bool {
        match self.vin.get_mut(index) {
            Some(input) => {
                input.prevout = Some(prevout);
                true
            }
            None => false,
        }
    }

    /// The serialized size: nominal (without witnesses) or witnessed. The
    /// witnessed size of a non-segregated transaction is its nominal size,
    /// as BIP144 omits the marker when there is no witness data.
    pub fn serialized_size(&self, witness: bool) -> usize {
        let mut len = 4; // version
        len += keel_core::ser::prefix_byte_len(self.vin.len() as u64) as usize;
        len += self.vin.serialized_length();
        len += keel_core::ser::prefix_byte_len(self.vout.len() as u64) as usize;
        len += self.vout.serialized_length();
        len += 4; // locktime

        if witness && self.segregated {
            len += 2; // marker and flag
            len += self
                .vin
                .iter()
                .map(|input| input.witness.serialized_length())
                .sum::<usize>();
        }
        len
    }

    /// Write the nominal (non-witness) serialization.
    pub fn write_legacy_to<W>(&self, writer: &mut W) -> TxResult<usize>
    where
        W: Write,
    {
        let mut len = Self::write_u32_le(writer, self.version)?;
        len += Self::write_prefix_vec(writer, &self.vin)?;
        len += Self::write_prefix_vec(writer, &self.vout)?;
        len += Self::write_u32_le(writer, self.locktime)?;
        Ok(len)
    }

    /// Calculate the txid: the double-SHA-256 of the nominal
    /// serialization.
    pub fn txid(&self) -> TXID {
        let mut writer = Hash256Writer::default();
        self.write_legacy_to(&mut writer)
            .expect("no IOError from hashing");
        writer.finish_marked()
    }

    /// Calculate the wtxid: the double-SHA-256 of the wire serialization.
    /// Identical to the txid (modulo marker type) for non-segregated
    /// transactions.
    pub fn wtxid(&self) -> WTXID {
        let mut writer = Hash256Writer::default();
        self.write_to(&mut writer).expect("no IOError from hashing");
        writer.finish_marked()
    }

    // Sighash midstates.

    fn compute_points_hash(&self) -> Hash256Digest {
        let mut writer = Hash256Writer::default();
        for input in &self.vin {
            input
                .outpoint
                .write_to(&mut writer)
                .expect("no IOError from hashing");
        }
        writer.finish()
    }

    fn compute_sequences_hash(&self) -> Hash256Digest {
        let mut writer = Hash256Writer::default();
        for input in &self.vin {
            Self::write_u32_le(&mut writer, input.sequence).expect("no IOError from hashing");
        }
        writer.finish()
    }

    fn compute_outputs_hash(&self) -> Hash256Digest {
        let mut writer = Hash256Writer::default();
        for output in &self.vout {
            output
                .write_to(&mut writer)
                .expect("no IOError from hashing");
        }
        writer.finish()
    }

    /// The BIP143 midstates, built on first use and reused across inputs.
    pub fn sighash_cache(&self) -> &SighashCache {
        self.sighash_cache.get_or_init(|| SighashCache {
            points: self.compute_points_hash(),
            sequences: self.compute_sequences_hash(),
            outputs: self.compute_outputs_hash(),
        })
    }

    /// Double-SHA-256 of all input outpoints (cached).
    pub fn points_hash(&self) -> Hash256Digest {
        self.sighash_cache().points
    }

    /// Double-SHA-256 of all input sequences (cached).
    pub fn sequences_hash(&self) -> Hash256Digest {
        self.sighash_cache().sequences
    }

    /// Double-SHA-256 of all outputs (cached).
    pub fn outputs_hash(&self) -> Hash256Digest {
        self.sighash_cache().outputs
    }

    /// Double-SHA-256 of the single output paired with `index`, or the
    /// null hash when the index exceeds the outputs.
    fn output_hash_v0(&self, index: usize) -> Hash256Digest {
        match self.vout.get(index) {
            Some(output) => {
                let mut writer = Hash256Writer::default();
                output
                    .write_to(&mut writer)
                    .expect("no IOError from hashing");
                writer.finish()
            }
            None => NULL_HASH,
        }
    }

    // Signature hashing (unversioned).

    /// Write the historic sighash preimage: the transaction re-serialized
    /// with scripts replaced and inputs/outputs trimmed by coverage, then
    /// the widened flag byte.
    pub fn write_legacy_sighash_preimage<W: Write>(
        &self,
        writer: &mut W,
        args: &LegacySighashArgs,
    ) -> TxResult<()> {
        if args.index >= self.vin.len() {
            return Err(TxError::MissingInput(args.index));
        }
        let coverage = args.sighash_flags.coverage();
        let anyone = args.sighash_flags.anyone_can_pay();

        Self::write_u32_le(writer, self.version)?;

        let input_count = if anyone { 1 } else { self.vin.len() };
        Self::write_compact_int(writer, input_count as u64)?;
        for (i, input) in self.vin.iter().enumerate() {
            if i == args.index {
                input.outpoint.write_to(writer)?;
                args.prevout_script.write_to(writer)?;
                Self::write_u32_le(writer, input.sequence)?;
            } else if !anyone {
                input.outpoint.write_to(writer)?;
                Self::write_u8(writer, 0)?; // empty script
                let sequence = match coverage {
                    Coverage::All => input.sequence,
                    _ => 0,
                };
                Self::write_u32_le(writer, sequence)?;
            }
        }

        match coverage {
            Coverage::All => {
                Self::write_prefix_vec(writer, &self.vout)?;
            }
            Coverage::None => {
                Self::write_compact_int(writer, 0)?;
            }
            Coverage::Single => {
                // Guarded by legacy_sighash: index < vout.len().
                Self::write_compact_int(writer, args.index as u64 + 1)?;
                for _ in 0..args.index {
                    TxOut::null().write_to(writer)?;
                }
                self.vout[args.index].write_to(writer)?;
            }
        }

        Self::write_u32_le(writer, self.locktime)?;
        Self::write_u32_le(writer, args.sighash_flags.raw() as u32)?;
        Ok(())
    }

    /// The unversioned (pre-BIP143) signature hash.
    ///
    /// A `SIGHASH_SINGLE` with no output at the input's index returns the
    /// `ONE_HASH` sentinel, reproducing the consensus bug rather than
    /// rejecting.
    pub fn legacy_sighash(&self, args: &LegacySighashArgs) -> TxResult<SigHash> {
        if args.index >= self.vin.len() {
            return Err(TxError::MissingInput(args.index));
        }
        if args.sighash_flags.coverage() == Coverage::Single && args.index >= self.vout.len() {
            return Ok(SigHash::from(ONE_HASH));
        }

        let mut writer = Hash256Writer::default();
        self.write_legacy_sighash_preimage(&mut writer, args)?;
        Ok(writer.finish_marked())
    }

    // Signature hashing (version 0 - segwit).

    /// Write the BIP143 sighash preimage.
    pub fn write_witness_sighash_preimage<W: Write>(
        &self,
        writer: &mut W,
        args: &WitnessSighashArgs,
    ) -> TxResult<()> {
        let input = self
            .vin
            .get(args.index)
            .ok_or(TxError::MissingInput(args.index))?;
        let coverage = args.sighash_flags.coverage();
        let anyone = args.sighash_flags.anyone_can_pay();
        let all = coverage == Coverage::All;

        Self::write_u32_le(writer, self.version)?;

        let points = if anyone { NULL_HASH } else { self.points_hash() };
        points.write_to(writer).map_err(SerError::from)?;

        let sequences = if !anyone && all {
            self.sequences_hash()
        } else {
            NULL_HASH
        };
        sequences.write_to(writer).map_err(SerError::from)?;

        input.outpoint.write_to(writer)?;
        args.prevout_script.write_to(writer)?;
        Self::write_u64_le(writer, args.prevout_value)?;
        Self::write_u32_le(writer, input.sequence)?;

        let outputs = match coverage {
            Coverage::Single => self.output_hash_v0(args.index),
            Coverage::All => self.outputs_hash(),
            Coverage::None => NULL_HASH,
        };
        outputs.write_to(writer).map_err(SerError::from)?;

        Self::write_u32_le(writer, self.locktime)?;
        Self::write_u32_le(writer, args.sighash_flags.raw() as u32)?;
        Ok(())
    }

    /// The BIP143 (witness v0) signature hash.
    pub fn witness_sighash(&self, args: &WitnessSighashArgs) -> TxResult<SigHash> {
        let mut writer = Hash256Writer::default();
        self.write_witness_sighash_preimage(&mut writer, args)?;
        Ok(writer.finish_marked())
    }
}

impl ByteFormat for Transaction {
    type Error = TxError;

    fn serialized_length(&self) -> usize {
        self.serialized_size(true)
    }

    fn read_from<R>(reader: &mut R, _limit: usize) -> Result<Self, Self::Error>
    where
        R: Read,
        Self: std::marker::Sized,
    {
        let version = Self::read_u32_le(reader)?;

        // The byte after the version is either the 0x00 segwit marker or
        // the first byte of the input-count varint.
        let sniff = Self::read_u8(reader)?;
        if sniff == 0 {
            let flag = Self::read_u8(reader)?;
            if flag != 1 {
                return Err(TxError::BadWitnessFlag([sniff, flag]));
            }

            let mut vin: Vin = Self::read_prefix_vec(reader)?;
            let vout: Vout = Self::read_prefix_vec(reader)?;
            for input in vin.iter_mut() {
                input.witness = Witness::read_from(reader, 0)?;
            }
            let locktime = Self::read_u32_le(reader)?;

            let segregated = vin.iter().any(TxInput::is_segregated);
            Ok(Self {
                version,
                vin,
                vout,
                locktime,
                segregated,
                sighash_cache: OnceCell::new(),
            })
        } else {
            let input_count = read_compact_int_tail(reader, sniff)?;
            let mut vin = Vin::new();
            for _ in 0..input_count {
                vin.push(TxInput::read_from(reader, 0)?);
            }
            let vout: Vout = Self::read_prefix_vec(reader)?;
            let locktime = Self::read_u32_le(reader)?;

            Ok(Self {
                version,
                vin,
                vout,
                locktime,
                segregated: false,
                sighash_cache: OnceCell::new(),
            })
        }
    }

    fn write_to<W>(&self, writer: &mut W) -> Result<usize, Self::Error>
    where
        W: Write,
    {
        if !self.segregated {
            return self.write_legacy_to(writer);
        }

        let mut len = Self::write_u32_le(writer, self.version)?;
        len += writer.write(&[0u8, 1u8])?;
        len += Self::write_prefix_vec(writer, &self.vin)?;
        len += Self::write_prefix_vec(writer, &self.vout)?;
        for input in &self.vin {
            len += input.witness.write_to(writer).map_err(SerError::from)?;
        }
        len += Self::write_u32_le(writer, self.locktime)?;
        Ok(len)
    }
}

keel_core::impl_hex_serde!(Transaction);

/// Finish reading a varint whose first byte has already been consumed.
fn read_compact_int_tail<R: Read>(reader: &mut R, first: u8) -> Result<u64, SerError> {
    let prefix_len = keel_core::ser::prefix_len_from_first_byte(first);
    if prefix_len == 1 {
        return Ok(first as u64);
    }
    let mut buf = [0u8; 8];
    reader.read_exact(&mut buf[..prefix_len as usize - 1])?;
    let number = u64::from_le_bytes(buf);
    if keel_core::ser::prefix_byte_len(number) < prefix_len {
        Err(SerError::NonMinimalVarInt)
    } else {
        Ok(number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keel_hashes::hash256;

    fn parse(hex_tx: &str) -> Transaction {
        Transaction::deserialize_hex(hex_tx).unwrap()
    }

    #[test]
    fn it_calculates_legacy_sighashes_and_txids() {
        // pulled from riemann helpers
        let tx_hex = "0100000001813f79011acb80925dfe69b3def355fe914bd1d96a3f5f71bf8303c6a989c7d1000000006b483045022100ed81ff192e75a3fd2304004dcadb746fa5e24c5031ccfcf21320b0277457c98f02207a986d955c6e0cb35d446a89d3f56100f4d7f67801c31967743a9c8e10615bed01210349fc4e631e3624a545de3f89f5d8684c7b8138bd94bdd531d2e213bf016b278afeffffff02a135ef01000000001976a914bc3b654dca7e56b04dca18f2566cdaf02e8d9ada88ac99c39800000000001976a9141c4bc762dd5423e332166702cb75f40df79fea1288ac19430600";
        let tx = parse(tx_hex);
        assert!(!tx.is_segregated());
        assert_eq!(tx.serialized_size(false), tx_hex.len() / 2);
        assert_eq!(tx.serialized_size(true), tx_hex.len() / 2);
        assert_eq!(tx.serialize_hex(), tx_hex);

        let prevout_script =
            Script::deserialize_hex("17a91424d6008f143af0cca57344069c46661aa4fcea2387").unwrap();

        let txid =
            TXID::deserialize_hex("03ee4f7a4e68f802303bc659f8f817964b4b74fe046facc3ae1be4679d622c45")
                .unwrap();
        assert_eq!(tx.txid(), txid);

        let cases = [
            (
                Sighash::ALL,
                "b85c4f8d1377cc138225dd9b319d0a4ca547f7884270640f44c5fcdf269e0fe8",
            ),
            (
                Sighash::ALL_ANYONE_CAN_PAY,
                "3b67a5114cc9fc837ddd6f6ec11bde38db5f68c34ab6ece2a043d7b25f2cf8bb",
            ),
            (
                Sighash::SINGLE,
                "1dab67d768be0380fc800098005d1f61744ffe585b0852f8d7adc12121a86938",
            ),
            (
                Sighash::SINGLE_ANYONE_CAN_PAY,
                "d4687b93c0a9090dc0a3384cd3a594ce613834bb37abc56f6032e96c597547e3",
            ),
        ];
        for (sighash_flags, expected) in cases.iter() {
            let args = LegacySighashArgs {
                index: 0,
                sighash_flags: *sighash_flags,
                prevout_script: &prevout_script,
            };
            assert_eq!(
                tx.legacy_sighash(&args).unwrap(),
                SigHash::deserialize_hex(expected).unwrap()
            );
        }
    }

    #[test]
    fn it_passes_more_legacy_sighash_tests() {
        // from riemann
        let tx_hex = "0200000002ee9242c89e79ab2aa537408839329895392b97505b3496d5543d6d2f531b94d20000000000fdffffffee9242c89e79ab2aa537408839329895392b97505b3496d5543d6d2f531b94d20000000000fdffffff0273d301000000000017a914bba5acbec4e6e3374a0345bf3609fa7cfea825f18773d301000000000017a914bba5acbec4e6e3374a0345bf3609fa7cfea825f18700000000";
        let tx = parse(tx_hex);
        assert_eq!(tx.serialized_size(true), tx_hex.len() / 2);

        let prevout_script =
            Script::deserialize_hex("160014758ce550380d964051086798d6546bebdca27a73").unwrap();

        let txid =
            TXID::deserialize_hex("40157948972c5c97a2bafff861ee2f8745151385c7f9fbd03991ddf59b76ac81")
                .unwrap();
        assert_eq!(tx.txid(), txid);

        let cases = [
            (
                Sighash::ALL,
                "3ab40bf1287b7be9a5c67ed0f97f80b38c5f68e53ec93bffd3893901eaaafdb2",
            ),
            (
                Sighash::ALL_ANYONE_CAN_PAY,
                "2d5802fed31e1ef6a857346cc0a9085ea452daeeb3a0b5afcb16a2203ce5689d",
            ),
            (
                Sighash::SINGLE,
                "ea52b62b26c1f0db838c952fa50806fb8e39ba4c92a9a88d1b4ba7e9c094517d",
            ),
            (
                Sighash::SINGLE_ANYONE_CAN_PAY,
                "9e2aca0a04afa6e1e5e00ff16b06a247a0da1e7bbaa7cd761c066a82bb3b07d0",
            ),
        ];
        for (sighash_flags, expected) in cases.iter() {
            let args = LegacySighashArgs {
                index: 1,
                sighash_flags: *sighash_flags,
                prevout_script: &prevout_script,
            };
            assert_eq!(
                tx.legacy_sighash(&args).unwrap(),
                SigHash::deserialize_hex(expected).unwrap()
            );
        }
    }

    #[test]
    fn it_calculates_witness_sighashes() {
        // pulled from riemann helpers; the witness serialization carries
        // empty stacks, so the parsed transaction is not segregated.
        let tx_hex = "02000000000101ee9242c89e79ab2aa537408839329895392b97505b3496d5543d6d2f531b94d20000000000fdffffff0173d301000000000017a914bba5acbec4e6e3374a0345bf3609fa7cfea825f18700cafd0700";
        let tx = parse(tx_hex);
        assert!(!tx.is_segregated());

        let prevout_script =
            Script::deserialize_hex("160014758ce550380d964051086798d6546bebdca27a73").unwrap();

        let txid =
            TXID::deserialize_hex("9e77087321b870859ebf08976d665c42d9f98cad18fff6a05a91c1d2da6d6c41")
                .unwrap();
        assert_eq!(tx.txid(), txid);

        let cases = [
            (
                Sighash::ALL,
                "135754ab872e4943f7a9c30d6143c4c7187e33d0f63c75ec82a7f9a15e2f2d00",
            ),
            (
                Sighash::ALL_ANYONE_CAN_PAY,
                "cc7438d5b15e93ba612dcd227cf1937c35273675b3aa7d1b771573667376ddf6",
            ),
            (
                Sighash::SINGLE,
                "d04631d2742e6fd8e80e2e4309dece65becca41d37fd6bc0bcba041c52d824d5",
            ),
            (
                Sighash::SINGLE_ANYONE_CAN_PAY,
                "ffea9cdda07170af9bc9967cedf485e9fe15b78a622e0c196c0b6fc64f40c615",
            ),
        ];
        for (sighash_flags, expected) in cases.iter() {
            let args = WitnessSighashArgs {
                index: 0,
                sighash_flags: *sighash_flags,
                prevout_script: &prevout_script,
                prevout_value: 120_000,
            };
            assert_eq!(
                tx.witness_sighash(&args).unwrap(),
                SigHash::deserialize_hex(expected).unwrap()
            );
        }
    }

    #[test]
    fn it_passes_more_witness_sighash_tests() {
        // from riemann
        let tx_hex = "02000000000102ee9242c89e79ab2aa537408839329895392b97505b3496d5543d6d2f531b94d20000000000fdffffffee9242c89e79ab2aa537408839329895392b97505b3496d5543d6d2f531b94d20000000000fdffffff0273d301000000000017a914bba5acbec4e6e3374a0345bf3609fa7cfea825f18773d301000000000017a914bba5acbec4e6e3374a0345bf3609fa7cfea825f1870000cafd0700";
        let tx = parse(tx_hex);

        let prevout_script =
            Script::deserialize_hex("160014758ce550380d964051086798d6546bebdca27a73").unwrap();

        let txid =
            TXID::deserialize_hex("184e7bce099679b27ed958213c97d2fb971e227c6517bca11f06ccbb97dcdc30")
                .unwrap();
        assert_eq!(tx.txid(), txid);

        let cases = [
            (
                Sighash::ALL,
                "75385c87ece4980b581cfd71bc5814f607801a87f6e0973c63dc9fda465c19c4",
            ),
            (
                Sighash::ALL_ANYONE_CAN_PAY,
                "bc55c4303c82cdcc8e290c597a00d662ab34414d79ec15d63912b8be7fe2ca3c",
            ),
            (
                Sighash::SINGLE,
                "9d57bf7af01a4e0baa57e749aa193d37a64e3bbc08eb88af93944f41af8dfc70",
            ),
            (
                Sighash::SINGLE_ANYONE_CAN_PAY,
                "ffea9cdda07170af9bc9967cedf485e9fe15b78a622e0c196c0b6fc64f40c615",
            ),
        ];
        for (sighash_flags, expected) in cases.iter() {
            let args = WitnessSighashArgs {
                index: 1,
                sighash_flags: *sighash_flags,
                prevout_script: &prevout_script,
                prevout_value: 120_000,
            };
            assert_eq!(
                tx.witness_sighash(&args).unwrap(),
                SigHash::deserialize_hex(expected).unwrap()
            );
        }
    }

    #[test]
    fn it_reuses_cached_midstates_across_inputs() {
        let tx_hex = "02000000000102ee9242c89e79ab2aa537408839329895392b97505b3496d5543d6d2f531b94d20000000000fdffffffee9242c89e79ab2aa537408839329895392b97505b3496d5543d6d2f531b94d20000000000fdffffff0273d301000000000017a914bba5acbec4e6e3374a0345bf3609fa7cfea825f18773d301000000000017a914bba5acbec4e6e3374a0345bf3609fa7cfea825f1870000cafd0700";
        let tx = parse(tx_hex);

        // Compute for input 0, snapshot the midstates, compute for input 1,
        // and require bit-identical cached digests.
        let prevout_script = Script::null();
        let args = |index| WitnessSighashArgs {
            index,
            sighash_flags: Sighash::ALL,
            prevout_script: &prevout_script,
            prevout_value: 120_000,
        };

        tx.witness_sighash(&args(0)).unwrap();
        let first = *tx.sighash_cache();
        tx.witness_sighash(&args(1)).unwrap();
        let second = *tx.sighash_cache();

        assert_eq!(first, second);
        assert_eq!(first.points, tx.points_hash());
        assert_eq!(first.sequences, tx.sequences_hash());
        assert_eq!(first.outputs, tx.outputs_hash());
    }

    #[test]
    fn it_returns_the_one_hash_sentinel_for_single_out_of_range() {
        // One output, but signing input index 1.
        let tx_hex = "02000000000102ee9242c89e79ab2aa537408839329895392b97505b3496d5543d6d2f531b94d20000000000fdffffffee9242c89e79ab2aa537408839329895392b97505b3496d5543d6d2f531b94d20000000000fdffffff0173d301000000000017a914bba5acbec4e6e3374a0345bf3609fa7cfea825f1870000cafd0700";
        let tx = parse(tx_hex);
        let prevout_script = Script::null();

        let args = LegacySighashArgs {
            index: 1,
            sighash_flags: Sighash::SINGLE,
            prevout_script: &prevout_script,
        };
        let sentinel = tx.legacy_sighash(&args).unwrap();
        assert_eq!(sentinel.0, ONE_HASH);
        assert_eq!(
            sentinel.serialize_hex(),
            "0000000000000000000000000000000000000000000000000000000000000001"
        );

        // BIP143 has no sentinel: the single-output hash is zero instead.
        let args = WitnessSighashArgs {
            index: 1,
            sighash_flags: Sighash::SINGLE,
            prevout_script: &prevout_script,
            prevout_value: 120_000,
        };
        assert!(tx.witness_sighash(&args).is_ok());
    }

    #[test]
    fn it_supports_sighash_none() {
        let tx_hex = "0100000001813f79011acb80925dfe69b3def355fe914bd1d96a3f5f71bf8303c6a989c7d1000000006b483045022100ed81ff192e75a3fd2304004dcadb746fa5e24c5031ccfcf21320b0277457c98f02207a986d955c6e0cb35d446a89d3f56100f4d7f67801c31967743a9c8e10615bed01210349fc4e631e3624a545de3f89f5d8684c7b8138bd94bdd531d2e213bf016b278afeffffff02a135ef01000000001976a914bc3b654dca7e56b04dca18f2566cdaf02e8d9ada88ac99c39800000000001976a9141c4bc762dd5423e332166702cb75f40df79fea1288ac19430600";
        let tx = parse(tx_hex);
        let prevout_script = Script::null();

        // NONE writes an empty output vector into the preimage.
        let mut preimage = vec![];
        tx.write_legacy_sighash_preimage(
            &mut preimage,
            &LegacySighashArgs {
                index: 0,
                sighash_flags: Sighash::NONE,
                prevout_script: &prevout_script,
            },
        )
        .unwrap();
        let digest = tx
            .legacy_sighash(&LegacySighashArgs {
                index: 0,
                sighash_flags: Sighash::NONE,
                prevout_script: &prevout_script,
            })
            .unwrap();
        assert_eq!(digest.0, hash256(&preimage));

        // The flag byte is widened to four bytes at the preimage tail.
        assert_eq!(&preimage[preimage.len() - 4..], &[0x02, 0, 0, 0]);
    }

    #[test]
    fn it_masks_sighash_flags() {
        assert_eq!(Sighash::from_u8(0x01).coverage(), Coverage::All);
        assert_eq!(Sighash::from_u8(0x02).coverage(), Coverage::None);
        assert_eq!(Sighash::from_u8(0x03).coverage(), Coverage::Single);

        // Bits 6/7 are masked off: 0x22 is still NONE, 0x43 still SINGLE.
        assert_eq!(Sighash::from_u8(0x22).coverage(), Coverage::None);
        assert_eq!(Sighash::from_u8(0x43).coverage(), Coverage::Single);

        // Anything else means ALL, including zero.
        assert_eq!(Sighash::from_u8(0x00).coverage(), Coverage::All);
        assert_eq!(Sighash::from_u8(0x04).coverage(), Coverage::All);
        assert_eq!(Sighash::from_u8(0x1f).coverage(), Coverage::All);

        assert!(Sighash::from_u8(0x81).anyone_can_pay());
        assert!(!Sighash::from_u8(0x01).anyone_can_pay());
        assert_eq!(Sighash::from_u8(0x82).coverage(), Coverage::None);
    }

    #[test]
    fn it_round_trips_real_witness_transactions() {
        // from mainnet: 3c7fb4af9b7bd2ba6f155318e0bc8a50432d4732ab6e36293ef45b304567b46a
        let tx_hex = "01000000000101b77bebb3ac480e99c0d95a4c812137b116e65e2f3b3a66a36d0e252928d460180100000000ffffffff03982457000000000017a91417b8e0f150215cc70bf2fb58070041d655b162dd8740e133000000000017a9142535e444f7d55f0500c1f86609d6cfc289576b698747abfb0100000000220020701a8d401c84fb13e6baf169d59684e17abd9fa216c8cc5b9fc63d622ff8c58d040047304402205c6a889efa26955bef7ce2b08792e63e25eac9859080f0d83912b0ea833d7eb402205f859f4640f1600db5012b467ec05bb4ae1779640c1b5fadc8908960740e52b30147304402201c239ea25cfeadfa9493a1b0d136d70f50f821385972b7188c4329c2bf2d23a302201ee790e4b6794af6567f85a226a387d5b0222c3dc90d2fc558d09e08062b8271016952210375e00eb72e29da82b89367947f29ef34afb75e8654f6ea368e0acdfd92976b7c2103a1b26313f430c4b15bb1fdce663207659d8cac749a0e53d70eff01874496feff2103c96d495bfdd5ba4145e3e046fee45e84a8a48ad05bd8dbb395c011a32cf9f88053ae00000000";
        let tx = parse(tx_hex);
        assert!(tx.is_segregated());
        assert_eq!(tx.serialize_hex(), tx_hex);
        assert_eq!(tx.serialized_size(true), tx_hex.len() / 2);
        assert!(tx.serialized_size(false) < tx.serialized_size(true));

        let wtxid =
            WTXID::deserialize_hex("84d85ce82c728e072bb11f379a6ed0b9127aa43905b7bae14b254bfcdce63549")
                .unwrap();
        assert_eq!(tx.wtxid(), wtxid);
    }

    #[test]
    fn it_rejects_bad_witness_flags() {
        let tx_hex = "010000000002";
        match Transaction::deserialize_hex(tx_hex) {
            Err(TxError::BadWitnessFlag([0, 2])) => {}
            other => panic!("expected BadWitnessFlag, got {:?}", other),
        }
    }

    #[test]
    fn it_tracks_segregation_through_witness_mutation() {
        let tx_hex = "0100000001813f79011acb80925dfe69b3def355fe914bd1d96a3f5f71bf8303c6a989c7d1000000006b483045022100ed81ff192e75a3fd2304004dcadb746fa5e24c5031ccfcf21320b0277457c98f02207a986d955c6e0cb35d446a89d3f56100f4d7f67801c31967743a9c8e10615bed01210349fc4e631e3624a545de3f89f5d8684c7b8138bd94bdd531d2e213bf016b278afeffffff02a135ef01000000001976a914bc3b654dca7e56b04dca18f2566cdaf02e8d9ada88ac99c39800000000001976a9141c4bc762dd5423e332166702cb75f40df79fea1288ac19430600";
        let mut tx = parse(tx_hex);
        assert!(!tx.is_segregated());
        let nominal = tx.serialized_size(false);

        assert!(tx.set_witness(0, Witness::from(vec![vec![0xaa; 16]])));
        assert!(tx.is_segregated());
        assert_eq!(tx.serialized_size(true), nominal + 2 + 1 + 1 + 16);

        // txid ignores the witness; wtxid does not.
        let txid_hex = "03ee4f7a4e68f802303bc659f8f817964b4b74fe046facc3ae1be4679d622c45";
        assert_eq!(tx.txid(), TXID::deserialize_hex(txid_hex).unwrap());
        assert_ne!(tx.wtxid().0, tx.txid().0);

        assert!(!tx.set_witness(7, Witness::null()));
    }

    #[test]
    fn it_invalidates_the_sighash_cache_on_mutation() {
        let tx_hex = "0100000001813f79011acb80925dfe69b3def355fe914bd1d96a3f5f71bf8303c6a989c7d1000000006b483045022100ed81ff192e75a3fd2304004dcadb746fa5e24c5031ccfcf21320b0277457c98f02207a986d955c6e0cb35d446a89d3f56100f4d7f67801c31967743a9c8e10615bed01210349fc4e631e3624a545de3f89f5d8684c7b8138bd94bdd531d2e213bf016b278afeffffff02a135ef01000000001976a914bc3b654dca7e56b04dca18f2566cdaf02e8d9ada88ac99c39800000000001976a9141c4bc762dd5423e332166702cb75f40df79fea1288ac19430600";
        let mut tx = parse(tx_hex);

        let before = tx.outputs_hash();
        let mut outputs = tx.outputs().to_vec();
        outputs.truncate(1);
        tx.set_outputs(outputs);
        let after = tx.outputs_hash();
        assert_ne!(before, after);
    }

    #[test]
    fn it_identifies_coinbase_transactions() {
        use crate::types::txin::Outpoint;

        let coinbase = Transaction::new(
            1,
            vec![TxInput::new(Outpoint::null(), vec![0x51], 0xffff_ffff)],
            vec![TxOut::new(50_0000_0000, vec![])],
            0,
        );
        assert!(coinbase.is_coinbase());

        let mut two_inputs = coinbase.clone();
        two_inputs.set_inputs(vec![
            TxInput::new(Outpoint::null(), vec![], 0),
            TxInput::new(Outpoint::null(), vec![], 0),
        ]);
        assert!(!two_inputs.is_coinbase());
    }
}
