//! The BIP341 (taproot) signature hash, with the BIP342 tapscript
//! extension.
//!
//! The preimage is bound by the `TapSighash` tagged hash. Its interior
//! midstates (prevouts, amounts, scripts, sequences, outputs, annex) are
//! plain single SHA-256 digests, never double. The tapscript fields come
//! last, so the writer midstate before `last_codeseparator_position` can
//! be cached across signature operations within one script.

use std::io::Write;

use keel_core::ser::{ByteFormat, SerError};
use keel_hashes::{Hash256Digest, MarkedDigestWriter, Sha256Writer, TaggedWriter};

use crate::{
    hashes::SigHash,
    types::{
        transactions::{Coverage, Sighash, Transaction, TxError, TxResult},
        txout::TxOut,
    },
};

/// The key version committed by tapscript signatures (BIP342).
pub const TAPSCRIPT_KEY_VERSION: u8 = 0;

/// The tapscript (BIP342) extension fields.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct TapscriptExt {
    /// The tapleaf hash of the executing script (BIP341).
    pub tapleaf_hash: Hash256Digest,
    /// Opcode position of the last executed `OP_CODESEPARATOR`, or
    /// `0xffff_ffff` when none has executed.
    pub last_codeseparator_position: u32,
}

/// Arguments for the BIP341/342 signature hash.
///
/// Taproot commits to every spent output, so the caller supplies the full
/// prevout set in input order (the amounts and scripts midstates), not
/// just the one under signature.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TaprootSighashArgs<'a> {
    /// The index of the input we'd like to sign.
    pub index: usize,
    /// The sighash flags to use. `0x00` is taproot's default-all.
    pub sighash_flags: Sighash,
    /// Every spent output, in input order.
    pub prevouts: &'a [TxOut],
    /// The annex, when the witness carries one.
    pub annex: Option<&'a [u8]>,
    /// The tapscript extension; `None` for key-path spends.
    pub ext: Option<TapscriptExt>,
}

fn sha256_writer_digest<F>(fill: F) -> TxResult<Hash256Digest>
where
    F: FnOnce(&mut Sha256Writer) -> TxResult<()>,
{
    let mut writer = Sha256Writer::default();
    fill(&mut writer)?;
    Ok(writer.finish())
}

impl Transaction {
    /// Write the BIP341 preimage (everything under the `TapSighash` tag).
    pub fn write_taproot_sighash_preimage<W: Write>(
        &self,
        writer: &mut W,
        args: &TaprootSighashArgs,
    ) -> TxResult<()> {
        let input = self
            .inputs()
            .get(args.index)
            .ok_or(TxError::MissingInput(args.index))?;
        let coverage = args.sighash_flags.coverage();
        let anyone = args.sighash_flags.anyone_can_pay();

        // The epoch precedes all fields.
        Self::write_u8(writer, 0)?;
        Self::write_u8(writer, args.sighash_flags.raw())?;
        Self::write_u32_le(writer, self.version())?;
        Self::write_u32_le(writer, self.locktime())?;

        if !anyone {
            if args.prevouts.len() < self.inputs().len() {
                return Err(TxError::MissingPrevout(args.prevouts.len()));
            }

            let prevouts = sha256_writer_digest(|sink| {
                for input in self.inputs() {
                    input.outpoint.write_to(sink)?;
                }
                Ok(())
            })?;
            prevouts.write_to(writer).map_err(SerError::from)?;

            let amounts = sha256_writer_digest(|sink| {
                for prevout in &args.prevouts[..self.inputs().len()] {
                    Self::write_u64_le(sink, prevout.value)?;
                }
                Ok(())
            })?;
            amounts.write_to(writer).map_err(SerError::from)?;

            let scripts = sha256_writer_digest(|sink| {
                for prevout in &args.prevouts[..self.inputs().len()] {
                    prevout.script_pubkey.write_to(sink).map_err(SerError::from)?;
                }
                Ok(())
            })?;
            scripts.write_to(writer).map_err(SerError::from)?;

            let sequences = sha256_writer_digest(|sink| {
                for input in self.inputs() {
                    Self::write_u32_le(sink, input.sequence)?;
                }
                Ok(())
            })?;
            sequences.write_to(writer).map_err(SerError::from)?;
        }

        if coverage == Coverage::All {
            let outputs = sha256_writer_digest(|sink| {
                for output in self.outputs() {
                    output.write_to(sink)?;
                }
                Ok(())
            })?;
            outputs.write_to(writer).map_err(SerError::from)?;
        }

        // Extension flag and annex presence share one byte.
        let ext_flag: u8 = if args.ext.is_some() { 1 } else { 0 };
        let spend_type = (ext_flag << 1) | (args.annex.is_some() as u8);
        Self::write_u8(writer, spend_type)?;

        if anyone {
            let prevout = args
                .prevouts
                .get(args.index)
                .ok_or(TxError::MissingPrevout(args.index))?;
            input.outpoint.write_to(writer)?;
            Self::write_u64_le(writer, prevout.value)?;
            prevout
                .script_pubkey
                .write_to(writer)
                .map_err(SerError::from)?;
            Self::write_u32_le(writer, input.sequence)?;
        } else {
            Self::write_u32_le(writer, args.index as u32)?;
        }

        if let Some(annex) = args.annex {
            let digest = sha256_writer_digest(|sink| {
                Self::write_compact_int(sink, annex.len() as u64)?;
                sink.write_all(annex).map_err(TxError::from)?;
                Ok(())
            })?;
            digest.write_to(writer).map_err(SerError::from)?;
        }

        if coverage == Coverage::Single {
            let output = self
                .outputs()
                .get(args.index)
                .ok_or(TxError::MissingOutput(args.index))?;
            let digest = sha256_writer_digest(|sink| {
                output.write_to(sink)?;
                Ok(())
            })?;
            digest.write_to(writer).map_err(SerError::from)?;
        }

        if let Some(ext) = &args.ext {
            ext.tapleaf_hash.write_to(writer).map_err(SerError::from)?;
            Self::write_u8(writer, TAPSCRIPT_KEY_VERSION)?;
            Self::write_u32_le(writer, ext.last_codeseparator_position)?;
        }

        Ok(())
    }

    /// The BIP341/342 (witness v1) signature hash.
    pub fn taproot_sighash(&self, args: &TaprootSighashArgs) -> TxResult<SigHash> {
        let mut writer = TaggedWriter::tap_sighash();
        self.write_taproot_sighash_preimage(&mut writer, args)?;
        Ok(SigHash::from(writer.finish()))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use keel_hashes::tagged_hash;

    use crate::types::{
        script::Script,
        transactions::WitnessSighashArgs,
        txin::{Outpoint, TxInput},
    };

    fn fixture() -> (Transaction, Vec<TxOut>) {
        let tx = Transaction::new(
            2,
            vec![
                TxInput::new(Outpoint::null(), vec![], 0xfffffffd),
                TxInput::new(Outpoint::null(), vec![], 0xfffffffe),
            ],
            vec![
                TxOut::new(
                    90_000,
                    hex::decode("0014758ce550380d964051086798d6546bebdca27a73").unwrap(),
                ),
                TxOut::new(10_000, vec![]),
            ],
            500_000,
        );
        let prevouts = vec![
            TxOut::new(
                60_000,
                hex::decode(
                    "5120701a8d401c84fb13e6baf169d59684e17abd9fa216c8cc5b9fc63d622ff8c58d",
                )
                .unwrap(),
            ),
            TxOut::new(
                50_000,
                hex::decode(
                    "5120b2329e01a1ad5a2b6cb40354b2d4b4aa9b5a4a97ee1a911f8d701584864b0f12",
                )
                .unwrap(),
            ),
        ];
        (tx, prevouts)
    }

    #[test]
    fn it_binds_the_preimage_with_the_tap_sighash_tag() {
        let (tx, prevouts) = fixture();
        let args = TaprootSighashArgs {
            index: 0,
            sighash_flags: Sighash::from_u8(0x00),
            prevouts: &prevouts,
            annex: None,
            ext: None,
        };

        let mut preimage = vec![];
        tx.write_taproot_sighash_preimage(&mut preimage, &args).unwrap();
        let digest = tx.taproot_sighash(&args).unwrap();
        assert_eq!(digest.0, tagged_hash("TapSighash", &preimage));
    }

    #[test]
    fn it_bounds_the_preimage_length() {
        let (tx, prevouts) = fixture();

        // Default flags, no annex, no tapscript: epoch + 174 data bytes.
        let mut preimage = vec![];
        tx.write_taproot_sighash_preimage(
            &mut preimage,
            &TaprootSighashArgs {
                index: 0,
                sighash_flags: Sighash::from_u8(0x00),
                prevouts: &prevouts,
                annex: None,
                ext: None,
            },
        )
        .unwrap();
        assert!(preimage.len() <= 207);

        // Anyone-can-pay drops the four midstates for the literal prevout.
        let mut anyone = vec![];
        tx.write_taproot_sighash_preimage(
            &mut anyone,
            &TaprootSighashArgs {
                index: 0,
                sighash_flags: Sighash::from_u8(0x81),
                prevouts: &prevouts,
                annex: None,
                ext: None,
            },
        )
        .unwrap();
        assert!(anyone.len() <= 158);
        assert!(anyone.len() < preimage.len());
    }

    #[test]
    fn it_encodes_the_spend_type_byte() {
        let (tx, prevouts) = fixture();
        let annex = [0x50u8, 0xaa, 0xbb];
        let ext = TapscriptExt {
            tapleaf_hash: [0x42; 32],
            last_codeseparator_position: 0xffff_ffff,
        };

        let render = |annex: Option<&[u8]>, ext: Option<TapscriptExt>| {
            let mut preimage = vec![];
            tx.write_taproot_sighash_preimage(
                &mut preimage,
                &TaprootSighashArgs {
                    index: 1,
                    sighash_flags: Sighash::from_u8(0x00),
                    prevouts: &prevouts,
                    annex,
                    ext,
                },
            )
            .unwrap();
            preimage
        };

        // The spend type byte sits after epoch(1) + flags(1) + version(4) +
        // locktime(4) + four midstates(128) + outputs midstate(32).
        const SPEND_TYPE_AT: usize = 170;
        assert_eq!(render(None, None)[SPEND_TYPE_AT], 0x00);
        assert_eq!(render(Some(&annex), None)[SPEND_TYPE_AT], 0x01);
        assert_eq!(render(None, Some(ext))[SPEND_TYPE_AT], 0x02);
        assert_eq!(render(Some(&annex), Some(ext))[SPEND_TYPE_AT], 0x03);

        // The annex commits as sha256(varint || annex).
        let with_annex = render(Some(&annex), None);
        let expected = {
            let mut buf = vec![annex.len() as u8];
            buf.extend_from_slice(&annex);
            keel_hashes::sha256(&buf)
        };
        // After the spend type comes the input index (4 bytes).
        assert_eq!(&with_annex[SPEND_TYPE_AT + 5..SPEND_TYPE_AT + 37], &expected);

        // Tapscript fields land at the tail.
        let with_ext = render(None, Some(ext));
        let tail = &with_ext[with_ext.len() - 37..];
        assert_eq!(&tail[..32], &[0x42; 32]);
        assert_eq!(tail[32], TAPSCRIPT_KEY_VERSION);
        assert_eq!(&tail[33..], &0xffff_ffffu32.to_le_bytes());
    }

    #[test]
    fn it_uses_single_sha256_midstates() {
        // The prevouts midstate is sha256 of the outpoints, not hash256.
        let (tx, prevouts) = fixture();
        let mut preimage = vec![];
        tx.write_taproot_sighash_preimage(
            &mut preimage,
            &TaprootSighashArgs {
                index: 0,
                sighash_flags: Sighash::from_u8(0x00),
                prevouts: &prevouts,
                annex: None,
                ext: None,
            },
        )
        .unwrap();

        let mut outpoints = vec![];
        for input in tx.inputs() {
            input.outpoint.write_to(&mut outpoints).unwrap();
        }
        let single = keel_hashes::sha256(&outpoints);
        let double = keel_hashes::hash256(&outpoints);
        assert_eq!(&preimage[10..42], &single);
        assert_ne!(&preimage[10..42], &double);
    }

    #[test]
    fn it_rejects_taproot_single_out_of_range() {
        let (tx, prevouts) = fixture();
        let mut outputs = tx.outputs().to_vec();
        outputs.truncate(1);
        let mut tx = tx;
        tx.set_outputs(outputs);

        let args = TaprootSighashArgs {
            index: 1,
            sighash_flags: Sighash::from_u8(0x03),
            prevouts: &prevouts,
            annex: None,
            ext: None,
        };
        match tx.taproot_sighash(&args) {
            Err(TxError::MissingOutput(1)) => {}
            other => panic!("expected MissingOutput, got {:?}", other),
        }
    }

    #[test]
    fn it_requires_the_full_prevout_set() {
        let (tx, prevouts) = fixture();
        let args = TaprootSighashArgs {
            index: 0,
            sighash_flags: Sighash::from_u8(0x01),
            prevouts: &prevouts[..1],
            annex: None,
            ext: None,
        };
        match tx.taproot_sighash(&args) {
            Err(TxError::MissingPrevout(1)) => {}
            other => panic!("expected MissingPrevout, got {:?}", other),
        }

        // Anyone-can-pay needs only the signing input's prevout.
        let args = TaprootSighashArgs {
            index: 0,
            sighash_flags: Sighash::from_u8(0x81),
            prevouts: &prevouts[..1],
            annex: None,
            ext: None,
        };
        assert!(tx.taproot_sighash(&args).is_ok());
    }

    #[test]
    fn it_differs_from_the_v0_sighash() {
        let (tx, prevouts) = fixture();
        let script = Script::null();
        let v0 = tx
            .witness_sighash(&WitnessSighashArgs {
                index: 0,
                sighash_flags: Sighash::ALL,
                prevout_script: &script,
                prevout_value: prevouts[0].value,
            })
            .unwrap();
        let v1 = tx
            .taproot_sighash(&TaprootSighashArgs {
                index: 0,
                sighash_flags: Sighash::ALL,
                prevouts: &prevouts,
                annex: None,
                ext: None,
            })
            .unwrap();
        assert_ne!(v0, v1);
    }
}
