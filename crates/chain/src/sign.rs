//! Endorsement creation and checking: the glue between signature hashing
//! and the secp facade.
//!
//! An endorsement is the DER signature a signer pushes onto the stack,
//! with the sighash flag byte appended. Taproot signatures are 64-byte
//! Schnorr signatures, with the flag byte appended only when it is not
//! the default zero.

use thiserror::Error;

use keel_secp::{
    der::{encode_signature, join_endorsement, parse_signature, split_endorsement},
    schnorr_sign, schnorr_verify, sign, verify_signature, SecpError, Secret,
};

use crate::types::{
    script::Script,
    transactions::{
        LegacySighashArgs, Sighash, Transaction, TxError, WitnessSighashArgs,
    },
    taproot::TaprootSighashArgs,
};

/// Errors from endorsement creation or checking.
#[derive(Debug, Error)]
pub enum SignError {
    /// The signature hash could not be computed.
    #[error(transparent)]
    Tx(#[from] TxError),

    /// A key or signature was invalid.
    #[error(transparent)]
    Secp(#[from] SecpError),
}

/// Result alias for endorsement operations.
pub type SignResult<T> = Result<T, SignError>;

/// Sign an input under the unversioned sighash and return the endorsement.
pub fn create_legacy_endorsement(
    secret: &Secret,
    tx: &Transaction,
    args: &LegacySighashArgs,
) -> SignResult<Vec<u8>> {
    let digest = tx.legacy_sighash(args)?;
    let compact = sign(secret, &digest.0)?;
    let der = encode_signature(&compact)?;
    Ok(join_endorsement(&der, args.sighash_flags.raw()))
}

/// Check an endorsement against the unversioned sighash. The flag byte
/// comes from the endorsement itself; DER parsing is lax, as historical
/// signatures require.
pub fn check_legacy_endorsement(
    endorsement: &[u8],
    public_key: &[u8],
    tx: &Transaction,
    index: usize,
    prevout_script: &Script,
) -> SignResult<bool> {
    let (der, flag) = split_endorsement(endorsement)?;
    let compact = parse_signature(der, false)?;
    let digest = tx.legacy_sighash(&LegacySighashArgs {
        index,
        sighash_flags: Sighash::from_u8(flag),
        prevout_script,
    })?;
    Ok(verify_signature(public_key, &digest.0, &compact))
}

/// Sign an input under the BIP143 sighash and return the endorsement.
pub fn create_witness_endorsement(
    secret: &Secret,
    tx: &Transaction,
    args: &WitnessSighashArgs,
) -> SignResult<Vec<u8>> {
    let digest = tx.witness_sighash(args)?;
    let compact = sign(secret, &digest.0)?;
    let der = encode_signature(&compact)?;
    Ok(join_endorsement(&der, args.sighash_flags.raw()))
}

/// Check an endorsement against the BIP143 sighash.
pub fn check_witness_endorsement(
    endorsement: &[u8],
    public_key: &[u8],
    tx: &Transaction,
    index: usize,
    prevout_script: &Script,
    prevout_value: u64,
) -> SignResult<bool> {
    let (der, flag) = split_endorsement(endorsement)?;
    let compact = parse_signature(der, false)?;
    let digest = tx.witness_sighash(&WitnessSighashArgs {
        index,
        sighash_flags: Sighash::from_u8(flag),
        prevout_script,
        prevout_value,
    })?;
    Ok(verify_signature(public_key, &digest.0, &compact))
}

/// Sign an input under the BIP341 sighash. The flag byte is appended only
/// when it is not taproot's default zero.
pub fn create_taproot_signature(
    secret: &Secret,
    tx: &Transaction,
    args: &TaprootSighashArgs,
) -> SignResult<Vec<u8>> {
    let digest = tx.taproot_sighash(args)?;
    let signature = schnorr_sign(secret, &digest.0)?;
    let mut out = signature.to_vec();
    if args.sighash_flags.raw() != 0 {
        out.push(args.sighash_flags.raw());
    }
    Ok(out)
}

/// Check a taproot witness signature against an x-only public key. A
/// 65-byte signature carries its flag byte; a 64-byte one means the
/// default zero, and the caller's args must agree.
pub fn check_taproot_signature(
    signature: &[u8],
    x_only: &[u8; 32],
    tx: &Transaction,
    args: &TaprootSighashArgs,
) -> SignResult<bool> {
    let raw = match signature.len() {
        64 => signature,
        65 if signature[64] == args.sighash_flags.raw() => &signature[..64],
        _ => return Ok(false),
    };
    let mut compact = [0u8; 64];
    compact.copy_from_slice(raw);

    let digest = tx.taproot_sighash(args)?;
    Ok(schnorr_verify(x_only, &digest.0, &compact))
}
