//! # Keel Secp
//!
//! A thin facade over the pure-Rust `k256` secp256k1 implementation,
//! exposing the operation set the chain layer needs: key derivation and
//! validation, point and scalar arithmetic, deterministic (RFC 6979) ECDSA
//! with low-s normalization, recoverable signatures, BIP340 Schnorr, and
//! the strict/lax DER codec.
//!
//! The original C library behind this design keeps two lazily-initialized
//! process-wide contexts. `k256` is context-free, so every operation here
//! is a plain pure function of its inputs.
//!
//! Signatures pass through this crate in 64-byte compact `r || s` form;
//! the [`der`] module converts to and from the wire encoding.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(unused_extern_crates)]

pub mod der;

use k256::{
    ecdsa::{
        signature::hazmat::{PrehashSigner, PrehashVerifier},
        RecoveryId, Signature, SigningKey, VerifyingKey,
    },
    elliptic_curve::{point::AffineCoordinates, sec1::ToEncodedPoint, PrimeField},
    schnorr, AffinePoint, FieldBytes, ProjectivePoint, PublicKey, Scalar, SecretKey,
};
use thiserror::Error;

/// A 32-byte secret key.
pub type Secret = [u8; 32];

/// A 32-byte message digest to be signed.
pub type SigHash = [u8; 32];

/// A 64-byte compact `r || s` ECDSA signature.
pub type CompactSignature = [u8; 64];

/// A 64-byte BIP340 Schnorr signature.
pub type SchnorrSignature = [u8; 64];

/// A compressed public key.
pub const COMPRESSED_LEN: usize = 33;

/// An uncompressed public key.
pub const UNCOMPRESSED_LEN: usize = 65;

/// Errors surfaced by the secp facade.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SecpError {
    /// A secret was zero or not less than the group order.
    #[error("invalid secret key")]
    InvalidSecret,

    /// A public key was not a valid curve point.
    #[error("invalid public key")]
    InvalidPoint,

    /// A signature failed to parse or normalize.
    #[error("invalid signature")]
    InvalidSignature,

    /// A recovery id was outside `0..4` or did not recover a key.
    #[error("invalid recovery id")]
    InvalidRecoveryId,

    /// A point operation produced the identity (or a scalar op produced
    /// zero), which has no valid encoding.
    #[error("degenerate curve operation result")]
    Degenerate,

    /// A DER signature failed strict or lax parsing.
    #[error("unparseable DER signature")]
    Der,

    /// An endorsement was too short to split into signature and flag.
    #[error("endorsement too short")]
    BadEndorsement,
}

/// A compact signature plus its recovery id.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct RecoverableSignature {
    /// The compact `r || s` signature.
    pub signature: CompactSignature,
    /// The recovery id, always in `0..4`.
    pub recovery_id: u8,
}

fn parse_secret(secret: &Secret) -> Result<SecretKey, SecpError> {
    SecretKey::from_slice(secret).map_err(|_| SecpError::InvalidSecret)
}

fn parse_point(point: &[u8]) -> Result<PublicKey, SecpError> {
    PublicKey::from_sec1_bytes(point).map_err(|_| SecpError::InvalidPoint)
}

fn parse_scalar(scalar: &[u8; 32]) -> Result<Scalar, SecpError> {
    Option::<Scalar>::from(Scalar::from_repr(FieldBytes::clone_from_slice(scalar)))
        .ok_or(SecpError::InvalidSecret)
}

fn encode_point(point: &PublicKey, compressed: bool) -> Vec<u8> {
    point.to_encoded_point(compressed).as_bytes().to_vec()
}

fn affine_to_bytes(point: ProjectivePoint, compressed: bool) -> Result<Vec<u8>, SecpError> {
    let affine = point.to_affine();
    let public = PublicKey::from_affine(affine).map_err(|_| SecpError::Degenerate)?;
    Ok(encode_point(&public, compressed))
}

/// Derive the public key for a secret, in the requested encoding.
pub fn secret_to_public(secret: &Secret, compressed: bool) -> Result<Vec<u8>, SecpError> {
    let secret = parse_secret(secret)?;
    Ok(encode_point(&secret.public_key(), compressed))
}

/// True if the secret is a valid scalar: nonzero and less than the group
/// order.
pub fn verify_secret(secret: &Secret) -> bool {
    parse_secret(secret).is_ok()
}

/// True if the bytes encode a valid curve point (compressed or not).
pub fn verify_point(point: &[u8]) -> bool {
    parse_point(point).is_ok()
}

/// Re-encode a public key compressed.
pub fn compress_point(point: &[u8]) -> Result<[u8; COMPRESSED_LEN], SecpError> {
    let encoded = encode_point(&parse_point(point)?, true);
    let mut out = [0u8; COMPRESSED_LEN];
    out.copy_from_slice(&encoded);
    Ok(out)
}

/// Re-encode a public key uncompressed.
pub fn decompress_point(point: &[u8]) -> Result<[u8; UNCOMPRESSED_LEN], SecpError> {
    let encoded = encode_point(&parse_point(point)?, false);
    let mut out = [0u8; UNCOMPRESSED_LEN];
    out.copy_from_slice(&encoded);
    Ok(out)
}

/// `point + tweak * G`, preserving the input encoding.
pub fn ec_add(point: &[u8], tweak: &[u8; 32]) -> Result<Vec<u8>, SecpError> {
    let compressed = point.len() == COMPRESSED_LEN;
    let parsed = parse_point(point)?;
    let scalar = parse_scalar(tweak)?;
    let sum = parsed.to_projective() + ProjectivePoint::GENERATOR * scalar;
    affine_to_bytes(sum, compressed)
}

/// `(a + b) mod n`, failing on a zero result.
pub fn ec_add_scalars(a: &[u8; 32], b: &[u8; 32]) -> Result<[u8; 32], SecpError> {
    let sum = parse_scalar(a)? + parse_scalar(b)?;
    if bool::from(sum.is_zero()) {
        return Err(SecpError::Degenerate);
    }
    let mut out = [0u8; 32];
    out.copy_from_slice(&sum.to_repr());
    Ok(out)
}

/// `point * scalar`, preserving the input encoding.
pub fn ec_multiply(point: &[u8], scalar: &[u8; 32]) -> Result<Vec<u8>, SecpError> {
    let compressed = point.len() == COMPRESSED_LEN;
    let parsed = parse_point(point)?;
    let scalar = parse_scalar(scalar)?;
    affine_to_bytes(parsed.to_projective() * scalar, compressed)
}

/// The additive inverse of a point, preserving the input encoding.
pub fn ec_negate(point: &[u8]) -> Result<Vec<u8>, SecpError> {
    let compressed = point.len() == COMPRESSED_LEN;
    let parsed = parse_point(point)?;
    affine_to_bytes(-parsed.to_projective(), compressed)
}

/// The sum of a list of points, compressed.
pub fn ec_sum(points: &[&[u8]]) -> Result<[u8; COMPRESSED_LEN], SecpError> {
    let mut sum = ProjectivePoint::IDENTITY;
    for point in points {
        sum += parse_point(point)?.to_projective();
    }
    let encoded = affine_to_bytes(sum, true)?;
    let mut out = [0u8; COMPRESSED_LEN];
    out.copy_from_slice(&encoded);
    Ok(out)
}

/// Deterministic (RFC 6979) ECDSA over the digest. The result is low-s
/// normalized compact `r || s`.
pub fn sign(secret: &Secret, sighash: &SigHash) -> Result<CompactSignature, SecpError> {
    let key = SigningKey::from(parse_secret(secret)?);
    let signature: Signature = key
        .sign_prehash(sighash)
        .map_err(|_| SecpError::InvalidSignature)?;
    let signature = signature.normalize_s().unwrap_or(signature);
    let mut out = [0u8; 64];
    out.copy_from_slice(&signature.to_bytes());
    Ok(out)
}

/// Verify a compact ECDSA signature over the digest. The network rule is
/// low-s, but both forms are accepted here: the signature is normalized
/// before verification.
pub fn verify_signature(point: &[u8], sighash: &SigHash, signature: &CompactSignature) -> bool {
    let Ok(public) = parse_point(point) else {
        return false;
    };
    let Ok(parsed) = Signature::from_slice(signature) else {
        return false;
    };
    let parsed = parsed.normalize_s().unwrap_or(parsed);
    VerifyingKey::from(&public)
        .verify_prehash(sighash, &parsed)
        .is_ok()
}

/// Deterministic ECDSA producing a recovery id alongside the signature.
pub fn sign_recoverable(
    secret: &Secret,
    sighash: &SigHash,
) -> Result<RecoverableSignature, SecpError> {
    let key = SigningKey::from(parse_secret(secret)?);
    let (signature, recovery_id) = key
        .sign_prehash_recoverable(sighash)
        .map_err(|_| SecpError::InvalidSignature)?;
    let mut out = [0u8; 64];
    out.copy_from_slice(&signature.to_bytes());
    Ok(RecoverableSignature {
        signature: out,
        recovery_id: recovery_id.to_byte(),
    })
}

/// Recover the signing public key from a recoverable signature.
pub fn recover_public(
    recoverable: &RecoverableSignature,
    sighash: &SigHash,
    compressed: bool,
) -> Result<Vec<u8>, SecpError> {
    let signature = Signature::from_slice(&recoverable.signature)
        .map_err(|_| SecpError::InvalidSignature)?;
    let recovery_id =
        RecoveryId::from_byte(recoverable.recovery_id).ok_or(SecpError::InvalidRecoveryId)?;
    let key = VerifyingKey::recover_from_prehash(sighash, &signature, recovery_id)
        .map_err(|_| SecpError::InvalidRecoveryId)?;
    Ok(encode_point(&PublicKey::from(&key), compressed))
}

/// BIP340 Schnorr signature over the digest, with all-zero auxiliary
/// randomness for determinism.
pub fn schnorr_sign(secret: &Secret, sighash: &SigHash) -> Result<SchnorrSignature, SecpError> {
    let key = schnorr::SigningKey::from_bytes(secret).map_err(|_| SecpError::InvalidSecret)?;
    let signature = key
        .sign_raw(sighash, &[0u8; 32])
        .map_err(|_| SecpError::InvalidSignature)?;
    let mut out = [0u8; 64];
    out.copy_from_slice(&signature.to_bytes());
    Ok(out)
}

/// Verify a BIP340 Schnorr signature against an x-only public key.
pub fn schnorr_verify(x_only: &[u8; 32], sighash: &SigHash, signature: &SchnorrSignature) -> bool {
    let Ok(key) = schnorr::VerifyingKey::from_bytes(x_only) else {
        return false;
    };
    let Ok(parsed) = schnorr::Signature::try_from(&signature[..]) else {
        return false;
    };
    key.verify_raw(sighash, &parsed).is_ok()
}

/// The x-only (BIP340) form of a secret's public key.
pub fn secret_to_x_only(secret: &Secret) -> Result<[u8; 32], SecpError> {
    let key = schnorr::SigningKey::from_bytes(secret).map_err(|_| SecpError::InvalidSecret)?;
    let mut out = [0u8; 32];
    out.copy_from_slice(&key.verifying_key().to_bytes());
    Ok(out)
}

/// The additive inverse of a scalar. Exposed for completeness with the
/// point operations.
pub fn ec_negate_scalar(scalar: &[u8; 32]) -> Result<[u8; 32], SecpError> {
    let parsed = parse_scalar(scalar)?;
    let negated = -parsed;
    let mut out = [0u8; 32];
    out.copy_from_slice(&negated.to_repr());
    Ok(out)
}

/// The x coordinate of a public key.
pub fn point_x(point: &[u8]) -> Result<[u8; 32], SecpError> {
    let parsed = parse_point(point)?;
    let affine: AffinePoint = *parsed.as_affine();
    let mut out = [0u8; 32];
    out.copy_from_slice(&affine.x());
    Ok(out)
}

#[cfg(test)]
mod test {
    use super::*;

    fn secret(fill: u8) -> Secret {
        let mut s = [0u8; 32];
        s[31] = fill;
        s[0] = fill;
        s
    }

    #[test]
    fn it_validates_secrets_and_points() {
        assert!(!verify_secret(&[0u8; 32]));
        assert!(!verify_secret(&[0xffu8; 32]));
        assert!(verify_secret(&secret(1)));

        let public = secret_to_public(&secret(1), true).unwrap();
        assert_eq!(public.len(), COMPRESSED_LEN);
        assert!(verify_point(&public));
        assert!(!verify_point(&[0u8; 33]));
    }

    #[test]
    fn it_compresses_and_decompresses() {
        let public = secret_to_public(&secret(7), false).unwrap();
        assert_eq!(public.len(), UNCOMPRESSED_LEN);

        let compressed = compress_point(&public).unwrap();
        let decompressed = decompress_point(&compressed).unwrap();
        assert_eq!(&decompressed[..], &public[..]);
    }

    #[test]
    fn it_tweaks_points_homomorphically() {
        // pub(a) + b*G == pub(a + b)
        let a = secret(3);
        let b = secret(5);
        let tweaked = ec_add(&secret_to_public(&a, true).unwrap(), &b).unwrap();
        let summed = secret_to_public(&ec_add_scalars(&a, &b).unwrap(), true).unwrap();
        assert_eq!(tweaked, summed);
    }

    #[test]
    fn it_sums_and_negates_points() {
        let p1 = secret_to_public(&secret(11), true).unwrap();
        let p2 = secret_to_public(&secret(13), true).unwrap();

        let sum = ec_sum(&[&p1, &p2]).unwrap();
        let direct = ec_add(&p1, &secret(13)).unwrap();
        assert_eq!(&sum[..], &direct[..]);

        // P + (-P) is the identity, which has no encoding.
        let negated = ec_negate(&p1).unwrap();
        assert_eq!(ec_sum(&[&p1, &negated]), Err(SecpError::Degenerate));
    }

    #[test]
    fn it_signs_deterministically_and_verifies() {
        let key = secret(42);
        let digest = [0xabu8; 32];
        let public = secret_to_public(&key, true).unwrap();

        let first = sign(&key, &digest).unwrap();
        let second = sign(&key, &digest).unwrap();
        assert_eq!(first, second);
        assert!(verify_signature(&public, &digest, &first));

        let mut other = digest;
        other[0] ^= 1;
        assert!(!verify_signature(&public, &other, &first));
    }

    #[test]
    fn it_accepts_high_s_signatures() {
        let key = secret(9);
        let digest = [0x33u8; 32];
        let public = secret_to_public(&key, true).unwrap();
        let compact = sign(&key, &digest).unwrap();

        // Re-malleate to the high-s form: s' = n - s.
        let parsed = Signature::from_slice(&compact).unwrap();
        let (r, s) = parsed.split_scalars();
        let high = Signature::from_scalars(*r.as_ref(), -*s.as_ref()).unwrap();
        let mut malleated = [0u8; 64];
        malleated.copy_from_slice(&high.to_bytes());

        assert_ne!(compact, malleated);
        assert!(verify_signature(&public, &digest, &malleated));
    }

    #[test]
    fn it_recovers_public_keys() {
        let key = secret(21);
        let digest = [0x77u8; 32];
        let expected = secret_to_public(&key, true).unwrap();

        let recoverable = sign_recoverable(&key, &digest).unwrap();
        assert!(recoverable.recovery_id < 4);
        let recovered = recover_public(&recoverable, &digest, true).unwrap();
        assert_eq!(recovered, expected);

        // The non-recoverable signature is the same bytes.
        assert_eq!(recoverable.signature, sign(&key, &digest).unwrap());
    }

    #[test]
    fn it_round_trips_schnorr() {
        let key = secret(17);
        let digest = [0x55u8; 32];

        let signature = schnorr_sign(&key, &digest).unwrap();
        let x_only = secret_to_x_only(&key).unwrap();
        assert!(schnorr_verify(&x_only, &digest, &signature));

        let mut tampered = signature;
        tampered[63] ^= 1;
        assert!(!schnorr_verify(&x_only, &digest, &tampered));
    }
}
