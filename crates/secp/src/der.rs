//! DER signature codec and endorsement splitting.
//!
//! Strict mode is the BIP66 rule set enforced by `k256`'s DER parser plus
//! nonzero scalars. Lax mode reimplements the historical tolerance of
//! OpenSSL-era parsers: sloppy outer lengths, long-form length bytes,
//! oversized padding, and zero-value integers all parse, as they did on the
//! network before BIP66 activated.

use k256::ecdsa::Signature;

use crate::{CompactSignature, SecpError};

/// Parse a DER signature to compact `r || s`. `strict` applies BIP66
/// rules; lax accepts historical malleations.
pub fn parse_signature(der: &[u8], strict: bool) -> Result<CompactSignature, SecpError> {
    if strict {
        let signature = Signature::from_der(der).map_err(|_| SecpError::Der)?;
        let mut out = [0u8; 64];
        out.copy_from_slice(&signature.to_bytes());
        Ok(out)
    } else {
        parse_lax(der)
    }
}

/// Encode a compact signature as strict DER.
pub fn encode_signature(compact: &CompactSignature) -> Result<Vec<u8>, SecpError> {
    let signature = Signature::from_slice(compact).map_err(|_| SecpError::InvalidSignature)?;
    Ok(signature.to_der().as_bytes().to_vec())
}

/// Split an endorsement into its DER signature and trailing sighash flag
/// byte.
pub fn split_endorsement(endorsement: &[u8]) -> Result<(&[u8], u8), SecpError> {
    match endorsement.split_last() {
        Some((flag, signature)) if !signature.is_empty() => Ok((signature, *flag)),
        _ => Err(SecpError::BadEndorsement),
    }
}

/// Join a DER signature and sighash flag byte into an endorsement.
pub fn join_endorsement(der: &[u8], sighash_flag: u8) -> Vec<u8> {
    let mut endorsement = der.to_vec();
    endorsement.push(sighash_flag);
    endorsement
}

/// A forward cursor for the lax parser.
struct Lax<'a> {
    bytes: &'a [u8],
    position: usize,
}

impl<'a> Lax<'a> {
    fn take(&mut self) -> Result<u8, SecpError> {
        let byte = *self.bytes.get(self.position).ok_or(SecpError::Der)?;
        self.position += 1;
        Ok(byte)
    }

    /// Read a BER length: short form, or long form with any number of
    /// length bytes (values beyond usize reject).
    fn length(&mut self) -> Result<usize, SecpError> {
        let first = self.take()?;
        if first & 0x80 == 0 {
            return Ok(first as usize);
        }
        let count = (first & 0x7f) as usize;
        let mut length = 0usize;
        for _ in 0..count {
            length = length
                .checked_mul(256)
                .and_then(|l| l.checked_add(self.take().ok()? as usize))
                .ok_or(SecpError::Der)?;
        }
        Ok(length)
    }

    /// Read an INTEGER element and right-align its value into 32 bytes,
    /// stripping leading zeros. Values over 32 significant bytes reject.
    fn integer(&mut self) -> Result<[u8; 32], SecpError> {
        if self.take()? != 0x02 {
            return Err(SecpError::Der);
        }
        let length = self.length()?;
        let end = self.position.checked_add(length).ok_or(SecpError::Der)?;
        if end > self.bytes.len() {
            return Err(SecpError::Der);
        }
        let mut value = &self.bytes[self.position..end];
        self.position = end;

        while value.first() == Some(&0) {
            value = &value[1..];
        }
        if value.len() > 32 {
            return Err(SecpError::Der);
        }
        let mut out = [0u8; 32];
        out[32 - value.len()..].copy_from_slice(value);
        Ok(out)
    }
}

/// The lax parser: a SEQUENCE tag with an unchecked length, then two
/// INTEGERs. The outer length is ignored entirely, as the historical
/// parser ignored it.
fn parse_lax(der: &[u8]) -> Result<CompactSignature, SecpError> {
    let mut cursor = Lax {
        bytes: der,
        position: 0,
    };
    if cursor.take()? != 0x30 {
        return Err(SecpError::Der);
    }
    let _ = cursor.length()?;

    let r = cursor.integer()?;
    let s = cursor.integer()?;

    let mut out = [0u8; 64];
    out[..32].copy_from_slice(&r);
    out[32..].copy_from_slice(&s);
    Ok(out)
}
