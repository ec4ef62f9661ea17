use k256::ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};
use k256::ecdsa::{Signature, SigningKey, VerifyingKey};
use k256::FieldBytes;
use thiserror::Error;
use xpc_core::script::Script;
use xpc_core::types::{Hash160, Hash256};

use crate::hash::hash160;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CryptoError {
    #[error("invalid public key")]
    InvalidPublicKey,
    #[error("invalid secret key")]
    InvalidSecretKey,
    #[error("malformed DER signature")]
    MalformedSignature,
    #[error("signature verification failed")]
    VerificationFailed,
    #[error("signing failed")]
    SigningFailed,
}

/// A serialized secp256k1 public key: compressed (33 bytes), uncompressed
/// or hybrid (65).
///
/// The original bytes are kept because key ids hash the serialized form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublicKey {
    bytes: Vec<u8>,
    key: VerifyingKey,
}

impl PublicKey {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        if !xpc_core::script::pubkey_size_ok(bytes) {
            return Err(CryptoError::InvalidPublicKey);
        }
        let key = match bytes[0] {
            // Hybrid: uncompressed point plus a y-parity tag that must agree.
            0x06 | 0x07 => {
                if bytes[0] & 1 != bytes[64] & 1 {
                    return Err(CryptoError::InvalidPublicKey);
                }
                let mut sec1 = bytes.to_vec();
                sec1[0] = 0x04;
                VerifyingKey::from_sec1_bytes(&sec1)
            }
            _ => VerifyingKey::from_sec1_bytes(bytes),
        }
        .map_err(|_| CryptoError::InvalidPublicKey)?;
        Ok(Self {
            bytes: bytes.to_vec(),
            key,
        })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn is_compressed(&self) -> bool {
        self.bytes.len() == 33
    }

    /// HASH160 of the serialized key.
    pub fn key_id(&self) -> Hash160 {
        hash160(&self.bytes)
    }

    /// Script id of the pay-to-witness-key-hash script wrapped in P2SH.
    /// Only compressed keys have a segwit form.
    pub fn p2sh_segwit_id(&self) -> Option<Hash160> {
        if !self.is_compressed() {
            return None;
        }
        let witness_script = Script::new_p2wpkh(&self.key_id());
        Some(hash160(witness_script.as_bytes()))
    }

    /// Verify a signature over a 32-byte digest.
    ///
    /// The signature is parsed with the lax BER rules nodes have always
    /// accepted, and high-S values are normalized before checking.
    pub fn verify(&self, digest: &Hash256, der_sig: &[u8]) -> Result<(), CryptoError> {
        let (r, s) = parse_der_lax(der_sig).ok_or(CryptoError::MalformedSignature)?;
        // Out-of-range scalars parse but can never verify.
        let sig = Signature::from_scalars(r, s).map_err(|_| CryptoError::VerificationFailed)?;
        let sig = sig.normalize_s().unwrap_or(sig);
        self.key
            .verify_prehash(digest.as_bytes(), &sig)
            .map_err(|_| CryptoError::VerificationFailed)
    }
}

/// Check that `bytes` is a well-formed public key on the curve.
pub fn is_fully_valid(bytes: &[u8]) -> bool {
    PublicKey::from_slice(bytes).is_ok()
}

/// Sign a 32-byte digest, returning a low-S DER signature.
pub fn sign_digest(key: &SigningKey, digest: &Hash256) -> Result<Vec<u8>, CryptoError> {
    let sig: Signature = key
        .sign_prehash(digest.as_bytes())
        .map_err(|_| CryptoError::SigningFailed)?;
    let sig = sig.normalize_s().unwrap_or(sig);
    Ok(sig.to_der().as_bytes().to_vec())
}

// ── Lax DER ───────────────────────────────────────────────────────────────────

/// Extract R and S from a BER-ish `SEQUENCE { INTEGER r, INTEGER s }`.
///
/// Accepts long-form lengths, redundant zero padding and trailing garbage
/// after S. Returns `None` only when the framing itself is broken. Integers
/// wider than 32 bytes after stripping leading zeros come back as all-zero
/// scalars, which `Signature::from_scalars` refuses.
pub fn parse_der_lax(sig: &[u8]) -> Option<(FieldBytes, FieldBytes)> {
    let mut pos = 0;

    // Sequence tag and length; the length itself is not checked.
    if *sig.get(pos)? != 0x30 {
        return None;
    }
    pos += 1;
    let len = *sig.get(pos)? as usize;
    pos += 1;
    if len & 0x80 != 0 {
        let width = len - 0x80;
        if width > sig.len() - pos {
            return None;
        }
        pos += width;
    }

    let (r_start, r_len) = read_integer(sig, &mut pos)?;
    pos = r_start + r_len;
    let (s_start, s_len) = read_integer(sig, &mut pos)?;

    let r = &sig[r_start..r_start + r_len];
    let s = &sig[s_start..s_start + s_len];
    Some((to_scalar_bytes(r), to_scalar_bytes(s)))
}

/// Read an INTEGER header at `pos`, returning where its content starts and
/// how long it is. The content is bounds-checked but not consumed.
fn read_integer(sig: &[u8], pos: &mut usize) -> Option<(usize, usize)> {
    if *sig.get(*pos)? != 0x02 {
        return None;
    }
    *pos += 1;
    let mut len = *sig.get(*pos)? as usize;
    *pos += 1;
    if len & 0x80 != 0 {
        let mut width = len - 0x80;
        if width > sig.len() - *pos {
            return None;
        }
        while width > 0 && sig[*pos] == 0 {
            *pos += 1;
            width -= 1;
        }
        if width >= std::mem::size_of::<usize>() {
            return None;
        }
        len = 0;
        while width > 0 {
            len = (len << 8) | sig[*pos] as usize;
            *pos += 1;
            width -= 1;
        }
    }
    if len > sig.len() - *pos {
        return None;
    }
    Some((*pos, len))
}

fn to_scalar_bytes(int: &[u8]) -> FieldBytes {
    let first = int.iter().position(|b| *b != 0).unwrap_or(int.len());
    let digits = &int[first..];
    let mut out = FieldBytes::default();
    if digits.len() <= 32 {
        out[32 - digits.len()..].copy_from_slice(digits);
    }
    out
}
