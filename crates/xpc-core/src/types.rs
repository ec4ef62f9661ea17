use serde::{Deserialize, Serialize};
use std::fmt;

/// Amount in satoshis (1 XPC = 100_000_000 satoshis). Signed, matching the
/// on-chain output value encoding.
pub type Amount = i64;

/// Block height.
pub type Height = u32;

/// Unix timestamp (seconds, UTC).
pub type Timestamp = i64;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum HashParseError {
    #[error("invalid hex: {0}")]
    Hex(#[from] hex::FromHexError),
    #[error("wrong length: expected {expected} bytes, got {got}")]
    Length { expected: usize, got: usize },
}

// ── Hash256 ──────────────────────────────────────────────────────────────────

/// 32-byte double-SHA256 digest.
///
/// Bytes are stored in digest order; the hex form is byte-reversed, which is
/// how transaction and block ids are conventionally displayed.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Hash256(pub [u8; 32]);

/// Transaction identifier.
pub type TxId = Hash256;

/// Block identifier.
pub type BlockHash = Hash256;

impl Hash256 {
    pub const ZERO: Hash256 = Hash256([0u8; 32]);

    pub fn from_bytes(b: [u8; 32]) -> Self {
        Self(b)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    pub fn to_hex(&self) -> String {
        let mut rev = self.0;
        rev.reverse();
        hex::encode(rev)
    }

    pub fn from_hex(s: &str) -> Result<Self, HashParseError> {
        let bytes = hex::decode(s)?;
        if bytes.len() != 32 {
            return Err(HashParseError::Length {
                expected: 32,
                got: bytes.len(),
            });
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        arr.reverse();
        Ok(Self(arr))
    }
}

impl fmt::Display for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash256({}…)", &self.to_hex()[..16])
    }
}

// ── Hash160 ──────────────────────────────────────────────────────────────────

/// 20-byte RIPEMD160(SHA256(x)) digest: key ids and script ids.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Hash160(pub [u8; 20]);

impl Hash160 {
    pub fn from_bytes(b: [u8; 20]) -> Self {
        Self(b)
    }

    /// Returns `None` unless `bytes` is exactly 20 bytes long.
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        let arr: [u8; 20] = bytes.try_into().ok()?;
        Some(Self(arr))
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for Hash160 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Hash160 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash160({})", self.to_hex())
    }
}
