//! Consensus serialization.
//!
//! Byte layout of everything that gets hashed: little-endian integers,
//! compact-size length prefixes, raw 32-byte hashes.

use crate::types::Hash256;

/// Types with a canonical on-chain byte encoding.
pub trait Encodable {
    fn consensus_encode(&self, out: &mut Vec<u8>);

    fn to_consensus_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.consensus_encode(&mut out);
        out
    }
}

pub fn write_compact_size(out: &mut Vec<u8>, n: u64) {
    match n {
        0..=0xfc => out.push(n as u8),
        0xfd..=0xffff => {
            out.push(0xfd);
            out.extend_from_slice(&(n as u16).to_le_bytes());
        }
        0x1_0000..=0xffff_ffff => {
            out.push(0xfe);
            out.extend_from_slice(&(n as u32).to_le_bytes());
        }
        _ => {
            out.push(0xff);
            out.extend_from_slice(&n.to_le_bytes());
        }
    }
}

/// Length-prefixed byte vector.
pub fn write_var_bytes(out: &mut Vec<u8>, bytes: &[u8]) {
    write_compact_size(out, bytes.len() as u64);
    out.extend_from_slice(bytes);
}

impl Encodable for u32 {
    fn consensus_encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_le_bytes());
    }
}

impl Encodable for i32 {
    fn consensus_encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_le_bytes());
    }
}

impl Encodable for i64 {
    fn consensus_encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_le_bytes());
    }
}

impl Encodable for Hash256 {
    fn consensus_encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.0);
    }
}

impl<T: Encodable> Encodable for Vec<T> {
    fn consensus_encode(&self, out: &mut Vec<u8>) {
        write_compact_size(out, self.len() as u64);
        for item in self {
            item.consensus_encode(out);
        }
    }
}
