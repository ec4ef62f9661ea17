use ripemd::Ripemd160;
use sha2::{Digest, Sha256};
use xpc_core::transaction::Transaction;
use xpc_core::types::{Hash160, Hash256, TxId};

/// SHA256(SHA256(data)).
pub fn sha256d(data: &[u8]) -> Hash256 {
    let first = Sha256::digest(data);
    Hash256::from_bytes(Sha256::digest(first).into())
}

/// RIPEMD160(SHA256(data)): key ids and script ids.
pub fn hash160(data: &[u8]) -> Hash160 {
    let sha = Sha256::digest(data);
    Hash160::from_bytes(Ripemd160::digest(sha).into())
}

/// Derive a TxId from the canonical transaction bytes.
pub fn txid(tx: &Transaction) -> TxId {
    sha256d(&tx.body_bytes())
}
