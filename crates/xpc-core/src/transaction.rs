use serde::{Deserialize, Serialize};

use crate::encode::{write_var_bytes, Encodable};
use crate::script::Script;
use crate::types::{Amount, TxId};

// ── OutPoint ──────────────────────────────────────────────────────────────────

/// Reference to one output of a previous transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutPoint {
    pub txid: TxId,
    pub vout: u32,
}

impl OutPoint {
    pub fn new(txid: TxId, vout: u32) -> Self {
        Self { txid, vout }
    }

    /// The null outpoint spent by coinbase inputs.
    pub fn null() -> Self {
        Self {
            txid: TxId::ZERO,
            vout: u32::MAX,
        }
    }

    pub fn is_null(&self) -> bool {
        self.txid.is_zero() && self.vout == u32::MAX
    }
}

impl Encodable for OutPoint {
    fn consensus_encode(&self, out: &mut Vec<u8>) {
        self.txid.consensus_encode(out);
        self.vout.consensus_encode(out);
    }
}

// ── TxIn / TxOut ──────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxIn {
    pub prevout: OutPoint,
    pub script_sig: Script,
    pub sequence: u32,
}

impl TxIn {
    pub fn new(prevout: OutPoint) -> Self {
        Self {
            prevout,
            script_sig: Script::new(),
            sequence: u32::MAX,
        }
    }
}

impl Encodable for TxIn {
    fn consensus_encode(&self, out: &mut Vec<u8>) {
        self.prevout.consensus_encode(out);
        self.script_sig.consensus_encode(out);
        self.sequence.consensus_encode(out);
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOut {
    pub value: Amount,
    pub script_pubkey: Script,
}

impl TxOut {
    pub fn new(value: Amount, script_pubkey: Script) -> Self {
        Self {
            value,
            script_pubkey,
        }
    }
}

impl Encodable for TxOut {
    fn consensus_encode(&self, out: &mut Vec<u8>) {
        self.value.consensus_encode(out);
        self.script_pubkey.consensus_encode(out);
    }
}

impl Encodable for Script {
    fn consensus_encode(&self, out: &mut Vec<u8>) {
        write_var_bytes(out, self.as_bytes());
    }
}

// ── Transaction ───────────────────────────────────────────────────────────────

/// A transaction as the stake core sees it. Witness data never enters any
/// hash computed here, so it is not modelled.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub version: i32,
    pub inputs: Vec<TxIn>,
    pub outputs: Vec<TxOut>,
    pub lock_time: u32,
}

impl Transaction {
    pub fn new(inputs: Vec<TxIn>, outputs: Vec<TxOut>) -> Self {
        Self {
            version: 2,
            inputs,
            outputs,
            lock_time: 0,
        }
    }

    pub fn is_coinbase(&self) -> bool {
        self.inputs.len() == 1 && self.inputs[0].prevout.is_null()
    }

    /// Serialize to canonical bytes. The txid is the double-SHA256 of this.
    pub fn body_bytes(&self) -> Vec<u8> {
        self.to_consensus_bytes()
    }
}

impl Encodable for Transaction {
    fn consensus_encode(&self, out: &mut Vec<u8>) {
        self.version.consensus_encode(out);
        self.inputs.consensus_encode(out);
        self.outputs.consensus_encode(out);
        self.lock_time.consensus_encode(out);
    }
}

// ── Block ─────────────────────────────────────────────────────────────────────

/// The parts of a block the stake core reads: its timestamp and its
/// transactions (coinbase first, coinstake second).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub time: u32,
    pub transactions: Vec<Transaction>,
}

impl Block {
    pub fn coinbase(&self) -> Option<&Transaction> {
        self.transactions.first()
    }

    pub fn coinstake(&self) -> Option<&Transaction> {
        self.transactions.get(1)
    }
}
