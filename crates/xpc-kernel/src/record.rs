use serde::{Deserialize, Serialize};
use xpc_core::params::ConsensusParams;
use xpc_core::script::{Destination, Script};
use xpc_core::transaction::Transaction;
use xpc_core::types::{Amount, Timestamp, TxId};
use xpc_core::SECONDS_PER_DAY;
use xpc_crypto::{hash160, txid};

/// One stakeable output owned by the wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KernelRecord {
    pub txid: TxId,
    pub vout: u32,
    /// Time the wallet first saw the transaction (unix seconds).
    pub time: Timestamp,
    /// Base58 address, if the output pays a key hash or script hash.
    pub address: Option<String>,
    pub amount: Amount,
}

impl KernelRecord {
    /// Whole days since `time`.
    pub fn age_days(&self, now: Timestamp) -> i64 {
        (now - self.time) / SECONDS_PER_DAY
    }

    /// Seconds since `time`.
    pub fn age_secs(&self, now: Timestamp) -> i64 {
        now - self.time
    }
}

/// One record per output of `tx` that `is_spendable` accepts, in output
/// order.
pub fn decompose_outputs<F>(
    tx: &Transaction,
    time: Timestamp,
    params: &ConsensusParams,
    is_spendable: F,
) -> Vec<KernelRecord>
where
    F: Fn(&Script) -> bool,
{
    let id = txid(tx);
    tx.outputs
        .iter()
        .enumerate()
        .filter(|(_, out)| is_spendable(&out.script_pubkey))
        .map(|(n, out)| KernelRecord {
            txid: id,
            vout: n as u32,
            time,
            address: Destination::from_script(&out.script_pubkey, hash160)
                .and_then(|d| params.encode_destination(&d)),
            amount: out.value,
        })
        .collect()
}
