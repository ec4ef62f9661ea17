//! Read-only view of chain state supplied by the caller.
//!
//! The stake core never reaches for global chain state: every function that
//! needs the tip height or a previous transaction takes a `ChainView`.

use std::collections::HashMap;

use xpc_core::transaction::Transaction;
use xpc_core::types::{BlockHash, Height, TxId};
use xpc_crypto::txid;

/// Chain lookups the stake core consumes. "Not found" is `None`, never an
/// error; implementations backed by storage may block on I/O.
pub trait ChainView {
    /// Height of the active chain tip.
    fn tip_height(&self) -> Height;

    /// A transaction and the hash of the block containing it. The block hash
    /// is `None` for transactions not yet in a block.
    fn transaction(&self, txid: &TxId) -> Option<(Transaction, Option<BlockHash>)>;

    /// Height of a block on the active chain.
    fn block_height(&self, hash: &BlockHash) -> Option<Height>;
}

/// Height of the block that confirmed `txid`, or 0 if the transaction is
/// unknown, unconfirmed, or in a block the view cannot place.
pub fn last_height<C: ChainView + ?Sized>(chain: &C, txid: &TxId) -> Height {
    chain
        .transaction(txid)
        .and_then(|(_, block)| block)
        .and_then(|hash| chain.block_height(&hash))
        .unwrap_or(0)
}

/// Age in blocks of the output created by `txid`: tip height minus the
/// confirming height. Unknown inputs are age 0.
pub fn coin_age_blocks<C: ChainView + ?Sized>(chain: &C, txid: &TxId) -> u32 {
    match last_height(chain, txid) {
        0 => 0,
        h => chain.tip_height().saturating_sub(h),
    }
}

// ── MemoryChain ───────────────────────────────────────────────────────────────

/// In-memory `ChainView` for tooling and tests.
#[derive(Debug, Default, Clone)]
pub struct MemoryChain {
    tip: Height,
    transactions: HashMap<TxId, (Transaction, Option<BlockHash>)>,
    blocks: HashMap<BlockHash, Height>,
}

impl MemoryChain {
    pub fn new(tip: Height) -> Self {
        Self {
            tip,
            ..Self::default()
        }
    }

    pub fn set_tip(&mut self, tip: Height) {
        self.tip = tip;
    }

    pub fn add_block(&mut self, hash: BlockHash, height: Height) {
        self.blocks.insert(hash, height);
    }

    /// Record `tx` under its computed txid. Returns the txid.
    pub fn add_transaction(&mut self, tx: Transaction, block: Option<BlockHash>) -> TxId {
        let id = txid(&tx);
        self.transactions.insert(id, (tx, block));
        id
    }

    /// Record `tx` under an arbitrary id, as a misbehaving store might.
    pub fn insert_transaction_as(&mut self, id: TxId, tx: Transaction, block: Option<BlockHash>) {
        self.transactions.insert(id, (tx, block));
    }
}

impl ChainView for MemoryChain {
    fn tip_height(&self) -> Height {
        self.tip
    }

    fn transaction(&self, txid: &TxId) -> Option<(Transaction, Option<BlockHash>)> {
        self.transactions.get(txid).cloned()
    }

    fn block_height(&self, hash: &BlockHash) -> Option<Height> {
        self.blocks.get(hash).copied()
    }
}
