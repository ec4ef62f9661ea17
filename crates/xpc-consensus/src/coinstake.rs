//! Coinstake shape and ownership continuity.
//!
//! A coinstake spends exactly one staked output back to the same owner in
//! exactly one output.

use std::collections::HashSet;

use tracing::debug;
use xpc_core::error::XpcError;
use xpc_core::script::{Destination, Script};
use xpc_core::transaction::Transaction;
use xpc_crypto::{hash160, txid};

use crate::chain::ChainView;
use crate::exceptions::is_known_exception;

/// Destination of a script that solves to exactly one solution.
/// Multisig, null-data and nonstandard scripts have none.
pub fn single_destination(script: &Script) -> Option<Destination> {
    if script.classify().solution_count() != Some(1) {
        return None;
    }
    Destination::from_script(script, hash160)
}

/// True if both scripts resolve to the same single destination.
pub fn is_destination_same(a: &Script, b: &Script) -> bool {
    match (single_destination(a), single_destination(b)) {
        (Some(da), Some(db)) => da == db,
        _ => false,
    }
}

/// Validate a coinstake and return the transaction whose output it spends.
///
/// Checks (in order):
/// 1. Exactly one input
/// 2. Exactly one output
/// 3. The spent transaction is known to the chain view
/// 4. The chain view returned the transaction that was asked for
/// 5. The referenced output exists
/// 6. The coinstake pays the same destination it spends from
pub fn validate_coinstake<C: ChainView + ?Sized>(
    tx: &Transaction,
    chain: &C,
) -> Result<Transaction, XpcError> {
    // ── 1–2. Shape ───────────────────────────────────────────────────────────
    if tx.inputs.len() != 1 {
        debug!(inputs = tx.inputs.len(), "coinstake has too many inputs");
        return Err(XpcError::TooManyInputs {
            got: tx.inputs.len(),
        });
    }
    if tx.outputs.len() != 1 {
        debug!(outputs = tx.outputs.len(), "coinstake has too many outputs");
        return Err(XpcError::TooManyOutputs {
            got: tx.outputs.len(),
        });
    }

    // ── 3–4. Previous transaction ───────────────────────────────────────────
    let prevout = tx.inputs[0].prevout;
    let Some((prev_tx, _)) = chain.transaction(&prevout.txid) else {
        debug!(txid = %prevout.txid, "unknown coinstake input");
        return Err(XpcError::UnknownInput(prevout.txid));
    };

    let resolved = txid(&prev_tx);
    if resolved != prevout.txid {
        debug!(referenced = %prevout.txid, resolved = %resolved, "invalid coinstake input hash");
        return Err(XpcError::InvalidCoinstakeInputHash {
            referenced: prevout.txid,
            resolved,
        });
    }

    // ── 5–6. Ownership continuity ────────────────────────────────────────────
    let Some(spent) = prev_tx.outputs.get(prevout.vout as usize) else {
        return Err(XpcError::MissingPrevOutput {
            txid: prevout.txid,
            index: prevout.vout,
        });
    };
    if !is_destination_same(&spent.script_pubkey, &tx.outputs[0].script_pubkey) {
        debug!(txid = %prevout.txid, "invalid coinstake output");
        return Err(XpcError::CoinstakeDestinationMismatch);
    }

    Ok(prev_tx)
}

/// Reject a transaction that spends the same outpoint twice, unless it is one
/// of the grandfathered transactions already on chain.
pub fn check_duplicate_inputs(tx: &Transaction) -> Result<(), XpcError> {
    let mut seen = HashSet::with_capacity(tx.inputs.len());
    if tx.inputs.iter().all(|input| seen.insert(input.prevout)) {
        return Ok(());
    }
    let id = txid(tx);
    if is_known_exception(&id) {
        debug!(txid = %id, "duplicate inputs allowed for grandfathered transaction");
        return Ok(());
    }
    Err(XpcError::DuplicateInputs(id))
}
