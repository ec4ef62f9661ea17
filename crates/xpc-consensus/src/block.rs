//! Stake-block validation pipeline.

use tracing::{debug, info};
use xpc_core::error::XpcError;
use xpc_core::transaction::{Block, Transaction};

use crate::chain::ChainView;
use crate::coinbase::check_coinbase_reward;
use crate::coinstake::{check_duplicate_inputs, validate_coinstake};

/// Validate a proof-of-stake block and return the transaction its coinstake
/// spends.
///
/// Order: duplicate inputs in every transaction, then the coinstake, then
/// the signed reward manifest in the coinbase.
pub fn validate_stake_block<C: ChainView + ?Sized>(
    block: &Block,
    chain: &C,
) -> Result<Transaction, XpcError> {
    for tx in &block.transactions {
        check_duplicate_inputs(tx)?;
    }

    let coinstake = block
        .coinstake()
        .ok_or(XpcError::MissingTransaction("coinstake"))?;
    let staked = validate_coinstake(coinstake, chain)?;
    debug!(time = block.time, "coinstake accepted");

    check_coinbase_reward(block)?;
    info!(
        time = block.time,
        transactions = block.transactions.len(),
        "stake block validated"
    );
    Ok(staked)
}
