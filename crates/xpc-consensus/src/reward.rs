//! Phase-indexed stake interest.
//!
//! Each phase has its own tier: a floor rate, a ceiling the rate must stay
//! under, and a step window. A coin earns the floor rate plus one point for
//! every started step window by which the phase position exceeds the coin's
//! age. Rates are in hundredths of a percent.
//!
//! | phase | floor | ceiling | step window |
//! |-------|-------|---------|-------------|
//! | 1     | 0.60% | 2.40%   | 2920        |
//! | 2     | 0.50% | 2.00%   | 3504        |
//! | 3     | 0.40% | 1.60%   | 4380        |
//! | 4     | 0.30% | 1.20%   | 5840        |
//! | 5     | 0.15% | 0.60%   | 11580       |
//!
//! Phase 0 and everything after phase 5 pay no interest.

use tracing::warn;
use xpc_core::error::XpcError;
use xpc_core::params::ConsensusParams;
use xpc_core::types::{Amount, Height};
use xpc_core::RATE_DENOMINATOR;

use crate::chain::ChainView;
use crate::phase::{phase_of, PhasePosition};

/// Interest parameters of one phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RewardTier {
    pub floor_rate: u32,
    pub ceiling_rate: u32,
    pub step_window: u32,
}

impl RewardTier {
    const fn new(floor_rate: u32, ceiling_rate: u32, step_window: u32) -> Self {
        Self {
            floor_rate,
            ceiling_rate,
            step_window,
        }
    }
}

/// The tier for `phase`, or `None` for phases that pay nothing.
pub fn tier_for_phase(phase: u32) -> Option<RewardTier> {
    match phase {
        1 => Some(RewardTier::new(60, 240, 2920)),
        2 => Some(RewardTier::new(50, 200, 3504)),
        3 => Some(RewardTier::new(40, 160, 4380)),
        4 => Some(RewardTier::new(30, 120, 5840)),
        5 => Some(RewardTier::new(15, 60, 11580)),
        _ => None,
    }
}

/// Interest rate at a known phase position for a coin `coin_age` blocks old.
pub fn interest_rate_at(position: PhasePosition, coin_age: u32) -> Result<u32, XpcError> {
    let Some(tier) = tier_for_phase(position.phase) else {
        return Ok(0);
    };

    let mut rate = tier.floor_rate;
    let mut excess = i64::from(position.blocks_into_phase.saturating_sub(coin_age));
    while excess > 0 {
        rate += 1;
        excess -= i64::from(tier.step_window);
    }

    if rate >= tier.ceiling_rate {
        warn!(
            phase = position.phase,
            rate,
            ceiling = tier.ceiling_rate,
            "interest rate reached its tier ceiling"
        );
        return Err(XpcError::RateCeilingReached {
            phase: position.phase,
            rate,
            ceiling: tier.ceiling_rate,
        });
    }
    Ok(rate)
}

/// Interest rate for a coin `coin_age` blocks old at `height`.
pub fn interest_rate(height: Height, coin_age: u32, params: &ConsensusParams) -> Result<u32, XpcError> {
    interest_rate_at(phase_of(height, params), coin_age)
}

/// Stake reward for `amount` satoshis aged `coin_age` blocks, at the chain
/// tip. Amounts under one whole coin earn nothing.
pub fn stake_reward<C: ChainView + ?Sized>(
    amount: Amount,
    coin_age: u32,
    chain: &C,
    params: &ConsensusParams,
) -> Result<Amount, XpcError> {
    params.validate()?;
    if amount / params.coin < 1 {
        return Ok(0);
    }
    let rate = interest_rate(chain.tip_height(), coin_age, params)?;
    let reward = i128::from(amount) * i128::from(rate) / i128::from(RATE_DENOMINATOR);
    Ok(reward as Amount)
}
