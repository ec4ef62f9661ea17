//! Wallet-side staking estimates: the spendable outputs a wallet can stake
//! with, and how likely each is to mint a block.

pub mod probability;
pub mod record;

pub use probability::{
    mint_probability_per_interval, mint_probability_within_minutes, MintProbabilityModel,
};
pub use record::{decompose_outputs, KernelRecord};
