pub mod block;
pub mod chain;
pub mod coinbase;
pub mod coinstake;
pub mod exceptions;
pub mod legacy;
pub mod phase;
pub mod reward;

pub use block::validate_stake_block;
pub use chain::{coin_age_blocks, last_height, ChainView, MemoryChain};
pub use coinbase::{
    build_reward_outputs, check_coinbase_reward, verify_coinbase_reward, RewardHeader,
    RewardManifest,
};
pub use coinstake::{check_duplicate_inputs, is_destination_same, validate_coinstake};
pub use exceptions::is_known_exception;
pub use legacy::legacy_reward;
pub use phase::{phase_of, PhasePosition};
pub use reward::{interest_rate, stake_reward, tier_for_phase, RewardTier};
