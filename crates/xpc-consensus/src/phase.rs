//! Reward phases.
//!
//! Staking rewards run in year-long phases counted from the phase start
//! height. Phase 0 is the first year; phases past the last reward tier pay
//! nothing.
//!
//! The position within a phase is 1-based: a height exactly one phase length
//! past the start is the *last* block of phase 0, not the first block of
//! phase 1.

use serde::{Deserialize, Serialize};
use xpc_core::params::ConsensusParams;
use xpc_core::types::Height;

/// Where a height falls in the phase schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhasePosition {
    pub phase: u32,
    /// In `1..=year_blocks` once staking has begun; 0 before that.
    pub blocks_into_phase: u32,
}

impl PhasePosition {
    pub const NOT_STARTED: PhasePosition = PhasePosition {
        phase: 0,
        blocks_into_phase: 0,
    };
}

/// Map `height` to its reward phase.
pub fn phase_of(height: Height, params: &ConsensusParams) -> PhasePosition {
    let start = params.phase_start_height();
    if height <= start {
        return PhasePosition::NOT_STARTED;
    }

    let year_blocks = params.year_blocks();
    let mut remaining = height - start;
    let mut phase = 0;
    while remaining > year_blocks {
        phase += 1;
        remaining -= year_blocks;
    }
    PhasePosition {
        phase,
        blocks_into_phase: remaining,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn test_params() -> ConsensusParams {
        ConsensusParams::test()
    }

    #[test]
    fn before_start_is_not_started() {
        let p = test_params();
        assert_eq!(phase_of(0, &p), PhasePosition::NOT_STARTED);
        assert_eq!(phase_of(128, &p), PhasePosition::NOT_STARTED);
    }

    #[test]
    fn first_block_after_start() {
        let p = test_params();
        assert_eq!(
            phase_of(129, &p),
            PhasePosition {
                phase: 0,
                blocks_into_phase: 1
            }
        );
    }

    #[test]
    fn exact_phase_length_stays_in_previous_phase() {
        let p = test_params();
        let at_boundary = phase_of(128 + 1024, &p);
        assert_eq!(at_boundary.phase, 0);
        assert_eq!(at_boundary.blocks_into_phase, 1024);

        let after = phase_of(128 + 1025, &p);
        assert_eq!(after.phase, 1);
        assert_eq!(after.blocks_into_phase, 1);

        let two = phase_of(128 + 2 * 1024, &p);
        assert_eq!(two.phase, 1);
        assert_eq!(two.blocks_into_phase, 1024);
    }

    #[test]
    fn mainnet_uses_configured_start() {
        let mut p = ConsensusParams::main();
        p.abpos_height = 1_000;
        assert_eq!(phase_of(1_000, &p), PhasePosition::NOT_STARTED);
        let pos = phase_of(1_000 + 525_600 + 10, &p);
        assert_eq!(pos.phase, 1);
        assert_eq!(pos.blocks_into_phase, 10);
    }

    proptest! {
        #[test]
        fn blocks_into_phase_in_range(height in 129u32..2_000_000) {
            let p = test_params();
            let pos = phase_of(height, &p);
            prop_assert!(pos.blocks_into_phase > 0);
            prop_assert!(pos.blocks_into_phase <= p.year_blocks());
            let back = 128 + pos.phase * p.year_blocks() + pos.blocks_into_phase;
            prop_assert_eq!(back, height);
        }

        #[test]
        fn heights_up_to_start_are_zero(height in 0u32..=128) {
            prop_assert_eq!(phase_of(height, &test_params()), PhasePosition::NOT_STARTED);
        }
    }
}
