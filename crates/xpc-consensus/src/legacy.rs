//! Pre-fork stake reward curve.
//!
//! Blocks produced before phase-indexed staking activated were rewarded by
//! an annual rate that steps down every year of one-minute blocks, scaled by
//! a logistic coefficient of the coin's age in seconds. Kept so historical
//! rewards can be recomputed exactly.

use xpc_core::constants::{
    LEGACY_CURVE_BASE, LEGACY_CURVE_LIMIT, LEGACY_CURVE_MAXIMUM, LEGACY_CURVE_STEEPNESS,
    LEGACY_RATE_INTERVAL, LEGACY_STAKE_MAX_AGE_SECS, LEGACY_STAKE_MIN_AGE_SECS, SECONDS_PER_YEAR,
};
use xpc_core::types::{Amount, Height};

/// Annual rate for `height`: 10% in the first year, one point less each
/// following year, 5% from the sixth year on.
pub fn annual_rate(height: Height) -> f64 {
    let interval = LEGACY_RATE_INTERVAL;
    match height {
        h if h <= interval => 0.10,
        h if h <= interval * 2 => 0.09,
        h if h <= interval * 3 => 0.08,
        h if h <= interval * 4 => 0.07,
        h if h <= interval * 5 => 0.06,
        _ => 0.05,
    }
}

/// Logistic age coefficient, capped at `LEGACY_CURVE_LIMIT`.
pub fn age_coefficient(coin_age_secs: u32) -> f64 {
    let t = f64::from(coin_age_secs);
    let c = LEGACY_CURVE_MAXIMUM
        / (1.0
            + (LEGACY_CURVE_MAXIMUM / LEGACY_CURVE_BASE - 1.0)
                * (-LEGACY_CURVE_STEEPNESS * t).exp());
    c.min(LEGACY_CURVE_LIMIT)
}

/// Reward for staking `amount` satoshis held `coin_age_secs` seconds.
///
/// Coins younger than three days earn nothing; age counts up to sixty days.
pub fn legacy_reward(height: Height, amount: Amount, coin_age_secs: u32) -> Amount {
    if coin_age_secs < LEGACY_STAKE_MIN_AGE_SECS {
        return 0;
    }
    let t = coin_age_secs.min(LEGACY_STAKE_MAX_AGE_SECS);

    let annual = (amount as f64 * annual_rate(height)) as Amount;
    let coefficient = age_coefficient(t);
    (annual as f64 * coefficient * f64::from(t) / SECONDS_PER_YEAR as f64) as Amount
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use xpc_core::COIN;

    const Y: Height = 525_600;
    const DAY: u32 = 86_400;

    #[test]
    fn annual_rate_tiers_at_each_boundary() {
        assert_eq!(annual_rate(0), 0.10);
        assert_eq!(annual_rate(1), 0.10);
        let expected = [(1, 0.10, 0.09), (2, 0.09, 0.08), (3, 0.08, 0.07), (4, 0.07, 0.06), (5, 0.06, 0.05)];
        for (k, at, above) in expected {
            assert_eq!(annual_rate(k * Y - 1), at, "just below boundary {k}");
            assert_eq!(annual_rate(k * Y), at, "at boundary {k}");
            assert_eq!(annual_rate(k * Y + 1), above, "just above boundary {k}");
        }
    }

    #[test]
    fn annual_rate_floor_beyond_last_window() {
        assert_eq!(annual_rate(6 * Y), 0.05);
        assert_eq!(annual_rate(u32::MAX), 0.05);
    }

    #[test]
    fn young_coins_earn_nothing() {
        assert_eq!(legacy_reward(1, 1_000 * COIN, 0), 0);
        assert_eq!(legacy_reward(1, 1_000 * COIN, 3 * DAY - 1), 0);
        assert!(legacy_reward(1, 1_000 * COIN, 3 * DAY) > 0);
    }

    #[test]
    fn coefficient_saturates() {
        assert!(age_coefficient(0) < 0.02);
        assert_eq!(age_coefficient(60 * DAY), LEGACY_CURVE_LIMIT);
    }

    #[test]
    fn sixty_day_reward_matches_formula() {
        // 10% of 1000 XPC over 60/365 of a year, coefficient capped at 1.0
        assert_eq!(legacy_reward(1, 1_000 * COIN, 60 * DAY), 1_643_835_616);
        // 6% from the fifth window
        assert_eq!(legacy_reward(4 * Y + 1, 1_000 * COIN, 60 * DAY), 986_301_369);
    }

    #[test]
    fn age_beyond_cap_is_flat() {
        let at_cap = legacy_reward(1, 500 * COIN, 60 * DAY);
        assert_eq!(legacy_reward(1, 500 * COIN, 90 * DAY), at_cap);
        assert_eq!(legacy_reward(1, 500 * COIN, u32::MAX), at_cap);
    }

    proptest! {
        #[test]
        fn reward_non_decreasing_in_age(
            a in 0u32..(70 * DAY),
            b in 0u32..(70 * DAY),
            amount in 0i64..(10_000_000 * COIN),
            height in 0u32..(7 * Y),
        ) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(legacy_reward(height, amount, lo) <= legacy_reward(height, amount, hi));
        }
    }
}
