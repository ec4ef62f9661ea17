//! Probability that a stake record mints a block.
//!
//! Each second the kernel gets one try, succeeding with probability
//! `coin_days / (2^32 * difficulty)`. Coin days grow with the record's age
//! between the minimum and maximum stake ages, so a longer window is
//! evaluated a day at a time with the weight the record will have then.

use parking_lot::Mutex;
use tracing::debug;
use xpc_core::params::ConsensusParams;
use xpc_core::types::Timestamp;
use xpc_core::SECONDS_PER_DAY;

use crate::record::KernelRecord;

const MINUTES_PER_DAY: u32 = 60 * 24;

/// Chance of minting in any single second, `time_offset` seconds from `now`.
///
/// Non-positive or non-finite difficulty yields 0, as does a non-positive
/// `params.coin`.
pub fn mint_probability_per_interval(
    difficulty: f64,
    time_offset: i64,
    record: &KernelRecord,
    now: Timestamp,
    params: &ConsensusParams,
) -> f64 {
    if !difficulty.is_finite() || difficulty <= 0.0 || params.coin <= 0 {
        return 0.0;
    }

    let aged = record
        .age_secs(now)
        .saturating_add(time_offset)
        .min(params.stake_max_age);
    let weight = i128::from(aged - params.stake_min_age);
    let coin_days = (i128::from(record.amount) * weight
        / (i128::from(params.coin) * i128::from(SECONDS_PER_DAY)))
    .max(0);

    let p = coin_days as f64 / (2f64.powi(32) * difficulty);
    p.min(1.0)
}

/// Chance of minting at least once within `minutes` from `now`.
pub fn mint_probability_within_minutes(
    difficulty: f64,
    minutes: u32,
    record: &KernelRecord,
    now: Timestamp,
    params: &ConsensusParams,
) -> f64 {
    let days = minutes / MINUTES_PER_DAY;
    let rest = minutes % MINUTES_PER_DAY;

    let mut miss = 1.0;
    for day in 0..days {
        let offset = i64::from(day) * SECONDS_PER_DAY;
        let p = mint_probability_per_interval(difficulty, offset, record, now, params);
        miss *= (1.0 - p).powi(SECONDS_PER_DAY as i32);
    }
    let offset = i64::from(days) * SECONDS_PER_DAY;
    let p = mint_probability_per_interval(difficulty, offset, record, now, params);
    miss *= (1.0 - p).powi(60 * rest as i32);

    1.0 - miss
}

// ── Memoized model ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
struct Memo {
    difficulty: f64,
    minutes: u32,
    probability: f64,
}

/// A record plus the last probability computed for it.
///
/// The memo holds one entry keyed by `(difficulty, minutes)`; any other key
/// replaces it. `now` is not part of the key, so a repeated query returns the
/// earlier answer even if time has moved on.
#[derive(Debug)]
pub struct MintProbabilityModel {
    record: KernelRecord,
    memo: Mutex<Option<Memo>>,
}

impl MintProbabilityModel {
    pub fn new(record: KernelRecord) -> Self {
        Self {
            record,
            memo: Mutex::new(None),
        }
    }

    pub fn record(&self) -> &KernelRecord {
        &self.record
    }

    pub fn within_minutes(
        &self,
        difficulty: f64,
        minutes: u32,
        now: Timestamp,
        params: &ConsensusParams,
    ) -> f64 {
        let mut memo = self.memo.lock();
        if let Some(m) = *memo {
            if m.difficulty == difficulty && m.minutes == minutes {
                return m.probability;
            }
        }

        let probability =
            mint_probability_within_minutes(difficulty, minutes, &self.record, now, params);
        debug!(
            txid = %self.record.txid,
            vout = self.record.vout,
            difficulty,
            minutes,
            probability,
            "mint probability recomputed"
        );
        *memo = Some(Memo {
            difficulty,
            minutes,
            probability,
        });
        probability
    }

    /// Key of the memoized entry, if any.
    pub fn cached_key(&self) -> Option<(f64, u32)> {
        let memo = *self.memo.lock();
        memo.map(|m| (m.difficulty, m.minutes))
    }
}
