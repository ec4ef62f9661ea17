/// ─── XPChain Stake Constants ────────────────────────────────────────────────
///
/// Base unit:    satoshi  (1 XPC = 100,000,000 satoshis)
/// Block time:   one minute

// ── Units ─────────────────────────────────────────────────────────────────────

/// 1 XPC expressed in satoshis.
pub const COIN: i64 = 100_000_000;

pub const SECONDS_PER_DAY: i64 = 86_400;

/// 365 days, no leap correction.
pub const SECONDS_PER_YEAR: i64 = 365 * SECONDS_PER_DAY;

// ── Phase schedule ────────────────────────────────────────────────────────────

/// Blocks per reward phase on mainnet (one year of one-minute blocks).
pub const MAIN_YEAR_BLOCKS: u32 = 60 * 24 * 365;

/// Blocks per reward phase on testnet.
pub const TEST_YEAR_BLOCKS: u32 = 1024;

/// Height at which phase-indexed staking begins on testnet.
pub const TEST_PHASE_START_HEIGHT: u32 = 128;

/// Default mainnet activation height of phase-indexed staking.
/// Deployments override it through `ConsensusParams::abpos_height`.
pub const MAIN_PHASE_START_HEIGHT: u32 = 1_050_000;

/// Divisor turning a rate in hundredths of a percent into a fraction.
pub const RATE_DENOMINATOR: i64 = 10_000;

// ── Legacy reward curve ───────────────────────────────────────────────────────

/// Length of one legacy annual-rate window in blocks.
pub const LEGACY_RATE_INTERVAL: u32 = 60 * 24 * 365;

pub const LEGACY_STAKE_MIN_AGE_SECS: u32 = 3 * 86_400;
pub const LEGACY_STAKE_MAX_AGE_SECS: u32 = 60 * 86_400;

pub const LEGACY_CURVE_MAXIMUM: f64 = 1.025;
pub const LEGACY_CURVE_LIMIT: f64 = 1.0;
pub const LEGACY_CURVE_BASE: f64 = 0.018;
pub const LEGACY_CURVE_STEEPNESS: f64 = 0.000_002_85;

// ── Staking eligibility ───────────────────────────────────────────────────────

/// Default minimum coin age (seconds) before an output may stake.
pub const DEFAULT_STAKE_MIN_AGE_SECS: i64 = 3 * SECONDS_PER_DAY;

/// Default age (seconds) beyond which stake weight stops growing.
pub const DEFAULT_STAKE_MAX_AGE_SECS: i64 = 60 * SECONDS_PER_DAY;

/// Testnet minimum coin age: one hour.
pub const TEST_STAKE_MIN_AGE_SECS: i64 = 3_600;

// ── Address prefixes ──────────────────────────────────────────────────────────

pub const MAIN_PUBKEY_ADDRESS_PREFIX: u8 = 75;
pub const MAIN_SCRIPT_ADDRESS_PREFIX: u8 = 18;
pub const TEST_PUBKEY_ADDRESS_PREFIX: u8 = 111;
pub const TEST_SCRIPT_ADDRESS_PREFIX: u8 = 196;

/// Human-readable parts of segwit addresses.
pub const MAIN_BECH32_HRP: &str = "xpc";
pub const TEST_BECH32_HRP: &str = "txpc";
