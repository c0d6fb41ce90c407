//! Protocol constants. Token amounts in wei (1 OCEAN = 10^18 wei) unless the
//! name says otherwise.

/// Wei per whole token.
pub const WEI_PER_TOKEN: u128 = 1_000_000_000_000_000_000;

pub const BPS_PRECISION: u64 = 10_000;
pub const SECONDS_PER_DAY: i64 = 86_400;
pub const SECONDS_PER_WEEK: i64 = 7 * SECONDS_PER_DAY;

/// Start of DF5 (2022-09-29T00:00:00Z). Week numbering is anchored here
/// because of the gap between DF4 and DF5.
pub const DF5_START_UNIX: i64 = 1_664_409_600;
pub const DF5_WEEK_NUMBER: i64 = 5;

/// Pre-decay weekly schedule: `(threshold, whole tokens)` pairs keyed by the
/// zero-based week index. The first threshold strictly greater than the
/// index selects the amount.
///
/// # Examples
///
/// ```
/// use df_core::constants::DFMAIN_SCHEDULE;
/// assert_eq!(DFMAIN_SCHEDULE.len(), 4);
/// assert!(DFMAIN_SCHEDULE.windows(2).all(|w| w[0].0 < w[1].0));
/// ```
pub const DFMAIN_SCHEDULE: [(i64, u128); 4] = [
    (28, 0),
    (28 + 52, 150_000),
    (28 + 52 + 26, 300_000),
    (28 + 52 + 26 + 26, 600_000),
];

/// Supply released along the half-life curve, in wei.
///
/// This is the exact integer the reference distribution submits to the
/// on-chain `getAmount`, so the weekly figures match the ledger bit for bit.
pub const DECAYING_SUPPLY_WEI: u128 = 503_369_999_999_999_986_674_696_192;

/// Four years of 365 days.
pub const HALF_LIFE_SECS: u64 = 4 * 365 * 24 * 60 * 60;

/// Start of the half-life era (2025-03-13T00:00:00Z), the first week past
/// the last schedule threshold.
pub const VESTING_START_UNIX: i64 = 1_741_824_000;

/// Share of the weekly amount earmarked for active rewards.
pub const ACTIVE_REWARDS_MULTIPLIER_BPS: u64 = 5_000;

pub const PREDICTOOR_BUDGET_TOKENS: u128 = 37_500;
/// Zero-based week index from which the predictoor stream is funded.
pub const PREDICTOOR_RELEASE_WEEK: i64 = 62;

pub const MAX_BATCH_SIZE: usize = 500;
pub const MAX_ALLOCATE_ATTEMPTS: u32 = 3;

/// Tolerance for floating-point reward sums.
pub const REWARD_TOLERANCE: f64 = 1e-6;
