//! DF week numbering and the fixed pre-decay weekly schedule.
//!
//! Early distribution weeks follow a pre-agreed table that is not a smooth
//! function of time. The table maps a zero-based week index to a whole-token
//! amount: the first threshold strictly greater than the index wins. Past the
//! last threshold the half-life curve takes over.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use df_core::constants::{
    DF5_START_UNIX, DF5_WEEK_NUMBER, DFMAIN_SCHEDULE, SECONDS_PER_WEEK, WEI_PER_TOKEN,
};
use df_core::error::{InputError, VestingError};

/// DF week number containing `dt`. Returns -1 before DF5; weeks 1-4 predate
/// the current numbering and are not reconstructed.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use df_vesting::schedule::df_week_number;
/// let dt = Utc.with_ymd_and_hms(2023, 3, 16, 0, 0, 0).unwrap();
/// assert_eq!(df_week_number(dt), 29);
/// ```
pub fn df_week_number(dt: DateTime<Utc>) -> i64 {
    let offset = dt.timestamp() - DF5_START_UNIX;
    if offset < 0 {
        return -1;
    }
    offset / SECONDS_PER_WEEK + DF5_WEEK_NUMBER
}

/// Zero-based week index used by the schedule table and stream release week.
pub fn week_index(dt: DateTime<Utc>) -> i64 {
    df_week_number(dt) - 1
}

/// Start of DF week `number` (for `number >= 5`).
pub fn df_week_start(number: i64) -> Option<DateTime<Utc>> {
    if number < DF5_WEEK_NUMBER {
        return None;
    }
    let secs = DF5_START_UNIX + (number - DF5_WEEK_NUMBER) * SECONDS_PER_WEEK;
    DateTime::from_timestamp(secs, 0)
}

/// One row of the schedule: weeks with index below `before_week` (and at or
/// above the previous row's threshold) receive `tokens`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub before_week: i64,
    pub tokens: u128,
}

/// Ordered week-threshold → weekly amount table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleTable {
    entries: Vec<ScheduleEntry>,
}

impl ScheduleTable {
    /// Validate and build a table. Thresholds must be strictly ascending and
    /// every amount must be representable in wei.
    pub fn new(entries: Vec<ScheduleEntry>) -> Result<Self, VestingError> {
        for (i, pair) in entries.windows(2).enumerate() {
            if pair[0].before_week >= pair[1].before_week {
                return Err(InputError::UnsortedSchedule(i + 1).into());
            }
        }
        for entry in &entries {
            entry
                .tokens
                .checked_mul(WEI_PER_TOKEN)
                .ok_or(VestingError::ArithmeticOverflow)?;
        }
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[ScheduleEntry] {
        &self.entries
    }

    /// Tabulated weekly amount in wei, or `None` once the index is past
    /// every threshold.
    pub fn amount_for_week_wei(&self, index: i64) -> Option<u128> {
        self.entries
            .iter()
            .find(|e| index < e.before_week)
            .map(|e| e.tokens * WEI_PER_TOKEN)
    }

    /// First week index governed by the decay curve.
    pub fn decay_start_week(&self) -> Option<i64> {
        self.entries.last().map(|e| e.before_week)
    }
}

impl Default for ScheduleTable {
    fn default() -> Self {
        Self {
            entries: DFMAIN_SCHEDULE
                .iter()
                .map(|&(before_week, tokens)| ScheduleEntry {
                    before_week,
                    tokens,
                })
                .collect(),
        }
    }
}

/// Duration of one DF week.
pub fn week() -> Duration {
    Duration::seconds(SECONDS_PER_WEEK)
}
