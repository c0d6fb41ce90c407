//! Weekly release amounts under the vesting schedule.
//!
//! [`VestingCalculator`] combines the fixed [`ScheduleTable`] with a
//! [`DecayFunction`]: table weeks return their tabulated amount, later weeks
//! release `F(end) - F(start)` over the seven days starting at the week
//! start. All amounts are integer wei.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use df_core::constants::{
    ACTIVE_REWARDS_MULTIPLIER_BPS, BPS_PRECISION, DECAYING_SUPPLY_WEI, HALF_LIFE_SECS,
    PREDICTOOR_BUDGET_TOKENS, PREDICTOOR_RELEASE_WEEK, SECONDS_PER_WEEK, VESTING_START_UNIX,
    WEI_PER_TOKEN,
};
use df_core::error::{InputError, VestingError};
use df_core::traits::DecayOracle;

use crate::decay::{DecayFunction, FixedPointHalfLife, OracleHalfLife};
use crate::schedule::{ScheduleTable, week_index};

/// Immutable vesting configuration, built once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VestingParams {
    pub schedule: ScheduleTable,
    pub decaying_supply_wei: u128,
    pub half_life_secs: u64,
    pub vesting_start: DateTime<Utc>,
    pub active_multiplier_bps: u64,
    pub predictoor_budget_wei: u128,
    /// Zero-based week index from which the predictoor stream is funded.
    pub predictoor_release_week: i64,
}

impl Default for VestingParams {
    fn default() -> Self {
        Self {
            schedule: ScheduleTable::default(),
            decaying_supply_wei: DECAYING_SUPPLY_WEI,
            half_life_secs: HALF_LIFE_SECS,
            vesting_start: DateTime::from_timestamp(VESTING_START_UNIX, 0)
                .unwrap_or_default(),
            active_multiplier_bps: ACTIVE_REWARDS_MULTIPLIER_BPS,
            predictoor_budget_wei: PREDICTOOR_BUDGET_TOKENS * WEI_PER_TOKEN,
            predictoor_release_week: PREDICTOOR_RELEASE_WEEK,
        }
    }
}

/// Named sub-stream of the active reward amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stream {
    Predictoor,
    Volume,
}

impl FromStr for Stream {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "predictoor" => Ok(Self::Predictoor),
            "volume" => Ok(Self::Volume),
            other => Err(InputError::UnknownStream(other.to_string())),
        }
    }
}

impl fmt::Display for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Predictoor => f.write_str("predictoor"),
            Self::Volume => f.write_str("volume"),
        }
    }
}

/// Vesting amount calculator over a chosen decay mode.
///
/// Stateless apart from its immutable parameters; safe to share across tasks.
#[derive(Debug, Clone)]
pub struct VestingCalculator<D> {
    params: VestingParams,
    decay: D,
}

impl VestingCalculator<FixedPointHalfLife> {
    /// Offline mode using the local fixed-point formula.
    pub fn approximate(params: VestingParams) -> Self {
        Self::new(params, FixedPointHalfLife)
    }
}

impl<O: DecayOracle> VestingCalculator<OracleHalfLife<O>> {
    /// Exact mode: every decay evaluation goes to `oracle`.
    pub fn exact(params: VestingParams, oracle: O) -> Self {
        Self::new(params, OracleHalfLife::new(oracle))
    }
}

impl<D: DecayFunction> VestingCalculator<D> {
    pub fn new(params: VestingParams, decay: D) -> Self {
        Self { params, decay }
    }

    pub fn params(&self) -> &VestingParams {
        &self.params
    }

    pub fn decay(&self) -> &D {
        &self.decay
    }

    /// Total amount released for the week starting at `week_start`, in wei.
    pub async fn reward_amount_for_week_wei(
        &self,
        week_start: DateTime<Utc>,
    ) -> Result<u128, VestingError> {
        let index = week_index(week_start);
        if let Some(amount) = self.params.schedule.amount_for_week_wei(index) {
            debug!(week = index, amount = %amount, "schedule table amount");
            return Ok(amount);
        }

        let start = self.elapsed_secs(week_start)?;
        let end = start
            .checked_add(SECONDS_PER_WEEK as u64)
            .ok_or(VestingError::ArithmeticOverflow)?;

        let value = self.params.decaying_supply_wei;
        let h = self.params.half_life_secs;
        let released_end = self.decay.amount(value, end, h).await?;
        let released_start = self.decay.amount(value, start, h).await?;

        let amount = released_end
            .checked_sub(released_start)
            .ok_or(VestingError::NonMonotonicDecay {
                start: released_start,
                end: released_end,
            })?;
        debug!(week = index, elapsed = start, amount = %amount, "half-life amount");
        Ok(amount)
    }

    /// Share of the weekly amount earmarked for active rewards, in wei.
    pub async fn active_reward_amount_for_week_wei(
        &self,
        week_start: DateTime<Utc>,
    ) -> Result<u128, VestingError> {
        let total = self.reward_amount_for_week_wei(week_start).await?;
        let active = total
            .checked_mul(self.params.active_multiplier_bps as u128)
            .ok_or(VestingError::ArithmeticOverflow)?
            / BPS_PRECISION as u128;
        Ok(active)
    }

    /// Active amount assigned to `stream` for the week, in wei.
    ///
    /// `Predictoor` receives the fixed budget once the release week is
    /// reached; `Volume` receives the remainder of the active amount.
    pub async fn active_reward_amount_by_stream_wei(
        &self,
        week_start: DateTime<Utc>,
        stream: Stream,
    ) -> Result<u128, VestingError> {
        let predictoor = self.predictoor_budget_for(week_start);
        match stream {
            Stream::Predictoor => Ok(predictoor),
            Stream::Volume => {
                let active = self.active_reward_amount_for_week_wei(week_start).await?;
                active
                    .checked_sub(predictoor)
                    .ok_or(VestingError::StreamBudgetExceedsActive {
                        stream: predictoor,
                        active,
                    })
            }
        }
    }

    /// Convenience form taking a stream name. Unknown names are rejected
    /// before any computation.
    pub async fn active_reward_amount_by_stream_name_wei(
        &self,
        week_start: DateTime<Utc>,
        stream: &str,
    ) -> Result<u128, VestingError> {
        let stream: Stream = stream.parse()?;
        self.active_reward_amount_by_stream_wei(week_start, stream).await
    }

    fn predictoor_budget_for(&self, week_start: DateTime<Utc>) -> u128 {
        if week_index(week_start) >= self.params.predictoor_release_week {
            self.params.predictoor_budget_wei
        } else {
            0
        }
    }

    fn elapsed_secs(&self, at: DateTime<Utc>) -> Result<u64, VestingError> {
        let elapsed = at.timestamp() - self.params.vesting_start.timestamp();
        if elapsed < 0 {
            return Err(InputError::NegativeElapsed(elapsed).into());
        }
        Ok(elapsed as u64)
    }
}
