//! # df-vesting — Weekly token release under the Data Farming vesting schedule.
//!
//! All amounts are integer wei; no floating point touches the release math.
//!
//! - **Schedule table**: early weeks follow a fixed, pre-agreed amount per era.
//! - **Half-life decay**: later weeks release `F(end) - F(start)` of the
//!   decaying supply, where `F` is the fixed-point half-life function shared
//!   with the on-chain vesting wallet.
//! - **Two decay modes**: a local fixed-point evaluation and an exact mode
//!   backed by an injected oracle; both must agree for every input.
//! - **Streams**: the active share of each week is split between the
//!   predictoor budget and the volume stream.

pub mod decay;
pub mod engine;
pub mod halflife;
pub mod schedule;

pub use decay::{DecayFunction, FixedPointHalfLife, OracleHalfLife};
pub use engine::{Stream, VestingCalculator, VestingParams};
pub use halflife::halflife;
pub use schedule::{ScheduleEntry, ScheduleTable, df_week_number, df_week_start, week_index};
