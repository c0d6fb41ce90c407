//! # df-predictoor — Predictoor rewards for one Data Farming round.
//!
//! Raw prediction events are scored per market, each market's even share of
//! the budget is split by positive net revenue, and the per-market maps are
//! folded into per-participant totals.

pub mod aggregate;
pub mod apportion;
pub mod calc;
pub mod csvs;
pub mod ledger;
pub mod scoring;

pub use aggregate::{AggregateRewardMap, RewardMap, aggregate, flatten};
pub use apportion::apportion;
pub use calc::{calc_predictoor_rewards, rewards_for_markets};
pub use ledger::{Participant, PredictionEvent, PredictoorSummary};
pub use scoring::{PredictionSummary, score, summarize};
