//! Per-market reward maps and their per-participant totals.

use std::collections::BTreeMap;

use df_core::types::{Address, MarketId};

/// market → participant → reward (tokens). Only positive shares appear.
pub type RewardMap = BTreeMap<MarketId, BTreeMap<Address, f64>>;

/// participant → reward summed over every market.
pub type AggregateRewardMap = BTreeMap<Address, f64>;

/// Sum each participant's rewards across all markets.
pub fn aggregate(per_market: &RewardMap) -> AggregateRewardMap {
    let mut totals = AggregateRewardMap::new();
    for rewards in per_market.values() {
        for (addr, amount) in rewards {
            *totals.entry(addr.clone()).or_insert(0.0) += amount;
        }
    }
    totals
}

/// Total of every entry; equals the allocated budget.
pub fn flatten(per_market: &RewardMap) -> f64 {
    per_market.values().flat_map(BTreeMap::values).sum()
}
