//! Per-market reward calculation for a scoring period.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, info, warn};

use df_core::error::{InputError, RewardError};
use df_core::traits::MarketEnumerator;
use df_core::types::{Address, MarketId, RewardPeriod};

use crate::aggregate::{RewardMap, flatten};
use crate::apportion::apportion;
use crate::ledger::Participant;
use crate::scoring::summarize;

/// Enumerate the period's active markets, then split `tokens_avail` over them.
///
/// Enumeration failures propagate unchanged; no market list is assumed.
pub async fn calc_predictoor_rewards(
    participants: &BTreeMap<Address, Participant>,
    tokens_avail: f64,
    markets: &dyn MarketEnumerator,
    period: &RewardPeriod,
) -> Result<RewardMap, RewardError> {
    let active = markets.list_active_markets(period).await?;
    debug!(markets = active.len(), start = %period.start(), "enumerated active markets");
    rewards_for_markets(participants, tokens_avail, &active)
}

/// Divide `tokens_avail` evenly across `markets` and apportion each share by
/// net revenue. Every market gets an entry, empty when nobody earned.
pub fn rewards_for_markets(
    participants: &BTreeMap<Address, Participant>,
    tokens_avail: f64,
    markets: &BTreeSet<MarketId>,
) -> Result<RewardMap, RewardError> {
    if !tokens_avail.is_finite() {
        return Err(InputError::NonFinite { field: "tokens_avail", value: tokens_avail }.into());
    }
    if tokens_avail < 0.0 {
        return Err(InputError::NegativeBudget(tokens_avail).into());
    }

    let mut rewards = RewardMap::new();
    if markets.is_empty() {
        warn!(tokens_avail, "no active markets, nothing to distribute");
        return Ok(rewards);
    }

    let per_market_budget = tokens_avail / markets.len() as f64;
    for market in markets {
        let revenues: BTreeMap<Address, f64> = participants
            .iter()
            .filter_map(|(addr, p)| {
                let summary = summarize(p, market);
                (summary.count > 0).then(|| (addr.clone(), summary.total_revenue))
            })
            .collect();

        let shares = apportion(&revenues, per_market_budget)?;
        if shares.is_empty() {
            warn!(market = %market, budget = per_market_budget, "no positive revenue, share forfeited");
        } else {
            debug!(market = %market, participants = revenues.len(), paid = shares.len(), "apportioned market");
        }
        rewards.insert(market.clone(), shares);
    }

    info!(
        markets = rewards.len(),
        allocated = flatten(&rewards),
        tokens_avail,
        "predictoor rewards computed"
    );
    Ok(rewards)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use df_core::constants::REWARD_TOLERANCE;
    use df_core::error::CollaboratorError;
    use df_core::traits::StaticMarkets;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use crate::aggregate::aggregate;
    use crate::ledger::PredictionEvent;

    fn addr(s: &str) -> Address {
        s.parse().unwrap()
    }

    fn market(s: &str) -> MarketId {
        s.parse().unwrap()
    }

    fn two_markets() -> StaticMarkets {
        StaticMarkets::new([market("0xContract1"), market("0xContract2")])
    }

    fn period() -> RewardPeriod {
        RewardPeriod::week_starting(Utc.with_ymd_and_hms(2024, 3, 14, 0, 0, 0).unwrap())
    }

    fn predict(p: &mut Participant, n: usize, payout: f64, stake: f64, m: &str) {
        for _ in 0..n {
            p.add_prediction(PredictionEvent::new(1, payout, stake, market(m)).unwrap());
        }
    }

    fn book(ps: Vec<Participant>) -> BTreeMap<Address, Participant> {
        ps.into_iter().map(|p| (p.address().clone(), p)).collect()
    }

    struct Down;

    #[async_trait]
    impl MarketEnumerator for Down {
        async fn list_active_markets(
            &self,
            _period: &RewardPeriod,
        ) -> Result<BTreeSet<MarketId>, CollaboratorError> {
            Err(CollaboratorError::Unavailable("subgraph timeout".into()))
        }
    }

    #[tokio::test]
    async fn no_predictions_gives_empty_markets() {
        let rewards = calc_predictoor_rewards(&BTreeMap::new(), 100.0, &two_markets(), &period())
            .await
            .unwrap();
        assert_eq!(rewards.len(), 2);
        assert!(rewards.values().all(BTreeMap::is_empty));
    }

    #[tokio::test]
    async fn one_predictoor_gets_its_market_share() {
        let mut p1 = Participant::new(addr("0x1"));
        predict(&mut p1, 10, 1.0, 0.1, "0xContract1");

        let rewards = calc_predictoor_rewards(&book(vec![p1]), 200.0, &two_markets(), &period())
            .await
            .unwrap();
        let total = aggregate(&rewards);
        // two markets, so half the budget
        assert_eq!(total[&addr("0x1")], 100.0);
    }

    #[tokio::test]
    async fn tiny_revenue_against_large() {
        let mut p1 = Participant::new(addr("0x1"));
        predict(&mut p1, 1, 1e-15, 1e-15, "0xContract1");
        let mut p2 = Participant::new(addr("0x2"));
        predict(&mut p2, 10_000, 1.0, 100.0, "0xContract1");

        let rewards = calc_predictoor_rewards(&book(vec![p1, p2]), 200.0, &two_markets(), &period())
            .await
            .unwrap();
        let total = aggregate(&rewards);
        assert!(total[&addr("0x1")] < REWARD_TOLERANCE);
        assert!((total[&addr("0x2")] - 100.0).abs() < REWARD_TOLERANCE);
    }

    #[tokio::test]
    async fn shares_follow_revenue_per_market() {
        let mut p1 = Participant::new(addr("0x1"));
        predict(&mut p1, 5, 1.0, 0.5, "0xContract1");
        predict(&mut p1, 5, 0.0, 0.5, "0xContract1");
        let mut p2 = Participant::new(addr("0x2"));
        predict(&mut p2, 20, 1.0, 0.5, "0xContract2");
        predict(&mut p2, 20, 0.0, 0.5, "0xContract2");
        let mut p3 = Participant::new(addr("0x3"));
        predict(&mut p3, 5, 1.0, 0.5, "0xContract2");
        predict(&mut p3, 5, 0.0, 0.5, "0xContract2");

        let rewards = calc_predictoor_rewards(&book(vec![p1, p2, p3]), 100.0, &two_markets(), &period())
            .await
            .unwrap();
        assert_eq!(rewards.len(), 2);
        let c1 = &rewards[&market("0xcontract1")];
        let c2 = &rewards[&market("0xcontract2")];
        assert_eq!(c1[&addr("0x1")], 50.0);
        assert!((c2[&addr("0x2")] - 40.0).abs() < REWARD_TOLERANCE);
        assert!((c2[&addr("0x3")] - 10.0).abs() < REWARD_TOLERANCE);
    }

    #[tokio::test]
    async fn negative_revenue_forfeits_share() {
        let mut p1 = Participant::new(addr("0x1"));
        predict(&mut p1, 5, 1.0, 0.5, "0xContract1");
        predict(&mut p1, 5, 0.0, 2.0, "0xContract1");

        let rewards = calc_predictoor_rewards(&book(vec![p1]), 1000.0, &two_markets(), &period())
            .await
            .unwrap();
        assert!(rewards[&market("0xcontract1")].is_empty());
        assert!(rewards[&market("0xcontract2")].is_empty());
        assert_eq!(flatten(&rewards), 0.0);
    }

    #[tokio::test]
    async fn events_on_unlisted_markets_are_ignored() {
        let mut p1 = Participant::new(addr("0x1"));
        predict(&mut p1, 3, 1.0, 0.0, "0xElsewhere");
        predict(&mut p1, 1, 1.0, 0.0, "0xContract2");

        let rewards = calc_predictoor_rewards(&book(vec![p1]), 10.0, &two_markets(), &period())
            .await
            .unwrap();
        assert!(!rewards.contains_key(&market("0xelsewhere")));
        assert_eq!(flatten(&rewards), 5.0);
    }

    #[tokio::test]
    async fn no_active_markets_yields_empty_map() {
        let empty = StaticMarkets::new(Vec::<MarketId>::new());
        let rewards = calc_predictoor_rewards(&BTreeMap::new(), 10.0, &empty, &period())
            .await
            .unwrap();
        assert!(rewards.is_empty());
    }

    #[tokio::test]
    async fn enumerator_failure_propagates() {
        let err = calc_predictoor_rewards(&BTreeMap::new(), 10.0, &Down, &period())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RewardError::Collaborator(CollaboratorError::Unavailable(_))
        ));
    }

    #[test]
    fn negative_tokens_rejected() {
        let markets: BTreeSet<MarketId> = [market("0xc1")].into_iter().collect();
        assert!(matches!(
            rewards_for_markets(&BTreeMap::new(), -1.0, &markets),
            Err(RewardError::Input(InputError::NegativeBudget(_)))
        ));
    }

    #[test]
    fn fuzz_rewards_are_proportional() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut ps = Vec::new();
        for i in 0..100 {
            let mut p = Participant::new(addr(&format!("0x{i:x}")));
            let total = rng.gen_range(100..200);
            let correct = rng.gen_range(0..=total);
            for _ in 0..correct {
                predict(&mut p, 1, 1.0, rng.gen_range(0.0..10.0), "0xContract1");
                predict(&mut p, 1, 1.0, rng.gen_range(0.0..10.0), "0xContract2");
            }
            for _ in correct..total {
                predict(&mut p, 1, 0.0, rng.gen_range(0.0..10.0), "0xContract1");
                predict(&mut p, 1, 0.0, rng.gen_range(0.0..10.0), "0xContract2");
            }
            ps.push(p);
        }
        let participants = book(ps);
        let markets: BTreeSet<MarketId> =
            [market("0xContract1"), market("0xContract2")].into_iter().collect();
        let tokens_avail = 1000.0;

        let rewards = rewards_for_markets(&participants, tokens_avail, &markets).unwrap();

        for m in &markets {
            let positive_total: f64 = participants
                .values()
                .map(|p| summarize(p, m).total_revenue.max(0.0))
                .sum();
            for (a, p) in &participants {
                let rev = summarize(p, m).total_revenue;
                let expected = if rev > 0.0 {
                    rev / positive_total * tokens_avail / 2.0
                } else {
                    0.0
                };
                let got = rewards[m].get(a).copied().unwrap_or(0.0);
                assert!((got - expected).abs() < REWARD_TOLERANCE, "{a} on {m}: {got} vs {expected}");
            }
        }
        assert!((flatten(&rewards) - tokens_avail).abs() < REWARD_TOLERANCE);
    }
}
