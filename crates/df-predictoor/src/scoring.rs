//! Per-prediction revenue and per-market summaries.

use serde::{Deserialize, Serialize};

use df_core::types::MarketId;

use crate::ledger::{Participant, PredictionEvent};

/// Net revenue of one prediction: `payout - stake * (1 - payout)`.
///
/// A fully correct call earns 1 whatever the stake; a fully wrong call
/// forfeits the stake; fractional payouts interpolate linearly. Not clipped.
///
/// # Examples
///
/// ```
/// use df_predictoor::ledger::PredictionEvent;
/// use df_predictoor::scoring::score;
/// let m = "0xc1".parse().unwrap();
/// assert_eq!(score(&PredictionEvent::new(1, 1.0, 5.0, m).unwrap()), 1.0);
/// ```
pub fn score(event: &PredictionEvent) -> f64 {
    let payout = event.payout_fraction();
    payout - event.stake() * (1.0 - payout)
}

/// Summed revenue and event count of one participant on one market.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PredictionSummary {
    pub total_revenue: f64,
    pub count: u64,
}

/// Sum `score` over `participant`'s events on `market`. No normalization.
pub fn summarize(participant: &Participant, market: &MarketId) -> PredictionSummary {
    participant
        .events()
        .iter()
        .filter(|e| e.market() == market)
        .fold(PredictionSummary::default(), |acc, e| PredictionSummary {
            total_revenue: acc.total_revenue + score(e),
            count: acc.count + 1,
        })
}

impl Participant {
    pub fn prediction_summary(&self, market: &MarketId) -> PredictionSummary {
        summarize(self, market)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use df_core::types::Address;

    fn market(s: &str) -> MarketId {
        s.parse().unwrap()
    }

    fn event(payout: f64, stake: f64, m: &str) -> PredictionEvent {
        PredictionEvent::new(1, payout, stake, market(m)).unwrap()
    }

    #[test]
    fn correct_call_ignores_stake() {
        assert_eq!(score(&event(1.0, 0.1, "0xc1")), 1.0);
        assert_eq!(score(&event(1.0, 100.0, "0xc1")), 1.0);
    }

    #[test]
    fn wrong_call_forfeits_stake() {
        assert_eq!(score(&event(0.0, 2.0, "0xc1")), -2.0);
        assert_eq!(score(&event(0.0, 0.0, "0xc1")), 0.0);
    }

    #[test]
    fn fractional_payout_interpolates() {
        // 0.5 - 2 * 0.5
        assert_eq!(score(&event(0.5, 2.0, "0xc1")), -0.5);
        // 0.75 - 1 * 0.25
        assert_eq!(score(&event(0.75, 1.0, "0xc1")), 0.5);
    }

    #[test]
    fn mixed_record_nets_negative() {
        let mut p = Participant::new("0x1".parse::<Address>().unwrap());
        for _ in 0..5 {
            p.add_prediction(event(1.0, 0.5, "0xContract1"));
        }
        for _ in 0..5 {
            p.add_prediction(event(0.0, 2.0, "0xContract1"));
        }
        let s = p.prediction_summary(&market("0xcontract1"));
        assert_eq!(s.total_revenue, -5.0);
        assert_eq!(s.count, 10);
    }

    #[test]
    fn summary_is_scoped_to_market() {
        let mut p = Participant::new("0x1".parse::<Address>().unwrap());
        p.add_prediction(event(1.0, 0.5, "0xc1"));
        p.add_prediction(event(0.0, 3.0, "0xc2"));
        p.add_prediction(event(1.0, 0.5, "0xc1"));

        assert_eq!(summarize(&p, &market("0xc1")), PredictionSummary { total_revenue: 2.0, count: 2 });
        assert_eq!(summarize(&p, &market("0xc2")), PredictionSummary { total_revenue: -3.0, count: 1 });
        assert_eq!(summarize(&p, &market("0xc3")), PredictionSummary::default());
    }
}
