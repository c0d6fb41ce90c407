//! Participants and the prediction events attributed to them.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use df_core::error::InputError;
use df_core::types::{Address, MarketId};

/// One scored prediction. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPredictionEvent")]
pub struct PredictionEvent {
    timestamp: u64,
    payout_fraction: f64,
    stake: f64,
    market: MarketId,
}

/// Wire form, checked by [`PredictionEvent::new`] on the way in.
#[derive(Deserialize)]
struct RawPredictionEvent {
    timestamp: u64,
    payout_fraction: f64,
    stake: f64,
    market: MarketId,
}

impl TryFrom<RawPredictionEvent> for PredictionEvent {
    type Error = InputError;

    fn try_from(raw: RawPredictionEvent) -> Result<Self, Self::Error> {
        Self::new(raw.timestamp, raw.payout_fraction, raw.stake, raw.market)
    }
}

impl PredictionEvent {
    /// Build a validated event.
    ///
    /// `payout_fraction` must lie in `[0, 1]` and `stake` must be
    /// non-negative; both must be finite.
    pub fn new(
        timestamp: u64,
        payout_fraction: f64,
        stake: f64,
        market: MarketId,
    ) -> Result<Self, InputError> {
        if !payout_fraction.is_finite() {
            return Err(InputError::NonFinite { field: "payout", value: payout_fraction });
        }
        if !(0.0..=1.0).contains(&payout_fraction) {
            return Err(InputError::PayoutOutOfRange(payout_fraction));
        }
        if !stake.is_finite() {
            return Err(InputError::NonFinite { field: "stake", value: stake });
        }
        if stake < 0.0 {
            return Err(InputError::NegativeStake(stake));
        }
        Ok(Self {
            timestamp,
            payout_fraction,
            stake,
            market,
        })
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    pub fn payout_fraction(&self) -> f64 {
        self.payout_fraction
    }

    pub fn stake(&self) -> f64 {
        self.stake
    }

    pub fn market(&self) -> &MarketId {
        &self.market
    }

    /// Any non-zero payout counts as a correct call.
    pub fn is_correct(&self) -> bool {
        self.payout_fraction > 0.0
    }
}

/// A predictoor and its events, in insertion order.
#[derive(Debug, Clone, PartialEq)]
pub struct Participant {
    address: Address,
    events: Vec<PredictionEvent>,
    prediction_count: u64,
    correct_prediction_count: u64,
}

impl Participant {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            events: Vec::new(),
            prediction_count: 0,
            correct_prediction_count: 0,
        }
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn events(&self) -> &[PredictionEvent] {
        &self.events
    }

    pub fn add_prediction(&mut self, event: PredictionEvent) {
        self.prediction_count += 1;
        if event.is_correct() {
            self.correct_prediction_count += 1;
        }
        self.events.push(event);
    }

    pub fn prediction_count(&self) -> u64 {
        self.prediction_count
    }

    pub fn correct_prediction_count(&self) -> u64 {
        self.correct_prediction_count
    }

    /// Fraction of correct predictions; 0 with no predictions.
    pub fn accuracy(&self) -> f64 {
        if self.prediction_count == 0 {
            return 0.0;
        }
        self.correct_prediction_count as f64 / self.prediction_count as f64
    }

    /// Markets this participant predicted on.
    pub fn markets(&self) -> BTreeSet<&MarketId> {
        self.events.iter().map(PredictionEvent::market).collect()
    }

    pub fn summary(&self) -> PredictoorSummary {
        PredictoorSummary {
            address: self.address.clone(),
            prediction_count: self.prediction_count,
            correct_prediction_count: self.correct_prediction_count,
            accuracy: self.accuracy(),
        }
    }
}

/// Event-free snapshot of a participant, as persisted between runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictoorSummary {
    pub address: Address,
    pub prediction_count: u64,
    pub correct_prediction_count: u64,
    pub accuracy: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn market(s: &str) -> MarketId {
        s.parse().unwrap()
    }

    fn addr(s: &str) -> Address {
        s.parse().unwrap()
    }

    #[test]
    fn rejects_payout_outside_unit_interval() {
        assert_eq!(
            PredictionEvent::new(1, 1.5, 0.0, market("0xc1")),
            Err(InputError::PayoutOutOfRange(1.5))
        );
        assert_eq!(
            PredictionEvent::new(1, -0.1, 0.0, market("0xc1")),
            Err(InputError::PayoutOutOfRange(-0.1))
        );
    }

    #[test]
    fn rejects_negative_stake() {
        assert_eq!(
            PredictionEvent::new(1, 1.0, -2.0, market("0xc1")),
            Err(InputError::NegativeStake(-2.0))
        );
    }

    #[test]
    fn rejects_non_finite_values() {
        assert!(matches!(
            PredictionEvent::new(1, f64::NAN, 1.0, market("0xc1")),
            Err(InputError::NonFinite { field: "payout", .. })
        ));
        assert!(matches!(
            PredictionEvent::new(1, 0.5, f64::INFINITY, market("0xc1")),
            Err(InputError::NonFinite { field: "stake", .. })
        ));
    }

    #[test]
    fn accepts_boundaries() {
        assert!(PredictionEvent::new(0, 0.0, 0.0, market("0xc1")).is_ok());
        assert!(PredictionEvent::new(0, 1.0, 1e9, market("0xc1")).is_ok());
    }

    #[test]
    fn deserialization_goes_through_validation() {
        let ok = r#"{"timestamp":7,"payout_fraction":0.5,"stake":2.0,"market":"0xC1"}"#;
        let e: PredictionEvent = serde_json::from_str(ok).unwrap();
        assert_eq!(e, PredictionEvent::new(7, 0.5, 2.0, market("0xc1")).unwrap());

        let out_of_range = r#"{"timestamp":1,"payout_fraction":5.0,"stake":0.0,"market":"0xc1"}"#;
        assert!(serde_json::from_str::<PredictionEvent>(out_of_range).is_err());
        let negative_stake = r#"{"timestamp":1,"payout_fraction":1.0,"stake":-3.0,"market":"0xc1"}"#;
        assert!(serde_json::from_str::<PredictionEvent>(negative_stake).is_err());
    }

    #[test]
    fn counters_track_correct_predictions() {
        let mut p = Participant::new(addr("0x1"));
        for _ in 0..3 {
            p.add_prediction(PredictionEvent::new(1, 1.0, 0.5, market("0xc1")).unwrap());
        }
        p.add_prediction(PredictionEvent::new(2, 0.0, 0.5, market("0xc2")).unwrap());

        assert_eq!(p.prediction_count(), 4);
        assert_eq!(p.correct_prediction_count(), 3);
        assert_eq!(p.accuracy(), 0.75);
        assert_eq!(p.events().len(), 4);
        assert_eq!(p.markets().len(), 2);
    }

    #[test]
    fn accuracy_without_predictions_is_zero() {
        assert_eq!(Participant::new(addr("0x1")).accuracy(), 0.0);
    }

    #[test]
    fn summary_reflects_counters() {
        let mut p = Participant::new(addr("0xAA"));
        p.add_prediction(PredictionEvent::new(1, 0.25, 1.0, market("0xc1")).unwrap());
        let s = p.summary();
        assert_eq!(s.address.as_str(), "0xaa");
        assert_eq!(s.prediction_count, 1);
        assert_eq!(s.correct_prediction_count, 1);
        assert_eq!(s.accuracy, 1.0);
    }
}
