//! Shared test helpers for integration tests.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;

use df_core::error::CollaboratorError;
use df_core::traits::{DecayOracle, RewardAllocator};
use df_core::types::{Address, MarketId};
use df_predictoor::{Participant, PredictionEvent};

/// Deterministic address from an index.
pub fn addr(i: u64) -> Address {
    format!("0x{i:040x}").parse().unwrap()
}

pub fn market(s: &str) -> MarketId {
    s.parse().unwrap()
}

/// Midnight UTC on the given date.
pub fn date(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
}

/// Append `n` identical predictions to `p`.
pub fn predict(p: &mut Participant, n: usize, payout: f64, stake: f64, m: &MarketId) {
    for _ in 0..n {
        p.add_prediction(PredictionEvent::new(1, payout, stake, m.clone()).unwrap());
    }
}

/// Key a list of participants by address.
pub fn book(ps: impl IntoIterator<Item = Participant>) -> BTreeMap<Address, Participant> {
    ps.into_iter().map(|p| (p.address().clone(), p)).collect()
}

/// Stand-in for the vesting wallet contract: halves the remainder once per
/// whole half-life, then interpolates linearly at half slope.
#[derive(Debug, Default)]
pub struct ReferenceOracle {
    calls: Mutex<u64>,
}

impl ReferenceOracle {
    pub fn calls(&self) -> u64 {
        *self.calls.lock()
    }
}

pub fn reference_get_amount(value: u128, t: u64, h: u64) -> u128 {
    let mut p = value;
    let mut halvings = t / h;
    while halvings > 0 && p > 0 {
        p /= 2;
        halvings -= 1;
    }
    let rem = (t % h) as u128;
    value - p + p * rem / h as u128 / 2
}

#[async_trait]
impl DecayOracle for ReferenceOracle {
    async fn authoritative_decay(
        &self,
        value: u128,
        t: u64,
        h: u64,
    ) -> Result<u128, CollaboratorError> {
        *self.calls.lock() += 1;
        if h == 0 {
            return Err(CollaboratorError::InvalidResponse("execution reverted".into()));
        }
        Ok(reference_get_amount(value, t, h))
    }
}

/// Allocator that confirms every call and keeps what it saw.
#[derive(Debug, Default)]
pub struct RecordingAllocator {
    pub approved: Mutex<Vec<u128>>,
    pub allocated: Mutex<Vec<(Vec<Address>, Vec<u128>)>>,
}

#[async_trait]
impl RewardAllocator for RecordingAllocator {
    async fn approve(&self, total_wei: u128) -> Result<(), CollaboratorError> {
        self.approved.lock().push(total_wei);
        Ok(())
    }

    async fn allocate(
        &self,
        recipients: &[Address],
        amounts_wei: &[u128],
    ) -> Result<(), CollaboratorError> {
        self.allocated
            .lock()
            .push((recipients.to_vec(), amounts_wei.to_vec()));
        Ok(())
    }
}
