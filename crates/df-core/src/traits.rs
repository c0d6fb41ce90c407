//! Collaborator interfaces for the Data Farming engine.
//!
//! The engine itself is pure; everything that touches the network or the
//! ledger is injected through these traits:
//! - [`MarketEnumerator`]: lists the markets eligible for a scoring period
//! - [`DecayOracle`]: authoritative on-chain half-life computation
//! - [`RewardAllocator`]: submits approved reward batches
//!
//! Timeouts, retries and cancellation around each call belong to the caller.

use std::collections::BTreeSet;

use async_trait::async_trait;

use crate::error::CollaboratorError;
use crate::types::{Address, MarketId, RewardPeriod};

/// Source of the markets that share the predictoor budget for a period.
#[async_trait]
pub trait MarketEnumerator: Send + Sync {
    /// Markets active during `period`. Network failures must surface as
    /// [`CollaboratorError::Unavailable`].
    async fn list_active_markets(
        &self,
        period: &RewardPeriod,
    ) -> Result<BTreeSet<MarketId>, CollaboratorError>;
}

/// Authoritative evaluation of the half-life function, typically a pure
/// call on the deployed vesting wallet contract.
///
/// Callers must reject negative elapsed time before calling.
#[async_trait]
pub trait DecayOracle: Send + Sync {
    /// Cumulative amount of `value` released after `t` seconds with a
    /// half-life of `h` seconds.
    async fn authoritative_decay(&self, value: u128, t: u64, h: u64)
        -> Result<u128, CollaboratorError>;
}

/// Submits reward allocations to the rewards contract.
///
/// Each `allocate` call is one independently retryable unit. An `Ok` return
/// means the batch is confirmed and must never be sent again.
#[async_trait]
pub trait RewardAllocator: Send + Sync {
    /// Approve the rewards contract to pull `total_wei`.
    async fn approve(&self, total_wei: u128) -> Result<(), CollaboratorError>;

    /// Allocate `amounts_wei[i]` to `recipients[i]`.
    async fn allocate(
        &self,
        recipients: &[Address],
        amounts_wei: &[u128],
    ) -> Result<(), CollaboratorError>;
}

/// Fixed market list, e.g. from configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticMarkets {
    markets: BTreeSet<MarketId>,
}

impl StaticMarkets {
    pub fn new(markets: impl IntoIterator<Item = MarketId>) -> Self {
        Self {
            markets: markets.into_iter().collect(),
        }
    }
}

#[async_trait]
impl MarketEnumerator for StaticMarkets {
    async fn list_active_markets(
        &self,
        _period: &RewardPeriod,
    ) -> Result<BTreeSet<MarketId>, CollaboratorError> {
        Ok(self.markets.clone())
    }
}
