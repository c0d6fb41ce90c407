//! Allocator that records batches instead of submitting transactions.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Serialize;
use tracing::info;

use df_core::error::CollaboratorError;
use df_core::traits::RewardAllocator;
use df_core::types::Address;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedCall {
    pub recipients: Vec<Address>,
    /// Decimal strings; JSON numbers cannot hold every u128.
    pub amounts_wei: Vec<String>,
}

/// Accepts every call and keeps what would have been sent.
#[derive(Debug, Default)]
pub struct DryRunAllocator {
    approved: Mutex<Vec<u128>>,
    calls: Mutex<Vec<PlannedCall>>,
}

impl DryRunAllocator {
    pub fn approved(&self) -> Vec<u128> {
        self.approved.lock().clone()
    }

    pub fn calls(&self) -> Vec<PlannedCall> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl RewardAllocator for DryRunAllocator {
    async fn approve(&self, total_wei: u128) -> Result<(), CollaboratorError> {
        info!(total_wei = %total_wei, "dry run: approve");
        self.approved.lock().push(total_wei);
        Ok(())
    }

    async fn allocate(
        &self,
        recipients: &[Address],
        amounts_wei: &[u128],
    ) -> Result<(), CollaboratorError> {
        info!(recipients = recipients.len(), "dry run: allocate");
        self.calls.lock().push(PlannedCall {
            recipients: recipients.to_vec(),
            amounts_wei: amounts_wei.iter().map(u128::to_string).collect(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use df_core::constants::WEI_PER_TOKEN;
    use df_dispense::{DispenseOptions, dispense};

    #[tokio::test]
    async fn records_full_plan() {
        let rewards: BTreeMap<Address, f64> = [("0x1", 1.5), ("0x2", 2.0), ("0x3", 0.25)]
            .into_iter()
            .map(|(a, v)| (a.parse().unwrap(), v))
            .collect();
        let alloc = DryRunAllocator::default();
        let opts = DispenseOptions {
            batch_size: 2,
            ..Default::default()
        };

        let report = dispense(&rewards, &alloc, &opts).await.unwrap();

        assert!(report.is_complete());
        assert_eq!(alloc.approved(), vec![15 * WEI_PER_TOKEN / 4]);
        let calls = alloc.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].amounts_wei, ["1500000000000000000", "2000000000000000000"]);
        assert_eq!(calls[1].recipients[0].as_str(), "0x3");
    }
}
