//! Submitting a planned reward distribution through a [`RewardAllocator`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use df_core::constants::{MAX_ALLOCATE_ATTEMPTS, MAX_BATCH_SIZE};
use df_core::error::DispenseError;
use df_core::traits::RewardAllocator;
use df_core::types::Address;

use crate::batch::{Batch, checked_sum, plan_batches};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispenseOptions {
    /// Most recipients per `allocate` call.
    pub batch_size: usize,
    /// Attempts per batch before it is reported as failed.
    pub max_attempts: u32,
    /// Resume mode: run only this 1-based batch.
    pub batch_number: Option<usize>,
}

impl Default for DispenseOptions {
    fn default() -> Self {
        Self {
            batch_size: MAX_BATCH_SIZE,
            max_attempts: MAX_ALLOCATE_ATTEMPTS,
            batch_number: None,
        }
    }
}

/// Outcome of a dispense run. Failed batches can be resumed by number.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct DispenseReport {
    pub total_batches: usize,
    pub confirmed: Vec<usize>,
    pub failed: Vec<usize>,
    /// Amount approved for this run.
    pub total_wei: u128,
}

impl DispenseReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Approve and allocate `rewards` (tokens) in batches.
///
/// Each batch is tried up to `max_attempts` times while the allocator keeps
/// reporting a retryable failure. A confirmed batch is never re-sent. A batch
/// that never confirms is logged and listed in [`DispenseReport::failed`].
pub async fn dispense(
    rewards: &BTreeMap<Address, f64>,
    allocator: &dyn RewardAllocator,
    opts: &DispenseOptions,
) -> Result<DispenseReport, DispenseError> {
    if opts.max_attempts == 0 {
        return Err(DispenseError::ZeroAttempts);
    }
    let plan = plan_batches(rewards, opts.batch_size)?;
    let total_batches = plan.len();

    let selected: Vec<&Batch> = match opts.batch_number {
        Some(number) => {
            if number == 0 || number > total_batches {
                return Err(DispenseError::InvalidBatchNumber {
                    number,
                    batches: total_batches,
                });
            }
            vec![&plan[number - 1]]
        }
        None => plan.iter().collect(),
    };

    let mut report = DispenseReport {
        total_batches,
        ..Default::default()
    };
    if selected.is_empty() {
        info!("no rewards to dispense");
        return Ok(report);
    }

    let totals = selected
        .iter()
        .map(|b| b.total_wei())
        .collect::<Result<Vec<_>, _>>()?;
    report.total_wei = checked_sum(&totals)?;

    info!(
        recipients = rewards.len(),
        batches = total_batches,
        selected = selected.len(),
        total_wei = %report.total_wei,
        "dispense: begin"
    );
    allocator
        .approve(report.total_wei)
        .await
        .map_err(DispenseError::Approval)?;

    for batch in selected {
        if allocate_with_retry(allocator, batch, total_batches, opts.max_attempts).await {
            report.confirmed.push(batch.number);
        } else {
            error!(batch = batch.number, recipients = batch.len(), "could not allocate funds for batch");
            report.failed.push(batch.number);
        }
    }

    info!(
        confirmed = report.confirmed.len(),
        failed = report.failed.len(),
        "dispense: done"
    );
    Ok(report)
}

async fn allocate_with_retry(
    allocator: &dyn RewardAllocator,
    batch: &Batch,
    total_batches: usize,
    max_attempts: u32,
) -> bool {
    for attempt in 1..=max_attempts {
        debug!(
            batch = batch.number,
            of = total_batches,
            recipients = batch.len(),
            attempt,
            "allocating rewards batch"
        );
        match allocator.allocate(&batch.recipients, &batch.amounts_wei).await {
            Ok(()) => return true,
            Err(e) if e.is_retryable() => {
                warn!(batch = batch.number, attempt, error = %e, "allocate failed, retrying");
            }
            Err(e) => {
                warn!(batch = batch.number, attempt, error = %e, "allocate rejected");
                return false;
            }
        }
    }
    false
}
