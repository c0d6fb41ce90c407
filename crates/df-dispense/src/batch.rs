//! Splitting a reward map into bounded, wei-denominated batches.

use std::collections::BTreeMap;

use serde::Serialize;

use df_core::error::DispenseError;
use df_core::types::Address;
use df_core::units::tokens_to_wei;

/// One `allocate` call's worth of recipients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Batch {
    /// 1-based position in the plan.
    pub number: usize,
    pub recipients: Vec<Address>,
    pub amounts_wei: Vec<u128>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.recipients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipients.is_empty()
    }

    pub fn total_wei(&self) -> Result<u128, DispenseError> {
        checked_sum(&self.amounts_wei)
    }
}

/// Convert `rewards` (tokens) to wei and chunk them, in address order, into
/// batches of at most `batch_size` recipients.
pub fn plan_batches(
    rewards: &BTreeMap<Address, f64>,
    batch_size: usize,
) -> Result<Vec<Batch>, DispenseError> {
    if batch_size == 0 {
        return Err(DispenseError::ZeroBatchSize);
    }
    let entries = rewards
        .iter()
        .map(|(addr, tokens)| Ok((addr.clone(), tokens_to_wei(*tokens)?)))
        .collect::<Result<Vec<_>, DispenseError>>()?;

    Ok(entries
        .chunks(batch_size)
        .enumerate()
        .map(|(i, chunk)| {
            let (recipients, amounts_wei) = chunk.iter().cloned().unzip();
            Batch {
                number: i + 1,
                recipients,
                amounts_wei,
            }
        })
        .collect())
}

pub(crate) fn checked_sum(amounts: &[u128]) -> Result<u128, DispenseError> {
    amounts
        .iter()
        .try_fold(0u128, |acc, a| acc.checked_add(*a))
        .ok_or(DispenseError::AmountOverflow)
}
