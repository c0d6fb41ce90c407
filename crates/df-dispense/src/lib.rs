//! # df-dispense
//! Wei conversion, batching and retrying submission of reward maps.

pub mod batch;
pub mod dispense;

pub use batch::{Batch, plan_batches};
pub use dispense::{DispenseOptions, DispenseReport, dispense};
