//! Cross-crate integration tests for the Data Farming engine.
//!
//! The tests under `tests/` drive whole rounds: raw predictions through
//! scoring, apportionment, aggregation, CSV snapshots and dispense planning,
//! and both vesting decay modes against each other.

pub mod helpers;
