//! # df-core
//! Foundation types, constants and collaborator traits for Data Farming
//! reward computation.

pub mod constants;
pub mod error;
pub mod traits;
pub mod types;
pub mod units;
