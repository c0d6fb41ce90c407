//! The two interchangeable half-life evaluation modes.
//!
//! [`FixedPointHalfLife`] evaluates the formula locally and needs no I/O.
//! [`OracleHalfLife`] defers to an authoritative [`DecayOracle`] and trusts
//! its answer verbatim. Callers pick one explicitly; an unreachable oracle is
//! an error, never a silent switch to the local formula.

use async_trait::async_trait;

use df_core::error::VestingError;
use df_core::traits::DecayOracle;

use crate::halflife::halflife;

/// Cumulative release `F(value, t, h)` of the half-life curve.
#[async_trait]
pub trait DecayFunction: Send + Sync {
    async fn amount(&self, value: u128, t: u64, h: u64) -> Result<u128, VestingError>;
}

/// Local fixed-point approximation, bit-compatible with the contract.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedPointHalfLife;

#[async_trait]
impl DecayFunction for FixedPointHalfLife {
    async fn amount(&self, value: u128, t: u64, h: u64) -> Result<u128, VestingError> {
        halflife(value, t, h)
    }
}

/// Exact mode: every evaluation is a call to the oracle.
#[derive(Debug, Clone)]
pub struct OracleHalfLife<O> {
    oracle: O,
}

impl<O: DecayOracle> OracleHalfLife<O> {
    pub fn new(oracle: O) -> Self {
        Self { oracle }
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }
}

#[async_trait]
impl<O: DecayOracle> DecayFunction for OracleHalfLife<O> {
    async fn amount(&self, value: u128, t: u64, h: u64) -> Result<u128, VestingError> {
        Ok(self.oracle.authoritative_decay(value, t, h).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use df_core::error::CollaboratorError;

    struct Unreachable;

    #[async_trait]
    impl DecayOracle for Unreachable {
        async fn authoritative_decay(
            &self,
            _value: u128,
            _t: u64,
            _h: u64,
        ) -> Result<u128, CollaboratorError> {
            Err(CollaboratorError::Unavailable("connection refused".into()))
        }
    }

    struct Constant(u128);

    #[async_trait]
    impl DecayOracle for Constant {
        async fn authoritative_decay(
            &self,
            _value: u128,
            _t: u64,
            _h: u64,
        ) -> Result<u128, CollaboratorError> {
            Ok(self.0)
        }
    }

    #[tokio::test]
    async fn fixed_point_matches_formula() {
        let f = FixedPointHalfLife;
        assert_eq!(f.amount(1_000, 10, 10).await.unwrap(), 500);
    }

    #[tokio::test]
    async fn oracle_answer_is_trusted_verbatim() {
        let f = OracleHalfLife::new(Constant(42));
        assert_eq!(f.amount(1_000, 10, 10).await.unwrap(), 42);
    }

    #[tokio::test]
    async fn unreachable_oracle_surfaces_error() {
        let f = OracleHalfLife::new(Unreachable);
        let err = f.amount(1_000, 10, 10).await.unwrap_err();
        assert!(matches!(
            err,
            VestingError::Collaborator(CollaboratorError::Unavailable(_))
        ));
    }
}
