//! Proportional split of one market's budget among its participants.

use std::collections::BTreeMap;

use df_core::error::{InputError, RewardError};
use df_core::types::Address;

/// Split `budget` in proportion to each strictly positive revenue.
///
/// Participants with zero or negative revenue get no entry. When nobody is
/// positive, or the budget is zero, the map is empty. Summation
/// follows the map's address order, so results are reproducible.
pub fn apportion(
    revenues: &BTreeMap<Address, f64>,
    budget: f64,
) -> Result<BTreeMap<Address, f64>, RewardError> {
    if !budget.is_finite() {
        return Err(InputError::NonFinite { field: "budget", value: budget }.into());
    }
    if budget < 0.0 {
        return Err(InputError::NegativeBudget(budget).into());
    }
    if let Some(&bad) = revenues.values().find(|r| !r.is_finite()) {
        return Err(InputError::NonFinite { field: "revenue", value: bad }.into());
    }

    let positive: Vec<(&Address, f64)> = revenues
        .iter()
        .filter(|(_, r)| **r > 0.0)
        .map(|(a, r)| (a, *r))
        .collect();
    if positive.is_empty() || budget == 0.0 {
        return Ok(BTreeMap::new());
    }

    let total_positive: f64 = positive.iter().map(|(_, r)| r).sum();
    if !total_positive.is_finite() {
        return Err(InputError::NonFinite { field: "revenue total", value: total_positive }.into());
    }

    Ok(positive
        .into_iter()
        .map(|(addr, r)| (addr.clone(), budget * (r / total_positive)))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use df_core::constants::REWARD_TOLERANCE;
    use proptest::prelude::*;

    fn addr(s: &str) -> Address {
        s.parse().unwrap()
    }

    fn revenues(pairs: &[(&str, f64)]) -> BTreeMap<Address, f64> {
        pairs.iter().map(|(a, r)| (addr(a), *r)).collect()
    }

    #[test]
    fn single_positive_takes_everything() {
        let out = apportion(&revenues(&[("0x1", 3.0)]), 100.0).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[&addr("0x1")], 100.0);
    }

    #[test]
    fn proportional_split() {
        let out = apportion(&revenues(&[("0x2", 4.0), ("0x3", 1.0)]), 50.0).unwrap();
        assert!((out[&addr("0x2")] - 40.0).abs() < REWARD_TOLERANCE);
        assert!((out[&addr("0x3")] - 10.0).abs() < REWARD_TOLERANCE);
    }

    #[test]
    fn non_positive_get_no_entry() {
        let out = apportion(
            &revenues(&[("0x1", 2.0), ("0x2", 0.0), ("0x3", -7.5)]),
            10.0,
        )
        .unwrap();
        assert_eq!(out.keys().collect::<Vec<_>>(), vec![&addr("0x1")]);
        assert_eq!(out[&addr("0x1")], 10.0);
    }

    #[test]
    fn all_non_positive_leaves_budget_unallocated() {
        let out = apportion(&revenues(&[("0x1", -5.0), ("0x2", 0.0)]), 200.0).unwrap();
        assert!(out.is_empty());
        assert!(apportion(&BTreeMap::new(), 200.0).unwrap().is_empty());
    }

    #[test]
    fn tiny_revenue_is_not_lost() {
        let out = apportion(&revenues(&[("0xa", 1e-15), ("0xb", 1e4)]), 200.0).unwrap();
        let a = out[&addr("0xa")];
        let b = out[&addr("0xb")];
        assert!(a > 0.0);
        assert!(a < REWARD_TOLERANCE);
        assert!((b - 200.0).abs() < REWARD_TOLERANCE);
    }

    #[test]
    fn zero_budget_pays_nobody() {
        let out = apportion(&revenues(&[("0x1", 1.0)]), 0.0).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn invalid_budget_is_rejected() {
        let r = revenues(&[("0x1", 1.0)]);
        assert!(matches!(
            apportion(&r, -1.0),
            Err(RewardError::Input(InputError::NegativeBudget(_)))
        ));
        assert!(matches!(
            apportion(&r, f64::NAN),
            Err(RewardError::Input(InputError::NonFinite { field: "budget", .. }))
        ));
    }

    #[test]
    fn non_finite_revenue_is_rejected() {
        let r = revenues(&[("0x1", 1.0), ("0x2", f64::INFINITY)]);
        assert!(matches!(
            apportion(&r, 1.0),
            Err(RewardError::Input(InputError::NonFinite { field: "revenue", .. }))
        ));
    }

    #[test]
    fn overflowing_total_is_rejected() {
        let r = revenues(&[("0x1", f64::MAX), ("0x2", f64::MAX)]);
        assert!(apportion(&r, 1.0).is_err());
    }

    // --- proptest ---

    fn revenue_map() -> impl Strategy<Value = BTreeMap<Address, f64>> {
        prop::collection::btree_map(
            (1u64..10_000).prop_map(|n| addr(&format!("0x{n:x}"))),
            -1e6f64..1e6,
            1..40,
        )
    }

    proptest! {
        #[test]
        fn conserves_budget(r in revenue_map(), budget in 0.0f64..1e6) {
            let out = apportion(&r, budget).unwrap();
            if r.values().any(|v| *v > 0.0) {
                let total: f64 = out.values().sum();
                prop_assert!((total - budget).abs() < REWARD_TOLERANCE);
            } else {
                prop_assert!(out.is_empty());
            }
        }

        #[test]
        fn only_positive_participants_are_paid(r in revenue_map(), budget in 0.0f64..1e6) {
            let out = apportion(&r, budget).unwrap();
            for addr in out.keys() {
                prop_assert!(r[addr] > 0.0);
            }
            prop_assert_eq!(out.len(), r.values().filter(|v| **v > 0.0).count());
        }

        #[test]
        fn scale_invariant(r in revenue_map(), budget in 0.0f64..1e6, k in 1e-3f64..1e3) {
            let scaled: BTreeMap<Address, f64> =
                r.iter().map(|(a, v)| (a.clone(), v * k)).collect();
            let base = apportion(&r, budget).unwrap();
            let other = apportion(&scaled, budget).unwrap();
            prop_assert_eq!(base.len(), other.len());
            for (a, v) in &base {
                prop_assert!((v - other[a]).abs() < REWARD_TOLERANCE);
            }
        }

        #[test]
        fn monotonic_in_revenue(r in revenue_map(), budget in 0.0f64..1e6) {
            let out = apportion(&r, budget).unwrap();
            for (a, ra) in &r {
                for (b, rb) in &r {
                    if *ra > *rb && *rb > 0.0 {
                        prop_assert!(out[a] >= out[b]);
                    }
                }
            }
        }
    }
}
