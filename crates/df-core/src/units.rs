//! Conversions between whole-token floats and integer wei.

use crate::constants::WEI_PER_TOKEN;
use crate::error::InputError;

/// Convert a token amount to wei, flooring any sub-wei remainder.
///
/// # Examples
///
/// ```
/// use df_core::units::tokens_to_wei;
/// assert_eq!(tokens_to_wei(1.5).unwrap(), 1_500_000_000_000_000_000);
/// assert!(tokens_to_wei(-1.0).is_err());
/// ```
pub fn tokens_to_wei(tokens: f64) -> Result<u128, InputError> {
    if !tokens.is_finite() {
        return Err(InputError::NonFinite { field: "token amount", value: tokens });
    }
    if tokens < 0.0 {
        return Err(InputError::NegativeAmount(tokens));
    }
    let whole = tokens.trunc();
    if whole >= (u128::MAX / WEI_PER_TOKEN) as f64 {
        return Err(InputError::AmountTooLarge(tokens));
    }
    // Split so the integral part keeps full precision.
    let frac_wei = ((tokens - whole) * WEI_PER_TOKEN as f64).floor() as u128;
    Ok(whole as u128 * WEI_PER_TOKEN + frac_wei.min(WEI_PER_TOKEN - 1))
}

/// Convert wei to a token amount. Lossy above 2^53 wei of fractional detail.
pub fn wei_to_tokens(wei: u128) -> f64 {
    (wei / WEI_PER_TOKEN) as f64 + (wei % WEI_PER_TOKEN) as f64 / WEI_PER_TOKEN as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn whole_tokens_are_exact() {
        assert_eq!(tokens_to_wei(150_000.0).unwrap(), 150_000 * WEI_PER_TOKEN);
        assert_eq!(wei_to_tokens(37_500 * WEI_PER_TOKEN), 37_500.0);
    }

    #[test]
    fn zero_is_zero() {
        assert_eq!(tokens_to_wei(0.0).unwrap(), 0);
        assert_eq!(wei_to_tokens(0), 0.0);
    }

    #[test]
    fn rejects_negative_and_non_finite() {
        assert_eq!(tokens_to_wei(-0.1), Err(InputError::NegativeAmount(-0.1)));
        assert!(matches!(tokens_to_wei(f64::NAN), Err(InputError::NonFinite { .. })));
        assert!(matches!(tokens_to_wei(f64::INFINITY), Err(InputError::NonFinite { .. })));
    }

    #[test]
    fn rejects_amounts_beyond_u128() {
        assert!(matches!(tokens_to_wei(1e30), Err(InputError::AmountTooLarge(_))));
    }

    #[test]
    fn fractional_amounts_floor() {
        assert_eq!(tokens_to_wei(0.1).unwrap(), 100_000_000_000_000_000);
        assert_eq!(tokens_to_wei(2.25).unwrap(), 2_250_000_000_000_000_000);
    }

    proptest! {
        #[test]
        fn conversion_is_close(tokens in 0.0f64..1e9) {
            let back = wei_to_tokens(tokens_to_wei(tokens).unwrap());
            prop_assert!((back - tokens).abs() <= tokens * 1e-12 + 1e-12);
        }
    }
}
