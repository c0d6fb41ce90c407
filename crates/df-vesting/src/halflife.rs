//! Fixed-point half-life release function.
//!
//! Integer arithmetic only. Mirrors the vesting wallet contract's
//! `getAmount(value, t, h)` operation for operation, so the local result and
//! the on-chain result agree exactly:
//!
//! ```text
//! p = value >> (t / h)
//! t = t % h
//! amount = value - p + (p * t) / h / 2
//! ```
//!
//! Whole half-lives halve the unreleased remainder exactly; inside a
//! half-life the release is interpolated linearly, so the curve is piecewise
//! linear and `amount` is non-decreasing in `t`.

use df_core::error::{InputError, VestingError};

/// Cumulative amount of `value` released after `t` seconds with a half-life
/// of `h` seconds.
///
/// Returns `value` minus whatever is still locked; never exceeds `value`.
///
/// # Examples
///
/// ```
/// use df_vesting::halflife::halflife;
/// assert_eq!(halflife(1_000, 0, 10).unwrap(), 0);
/// assert_eq!(halflife(1_000, 10, 10).unwrap(), 500);
/// assert_eq!(halflife(1_000, 20, 10).unwrap(), 750);
/// ```
pub fn halflife(value: u128, t: u64, h: u64) -> Result<u128, VestingError> {
    if h == 0 {
        return Err(InputError::ZeroHalfLife.into());
    }

    // Shifting a u128 by 128 or more would panic; everything is released by then.
    let halvings = t / h;
    let p = if halvings >= u128::BITS as u64 {
        0
    } else {
        value >> halvings
    };
    let t_rem = (t % h) as u128;

    // Same order as the contract: multiply, then two floor divisions.
    let partial = p
        .checked_mul(t_rem)
        .ok_or(VestingError::ArithmeticOverflow)?
        / h as u128
        / 2;

    Ok(value - p + partial)
}
