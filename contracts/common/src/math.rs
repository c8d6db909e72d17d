//! Mathematical Utilities for proxyvote
//!
//! Exact percentage comparison and checked weight arithmetic.

use crate::constants::pct::PCT_BASE;
use crate::errors::{VotingError, VotingResult};
use crate::types::{Pct, Weight};

const LOW_MASK: u128 = u64::MAX as u128;

/// Full 256-bit product of two u128 values as `(high, low)`
///
/// Schoolbook multiplication on 64-bit halves, so no partial product can
/// overflow.
pub fn mul_wide(a: u128, b: u128) -> (u128, u128) {
    let (a0, a1) = (a & LOW_MASK, a >> 64);
    let (b0, b1) = (b & LOW_MASK, b >> 64);

    let p00 = a0 * b0;
    let p01 = a0 * b1;
    let p10 = a1 * b0;
    let p11 = a1 * b1;

    // Each term is below 2^64, the sum fits comfortably
    let mid = (p00 >> 64) + (p01 & LOW_MASK) + (p10 & LOW_MASK);

    let low = (p00 & LOW_MASK) | ((mid & LOW_MASK) << 64);
    let high = p11 + (p01 >> 64) + (p10 >> 64) + (mid >> 64);
    (high, low)
}

/// Check whether `value / total > pct / PCT_BASE`
///
/// Evaluated without division as `value * PCT_BASE > pct * total` on
/// 256-bit products, so the comparison is exact. Strict: hitting the
/// threshold exactly does not pass. Always false when `total` is zero.
///
/// # Arguments
/// * `value` - Numerator weight (yea, or cast weight)
/// * `total` - Denominator weight (cast weight, or voting power)
/// * `pct` - Threshold as a fraction of `PCT_BASE`
pub fn is_value_pct(value: Weight, total: Weight, pct: Pct) -> bool {
    if total == 0 {
        return false;
    }
    mul_wide(value, PCT_BASE as u128) > mul_wide(pct as u128, total)
}

/// Express a whole-number percentage (e.g. 70) as a fixed-point `Pct`
pub fn pct_from_percent(percent: u64) -> VotingResult<Pct> {
    percent
        .checked_mul(crate::constants::pct::ONE_PERCENT)
        .ok_or(VotingError::Overflow)
}

/// Safe weight addition with overflow check
pub fn safe_add_weight(a: Weight, b: Weight) -> VotingResult<Weight> {
    a.checked_add(b).ok_or(VotingError::Overflow)
}

/// Safe weight subtraction with underflow check
pub fn safe_sub_weight(a: Weight, b: Weight) -> VotingResult<Weight> {
    a.checked_sub(b).ok_or(VotingError::Underflow)
}
