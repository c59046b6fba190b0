//! Fixed-point binary logarithm for the logarithmic tariff.
//!
//! Only the range the tariff needs is supported: `-log2(x)` for a Q64.64
//! argument in `(0, 1]`, produced in Q64.64. The integer part comes from
//! normalizing the mantissa into `(1/2, 1]`; each fractional bit from one
//! square-and-compare iteration, the same square-and-multiply skeleton as
//! the exponential engine.

use farad_core::constants::ONE_Q64;
use farad_core::error::MathError;

use crate::wide::mul_shr_64;

const HALF_Q64: u128 = ONE_Q64 / 2;

/// `-log2(x)` in Q64.64 for `x` in `(0, 1]` Q64.64.
///
/// # Errors
///
/// [`MathError::LogDomain`] if `x == 0` or `x > 1`.
pub fn neg_log2(x: u128) -> Result<u128, MathError> {
    if x == 0 || x > ONE_Q64 {
        return Err(MathError::LogDomain);
    }

    // Normalize into (1/2, 1]; each shift is one whole unit of -log2.
    let mut mantissa = x;
    let mut int_part: u128 = 0;
    while mantissa <= HALF_Q64 {
        mantissa <<= 1;
        int_part += 1;
    }

    let mut result = int_part << 64;
    for i in (0..64).rev() {
        mantissa = mul_shr_64(mantissa, mantissa)?;
        if mantissa <= HALF_Q64 {
            mantissa <<= 1;
            result |= 1u128 << i;
        }
    }
    Ok(result)
}
