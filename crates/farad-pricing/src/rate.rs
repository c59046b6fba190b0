//! Base-rate construction.

use farad_core::constants::ONE_Q64;
use farad_core::error::MathError;
use farad_core::types::{Amount, Seconds};
use farad_math::mul_div;

/// Q64.64 fee per token unit per second such that renting `tokens` for
/// `period` costs `price` at the tariff floor.
///
/// The conventional quoting shape for a service is "renting 100 tokens for
/// one day costs 3 tokens": `base_rate_q64(3 * ONE_TOKEN, 100 * ONE_TOKEN,
/// ONE_DAY)`. `price` and `tokens` must share the same decimals.
///
/// # Errors
///
/// [`MathError::ArithmeticOverflow`] if `tokens * period` overflows or is
/// zero.
pub fn base_rate_q64(price: Amount, tokens: Amount, period: Seconds) -> Result<u128, MathError> {
    let denom = tokens
        .checked_mul(period as u128)
        .ok_or(MathError::ArithmeticOverflow)?;
    mul_div(price, ONE_Q64, denom)
}
