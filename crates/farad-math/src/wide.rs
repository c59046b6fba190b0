//! Widened 128-bit arithmetic helpers.
//!
//! Products of two 128-bit quantities go through a 256-bit intermediate
//! built from 64-bit limbs with u128 partial products, then truncate back
//! to 128 bits. All paths are checked; overflow of the final width is
//! reported as [`MathError::ArithmeticOverflow`].

use farad_core::error::MathError;

const LO_MASK: u128 = (1u128 << 64) - 1;

/// Full 256-bit product of two u128 values as `(hi, lo)` halves.
fn mul_256(a: u128, b: u128) -> (u128, u128) {
    let (a_hi, a_lo) = (a >> 64, a & LO_MASK);
    let (b_hi, b_lo) = (b >> 64, b & LO_MASK);

    let ll = a_lo * b_lo;
    let lh = a_lo * b_hi;
    let hl = a_hi * b_lo;
    let hh = a_hi * b_hi;

    // Middle terms overlap the boundary between the two output halves.
    let mid = (ll >> 64) + (lh & LO_MASK) + (hl & LO_MASK);

    let lo = (mid << 64) | (ll & LO_MASK);
    let hi = hh + (lh >> 64) + (hl >> 64) + (mid >> 64);
    (hi, lo)
}

/// `(a * b) >> 64`, truncated.
///
/// The workhorse of Q64.64 multiplication: multiplying a raw amount by a
/// Q64.64 factor, or two Q64.64 factors together.
pub fn mul_shr_64(a: u128, b: u128) -> Result<u128, MathError> {
    let (hi, lo) = mul_256(a, b);
    if hi >> 64 != 0 {
        return Err(MathError::ArithmeticOverflow);
    }
    Ok((hi << 64) | (lo >> 64))
}

/// `a * b / d`, truncated, with a 256-bit intermediate product.
///
/// Used for ratios of raw token amounts (shares math, utilization) where
/// `a * b` alone would overflow 128 bits.
pub fn mul_div(a: u128, b: u128, d: u128) -> Result<u128, MathError> {
    if d == 0 {
        return Err(MathError::ArithmeticOverflow);
    }
    let (hi, lo) = mul_256(a, b);
    if hi >= d {
        // Quotient would need more than 128 bits.
        return Err(MathError::ArithmeticOverflow);
    }
    if hi == 0 {
        return Ok(lo / d);
    }

    // Bit-by-bit long division of the 256-bit product by d. The remainder
    // is kept below d, so `rem * 2 + bit` fits in 129 bits; the transient
    // carry out of bit 127 is folded into the subtraction.
    let mut rem = hi;
    let mut quotient: u128 = 0;
    for i in (0..128).rev() {
        let carry = rem >> 127 != 0;
        rem = (rem << 1) | ((lo >> i) & 1);
        if carry || rem >= d {
            rem = rem.wrapping_sub(d);
            quotient |= 1 << i;
        }
    }
    Ok(quotient)
}
