//! Rational pole/slope tariff.
//!
//! `f(u) = (1-pole)*slope/(u-pole) + (1-slope)` over the unused fraction
//! `u`. The multiplier sits at 1.0 with the whole reserve free, stays near
//! the `1-slope` floor at low utilization, and diverges as `u` approaches
//! the pole: the curve itself refuses to rent the last `pole` share of
//! the reserve.

use farad_core::constants::{DEFAULT_POLE_Q64, DEFAULT_SLOPE_Q64, ONE_Q64};
use farad_core::error::PricingError;
use farad_core::traits::Tariff;
use farad_core::types::{Amount, Seconds};
use farad_math::{mul_div, mul_shr_64};
use serde::{Deserialize, Serialize};

/// The production tariff curve.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct RationalTariff {
    /// Unused-fraction asymptote in Q64.64; utilization cannot cross it.
    pub pole: u128,
    /// Curve steepness in Q64.64; `1 - slope` is the price floor.
    pub slope: u128,
}

impl Default for RationalTariff {
    fn default() -> Self {
        Self { pole: DEFAULT_POLE_Q64, slope: DEFAULT_SLOPE_Q64 }
    }
}

impl RationalTariff {
    pub fn new(pole: u128, slope: u128) -> Self {
        Self { pole, slope }
    }

    /// `h(x) = x * f((total - x)/total)` in raw token units.
    fn h(&self, total: Amount, x: Amount, numerator: u128) -> Result<Amount, PricingError> {
        let unused_q64 = mul_div(total - x, ONE_Q64, total)?;
        let denom = unused_q64.saturating_sub(self.pole);
        if denom == 0 {
            return Err(PricingError::InsufficientCapacity {
                requested: x,
                available: self.capacity(total),
            });
        }
        let f_q64 = mul_div(numerator, ONE_Q64, denom)?
            .checked_add(ONE_Q64 - self.slope)
            .ok_or(farad_core::error::MathError::ArithmeticOverflow)?;
        Ok(mul_shr_64(x, f_q64)?)
    }

    /// Largest committable reserve amount: `total * (1 - pole)`, exclusive
    /// of the pole itself.
    fn capacity(&self, total: Amount) -> Amount {
        mul_shr_64(total, ONE_Q64 - self.pole).unwrap_or(0)
    }
}

impl Tariff for RationalTariff {
    fn quote(
        &self,
        base_rate_q64: u128,
        total_reserve: Amount,
        used_reserve: Amount,
        amount: Amount,
        duration: Seconds,
    ) -> Result<Amount, PricingError> {
        if amount == 0 || duration == 0 {
            return Ok(0);
        }
        let usable = self.capacity(total_reserve).saturating_sub(used_reserve);
        if amount > usable {
            return Err(PricingError::InsufficientCapacity {
                requested: amount,
                available: usable,
            });
        }

        // (1 - pole) * slope, hoisted out of both h evaluations.
        let numerator = mul_shr_64(ONE_Q64 - self.pole, self.slope)?;
        let h_after = self.h(total_reserve, used_reserve + amount, numerator)?;
        let h_before = self.h(total_reserve, used_reserve, numerator)?;
        let g = h_after.saturating_sub(h_before);

        let token_seconds = g
            .checked_mul(duration as u128)
            .ok_or(farad_core::error::MathError::ArithmeticOverflow)?;
        Ok(mul_shr_64(token_seconds, base_rate_q64)?)
    }
}
