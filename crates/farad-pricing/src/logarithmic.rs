//! Logarithmic tariff, the earlier protocol revision's curve.
//!
//! `f(u) = 1 + lambda * (-log2 u)` over the unused fraction `u`. Gentler
//! than the rational curve at moderate utilization and without a hard
//! pole: the fee diverges only as the reserve empties out completely.

use farad_core::constants::{DEFAULT_LAMBDA_Q64, ONE_Q64};
use farad_core::error::PricingError;
use farad_core::traits::Tariff;
use farad_core::types::{Amount, Seconds};
use farad_math::{mul_div, mul_shr_64, neg_log2};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct LogTariff {
    /// Steepness in Q64.64.
    pub lambda: u128,
}

impl Default for LogTariff {
    fn default() -> Self {
        Self { lambda: DEFAULT_LAMBDA_Q64 }
    }
}

impl LogTariff {
    pub fn new(lambda: u128) -> Self {
        Self { lambda }
    }

    /// `h(x) = x * (1 + lambda * (-log2((total - x)/total)))`.
    fn h(&self, total: Amount, x: Amount) -> Result<Amount, PricingError> {
        if x == 0 {
            return Ok(0);
        }
        let unused_q64 = mul_div(total - x, ONE_Q64, total)?;
        if unused_q64 == 0 {
            return Err(PricingError::InsufficientCapacity {
                requested: x,
                available: total.saturating_sub(1),
            });
        }
        let f_q64 = ONE_Q64
            .checked_add(mul_shr_64(self.lambda, neg_log2(unused_q64)?)?)
            .ok_or(farad_core::error::MathError::ArithmeticOverflow)?;
        Ok(mul_shr_64(x, f_q64)?)
    }
}

impl Tariff for LogTariff {
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
        let available = total_reserve.saturating_sub(used_reserve);
        // u must stay strictly positive: the very last token is unrentable.
        if amount >= available {
            return Err(PricingError::InsufficientCapacity {
                requested: amount,
                available: available.saturating_sub(1),
            });
        }

        let g = self
            .h(total_reserve, used_reserve + amount)?
            .saturating_sub(self.h(total_reserve, used_reserve)?);

        let token_seconds = g
            .checked_mul(duration as u128)
            .ok_or(farad_core::error::MathError::ArithmeticOverflow)?;
        Ok(mul_shr_64(token_seconds, base_rate_q64)?)
    }
}
