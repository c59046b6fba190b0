//! Converter implementations.
//!
//! The station consumes a [`Converter`] to normalize fees quoted in a
//! service's pricing asset into whatever asset the renter pays with.
//! Production deployments plug in an exchange adapter; the implementations
//! here cover the same-asset identity and fixed-rate conversion.

use std::collections::BTreeMap;

use farad_core::error::ConvertError;
use farad_core::traits::Converter;
use farad_core::types::{Amount, AssetId};
use farad_math::mul_shr_64;

/// Same-asset conversions only; any real pair is unsupported.
#[derive(Clone, Copy, Debug, Default)]
pub struct IdentityConverter;

impl Converter for IdentityConverter {
    fn estimate_convert(
        &self,
        source: AssetId,
        amount: Amount,
        target: AssetId,
    ) -> Result<Amount, ConvertError> {
        if source == target {
            return Ok(amount);
        }
        Err(ConvertError::UnsupportedPair { from: source, target })
    }
}

/// Converts registered pairs at a fixed Q64.64 rate of target units per
/// source unit. Rates are directional: registering `(a, b)` does not
/// register `(b, a)`.
#[derive(Clone, Debug, Default)]
pub struct FixedRateConverter {
    rates: BTreeMap<(AssetId, AssetId), u128>,
}

impl FixedRateConverter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `rate_q64` target units per source unit.
    pub fn set_rate(&mut self, source: AssetId, target: AssetId, rate_q64: u128) {
        self.rates.insert((source, target), rate_q64);
    }
}

impl Converter for FixedRateConverter {
    fn estimate_convert(
        &self,
        source: AssetId,
        amount: Amount,
        target: AssetId,
    ) -> Result<Amount, ConvertError> {
        if source == target {
            return Ok(amount);
        }
        let rate = self
            .rates
            .get(&(source, target))
            .copied()
            .ok_or(ConvertError::UnsupportedPair { from: source, target })?;
        mul_shr_64(amount, rate).map_err(|_| ConvertError::ArithmeticOverflow)
    }
}
