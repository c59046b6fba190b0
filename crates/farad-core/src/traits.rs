//! Trait interfaces between crates:
//! - [`Tariff`] — rental fee pricing strategy (farad-pricing implements)
//! - [`Converter`] — asset-to-asset conversion quotes (farad-station
//!   implements; production deployments plug in an exchange adapter)

use crate::error::{ConvertError, PricingError};
use crate::types::{Amount, AssetId, Seconds};

/// Prices renting `amount` tokens for `duration` against the current
/// reserve state.
///
/// Implementations must satisfy the additivity law: renting `a1` then `a2`
/// (with `used_reserve` advanced in between) costs the same as renting
/// `a1 + a2` once, up to fixed-point rounding. The `h`-difference
/// construction used by both shipped tariffs guarantees this.
///
/// `base_rate_q64` is the Q64.64 fee per token unit per second in the
/// service's pricing asset.
pub trait Tariff: Send + Sync {
    /// Fee for renting `amount` for `duration`, in the pricing asset.
    ///
    /// # Errors
    ///
    /// [`PricingError::InsufficientCapacity`] if the unused reserve cannot
    /// cover `amount` under this curve's cap.
    fn quote(
        &self,
        base_rate_q64: u128,
        total_reserve: Amount,
        used_reserve: Amount,
        amount: Amount,
        duration: Seconds,
    ) -> Result<Amount, PricingError>;
}

/// Quotes and executes asset-to-asset conversion so rental fees can be
/// paid in assets other than the service's pricing asset.
///
/// The same-asset conversion is always the identity with no fee.
pub trait Converter: Send + Sync {
    /// Pure quote: how much `target` does `amount` of `source` buy.
    ///
    /// # Errors
    ///
    /// [`ConvertError::UnsupportedPair`] if the assets differ and the pair
    /// is not registered.
    fn estimate_convert(
        &self,
        source: AssetId,
        amount: Amount,
        target: AssetId,
    ) -> Result<Amount, ConvertError>;

    /// Execute the conversion. Default implementation applies the same
    /// rate as [`estimate_convert`](Self::estimate_convert); adapters with
    /// price impact override this.
    fn convert(
        &self,
        source: AssetId,
        amount: Amount,
        target: AssetId,
    ) -> Result<Amount, ConvertError> {
        self.estimate_convert(source, amount, target)
    }
}
