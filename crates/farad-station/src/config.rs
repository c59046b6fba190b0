//! Station and service configuration.
//!
//! Plain structs with serde derives; a station is configured
//! programmatically at construction and services are registered against
//! it. Runtime mutation happens only through explicit admin operations.

use farad_core::constants::{
    DEFAULT_GC_FEE_BPS, DEFAULT_LAMBDA_Q64, DEFAULT_OWNER_ONLY_COLLECTION_PERIOD,
    DEFAULT_POLE_Q64, DEFAULT_RENTER_ONLY_RETURN_PERIOD, DEFAULT_SLOPE_Q64,
    DEFAULT_STREAMING_HALVING_PERIOD,
};
use farad_core::traits::Tariff;
use farad_core::types::{AccountId, Amount, AssetId, Seconds};
use farad_pricing::{LogTariff, RationalTariff};
use serde::{Deserialize, Serialize};

/// Which tariff curve a service prices rentals with.
///
/// Selected once at service registration; the variants are separate
/// [`Tariff`] implementations, not branches inside one formula.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, bincode::Encode, bincode::Decode)]
pub enum CurveKind {
    /// Pole/slope rational curve with a hard capacity cap (production).
    Rational { pole: u128, slope: u128 },
    /// Logarithmic curve from the earlier protocol revision.
    Logarithmic { lambda: u128 },
}

impl Default for CurveKind {
    fn default() -> Self {
        Self::Rational { pole: DEFAULT_POLE_Q64, slope: DEFAULT_SLOPE_Q64 }
    }
}

impl CurveKind {
    /// Logarithmic curve with the default steepness.
    pub fn logarithmic() -> Self {
        Self::Logarithmic { lambda: DEFAULT_LAMBDA_Q64 }
    }

    /// Instantiate the pricing strategy.
    pub fn build(&self) -> Box<dyn Tariff> {
        match *self {
            Self::Rational { pole, slope } => Box::new(RationalTariff::new(pole, slope)),
            Self::Logarithmic { lambda } => Box::new(LogTariff::new(lambda)),
        }
    }
}

/// Station-wide configuration, fixed at construction.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, bincode::Encode, bincode::Decode)]
pub struct StationConfig {
    /// Human-readable station name; must be non-empty.
    pub name: String,
    /// The asset stakers deposit and the reserve is denominated in.
    pub base_asset: AssetId,
    /// Account receiving collected service fees and privileged for
    /// shutdown and owner-window returns.
    pub owner: AccountId,
    /// Half-life of streamed rental income availability.
    pub streaming_halving_period: Seconds,
    /// GC deposit share of each rental payment, in bps.
    pub gc_fee_bps: u128,
    /// Post-expiry window in which only the renter may return.
    pub renter_only_return_period: Seconds,
    /// Window after that in which only the renter or owner may return.
    pub owner_only_collection_period: Seconds,
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            name: "station".to_string(),
            base_asset: AssetId::default(),
            owner: AccountId::default(),
            streaming_halving_period: DEFAULT_STREAMING_HALVING_PERIOD,
            gc_fee_bps: DEFAULT_GC_FEE_BPS,
            renter_only_return_period: DEFAULT_RENTER_ONLY_RETURN_PERIOD,
            owner_only_collection_period: DEFAULT_OWNER_ONLY_COLLECTION_PERIOD,
        }
    }
}

/// Per-service configuration, fixed at registration.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, bincode::Encode, bincode::Decode)]
pub struct ServiceConfig {
    /// Power token name.
    pub name: String,
    /// Power token symbol.
    pub symbol: String,
    /// Half-life of the gap between a holder's balance and energy.
    pub energy_gap_halving_period: Seconds,
    /// Q64.64 fee per token unit per second, in `pricing_asset`.
    pub base_rate_q64: u128,
    /// Asset the tariff quotes fees in.
    pub pricing_asset: AssetId,
    /// Share of each rental fee diverted to the station owner, in bps.
    pub service_fee_bps: u128,
    /// Shortest rental period accepted.
    pub min_rental_period: Seconds,
    /// Longest rental period accepted.
    pub max_rental_period: Seconds,
    /// Floor on the GC deposit, in `pricing_asset` units.
    pub min_gc_fee: Amount,
    /// Tariff curve variant.
    pub curve: CurveKind,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "Farad Power".to_string(),
            symbol: "FPW".to_string(),
            energy_gap_halving_period: 86_400,
            base_rate_q64: 0,
            pricing_asset: AssetId::default(),
            service_fee_bps: 0,
            min_rental_period: 0,
            max_rental_period: 60 * 86_400,
            min_gc_fee: 0,
            curve: CurveKind::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use farad_core::constants::{ONE_Q64, ONE_TOKEN};

    #[test]
    fn default_curve_is_rational() {
        assert!(matches!(CurveKind::default(), CurveKind::Rational { .. }));
    }

    #[test]
    fn curve_builds_matching_tariff() {
        // Both variants must price an empty reserve at the base rate;
        // the rational curve exactly, the log curve in the limit.
        let rate = (3u128 << 64) / (100 * 86_400);
        let rational = CurveKind::default().build();
        let log = CurveKind::logarithmic().build();
        let fee_rational = rational
            .quote(rate, 1_000_000 * ONE_TOKEN, 0, ONE_TOKEN, 86_400)
            .unwrap();
        let fee_log = log
            .quote(rate, 1_000_000 * ONE_TOKEN, 0, ONE_TOKEN, 86_400)
            .unwrap();
        let expected = 3 * ONE_TOKEN / 100;
        assert!(fee_rational.abs_diff(expected) < ONE_TOKEN / 10_000);
        assert!(fee_log.abs_diff(expected) < ONE_TOKEN / 10_000);
    }

    #[test]
    fn default_station_config_windows() {
        let cfg = StationConfig::default();
        assert_eq!(cfg.renter_only_return_period, 43_200);
        assert_eq!(cfg.owner_only_collection_period, 43_200);
        assert_eq!(cfg.streaming_halving_period, 7 * 86_400);
    }

    #[test]
    fn custom_curve_parameters_survive_serde() {
        let curve = CurveKind::Rational { pole: ONE_Q64 / 10, slope: ONE_Q64 / 2 };
        let json = serde_json::to_string(&curve).unwrap();
        let back: CurveKind = serde_json::from_str(&json).unwrap();
        assert_eq!(curve, back);
    }

    #[test]
    fn service_config_serde_round_trip() {
        let cfg = ServiceConfig {
            base_rate_q64: 12345,
            min_gc_fee: ONE_TOKEN,
            ..ServiceConfig::default()
        };
        let json = serde_json::to_string(&cfg).unwrap();
        let back: ServiceConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(cfg, back);
    }
}
