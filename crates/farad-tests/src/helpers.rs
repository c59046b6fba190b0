//! Shared test helpers: funded stations, default services, tolerances.

use std::sync::Arc;

use farad_core::constants::ONE_TOKEN;
use farad_core::traits::Converter;
use farad_core::types::{AccountId, Amount, AssetId, Seconds, ServiceId};
use farad_pricing::base_rate_q64;
use farad_station::{IdentityConverter, ServiceConfig, Station, StationConfig};

pub const ONE_DAY: u64 = 86_400;
pub const ONE_HOUR: u64 = 3_600;

/// Install a compact tracing subscriber for test debugging. Safe to call
/// from every test; only the first call wins.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

pub fn base_asset() -> AssetId {
    AssetId::from_seed(0x01)
}

pub fn usd_asset() -> AssetId {
    AssetId::from_seed(0x02)
}

pub fn owner() -> AccountId {
    AccountId::from_seed(0xAA)
}

pub fn staker() -> AccountId {
    AccountId::from_seed(0x01)
}

pub fn staker2() -> AccountId {
    AccountId::from_seed(0x04)
}

pub fn renter() -> AccountId {
    AccountId::from_seed(0x02)
}

pub fn stranger() -> AccountId {
    AccountId::from_seed(0x03)
}

/// A station with no GC cut, so scenario arithmetic matches the quoted
/// fees exactly.
pub fn new_station() -> Station {
    new_station_with_converter(Arc::new(IdentityConverter))
}

pub fn new_station_with_converter(converter: Arc<dyn Converter>) -> Station {
    let config = StationConfig {
        name: "test station".to_string(),
        base_asset: base_asset(),
        owner: owner(),
        gc_fee_bps: 0,
        ..StationConfig::default()
    };
    Station::new(config, converter).unwrap()
}

/// Register a service priced `price` tokens per `tokens` rented per day,
/// with no service fee and a one-day energy gap half-life.
pub fn register_service(station: &Station, tokens: Amount, price: Amount) -> ServiceId {
    register_service_with(station, tokens, price, base_asset(), 0, 0, 60 * ONE_DAY)
}

pub fn register_service_with(
    station: &Station,
    tokens: Amount,
    price: Amount,
    pricing_asset: AssetId,
    service_fee_bps: u128,
    min_rental_period: Seconds,
    max_rental_period: Seconds,
) -> ServiceId {
    station
        .register_service(ServiceConfig {
            name: "Farad Power Test".to_string(),
            symbol: "FPT".to_string(),
            energy_gap_halving_period: ONE_DAY,
            base_rate_q64: base_rate_q64(price, tokens, ONE_DAY).unwrap(),
            pricing_asset,
            service_fee_bps,
            min_rental_period,
            max_rental_period,
            min_gc_fee: 0,
            ..ServiceConfig::default()
        })
        .unwrap()
}

/// Credit `tokens` whole tokens of `asset` to `account`.
pub fn fund(station: &Station, asset: AssetId, account: AccountId, tokens: Amount) {
    station.mint(asset, account, tokens * ONE_TOKEN);
}

/// Assert two raw amounts agree within `tol` thousandths of a token.
pub fn assert_close(a: Amount, b: Amount, tol_milli_tokens: Amount) {
    let diff = a.abs_diff(b);
    assert!(
        diff <= tol_milli_tokens * ONE_TOKEN / 1000,
        "amounts differ by {} raw units ({} vs {})",
        diff,
        a,
        b
    );
}
