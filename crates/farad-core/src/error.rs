//! Error types for the Farad engine.
use thiserror::Error;

use crate::types::{AssetId, Amount};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MathError {
    #[error("time {t} precedes anchor {anchor}")] TimeBeforeAnchor { t: u64, anchor: u64 },
    #[error("half-life must be positive")] NonPositiveHalfLife,
    #[error("log argument outside (0, 1]")] LogDomain,
    #[error("arithmetic overflow")] ArithmeticOverflow,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PricingError {
    #[error("insufficient capacity: requested {requested}, available {available}")]
    InsufficientCapacity { requested: Amount, available: Amount },
    #[error(transparent)] Math(#[from] MathError),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConvertError {
    #[error("unsupported pair: {from} -> {target}")] UnsupportedPair { from: AssetId, target: AssetId },
    #[error("arithmetic overflow")] ArithmeticOverflow,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StationError {
    #[error("empty station name")] EmptyName,
    #[error("zero amount")] ZeroAmount,
    #[error("unknown service: {0}")] UnknownService(u64),
    #[error("unknown stake: {0}")] UnknownStake(u64),
    #[error("unknown rental: {0}")] UnknownRental(u64),
    #[error("insufficient liquidity: requested {requested}, available {available}")]
    InsufficientLiquidity { requested: Amount, available: Amount },
    #[error("rental payment slippage: quoted {quoted} exceeds max payment {max_payment}")]
    SlippageExceeded { quoted: Amount, max_payment: Amount },
    #[error("rental period {period} outside [{min}, {max}]")]
    InvalidRentalPeriod { period: u64, min: u64, max: u64 },
    #[error("only the renter may return within the renter-only period")]
    InvalidCallerWithinRenterOnlyPeriod,
    #[error("only the renter or the station owner may return within the owner-only period")]
    InvalidCallerWithinOwnerOnlyPeriod,
    #[error("insufficient balance: have {have}, need {need}")]
    InsufficientBalance { have: Amount, need: Amount },
    #[error("insufficient available balance: available {available}, need {need}")]
    InsufficientAvailableBalance { available: Amount, need: Amount },
    #[error("power token transfers are disabled")] TransferDisabled,
    #[error("expired rental agreement cannot be transferred")] RentalTransferNotAllowed,
    #[error("station is shut down")] Shutdown,
    #[error("caller is not the position owner")] NotPositionOwner,
    #[error("operation restricted to the station owner")] NotStationOwner,
    #[error("invalid service configuration: {0}")] InvalidServiceConfig(String),
    #[error("snapshot: {0}")] Snapshot(String),
    #[error(transparent)] Math(#[from] MathError),
    #[error(transparent)] Pricing(#[from] PricingError),
    #[error(transparent)] Convert(#[from] ConvertError),
}

#[derive(Error, Debug)]
pub enum FaradError {
    #[error(transparent)] Math(#[from] MathError),
    #[error(transparent)] Pricing(#[from] PricingError),
    #[error(transparent)] Convert(#[from] ConvertError),
    #[error(transparent)] Station(#[from] StationError),
}
