//! Rental agreements and the return-window ladder.

use farad_core::error::StationError;
use farad_core::types::{AccountId, Amount, AssetId, Seconds, ServiceId, Timestamp};
use serde::{Deserialize, Serialize};

/// An active rental of power tokens against the reserve.
#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, bincode::Encode, bincode::Decode,
)]
pub struct RentalAgreement {
    /// Service whose power tokens are rented.
    pub service: ServiceId,
    /// Current holder of the agreement and its power tokens.
    pub renter: AccountId,
    /// Rented amount in base-asset units.
    pub rental_amount: Amount,
    /// Rental start.
    pub start_time: Timestamp,
    /// Rental expiry; extended by re-quoting.
    pub end_time: Timestamp,
    /// Asset the GC deposit is held in.
    pub payment_asset: AssetId,
    /// Deposit paid out to whoever performs the return.
    pub gc_deposit: Amount,
}

impl RentalAgreement {
    /// Enforce the return-window ladder at `now`.
    ///
    /// Through `end_time` plus the renter-only window, only the renter may
    /// return (the grace period belongs to them). Through the following
    /// collection window, the station owner may also collect. Past both,
    /// anyone may force-return and earn the GC deposit.
    pub fn check_return_caller(
        &self,
        caller: AccountId,
        station_owner: AccountId,
        renter_only_period: Seconds,
        owner_only_period: Seconds,
        now: Timestamp,
    ) -> Result<(), StationError> {
        if caller == self.renter {
            return Ok(());
        }
        let renter_only_until = self.end_time.saturating_add(renter_only_period);
        if now <= renter_only_until {
            return Err(StationError::InvalidCallerWithinRenterOnlyPeriod);
        }
        if now <= renter_only_until.saturating_add(owner_only_period) {
            if caller == station_owner {
                return Ok(());
            }
            return Err(StationError::InvalidCallerWithinOwnerOnlyPeriod);
        }
        Ok(())
    }

    /// Whether the agreement has expired at `now`.
    pub fn expired(&self, now: Timestamp) -> bool {
        now > self.end_time
    }
}
