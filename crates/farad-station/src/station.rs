//! The station: one serialized aggregate owning all mutable ledger state.
//!
//! Every operation takes the single write lock, validates against a
//! consistent snapshot of the state, and only then mutates: a failed
//! call leaves every ledger untouched. Quotes used for payment are
//! recomputed inside the same critical section that charges them, so a
//! rent can never be charged a different fee than it was admitted at.
//!
//! Timestamps are explicit arguments: the engine has no clock of its own,
//! an external sequencer supplies a non-decreasing `now` with each call.

use std::sync::Arc;

use farad_core::constants::BPS_PRECISION;
use farad_core::error::StationError;
use farad_core::traits::Converter;
use farad_core::types::{AccountId, Amount, AssetId, RentalId, Seconds, ServiceId, StakeId, Timestamp};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::assets::AssetLedger;
use crate::config::{ServiceConfig, StationConfig};
use crate::power::PowerLedger;
use crate::rental::RentalAgreement;
use crate::reserve::ReserveState;
use crate::stake::StakePosition;

/// Ledger account holding everything in the station's custody: staked
/// reserve, wrapped collateral, GC deposits and uncollected service fees.
pub const VAULT_ACCOUNT: AccountId = AccountId([0xFE; 20]);

/// A registered power-token service.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, bincode::Encode, bincode::Decode)]
pub struct Service {
    pub config: ServiceConfig,
    pub power: PowerLedger,
}

/// Everything durable, behind the station's single lock.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, bincode::Encode, bincode::Decode)]
pub struct StationState {
    config: StationConfig,
    assets: AssetLedger,
    reserve: ReserveState,
    services: BTreeMap<ServiceId, Service>,
    stakes: BTreeMap<StakeId, StakePosition>,
    rentals: BTreeMap<RentalId, RentalAgreement>,
    next_service: u64,
    next_stake: u64,
    next_rental: u64,
    shutdown: bool,
    /// Collected service fees in base-asset units, owed to the owner.
    service_fee_collected: Amount,
}

/// A rental fee quote with its internal split, all computed from one
/// state snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct RentalQuote {
    /// What the renter pays, in the payment asset (fee + GC deposit).
    total: Amount,
    /// Fee portion in the payment asset.
    fee_in_payment: Amount,
    /// GC deposit in the payment asset.
    gc_deposit: Amount,
    /// Pool share of the fee, in base-asset units.
    pool_in_base: Amount,
    /// Owner share of the fee, in base-asset units.
    service_in_base: Amount,
}

pub struct Station {
    state: RwLock<StationState>,
    converter: Arc<dyn Converter>,
}

impl std::fmt::Debug for Station {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Station").finish_non_exhaustive()
    }
}

impl Station {
    /// Create a station around its base asset and converter.
    pub fn new(config: StationConfig, converter: Arc<dyn Converter>) -> Result<Self, StationError> {
        if config.name.is_empty() {
            return Err(StationError::EmptyName);
        }
        info!(name = %config.name, base = %config.base_asset, "station created");
        Ok(Self {
            state: RwLock::new(StationState {
                config,
                assets: AssetLedger::new(),
                reserve: ReserveState::new(),
                services: BTreeMap::new(),
                stakes: BTreeMap::new(),
                rentals: BTreeMap::new(),
                next_service: 0,
                next_stake: 0,
                next_rental: 0,
                shutdown: false,
                service_fee_collected: 0,
            }),
            converter,
        })
    }

    // ------------------------------------------------------------------
    // Token-layer hooks and balance views
    // ------------------------------------------------------------------

    /// Token-layer hook: credit `amount` of `asset` to `account`.
    pub fn mint(&self, asset: AssetId, account: AccountId, amount: Amount) {
        self.state.write().assets.mint(asset, account, amount);
    }

    pub fn balance_of(&self, asset: AssetId, account: AccountId) -> Amount {
        self.state.read().assets.balance_of(asset, account)
    }

    pub fn power_balance_of(&self, service: ServiceId, who: AccountId) -> Result<Amount, StationError> {
        let state = self.state.read();
        Ok(state.service(service)?.power.balance_of(who))
    }

    pub fn energy_at(
        &self,
        service: ServiceId,
        who: AccountId,
        t: Timestamp,
    ) -> Result<Amount, StationError> {
        let state = self.state.read();
        let svc = state.service(service)?;
        Ok(svc.power.energy_at(who, svc.config.energy_gap_halving_period, t)?)
    }

    pub fn available_for_transfer(
        &self,
        service: ServiceId,
        who: AccountId,
        t: Timestamp,
    ) -> Result<Amount, StationError> {
        let state = self.state.read();
        let svc = state.service(service)?;
        Ok(svc
            .power
            .available_for_transfer(who, svc.config.energy_gap_halving_period, t)?)
    }

    // ------------------------------------------------------------------
    // Service administration
    // ------------------------------------------------------------------

    pub fn register_service(&self, config: ServiceConfig) -> Result<ServiceId, StationError> {
        let mut state = self.state.write();
        state.ensure_live()?;
        if config.name.is_empty() || config.symbol.is_empty() {
            return Err(StationError::InvalidServiceConfig("empty name or symbol".into()));
        }
        if config.energy_gap_halving_period == 0 {
            return Err(StationError::InvalidServiceConfig(
                "energy gap halving period must be positive".into(),
            ));
        }
        if config.min_rental_period > config.max_rental_period {
            return Err(StationError::InvalidServiceConfig(
                "min rental period exceeds max".into(),
            ));
        }
        if config.service_fee_bps > BPS_PRECISION {
            return Err(StationError::InvalidServiceConfig(
                "service fee above 100%".into(),
            ));
        }
        state.next_service += 1;
        let id = ServiceId(state.next_service);
        info!(service = %id, name = %config.name, symbol = %config.symbol, "service registered");
        state.services.insert(id, Service { config, power: PowerLedger::new() });
        Ok(id)
    }

    pub fn get_service_config(&self, service: ServiceId) -> Result<ServiceConfig, StationError> {
        Ok(self.state.read().service(service)?.config.clone())
    }

    /// One-way: allow plain power-token transfers for this service.
    pub fn enable_transfer_forever(
        &self,
        caller: AccountId,
        service: ServiceId,
    ) -> Result<(), StationError> {
        let mut state = self.state.write();
        if caller != state.config.owner {
            return Err(StationError::NotStationOwner);
        }
        state.service_mut(service)?.power.enable_transfer_forever();
        info!(%service, "power token transfers enabled forever");
        Ok(())
    }

    pub fn transfers_enabled(&self, service: ServiceId) -> Result<bool, StationError> {
        Ok(self.state.read().service(service)?.power.transfers_enabled())
    }

    /// One-way wind-down: staking and renting stop, exits stay open and
    /// are no longer blocked by outstanding rentals.
    pub fn shutdown_forever(&self, caller: AccountId) -> Result<(), StationError> {
        let mut state = self.state.write();
        if caller != state.config.owner {
            return Err(StationError::NotStationOwner);
        }
        state.shutdown = true;
        info!(name = %state.config.name, "station shut down forever");
        Ok(())
    }

    pub fn is_shutdown(&self) -> bool {
        self.state.read().shutdown
    }

    // ------------------------------------------------------------------
    // Reserve views
    // ------------------------------------------------------------------

    pub fn get_reserve(&self, now: Timestamp) -> Result<Amount, StationError> {
        let state = self.state.read();
        Ok(state
            .reserve
            .reserve_at(state.config.streaming_halving_period, now)?)
    }

    pub fn get_available_reserve(&self, now: Timestamp) -> Result<Amount, StationError> {
        let state = self.state.read();
        Ok(state
            .reserve
            .available_at(state.config.streaming_halving_period, now)?)
    }

    pub fn get_used_reserve(&self) -> Amount {
        self.state.read().reserve.used
    }

    pub fn get_streaming_halving_period(&self) -> Seconds {
        self.state.read().config.streaming_halving_period
    }

    pub fn get_service_fee_collected(&self) -> Amount {
        self.state.read().service_fee_collected
    }

    // ------------------------------------------------------------------
    // Staking
    // ------------------------------------------------------------------

    pub fn stake(
        &self,
        staker: AccountId,
        amount: Amount,
        now: Timestamp,
    ) -> Result<StakeId, StationError> {
        let mut state = self.state.write();
        state.ensure_live()?;
        if amount == 0 {
            return Err(StationError::ZeroAmount);
        }
        let half_life = state.config.streaming_halving_period;
        let base = state.config.base_asset;
        let shares = state.reserve.shares_for_stake(amount, half_life, now)?;
        state.assets.transfer(base, staker, VAULT_ACCOUNT, amount)?;
        state.reserve.flush(half_life, now)?;
        state.reserve.fixed += amount;
        state.reserve.total_shares += shares;
        state.next_stake += 1;
        let id = StakeId(state.next_stake);
        state
            .stakes
            .insert(id, StakePosition { owner: staker, amount, shares, staked_at: now });
        info!(stake = %id, %staker, amount, "stake created");
        Ok(id)
    }

    pub fn increase_stake(
        &self,
        caller: AccountId,
        stake: StakeId,
        amount: Amount,
        now: Timestamp,
    ) -> Result<(), StationError> {
        let mut state = self.state.write();
        state.ensure_live()?;
        if amount == 0 {
            return Err(StationError::ZeroAmount);
        }
        let position = state.position(stake)?;
        if position.owner != caller {
            return Err(StationError::NotPositionOwner);
        }
        let half_life = state.config.streaming_halving_period;
        let base = state.config.base_asset;
        let shares = state.reserve.shares_for_stake(amount, half_life, now)?;
        state.assets.transfer(base, caller, VAULT_ACCOUNT, amount)?;
        state.reserve.flush(half_life, now)?;
        state.reserve.fixed += amount;
        state.reserve.total_shares += shares;
        if let Some(p) = state.stakes.get_mut(&stake) {
            p.amount += amount;
            p.shares += shares;
        }
        debug!(%stake, amount, "stake increased");
        Ok(())
    }

    pub fn decrease_stake(
        &self,
        caller: AccountId,
        stake: StakeId,
        amount: Amount,
        now: Timestamp,
    ) -> Result<(), StationError> {
        let mut state = self.state.write();
        if amount == 0 {
            return Err(StationError::ZeroAmount);
        }
        let position = state.position(stake)?;
        if position.owner != caller {
            return Err(StationError::NotPositionOwner);
        }
        if position.amount < amount {
            return Err(StationError::InsufficientBalance {
                have: position.amount,
                need: amount,
            });
        }
        let half_life = state.config.streaming_halving_period;
        let base = state.config.base_asset;
        let enforce = !state.shutdown;
        let burn = state
            .reserve
            .shares_for_withdraw(amount, half_life, now)?
            .min(position.shares);
        state.reserve.withdraw(amount, half_life, now, enforce)?;
        state.reserve.total_shares -= burn;
        let mut payout = amount;
        if state.reserve.total_shares == 0 {
            payout += state.reserve.drain_remaining(now);
        }
        let emptied = if let Some(p) = state.stakes.get_mut(&stake) {
            p.amount -= amount;
            p.shares -= burn;
            p.amount == 0 && p.shares == 0
        } else {
            false
        };
        if emptied {
            state.stakes.remove(&stake);
        }
        state.assets.transfer(base, VAULT_ACCOUNT, caller, payout)?;
        debug!(%stake, amount, "stake decreased");
        Ok(())
    }

    /// Withdraw the position entirely: principal plus accrued reward.
    pub fn unstake(
        &self,
        caller: AccountId,
        stake: StakeId,
        now: Timestamp,
    ) -> Result<Amount, StationError> {
        let mut state = self.state.write();
        let position = state.position(stake)?;
        if position.owner != caller {
            return Err(StationError::NotPositionOwner);
        }
        let half_life = state.config.streaming_halving_period;
        let base = state.config.base_asset;
        let enforce = !state.shutdown;
        let mut payout = state
            .reserve
            .value_of_shares(position.shares, half_life, now)?;
        state.reserve.withdraw(payout, half_life, now, enforce)?;
        state.reserve.total_shares -= position.shares;
        if state.reserve.total_shares == 0 {
            payout += state.reserve.drain_remaining(now);
        }
        state.stakes.remove(&stake);
        state.assets.transfer(base, VAULT_ACCOUNT, caller, payout)?;
        info!(%stake, payout, "unstaked");
        Ok(payout)
    }

    /// Reward accrued above the position's principal at `now`.
    pub fn get_staking_reward(&self, stake: StakeId, now: Timestamp) -> Result<Amount, StationError> {
        let state = self.state.read();
        let position = state.position(stake)?;
        let value = state.reserve.value_of_shares(
            position.shares,
            state.config.streaming_halving_period,
            now,
        )?;
        Ok(value.saturating_sub(position.amount))
    }

    /// Pay out the accrued reward, resetting the position's shares to
    /// back only its remaining principal.
    pub fn claim_staking_reward(
        &self,
        caller: AccountId,
        stake: StakeId,
        now: Timestamp,
    ) -> Result<Amount, StationError> {
        let mut state = self.state.write();
        let position = state.position(stake)?;
        if position.owner != caller {
            return Err(StationError::NotPositionOwner);
        }
        let half_life = state.config.streaming_halving_period;
        let base = state.config.base_asset;
        let enforce = !state.shutdown;

        let value = state
            .reserve
            .value_of_shares(position.shares, half_life, now)?;
        let reward = value.saturating_sub(position.amount);
        if reward == 0 {
            return Ok(0);
        }
        // Shares backing the remaining principal, at the pre-claim ratio.
        let kept = state
            .reserve
            .shares_for_withdraw(position.amount, half_life, now)?
            .min(position.shares);
        let burn = position.shares - kept;
        state.reserve.withdraw(reward, half_life, now, enforce)?;
        state.reserve.total_shares -= burn;
        let mut payout = reward;
        if state.reserve.total_shares == 0 {
            payout += state.reserve.drain_remaining(now);
        }
        let emptied = if let Some(p) = state.stakes.get_mut(&stake) {
            p.shares = kept;
            p.amount == 0 && p.shares == 0
        } else {
            false
        };
        if emptied {
            state.stakes.remove(&stake);
        }
        state.assets.transfer(base, VAULT_ACCOUNT, caller, payout)?;
        info!(%stake, reward = payout, "staking reward claimed");
        Ok(payout)
    }

    pub fn get_stake(&self, stake: StakeId) -> Result<StakePosition, StationError> {
        self.state.read().position(stake)
    }

    // ------------------------------------------------------------------
    // Renting
    // ------------------------------------------------------------------

    /// Everything a renter would pay for this rental right now, in the
    /// payment asset (fee plus GC deposit).
    pub fn estimate_rental_fee(
        &self,
        service: ServiceId,
        payment_asset: AssetId,
        amount: Amount,
        duration: Seconds,
        now: Timestamp,
    ) -> Result<Amount, StationError> {
        let state = self.state.read();
        let quote = state.quote(&*self.converter, service, payment_asset, amount, duration, None, now)?;
        Ok(quote.total)
    }

    pub fn rent(
        &self,
        renter: AccountId,
        service: ServiceId,
        payment_asset: AssetId,
        amount: Amount,
        duration: Seconds,
        max_payment: Amount,
        now: Timestamp,
    ) -> Result<RentalId, StationError> {
        let mut state = self.state.write();
        state.ensure_live()?;
        if amount == 0 {
            return Err(StationError::ZeroAmount);
        }
        let quote = state.quote(&*self.converter, service, payment_asset, amount, duration, None, now)?;
        if quote.total > max_payment {
            return Err(StationError::SlippageExceeded {
                quoted: quote.total,
                max_payment,
            });
        }
        state.assets.transfer(payment_asset, renter, VAULT_ACCOUNT, quote.total)?;
        state.settle_payment(payment_asset, &quote, now)?;
        state.reserve.used += amount;

        let gap = state.service(service)?.config.energy_gap_halving_period;
        state
            .service_mut(service)?
            .power
            .mint(renter, amount, true, gap, now)?;

        state.next_rental += 1;
        let id = RentalId(state.next_rental);
        state.rentals.insert(
            id,
            RentalAgreement {
                service,
                renter,
                rental_amount: amount,
                start_time: now,
                end_time: now.saturating_add(duration),
                payment_asset,
                gc_deposit: quote.gc_deposit,
            },
        );
        info!(rental = %id, %renter, amount, paid = quote.total, "rented");
        Ok(id)
    }

    /// Extend a rental, re-quoted at current utilization with the
    /// rental's own amount excluded (a continuation, not a new draw).
    pub fn extend_rental_period(
        &self,
        caller: AccountId,
        rental: RentalId,
        payment_asset: AssetId,
        duration: Seconds,
        max_payment: Amount,
        now: Timestamp,
    ) -> Result<(), StationError> {
        let mut state = self.state.write();
        state.ensure_live()?;
        let agreement = state.agreement(rental)?;
        if agreement.renter != caller {
            return Err(StationError::NotPositionOwner);
        }
        let used_without = state.reserve.used - agreement.rental_amount;
        let quote = state.quote(
            &*self.converter,
            agreement.service,
            payment_asset,
            agreement.rental_amount,
            duration,
            Some(used_without),
            now,
        )?;
        if quote.total > max_payment {
            return Err(StationError::SlippageExceeded {
                quoted: quote.total,
                max_payment,
            });
        }
        state.assets.transfer(payment_asset, caller, VAULT_ACCOUNT, quote.total)?;
        state.settle_payment(payment_asset, &quote, now)?;
        if let Some(a) = state.rentals.get_mut(&rental) {
            a.end_time = a.end_time.max(now).saturating_add(duration);
        }
        debug!(%rental, duration, paid = quote.total, "rental period extended");
        Ok(())
    }

    /// Return rented power tokens, releasing the reserve and paying the
    /// GC deposit to whoever performed the return.
    pub fn return_rental(
        &self,
        caller: AccountId,
        rental: RentalId,
        now: Timestamp,
    ) -> Result<(), StationError> {
        let mut state = self.state.write();
        let agreement = state.agreement(rental)?;
        if !state.shutdown {
            agreement.check_return_caller(
                caller,
                state.config.owner,
                state.config.renter_only_return_period,
                state.config.owner_only_collection_period,
                now,
            )?;
        }
        let gap = state.service(agreement.service)?.config.energy_gap_halving_period;
        state.service_mut(agreement.service)?.power.burn(
            agreement.renter,
            agreement.rental_amount,
            true,
            gap,
            now,
        )?;
        state.reserve.used -= agreement.rental_amount;
        state
            .assets
            .transfer(agreement.payment_asset, VAULT_ACCOUNT, caller, agreement.gc_deposit)?;
        state.rentals.remove(&rental);
        info!(%rental, %caller, amount = agreement.rental_amount, "rental returned");
        Ok(())
    }

    pub fn get_rental_agreement(&self, rental: RentalId) -> Result<RentalAgreement, StationError> {
        self.state.read().agreement(rental)
    }

    /// Move a live rental agreement (and its locked power tokens) to a
    /// new holder. Requires service transfers enabled and a live rental.
    pub fn transfer_rental(
        &self,
        caller: AccountId,
        rental: RentalId,
        to: AccountId,
        now: Timestamp,
    ) -> Result<(), StationError> {
        let mut state = self.state.write();
        let agreement = state.agreement(rental)?;
        if agreement.renter != caller {
            return Err(StationError::NotPositionOwner);
        }
        let svc = state.service(agreement.service)?;
        if !svc.power.transfers_enabled() {
            return Err(StationError::TransferDisabled);
        }
        if agreement.expired(now) {
            return Err(StationError::RentalTransferNotAllowed);
        }
        let gap = svc.config.energy_gap_halving_period;
        state.service_mut(agreement.service)?.power.transfer_locked(
            caller,
            to,
            agreement.rental_amount,
            gap,
            now,
        )?;
        if let Some(a) = state.rentals.get_mut(&rental) {
            a.renter = to;
        }
        debug!(%rental, %to, "rental transferred");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Power token wrap / transfer surface
    // ------------------------------------------------------------------

    /// Wrap base asset into power tokens 1:1.
    pub fn swap_in(
        &self,
        caller: AccountId,
        service: ServiceId,
        amount: Amount,
        now: Timestamp,
    ) -> Result<(), StationError> {
        let mut state = self.state.write();
        state.ensure_live()?;
        if amount == 0 {
            return Err(StationError::ZeroAmount);
        }
        let base = state.config.base_asset;
        let gap = state.service(service)?.config.energy_gap_halving_period;
        state.assets.transfer(base, caller, VAULT_ACCOUNT, amount)?;
        state.service_mut(service)?.power.mint(caller, amount, false, gap, now)?;
        debug!(%service, %caller, amount, "swapped in");
        Ok(())
    }

    /// Unwrap power tokens back into base asset 1:1. Only the unlocked
    /// balance can leave; rented tokens go back through their agreement.
    pub fn swap_out(
        &self,
        caller: AccountId,
        service: ServiceId,
        amount: Amount,
        now: Timestamp,
    ) -> Result<(), StationError> {
        let mut state = self.state.write();
        if amount == 0 {
            return Err(StationError::ZeroAmount);
        }
        let base = state.config.base_asset;
        let gap = state.service(service)?.config.energy_gap_halving_period;
        state.service_mut(service)?.power.burn(caller, amount, false, gap, now)?;
        state.assets.transfer(base, VAULT_ACCOUNT, caller, amount)?;
        debug!(%service, %caller, amount, "swapped out");
        Ok(())
    }

    /// Plain power-token transfer: requires the service switch flipped
    /// and an energized, unlocked balance.
    pub fn transfer_power(
        &self,
        from: AccountId,
        to: AccountId,
        service: ServiceId,
        amount: Amount,
        now: Timestamp,
    ) -> Result<(), StationError> {
        let mut state = self.state.write();
        let gap = state.service(service)?.config.energy_gap_halving_period;
        state.service_mut(service)?.power.transfer(from, to, amount, gap, now)?;
        debug!(%service, %from, %to, amount, "power transferred");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Owner fee collection
    // ------------------------------------------------------------------

    /// Pay accumulated service fees out to the owner.
    pub fn collect_service_fee(&self, caller: AccountId) -> Result<Amount, StationError> {
        let mut state = self.state.write();
        if caller != state.config.owner {
            return Err(StationError::NotStationOwner);
        }
        let base = state.config.base_asset;
        let owner = state.config.owner;
        let amount = state.service_fee_collected;
        if amount == 0 {
            return Ok(0);
        }
        state.assets.transfer(base, VAULT_ACCOUNT, owner, amount)?;
        state.service_fee_collected = 0;
        info!(amount, "service fees collected");
        Ok(amount)
    }

    // ------------------------------------------------------------------
    // Snapshots
    // ------------------------------------------------------------------

    /// Serialize the full durable state.
    pub fn snapshot(&self) -> Result<Vec<u8>, StationError> {
        let state = self.state.read();
        bincode::encode_to_vec(&*state, bincode::config::standard())
            .map_err(|e| StationError::Snapshot(e.to_string()))
    }

    /// Rebuild a station from a snapshot, supplying the converter anew
    /// (converters are external collaborators, not state).
    pub fn restore(bytes: &[u8], converter: Arc<dyn Converter>) -> Result<Self, StationError> {
        let (state, _): (StationState, usize) =
            bincode::decode_from_slice(bytes, bincode::config::standard())
                .map_err(|e| StationError::Snapshot(e.to_string()))?;
        Ok(Self { state: RwLock::new(state), converter })
    }
}

impl StationState {
    fn ensure_live(&self) -> Result<(), StationError> {
        if self.shutdown {
            return Err(StationError::Shutdown);
        }
        Ok(())
    }

    fn service(&self, id: ServiceId) -> Result<&Service, StationError> {
        self.services.get(&id).ok_or(StationError::UnknownService(id.0))
    }

    fn service_mut(&mut self, id: ServiceId) -> Result<&mut Service, StationError> {
        self.services.get_mut(&id).ok_or(StationError::UnknownService(id.0))
    }

    fn position(&self, id: StakeId) -> Result<StakePosition, StationError> {
        self.stakes.get(&id).copied().ok_or(StationError::UnknownStake(id.0))
    }

    fn agreement(&self, id: RentalId) -> Result<RentalAgreement, StationError> {
        self.rentals.get(&id).copied().ok_or(StationError::UnknownRental(id.0))
    }

    /// Quote a rental from the current state snapshot. `used_override`
    /// substitutes the committed reserve (used by extensions to exclude
    /// their own amount).
    fn quote(
        &self,
        converter: &dyn Converter,
        service: ServiceId,
        payment_asset: AssetId,
        amount: Amount,
        duration: Seconds,
        used_override: Option<Amount>,
        now: Timestamp,
    ) -> Result<RentalQuote, StationError> {
        let svc = self.service(service)?;
        let cfg = &svc.config;
        if duration < cfg.min_rental_period || duration > cfg.max_rental_period {
            return Err(StationError::InvalidRentalPeriod {
                period: duration,
                min: cfg.min_rental_period,
                max: cfg.max_rental_period,
            });
        }
        let half_life = self.config.streaming_halving_period;
        let total_reserve = self.reserve.reserve_at(half_life, now)?;
        let used = used_override.unwrap_or(self.reserve.used);

        let fee_in_pricing = cfg.curve.build().quote(
            cfg.base_rate_q64,
            total_reserve,
            used,
            amount,
            duration,
        )?;
        let service_in_pricing = fee_in_pricing * cfg.service_fee_bps / BPS_PRECISION;
        let pool_in_pricing = fee_in_pricing - service_in_pricing;

        let base = self.config.base_asset;
        let fee_in_payment =
            converter.estimate_convert(cfg.pricing_asset, fee_in_pricing, payment_asset)?;
        let pool_in_base = converter.estimate_convert(cfg.pricing_asset, pool_in_pricing, base)?;
        let service_in_base =
            converter.estimate_convert(cfg.pricing_asset, service_in_pricing, base)?;

        let gc_floor = converter.estimate_convert(cfg.pricing_asset, cfg.min_gc_fee, payment_asset)?;
        let gc_deposit = (fee_in_payment * self.config.gc_fee_bps / BPS_PRECISION).max(gc_floor);

        Ok(RentalQuote {
            total: fee_in_payment + gc_deposit,
            fee_in_payment,
            gc_deposit,
            pool_in_base,
            service_in_base,
        })
    }

    /// Book a charged rental fee: convert the vault's payment-asset fee
    /// into base, stream the pool share, accrue the owner share. The GC
    /// deposit stays in the payment asset, earmarked for the returner.
    fn settle_payment(
        &mut self,
        payment_asset: AssetId,
        quote: &RentalQuote,
        now: Timestamp,
    ) -> Result<(), StationError> {
        let base = self.config.base_asset;
        if payment_asset != base || quote.fee_in_payment != quote.pool_in_base + quote.service_in_base {
            // The converter swapped the fee into base inside the vault.
            self.assets.burn(payment_asset, VAULT_ACCOUNT, quote.fee_in_payment)?;
            self.assets
                .mint(base, VAULT_ACCOUNT, quote.pool_in_base + quote.service_in_base);
        }
        self.reserve
            .record_payment(quote.pool_in_base, self.config.streaming_halving_period, now)?;
        self.service_fee_collected += quote.service_in_base;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CurveKind;
    use crate::converter::IdentityConverter;
    use farad_core::constants::ONE_TOKEN;
    use farad_pricing::base_rate_q64;

    const ONE_DAY: u64 = 86_400;

    fn base() -> AssetId {
        AssetId::from_seed(1)
    }

    fn owner() -> AccountId {
        AccountId::from_seed(0xAA)
    }

    fn staker() -> AccountId {
        AccountId::from_seed(1)
    }

    fn renter() -> AccountId {
        AccountId::from_seed(2)
    }

    fn test_station() -> Station {
        let config = StationConfig {
            name: "test".to_string(),
            base_asset: base(),
            owner: owner(),
            ..StationConfig::default()
        };
        Station::new(config, Arc::new(IdentityConverter)).unwrap()
    }

    fn test_service(station: &Station) -> ServiceId {
        station
            .register_service(ServiceConfig {
                base_rate_q64: base_rate_q64(3 * ONE_TOKEN, 100 * ONE_TOKEN, ONE_DAY).unwrap(),
                pricing_asset: base(),
                ..ServiceConfig::default()
            })
            .unwrap()
    }

    #[test]
    fn empty_name_rejected() {
        let config = StationConfig { name: String::new(), ..StationConfig::default() };
        let err = Station::new(config, Arc::new(IdentityConverter)).unwrap_err();
        assert!(matches!(err, StationError::EmptyName));
    }

    #[test]
    fn lone_staker_round_trips_exactly() {
        let station = test_station();
        station.mint(base(), staker(), 12_345 * ONE_TOKEN);
        let id = station.stake(staker(), 12_345 * ONE_TOKEN, 100).unwrap();
        assert_eq!(station.balance_of(base(), staker()), 0);

        let payout = station.unstake(staker(), id, 200).unwrap();
        assert_eq!(payout, 12_345 * ONE_TOKEN);
        assert_eq!(station.balance_of(base(), staker()), 12_345 * ONE_TOKEN);
        assert_eq!(station.get_reserve(200).unwrap(), 0);
    }

    #[test]
    fn zero_stake_rejected() {
        let station = test_station();
        assert!(matches!(
            station.stake(staker(), 0, 0),
            Err(StationError::ZeroAmount)
        ));
    }

    #[test]
    fn stake_requires_funds() {
        let station = test_station();
        let err = station.stake(staker(), ONE_TOKEN, 0).unwrap_err();
        assert!(matches!(err, StationError::InsufficientBalance { .. }));
    }

    #[test]
    fn rent_charges_exactly_the_estimate() {
        let station = test_station();
        let svc = test_service(&station);
        station.mint(base(), staker(), 1000 * ONE_TOKEN);
        station.mint(base(), renter(), 5 * ONE_TOKEN);
        station.stake(staker(), 1000 * ONE_TOKEN, 0).unwrap();

        let quoted = station
            .estimate_rental_fee(svc, base(), 100 * ONE_TOKEN, ONE_DAY, 10)
            .unwrap();

        // A bound one unit below the quote trips slippage protection.
        let err = station
            .rent(renter(), svc, base(), 100 * ONE_TOKEN, ONE_DAY, quoted - 1, 10)
            .unwrap_err();
        assert_eq!(
            err,
            StationError::SlippageExceeded { quoted, max_payment: quoted - 1 }
        );
        assert_eq!(station.balance_of(base(), renter()), 5 * ONE_TOKEN);

        // At the bound, the rent succeeds and charges exactly the quote.
        station
            .rent(renter(), svc, base(), 100 * ONE_TOKEN, ONE_DAY, quoted, 10)
            .unwrap();
        assert_eq!(station.balance_of(base(), renter()), 5 * ONE_TOKEN - quoted);
        assert_eq!(station.power_balance_of(svc, renter()).unwrap(), 100 * ONE_TOKEN);
        assert_eq!(station.get_used_reserve(), 100 * ONE_TOKEN);
    }

    #[test]
    fn unstake_blocked_while_reserve_rented() {
        let station = test_station();
        let svc = test_service(&station);
        station.mint(base(), staker(), 1000 * ONE_TOKEN);
        station.mint(base(), renter(), 50 * ONE_TOKEN);
        let stake_id = station.stake(staker(), 1000 * ONE_TOKEN, 0).unwrap();
        let rental_id = station
            .rent(renter(), svc, base(), 500 * ONE_TOKEN, ONE_DAY, 50 * ONE_TOKEN, 10)
            .unwrap();

        let err = station.unstake(staker(), stake_id, 20).unwrap_err();
        assert!(matches!(err, StationError::InsufficientLiquidity { .. }));

        // The renter returns; principal and matured income free up.
        station.return_rental(renter(), rental_id, ONE_DAY).unwrap();
        let payout = station.unstake(staker(), stake_id, ONE_DAY + 1).unwrap();
        assert!(payout > 1000 * ONE_TOKEN, "payout {payout} should include the fee");
    }

    #[test]
    fn decrease_stake_more_than_principal_rejected() {
        let station = test_station();
        station.mint(base(), staker(), 100 * ONE_TOKEN);
        let id = station.stake(staker(), 100 * ONE_TOKEN, 0).unwrap();
        let err = station
            .decrease_stake(staker(), id, 101 * ONE_TOKEN, 1)
            .unwrap_err();
        assert!(matches!(err, StationError::InsufficientBalance { .. }));
    }

    #[test]
    fn only_owner_operates_positions() {
        let station = test_station();
        station.mint(base(), staker(), 100 * ONE_TOKEN);
        let id = station.stake(staker(), 100 * ONE_TOKEN, 0).unwrap();
        assert!(matches!(
            station.unstake(renter(), id, 1),
            Err(StationError::NotPositionOwner)
        ));
        assert!(matches!(
            station.decrease_stake(renter(), id, ONE_TOKEN, 1),
            Err(StationError::NotPositionOwner)
        ));
        assert!(matches!(
            station.claim_staking_reward(renter(), id, 1),
            Err(StationError::NotPositionOwner)
        ));
    }

    #[test]
    fn unknown_ids_are_reported() {
        let station = test_station();
        assert!(matches!(
            station.get_stake(StakeId(9)),
            Err(StationError::UnknownStake(9))
        ));
        assert!(matches!(
            station.get_rental_agreement(RentalId(3)),
            Err(StationError::UnknownRental(3))
        ));
        assert!(matches!(
            station.get_service_config(ServiceId(2)),
            Err(StationError::UnknownService(2))
        ));
    }

    #[test]
    fn rental_period_limits_enforced() {
        let station = test_station();
        let svc = station
            .register_service(ServiceConfig {
                base_rate_q64: base_rate_q64(3 * ONE_TOKEN, 100 * ONE_TOKEN, ONE_DAY).unwrap(),
                pricing_asset: base(),
                min_rental_period: 12 * 3600,
                max_rental_period: 60 * ONE_DAY,
                ..ServiceConfig::default()
            })
            .unwrap();
        station.mint(base(), staker(), 1000 * ONE_TOKEN);
        station.mint(base(), renter(), 50 * ONE_TOKEN);
        station.stake(staker(), 1000 * ONE_TOKEN, 0).unwrap();

        let err = station
            .rent(renter(), svc, base(), ONE_TOKEN, 3600, 50 * ONE_TOKEN, 10)
            .unwrap_err();
        assert!(matches!(err, StationError::InvalidRentalPeriod { .. }));
        let err = station
            .rent(renter(), svc, base(), ONE_TOKEN, 61 * ONE_DAY, 50 * ONE_TOKEN, 10)
            .unwrap_err();
        assert!(matches!(err, StationError::InvalidRentalPeriod { .. }));
    }

    #[test]
    fn service_fee_accrues_to_owner() {
        let station = test_station();
        let svc = station
            .register_service(ServiceConfig {
                base_rate_q64: base_rate_q64(3 * ONE_TOKEN, 100 * ONE_TOKEN, ONE_DAY).unwrap(),
                pricing_asset: base(),
                service_fee_bps: 300,
                ..ServiceConfig::default()
            })
            .unwrap();
        station.mint(base(), staker(), 1000 * ONE_TOKEN);
        station.mint(base(), renter(), 50 * ONE_TOKEN);
        station.stake(staker(), 1000 * ONE_TOKEN, 0).unwrap();
        station
            .rent(renter(), svc, base(), 100 * ONE_TOKEN, ONE_DAY, 50 * ONE_TOKEN, 10)
            .unwrap();

        let collected = station.get_service_fee_collected();
        assert!(collected > 0);
        assert!(matches!(
            station.collect_service_fee(staker()),
            Err(StationError::NotStationOwner)
        ));
        let paid = station.collect_service_fee(owner()).unwrap();
        assert_eq!(paid, collected);
        assert_eq!(station.balance_of(base(), owner()), collected);
        assert_eq!(station.get_service_fee_collected(), 0);
    }

    #[test]
    fn snapshot_round_trips_state() {
        let station = test_station();
        let svc = test_service(&station);
        station.mint(base(), staker(), 1000 * ONE_TOKEN);
        station.mint(base(), renter(), 50 * ONE_TOKEN);
        let stake_id = station.stake(staker(), 1000 * ONE_TOKEN, 0).unwrap();
        let rental_id = station
            .rent(renter(), svc, base(), 100 * ONE_TOKEN, ONE_DAY, 50 * ONE_TOKEN, 10)
            .unwrap();

        let bytes = station.snapshot().unwrap();
        let restored = Station::restore(&bytes, Arc::new(IdentityConverter)).unwrap();

        assert_eq!(
            restored.get_reserve(ONE_DAY).unwrap(),
            station.get_reserve(ONE_DAY).unwrap()
        );
        assert_eq!(restored.get_used_reserve(), 100 * ONE_TOKEN);
        assert_eq!(
            restored.get_stake(stake_id).unwrap(),
            station.get_stake(stake_id).unwrap()
        );
        // The restored station keeps operating where the old one left off.
        restored.return_rental(renter(), rental_id, ONE_DAY).unwrap();
        assert_eq!(restored.get_used_reserve(), 0);
    }

    #[test]
    fn log_curve_service_quotes() {
        let station = test_station();
        let svc = station
            .register_service(ServiceConfig {
                base_rate_q64: base_rate_q64(3 * ONE_TOKEN, 100 * ONE_TOKEN, ONE_DAY).unwrap(),
                pricing_asset: base(),
                curve: CurveKind::logarithmic(),
                ..ServiceConfig::default()
            })
            .unwrap();
        station.mint(base(), staker(), 1000 * ONE_TOKEN);
        station.stake(staker(), 1000 * ONE_TOKEN, 0).unwrap();
        let fee = station
            .estimate_rental_fee(svc, base(), 100 * ONE_TOKEN, ONE_DAY, 10)
            .unwrap();
        assert!(fee > 0);
    }
}
