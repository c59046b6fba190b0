//! Shares-based reserve accounting with streamed rental income.
//!
//! The effective reserve at `t` is `fixed + streaming(t)`, where the
//! streaming part rises toward its target with a halving gap:
//!
//! ```text
//! streaming(t) = target - (target - streamed) * 2^(-(t - updated)/H)
//! ```
//!
//! Each rental payment first collapses the current streaming value into
//! the anchor, then raises the target; overlapping payments telescope
//! into this single anchor. A staker arriving right before a payment
//! lands earns only the still-streaming tail, which defeats
//! deposit-front-running.

use farad_core::error::{MathError, StationError};
use farad_core::types::{Amount, Seconds, Timestamp};
use farad_math::{approach, mul_div};
use serde::{Deserialize, Serialize};

#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq,
    bincode::Encode, bincode::Decode,
)]
pub struct ReserveState {
    /// Matured reserve: principal plus streamed-in income.
    pub fixed: Amount,
    /// Reserve committed to active rentals.
    pub used: Amount,
    /// Outstanding pool shares.
    pub total_shares: Amount,
    /// Streaming value at `updated`.
    streamed: Amount,
    /// Total queued income the streaming part converges to.
    target: Amount,
    /// Anchor time of `streamed`.
    updated: Timestamp,
}

impl ReserveState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Matured streaming income at `t`.
    pub fn streaming_at(&self, half_life: Seconds, t: Timestamp) -> Result<Amount, MathError> {
        approach(self.target, self.streamed, self.updated, half_life, t)
    }

    /// Effective reserve at `t`: fixed part plus matured streaming income.
    pub fn reserve_at(&self, half_life: Seconds, t: Timestamp) -> Result<Amount, MathError> {
        Ok(self.fixed + self.streaming_at(half_life, t)?)
    }

    /// Reserve not committed to rentals at `t`.
    pub fn available_at(&self, half_life: Seconds, t: Timestamp) -> Result<Amount, MathError> {
        Ok(self.reserve_at(half_life, t)?.saturating_sub(self.used))
    }

    /// Queue a rental payment into the streaming reserve.
    pub fn record_payment(
        &mut self,
        fee: Amount,
        half_life: Seconds,
        now: Timestamp,
    ) -> Result<(), MathError> {
        self.collapse(half_life, now)?;
        self.target = self
            .target
            .checked_add(fee)
            .ok_or(MathError::ArithmeticOverflow)?;
        Ok(())
    }

    /// Fold matured streaming income into the fixed reserve and re-anchor
    /// the remaining tail. The future streaming curve is unchanged.
    pub fn flush(&mut self, half_life: Seconds, now: Timestamp) -> Result<(), MathError> {
        let matured = self.streaming_at(half_life, now)?;
        self.fixed += matured;
        self.target -= matured;
        self.streamed = 0;
        self.updated = now;
        Ok(())
    }

    /// Re-anchor the streaming value at `now` without maturing anything.
    fn collapse(&mut self, half_life: Seconds, now: Timestamp) -> Result<(), MathError> {
        self.streamed = self.streaming_at(half_life, now)?;
        self.updated = now;
        Ok(())
    }

    /// Shares minted for staking `amount` at `t`.
    pub fn shares_for_stake(
        &self,
        amount: Amount,
        half_life: Seconds,
        t: Timestamp,
    ) -> Result<Amount, MathError> {
        if self.total_shares == 0 {
            return Ok(amount);
        }
        mul_div(amount, self.total_shares, self.reserve_at(half_life, t)?)
    }

    /// Shares redeemed when withdrawing `amount` at `t`.
    pub fn shares_for_withdraw(
        &self,
        amount: Amount,
        half_life: Seconds,
        t: Timestamp,
    ) -> Result<Amount, MathError> {
        mul_div(amount, self.total_shares, self.reserve_at(half_life, t)?)
    }

    /// Redeemable value of `shares` at `t`.
    pub fn value_of_shares(
        &self,
        shares: Amount,
        half_life: Seconds,
        t: Timestamp,
    ) -> Result<Amount, MathError> {
        if self.total_shares == 0 {
            return Ok(0);
        }
        mul_div(shares, self.reserve_at(half_life, t)?, self.total_shares)
    }

    /// Take `amount` out of the matured reserve, failing with
    /// `InsufficientLiquidity` when rentals have the rest committed.
    /// `enforce_liquidity` is lifted during wind-down.
    pub fn withdraw(
        &mut self,
        amount: Amount,
        half_life: Seconds,
        now: Timestamp,
        enforce_liquidity: bool,
    ) -> Result<(), StationError> {
        let available = self.available_at(half_life, now)?;
        if enforce_liquidity && available < amount {
            return Err(StationError::InsufficientLiquidity {
                requested: amount,
                available,
            });
        }
        self.flush(half_life, now)?;
        if self.fixed < amount {
            return Err(StationError::InsufficientLiquidity {
                requested: amount,
                available: self.fixed,
            });
        }
        self.fixed -= amount;
        Ok(())
    }

    /// Drain everything, matured or not. Used when the last shares are
    /// burned so that zero shares always means zero reserve.
    pub fn drain_remaining(&mut self, now: Timestamp) -> Amount {
        let rest = self.fixed + self.target;
        self.fixed = 0;
        self.target = 0;
        self.streamed = 0;
        self.updated = now;
        rest
    }
}
