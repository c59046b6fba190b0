//! Power-token ledger with per-holder energy accounting.
//!
//! Every holder carries an energy anchor `(energy, timestamp)`. Energy
//! converges toward the holder's current balance: the gap between the two
//! halves every `energy_gap_halving_period`, from below after a mint or
//! transfer-in (fresh tokens start cold) and from above after a burn or
//! transfer-out. The anchor resets on every balance-changing event, which
//! is exactly the `on_transfer` hook the surrounding token layer must
//! call.
//!
//! Rented tokens are tracked as `locked` balance: they move only together
//! with their rental agreement, never through a plain transfer. Plain
//! transfers are additionally disabled service-wide until the one-way
//! [`PowerLedger::enable_transfer_forever`] switch is flipped, and gated
//! by the holder's energized, unlocked balance.

use std::collections::BTreeMap;

use farad_core::error::{MathError, StationError};
use farad_core::types::{AccountId, Amount, Seconds, Timestamp};
use farad_math::value_at;
use serde::{Deserialize, Serialize};

/// One holder's balance and energy anchor.
#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq,
    bincode::Encode, bincode::Decode,
)]
pub struct PowerAccount {
    /// Total power tokens held (swapped-in plus rented).
    pub balance: Amount,
    /// Portion delivered through active rentals.
    pub locked: Amount,
    /// Energy at `timestamp`.
    pub energy: Amount,
    /// Anchor time of `energy`.
    pub timestamp: Timestamp,
}

impl PowerAccount {
    /// Energy at `t`, unclamped: converges toward `balance` from either
    /// side as the gap halves.
    fn energy_unclamped(
        &self,
        gap_halving_period: Seconds,
        t: Timestamp,
    ) -> Result<Amount, MathError> {
        if self.balance >= self.energy {
            let gap = self.balance - self.energy;
            Ok(self.balance - value_at(gap, self.timestamp, gap_halving_period, t)?)
        } else {
            let gap = self.energy - self.balance;
            Ok(self.balance + value_at(gap, self.timestamp, gap_halving_period, t)?)
        }
    }
}

/// Per-service power-token ledger.
#[derive(
    Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq,
    bincode::Encode, bincode::Decode,
)]
pub struct PowerLedger {
    accounts: BTreeMap<AccountId, PowerAccount>,
    transfers_enabled: bool,
}

impl PowerLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn balance_of(&self, who: AccountId) -> Amount {
        self.accounts.get(&who).map(|a| a.balance).unwrap_or(0)
    }

    pub fn locked_of(&self, who: AccountId) -> Amount {
        self.accounts.get(&who).map(|a| a.locked).unwrap_or(0)
    }

    pub fn transfers_enabled(&self) -> bool {
        self.transfers_enabled
    }

    /// One-way switch: once transfers are enabled they stay enabled.
    pub fn enable_transfer_forever(&mut self) {
        self.transfers_enabled = true;
    }

    /// Energy of `who` at `t`, clamped to the nominal balance: a transfer
    /// of unenergized tokens never raises the recipient's energy above
    /// what they hold.
    pub fn energy_at(
        &self,
        who: AccountId,
        gap_halving_period: Seconds,
        t: Timestamp,
    ) -> Result<Amount, MathError> {
        match self.accounts.get(&who) {
            None => Ok(0),
            Some(account) => {
                let energy = account.energy_unclamped(gap_halving_period, t)?;
                Ok(energy.min(account.balance))
            }
        }
    }

    /// How much `who` may move through a plain transfer at `t`: the
    /// energized share of the unlocked balance.
    pub fn available_for_transfer(
        &self,
        who: AccountId,
        gap_halving_period: Seconds,
        t: Timestamp,
    ) -> Result<Amount, MathError> {
        let unlocked = self.balance_of(who) - self.locked_of(who);
        Ok(unlocked.min(self.energy_at(who, gap_halving_period, t)?))
    }

    /// Re-anchor `who`'s energy at `t` before a balance change.
    fn touch(
        &mut self,
        who: AccountId,
        gap_halving_period: Seconds,
        t: Timestamp,
    ) -> Result<&mut PowerAccount, MathError> {
        let account = self.accounts.entry(who).or_default();
        if account.balance > 0 || account.energy > 0 {
            account.energy = account.energy_unclamped(gap_halving_period, t)?;
        }
        account.timestamp = t;
        Ok(account)
    }

    /// Mint power tokens to `who`; `locked` marks rental deliveries.
    pub fn mint(
        &mut self,
        who: AccountId,
        amount: Amount,
        locked: bool,
        gap_halving_period: Seconds,
        now: Timestamp,
    ) -> Result<(), MathError> {
        let account = self.touch(who, gap_halving_period, now)?;
        account.balance += amount;
        if locked {
            account.locked += amount;
        }
        Ok(())
    }

    /// Burn power tokens from `who`; `locked` marks rental returns.
    pub fn burn(
        &mut self,
        who: AccountId,
        amount: Amount,
        locked: bool,
        gap_halving_period: Seconds,
        now: Timestamp,
    ) -> Result<(), StationError> {
        let have = if locked { self.locked_of(who) } else { self.balance_of(who) - self.locked_of(who) };
        if have < amount {
            return Err(StationError::InsufficientBalance { have, need: amount });
        }
        let account = self.touch(who, gap_halving_period, now)?;
        account.balance -= amount;
        if locked {
            account.locked -= amount;
        }
        if account.balance == 0 {
            // The account's history ends with its last token.
            self.accounts.remove(&who);
        }
        Ok(())
    }

    /// Plain transfer of unlocked, energized balance.
    pub fn transfer(
        &mut self,
        from: AccountId,
        to: AccountId,
        amount: Amount,
        gap_halving_period: Seconds,
        now: Timestamp,
    ) -> Result<(), StationError> {
        if !self.transfers_enabled {
            return Err(StationError::TransferDisabled);
        }
        let available = self.available_for_transfer(from, gap_halving_period, now)?;
        if available < amount {
            return Err(StationError::InsufficientAvailableBalance {
                available,
                need: amount,
            });
        }
        let sender = self.touch(from, gap_halving_period, now)?;
        sender.balance -= amount;
        if sender.balance == 0 {
            self.accounts.remove(&from);
        }
        let receiver = self.touch(to, gap_halving_period, now)?;
        receiver.balance += amount;
        Ok(())
    }

    /// Move a rental's locked tokens to a new holder together with its
    /// agreement. Both anchors reset; the tokens stay locked.
    pub fn transfer_locked(
        &mut self,
        from: AccountId,
        to: AccountId,
        amount: Amount,
        gap_halving_period: Seconds,
        now: Timestamp,
    ) -> Result<(), StationError> {
        let locked = self.locked_of(from);
        if locked < amount {
            return Err(StationError::InsufficientBalance { have: locked, need: amount });
        }
        let sender = self.touch(from, gap_halving_period, now)?;
        sender.balance -= amount;
        sender.locked -= amount;
        if sender.balance == 0 {
            self.accounts.remove(&from);
        }
        let receiver = self.touch(to, gap_halving_period, now)?;
        receiver.balance += amount;
        receiver.locked += amount;
        Ok(())
    }
}
