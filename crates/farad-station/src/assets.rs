//! Minimal per-asset balance ledger.
//!
//! The engine is specified against an external token layer; this in-memory
//! ledger internalizes just enough of it (balances, mint, burn, transfer)
//! to make every monetary flow observable in tests. `BTreeMap`s keep
//! iteration and snapshots deterministic.

use std::collections::BTreeMap;

use farad_core::error::StationError;
use farad_core::types::{AccountId, Amount, AssetId};
use serde::{Deserialize, Serialize};

#[derive(
    Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq, bincode::Encode, bincode::Decode,
)]
pub struct AssetLedger {
    balances: BTreeMap<AssetId, BTreeMap<AccountId, Amount>>,
}

impl AssetLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn balance_of(&self, asset: AssetId, account: AccountId) -> Amount {
        self.balances
            .get(&asset)
            .and_then(|per_account| per_account.get(&account))
            .copied()
            .unwrap_or(0)
    }

    pub fn mint(&mut self, asset: AssetId, account: AccountId, amount: Amount) {
        if amount == 0 {
            return;
        }
        *self
            .balances
            .entry(asset)
            .or_default()
            .entry(account)
            .or_insert(0) += amount;
    }

    pub fn burn(
        &mut self,
        asset: AssetId,
        account: AccountId,
        amount: Amount,
    ) -> Result<(), StationError> {
        let have = self.balance_of(asset, account);
        if have < amount {
            return Err(StationError::InsufficientBalance { have, need: amount });
        }
        if amount == 0 {
            return Ok(());
        }
        if let Some(per_account) = self.balances.get_mut(&asset) {
            if let Some(balance) = per_account.get_mut(&account) {
                *balance -= amount;
                if *balance == 0 {
                    per_account.remove(&account);
                }
            }
        }
        Ok(())
    }

    pub fn transfer(
        &mut self,
        asset: AssetId,
        from: AccountId,
        to: AccountId,
        amount: Amount,
    ) -> Result<(), StationError> {
        self.burn(asset, from, amount)?;
        self.mint(asset, to, amount);
        Ok(())
    }

    /// Total units of an asset across all accounts.
    pub fn total_supply(&self, asset: AssetId) -> Amount {
        self.balances
            .get(&asset)
            .map(|per_account| per_account.values().sum())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset() -> AssetId {
        AssetId::from_seed(1)
    }

    #[test]
    fn mint_and_query() {
        let mut ledger = AssetLedger::new();
        ledger.mint(asset(), AccountId::from_seed(1), 100);
        assert_eq!(ledger.balance_of(asset(), AccountId::from_seed(1)), 100);
        assert_eq!(ledger.balance_of(asset(), AccountId::from_seed(2)), 0);
    }

    #[test]
    fn transfer_moves_balance() {
        let mut ledger = AssetLedger::new();
        let (a, b) = (AccountId::from_seed(1), AccountId::from_seed(2));
        ledger.mint(asset(), a, 100);
        ledger.transfer(asset(), a, b, 60).unwrap();
        assert_eq!(ledger.balance_of(asset(), a), 40);
        assert_eq!(ledger.balance_of(asset(), b), 60);
    }

    #[test]
    fn transfer_more_than_balance_fails() {
        let mut ledger = AssetLedger::new();
        let (a, b) = (AccountId::from_seed(1), AccountId::from_seed(2));
        ledger.mint(asset(), a, 10);
        let err = ledger.transfer(asset(), a, b, 11).unwrap_err();
        assert_eq!(err, StationError::InsufficientBalance { have: 10, need: 11 });
        // Nothing moved.
        assert_eq!(ledger.balance_of(asset(), a), 10);
        assert_eq!(ledger.balance_of(asset(), b), 0);
    }

    #[test]
    fn burn_to_zero_removes_entry() {
        let mut ledger = AssetLedger::new();
        let a = AccountId::from_seed(1);
        ledger.mint(asset(), a, 10);
        ledger.burn(asset(), a, 10).unwrap();
        assert_eq!(ledger.balance_of(asset(), a), 0);
        assert_eq!(ledger.total_supply(asset()), 0);
    }

    #[test]
    fn supply_tracks_mints_and_burns() {
        let mut ledger = AssetLedger::new();
        ledger.mint(asset(), AccountId::from_seed(1), 70);
        ledger.mint(asset(), AccountId::from_seed(2), 30);
        assert_eq!(ledger.total_supply(asset()), 100);
        ledger.burn(asset(), AccountId::from_seed(2), 30).unwrap();
        assert_eq!(ledger.total_supply(asset()), 70);
    }

    #[test]
    fn assets_are_independent() {
        let mut ledger = AssetLedger::new();
        let a = AccountId::from_seed(1);
        ledger.mint(AssetId::from_seed(1), a, 5);
        ledger.mint(AssetId::from_seed(2), a, 7);
        assert_eq!(ledger.balance_of(AssetId::from_seed(1), a), 5);
        assert_eq!(ledger.balance_of(AssetId::from_seed(2), a), 7);
    }
}
