//! Core engine types: accounts, assets, position identifiers.
//!
//! All monetary values are raw token units in `u128` (tests use an
//! 18-decimals base unit). Rates and curve factors are Q64.64 fixed point.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Raw token amount. 1 whole token = 10^decimals units; the engine never
/// interprets decimals, it only adds, subtracts and scales.
pub type Amount = u128;

/// Unix timestamp in seconds.
pub type Timestamp = u64;

/// Duration in seconds.
pub type Seconds = u64;

/// A 20-byte account identifier.
#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default,
    bincode::Encode, bincode::Decode,
)]
pub struct AccountId(pub [u8; 20]);

impl AccountId {
    /// The zero account. Used as the burn/mint counterparty in ledger moves.
    pub const ZERO: Self = Self([0u8; 20]);

    /// Deterministic account from a single seed byte. Test convenience.
    pub fn from_seed(seed: u8) -> Self {
        Self([seed; 20])
    }

    /// Check if this is the zero account.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl From<[u8; 20]> for AccountId {
    fn from(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}

/// A 20-byte asset identifier (base asset, power tokens, payment assets).
#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default,
    bincode::Encode, bincode::Decode,
)]
pub struct AssetId(pub [u8; 20]);

impl AssetId {
    /// Deterministic asset from a single seed byte. Test convenience.
    pub fn from_seed(seed: u8) -> Self {
        Self([seed; 20])
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl From<[u8; 20]> for AssetId {
    fn from(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}

macro_rules! sequential_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord,
            Default, bincode::Encode, bincode::Decode,
        )]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }
    };
}

sequential_id!(
    /// Identifier of a registered power-token service within a station.
    ServiceId
);
sequential_id!(
    /// Identifier of a stake position (the stake-receipt token id).
    StakeId
);
sequential_id!(
    /// Identifier of a rental agreement (the rental-receipt token id).
    RentalId
);
