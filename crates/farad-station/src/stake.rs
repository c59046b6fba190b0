//! Stake positions.

use farad_core::types::{AccountId, Amount, Timestamp};
use serde::{Deserialize, Serialize};

/// A staker's position in the reserve pool.
///
/// `shares` is the proportional ownership unit, fixed at mint and redeemed
/// at the then-current reserve-per-share ratio. `amount` tracks the
/// principal: everything a position's shares redeem for above it is
/// claimable staking reward. A position decreased to zero principal can
/// keep nonzero shares (the still-unclaimed reward) until a claim
/// zeroes them.
#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, bincode::Encode, bincode::Decode,
)]
pub struct StakePosition {
    /// Position owner; the only account allowed to decrease or claim.
    pub owner: AccountId,
    /// Principal at the current point in time.
    pub amount: Amount,
    /// Pool shares held by this position.
    pub shares: Amount,
    /// Creation time.
    pub staked_at: Timestamp,
}
