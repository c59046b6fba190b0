//! # farad-pricing — utilization-based rental tariffs.
//!
//! A tariff prices renting `amount` tokens for `duration` seconds as a
//! function of how much of the reserve is already committed. Both shipped
//! curves share one construction: a per-unit price multiplier `f(u)` of the
//! unused fraction `u`, an antiderivative-like `h(x) = x * f((R - x)/R)`,
//! and the two-sided difference
//!
//! ```text
//! quote = (h(used + amount) - h(used)) * base_rate * duration
//! ```
//!
//! Evaluating `h` at the true intermediate utilization is what makes
//! pricing additive: renting 300k then 200k out of a 1M reserve costs the
//! same as renting 500k at once, up to rounding.
//!
//! Curves:
//! - [`RationalTariff`] — `f(u) = (1-pole)*slope/(u-pole) + (1-slope)`,
//!   diverging at the pole (hard capacity cap near full utilization).
//! - [`LogTariff`] — `f(u) = 1 + lambda*(-log2 u)`, the earlier protocol
//!   revision's curve; soft cap, diverging only as `u -> 0`.
//!
//! All arithmetic is Q64.64 integer fixed point; the floating-point
//! reference implementations exist in test code only.

pub mod logarithmic;
pub mod rate;
pub mod rational;

pub use logarithmic::LogTariff;
pub use rate::base_rate_q64;
pub use rational::RationalTariff;
