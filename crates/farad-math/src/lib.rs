//! # farad-math — half-life exponential engine.
//!
//! All calculations use integer arithmetic only for determinism.
//!
//! This crate implements the numeric core every monetary outcome depends on:
//! - **Half-life decay**: `value_at` evaluates `v0 * 2^(-(t - t0)/H)` with
//!   an exact right shift for whole half-lives and binary exponentiation
//!   against a precomputed `2^(-1/2^i)` table for the fractional remainder.
//! - **Rising approach**: `approach` is the complement used by the
//!   streaming reserve, converging toward a target instead of zero.
//! - **Fixed-point log2**: `neg_log2` for the logarithmic tariff curve.
//! - **Widened arithmetic**: 128-bit values multiply through a 256-bit
//!   intermediate (`wide`), so token amounts spanning many orders of
//!   magnitude never overflow mid-computation.
//!
//! Chosen representation: Q64.64 for rates and ratios, truncation (round
//! toward zero) after each multiplication. With at most 64 multiplications
//! per evaluation the accumulated error stays below 64 units of the last
//! place, orders of magnitude inside the 1e-9 relative tolerance the
//! engine's tests demand.

pub mod exp;
pub mod log2;
pub mod wide;

pub use exp::{approach, value_at};
pub use log2::neg_log2;
pub use wide::{mul_div, mul_shr_64};
