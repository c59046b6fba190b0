//! Half-life exponential evaluation.
//!
//! `value_at` computes `v0 * 2^(-(t - t0)/H)` without floating point.
//! The elapsed-time ratio splits into an integer part (an exact right
//! shift) and a 64-bit fractional remainder evaluated by binary
//! exponentiation against a precomputed table of `2^(-1/2^i)` constants:
//! one multiplication per set bit of the remainder, at most 64 in total.
//!
//! Whole-half-life evaluations are exact: one half-life halves the value
//! to the unit, `t == t0` returns the reference value unchanged.

use farad_core::error::MathError;
use farad_core::types::{Amount, Timestamp};

/// Precomputed `2^(-1/2^i) * 2^64` for `i = 1..=64`, rounded to nearest.
///
/// Entry 0 is `2^(-1/2)` (one half of a half-life), entry 63 is
/// `2^(-1/2^64)`, indistinguishable from 1.0 at this precision and
/// saturated to `u64::MAX`.
const EXP2_NEG_FRAC: [u64; 64] = [
    13_043_817_825_332_782_212,
    15_511_800_964_685_064_948,
    16_915_738_899_553_466_671,
    17_664_662_643_191_237_676,
    18_051_468_387_014_017_850,
    18_248_035_989_933_441_397,
    18_347_121_020_861_646_924,
    18_396_865_112_328_554_661,
    18_421_787_711_448_657_618,
    18_434_261_669_329_232_140,
    18_440_501_815_349_552_982,
    18_443_622_680_442_407_998,
    18_445_183_311_048_607_332,
    18_445_963_675_871_538_004,
    18_446_353_870_663_572_145,
    18_446_548_971_154_807_802,
    18_446_646_522_174_239_825,
    18_446_695_297_877_410_579,
    18_446_719_685_777_359_791,
    18_446_731_879_739_425_374,
    18_446_737_976_723_480_912,
    18_446_741_025_216_264_368,
    18_446_742_549_462_845_018,
    18_446_743_311_586_182_574,
    18_446_743_692_647_863_159,
    18_446_743_883_178_706_404,
    18_446_743_978_444_128_764,
    18_446_744_026_076_840_128,
    18_446_744_049_893_195_857,
    18_446_744_061_801_373_733,
    18_446_744_067_755_462_673,
    18_446_744_070_732_507_144,
    18_446_744_072_221_029_380,
    18_446_744_072_965_290_498,
    18_446_744_073_337_421_057,
    18_446_744_073_523_486_337,
    18_446_744_073_616_518_976,
    18_446_744_073_663_035_296,
    18_446_744_073_686_293_456,
    18_446_744_073_697_922_536,
    18_446_744_073_703_737_076,
    18_446_744_073_706_644_346,
    18_446_744_073_708_097_981,
    18_446_744_073_708_824_799,
    18_446_744_073_709_188_207,
    18_446_744_073_709_369_912,
    18_446_744_073_709_460_764,
    18_446_744_073_709_506_190,
    18_446_744_073_709_528_903,
    18_446_744_073_709_540_259,
    18_446_744_073_709_545_938,
    18_446_744_073_709_548_777,
    18_446_744_073_709_550_196,
    18_446_744_073_709_550_906,
    18_446_744_073_709_551_261,
    18_446_744_073_709_551_439,
    18_446_744_073_709_551_527,
    18_446_744_073_709_551_572,
    18_446_744_073_709_551_594,
    18_446_744_073_709_551_605,
    18_446_744_073_709_551_610,
    18_446_744_073_709_551_613,
    18_446_744_073_709_551_615,
    18_446_744_073_709_551_615,
];

/// `value * c` where `c` is a Q64 fraction in (0, 1].
///
/// Splitting `value` into 64-bit halves keeps every partial product inside
/// u128; the result never exceeds `value`, so no overflow check is needed.
fn mul_q64_frac(value: u128, c: u64) -> u128 {
    let c = c as u128;
    let hi = (value >> 64) * c;
    let lo = ((value & ((1u128 << 64) - 1)) * c) >> 64;
    hi + lo
}

/// `2^(-frac/2^64) * value`, truncated.
///
/// Binary exponentiation: bit `63 - i` of `frac` (weight `2^-(i+1)`)
/// selects table entry `i`.
fn decay_frac(value: u128, frac: u64) -> u128 {
    let mut acc = value;
    for (i, &c) in EXP2_NEG_FRAC.iter().enumerate() {
        if frac & (1 << (63 - i)) != 0 {
            acc = mul_q64_frac(acc, c);
            if acc == 0 {
                break;
            }
        }
    }
    acc
}

/// Value of an exponentially decaying quantity at time `t`.
///
/// `reference_value` is the value at `reference_time`; the quantity halves
/// every `half_life` seconds. Works on raw token units and on Q64.64
/// values alike; the function only scales.
///
/// # Errors
///
/// - [`MathError::NonPositiveHalfLife`] if `half_life == 0`
/// - [`MathError::TimeBeforeAnchor`] if `t < reference_time`
pub fn value_at(
    reference_value: Amount,
    reference_time: Timestamp,
    half_life: u64,
    t: Timestamp,
) -> Result<Amount, MathError> {
    if half_life == 0 {
        return Err(MathError::NonPositiveHalfLife);
    }
    if t < reference_time {
        return Err(MathError::TimeBeforeAnchor { t, anchor: reference_time });
    }
    if reference_value == 0 {
        return Ok(0);
    }

    let dt = t - reference_time;
    let whole = dt / half_life;
    if whole >= 128 {
        return Ok(0);
    }
    let value = reference_value >> whole;
    if value == 0 {
        return Ok(0);
    }

    let rem = dt % half_life;
    if rem == 0 {
        return Ok(value);
    }
    // 64-bit fraction of a half-life: rem < half_life <= 2^64.
    let frac = (((rem as u128) << 64) / half_life as u128) as u64;
    Ok(decay_frac(value, frac))
}

/// Value of a quantity rising toward `target` with halving gap.
///
/// The complement of [`value_at`]: the distance to `target` halves every
/// `half_life` seconds, starting from `anchored` at `anchor_time`. Used by
/// the streaming reserve (`available(t) = fee * (1 - 2^(-dt/H))` summed
/// into a single anchor) and by energy convergence.
///
/// # Errors
///
/// Same domain errors as [`value_at`], plus
/// [`MathError::ArithmeticOverflow`] if `anchored > target`.
pub fn approach(
    target: Amount,
    anchored: Amount,
    anchor_time: Timestamp,
    half_life: u64,
    t: Timestamp,
) -> Result<Amount, MathError> {
    let gap = target
        .checked_sub(anchored)
        .ok_or(MathError::ArithmeticOverflow)?;
    Ok(target - value_at(gap, anchor_time, half_life, t)?)
}
