//! Fixed-point math utilities for deterministic simulation.
//!
//! Damage coefficients, armor penetration and heal fractions are all
//! fractional. Data files store them as integer percentages. Formulas build
//! an exact integer numerator over a denominator of 100 and only then divide
//! in fixed-point, so a coefficient like 1.2 never picks up binary rounding
//! error before the final floor.

use fixed::types::I32F32;

/// Fixed-point number type for all simulation math.
///
/// Uses 32 bits for integer part and 32 bits for fractional part.
pub type Fixed = I32F32;

/// Denominator shared by every percentage in the data files.
pub const PERCENT: i64 = 100;

/// Floor of `numerator / 100` computed in fixed-point.
///
/// Numerators outside the `I32F32` integer range (stats loaded from data
/// files are unbounded `u32`) fall back to exact integer floor division.
#[must_use]
pub fn floor_hundredths(numerator: i64) -> i64 {
    match Fixed::checked_from_num(numerator) {
        Some(value) => (value / Fixed::from_num(PERCENT)).floor().to_num::<i64>(),
        None => numerator.div_euclid(PERCENT),
    }
}

/// Take `pct` percent of `value`, rounded down and saturated to `u32`.
#[must_use]
pub fn percent_of(value: u32, pct: u32) -> u32 {
    let floored = floor_hundredths(i64::from(value) * i64::from(pct)).max(0);
    u32::try_from(floored).unwrap_or(u32::MAX)
}
