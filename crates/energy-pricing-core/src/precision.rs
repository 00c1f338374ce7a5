//! Rounding and comparison rules for prices.
//!
//! Prices are carried as `f64`. Every persisted or returned amount is
//! rounded to [`PRICE_DECIMALS`] places, and invariants are compared with
//! [`approx_eq`], which uses an absolute tolerance of [`PRICE_TOLERANCE`]
//! for small values and a relative one above 1.0.

/// Number of decimal places kept on every amount.
pub const PRICE_DECIMALS: i32 = 6;

/// Tolerance used when checking breakdown invariants.
pub const PRICE_TOLERANCE: f64 = 1e-6;

/// Round an amount to [`PRICE_DECIMALS`] places.
#[must_use]
pub fn round_price(value: f64) -> f64 {
    let factor = 10f64.powi(PRICE_DECIMALS);
    let rounded = (value * factor).round() / factor;
    // Normalise -0.0 so that serialized breakdowns are byte-identical.
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

/// Compare two amounts within the price tolerance.
#[must_use]
pub fn approx_eq(a: f64, b: f64) -> bool {
    let scale = a.abs().max(b.abs()).max(1.0);
    (a - b).abs() <= PRICE_TOLERANCE * scale
}
