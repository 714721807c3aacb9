//! Money helpers built on `rust_decimal`.
//!
//! Amounts are computed as `Decimal`, stored as integer minor units
//! (cents) and rendered as `f64` only at the HTTP boundary.

use rust_decimal::prelude::*;

/// Monetary values carry two decimal places.
pub const DECIMAL_PLACES: u32 = 2;

/// Round half-up (midpoint away from zero) to two decimal places.
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// Convert an amount to integer minor units for storage.
pub fn to_minor_units(value: Decimal) -> i64 {
    (round_money(value) * Decimal::ONE_HUNDRED)
        .to_i64()
        .unwrap_or(i64::MAX)
}

/// Convert stored minor units back into an amount.
pub fn from_minor_units(cents: i64) -> Decimal {
    Decimal::new(cents, DECIMAL_PLACES)
}

/// Parse a client-supplied float into a rounded amount.
///
/// Returns `None` for NaN and infinities.
pub fn from_f64(value: f64) -> Option<Decimal> {
    if !value.is_finite() {
        return None;
    }
    Decimal::from_f64(value).map(round_money)
}

pub fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}
