//! Decimal arithmetic utilities for order amounts.
//!
//! All amounts submitted to the venue are whole numbers of the smallest
//! tradable unit; fractional units never leave this process.

use rust_decimal::Decimal;

/// Truncate an amount to whole smallest-tradable units.
pub fn floor_units(value: Decimal) -> Decimal {
    value.floor()
}

/// Safe division that returns zero if the divisor is zero.
pub fn safe_div(numerator: Decimal, denominator: Decimal) -> Decimal {
    if denominator == Decimal::ZERO {
        Decimal::ZERO
    } else {
        numerator / denominator
    }
}
