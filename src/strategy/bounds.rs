//! Price-bound evaluation for resting orders.

use rust_decimal::Decimal;

/// Decide whether a resting order must be cancelled because the market has
/// drifted away from its quoted price.
///
/// Returns true iff `current` lies outside
/// `[quoted * (1 - threshold), quoted * (1 + threshold)]`.
pub fn should_cancel(quoted: Decimal, current: Decimal, threshold: Decimal) -> bool {
    let upper = quoted * (Decimal::ONE + threshold);
    let lower = quoted * (Decimal::ONE - threshold);
    current > upper || current < lower
}
