//! Money arithmetic.
//!
//! Prices are stored as JSON floats. Totals are computed in decimal so that
//! `3 x 0.1` shows as `0.30` in reports instead of `0.30000000000000004`.

use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};

/// Convert a stored price to a decimal. Non-finite input becomes zero.
#[must_use]
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default()
}

/// Convert back for consumers that need a float, such as spreadsheet cells.
#[must_use]
pub fn to_f64(amount: Decimal) -> f64 {
    amount.to_f64().unwrap_or_default()
}

/// Price times quantity, rounded to cents.
#[must_use]
pub fn line_total(price: f64, quantity: u32) -> Decimal {
    (to_decimal(price) * Decimal::from(quantity)).round_dp(2)
}

/// Format an amount for display, e.g. `$19.90`.
#[must_use]
pub fn format_money(amount: Decimal) -> String {
    format!("${:.2}", amount.round_dp(2))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_total_avoids_float_noise() {
        assert_eq!(line_total(0.1, 3), Decimal::new(3, 1));
        assert_eq!(line_total(10.0, 2), Decimal::from(20));
    }

    #[test]
    fn test_format_money() {
        assert_eq!(format_money(line_total(19.9, 1)), "$19.90");
        assert_eq!(format_money(Decimal::ZERO), "$0.00");
    }

    #[test]
    fn test_to_f64() {
        assert!((to_f64(line_total(2.5, 3)) - 7.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_non_finite_price_is_zero() {
        assert_eq!(to_decimal(f64::NAN), Decimal::ZERO);
    }
}
