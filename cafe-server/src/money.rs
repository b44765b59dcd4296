//! Money calculation utilities using rust_decimal for precision
//!
//! All arithmetic is done in `Decimal`. Amounts are persisted as integer
//! cents since SQLite has no exact decimal column type.

use rust_decimal::prelude::*;

/// Rounding strategy for monetary values (2 decimal places, half away from zero)
pub const DECIMAL_PLACES: u32 = 2;

/// Maximum allowed price per item (1,000,000)
pub const MAX_PRICE: Decimal = Decimal::from_parts(1_000_000, 0, 0, false, 0);

/// Round to currency precision
#[inline]
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// Convert a currency amount to integer cents, `None` on overflow
pub fn to_cents(value: Decimal) -> Option<i64> {
    (round_money(value) * Decimal::ONE_HUNDRED).to_i64()
}

pub fn from_cents(cents: i64) -> Decimal {
    Decimal::new(cents, DECIMAL_PLACES)
}

/// Parse a decimal rate stored as text ("1.50", "20")
pub fn parse_rate(raw: &str) -> Result<Decimal, rust_decimal::Error> {
    Decimal::from_str(raw.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_half_away_from_zero() {
        assert_eq!(round_money(Decimal::new(1005, 3)), Decimal::new(101, 2));
        assert_eq!(round_money(Decimal::new(1004, 3)), Decimal::new(100, 2));
    }

    #[test]
    fn test_cents_conversion() {
        assert_eq!(to_cents(Decimal::new(2050, 2)), Some(2050));
        assert_eq!(to_cents(Decimal::new(3, 0)), Some(300));
        assert_eq!(from_cents(1999), Decimal::new(1999, 2));
        assert_eq!(from_cents(to_cents(Decimal::new(12345, 3)).unwrap()), Decimal::new(1235, 2));
    }

    #[test]
    fn test_parse_rate() {
        assert_eq!(parse_rate("1.50").unwrap(), Decimal::new(150, 2));
        assert_eq!(parse_rate(" 20 ").unwrap(), Decimal::from(20));
        assert!(parse_rate("abc").is_err());
    }
}
