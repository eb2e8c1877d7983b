//! Money helpers for cart and catalog prices.
//!
//! Prices are exact decimals. Floating point never enters a total, so
//! `Σ(unit_price × quantity)` is reproducible on every recomputation.

use serde::{Deserialize, Serialize};
use std::fmt;

pub use rust_decimal::Decimal;

/// Supported currencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Currency {
    #[default]
    USD,
    EUR,
    GBP,
    JPY,
    CAD,
}

impl Currency {
    /// Get the currency code (e.g., "USD").
    pub fn code(&self) -> &'static str {
        match self {
            Currency::USD => "USD",
            Currency::EUR => "EUR",
            Currency::GBP => "GBP",
            Currency::JPY => "JPY",
            Currency::CAD => "CAD",
        }
    }

    /// Parse a currency code string.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.to_uppercase().as_str() {
            "USD" => Some(Currency::USD),
            "EUR" => Some(Currency::EUR),
            "GBP" => Some(Currency::GBP),
            "JPY" => Some(Currency::JPY),
            "CAD" => Some(Currency::CAD),
            _ => None,
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Price of `quantity` units at `unit_price`.
///
/// Saturates instead of panicking on overflow.
pub fn line_total(unit_price: Decimal, quantity: u32) -> Decimal {
    unit_price.saturating_mul(Decimal::from(quantity))
}

/// Sum of `unit_price × quantity` over a set of lines.
pub fn sum_lines<I>(lines: I) -> Decimal
where
    I: IntoIterator<Item = (Decimal, u32)>,
{
    lines
        .into_iter()
        .fold(Decimal::ZERO, |acc, (price, qty)| {
            acc.saturating_add(line_total(price, qty))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_codes() {
        assert_eq!(Currency::USD.code(), "USD");
        assert_eq!(Currency::from_code("eur"), Some(Currency::EUR));
        assert_eq!(Currency::from_code("XXX"), None);
    }

    #[test]
    fn test_line_total_is_exact() {
        // 0.1 * 3 is not 0.3 in binary floating point
        assert_eq!(line_total(Decimal::new(1, 1), 3), Decimal::new(3, 1));
    }

    #[test]
    fn test_sum_lines() {
        let total = sum_lines([(Decimal::new(1000, 2), 2), (Decimal::new(2999, 2), 1)]);
        assert_eq!(total, Decimal::new(4999, 2));
        assert_eq!(sum_lines(std::iter::empty()), Decimal::ZERO);
    }
}
