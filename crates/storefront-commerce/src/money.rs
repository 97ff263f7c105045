//! Money type for representing monetary values.
//!
//! Every amount inside the core is held in the canonical currency (USD) as
//! an integer count of cents. Display currencies only exist at render time,
//! see [`CurrencyFormatter`](crate::currency::CurrencyFormatter).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Sub};

/// Supported display currencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum Currency {
    #[default]
    USD,
    EUR,
    GBP,
    JPY,
    CAD,
    AUD,
    CHF,
    CNY,
    INR,
    MXN,
}

impl Currency {
    /// The unit of account for all stored prices.
    pub const CANONICAL: Currency = Currency::USD;

    /// Every supported currency, in display order.
    pub const ALL: [Currency; 10] = [
        Currency::USD,
        Currency::EUR,
        Currency::GBP,
        Currency::JPY,
        Currency::CAD,
        Currency::AUD,
        Currency::CHF,
        Currency::CNY,
        Currency::INR,
        Currency::MXN,
    ];

    /// Get the currency code (e.g., "USD").
    pub fn code(&self) -> &'static str {
        match self {
            Currency::USD => "USD",
            Currency::EUR => "EUR",
            Currency::GBP => "GBP",
            Currency::JPY => "JPY",
            Currency::CAD => "CAD",
            Currency::AUD => "AUD",
            Currency::CHF => "CHF",
            Currency::CNY => "CNY",
            Currency::INR => "INR",
            Currency::MXN => "MXN",
        }
    }

    /// Parse a currency code string.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_uppercase().as_str() {
            "USD" => Some(Currency::USD),
            "EUR" => Some(Currency::EUR),
            "GBP" => Some(Currency::GBP),
            "JPY" => Some(Currency::JPY),
            "CAD" => Some(Currency::CAD),
            "AUD" => Some(Currency::AUD),
            "CHF" => Some(Currency::CHF),
            "CNY" => Some(Currency::CNY),
            "INR" => Some(Currency::INR),
            "MXN" => Some(Currency::MXN),
            _ => None,
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Number of fractional digits in the canonical currency.
pub const CANONICAL_DECIMALS: u32 = 2;

/// A monetary value in the canonical currency.
///
/// Amounts are stored in cents. This avoids floating-point precision issues
/// in subtotals and discounts; floats only appear when converting for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Money {
    amount_cents: i64,
}

impl Money {
    /// Create a Money value from cents.
    pub const fn from_cents(amount_cents: i64) -> Self {
        Self { amount_cents }
    }

    /// Create a Money value from a decimal amount, rounding to the nearest cent.
    ///
    /// ```
    /// use storefront_commerce::money::Money;
    /// let price = Money::from_decimal(49.99);
    /// assert_eq!(price.cents(), 4999);
    /// ```
    pub fn from_decimal(amount: f64) -> Self {
        let multiplier = 10_i64.pow(CANONICAL_DECIMALS) as f64;
        Self::from_cents((amount * multiplier).round() as i64)
    }

    /// Zero.
    pub const fn zero() -> Self {
        Self::from_cents(0)
    }

    /// Amount in cents.
    pub const fn cents(&self) -> i64 {
        self.amount_cents
    }

    /// Check if this is zero.
    pub fn is_zero(&self) -> bool {
        self.amount_cents == 0
    }

    /// Check if this is negative.
    pub fn is_negative(&self) -> bool {
        self.amount_cents < 0
    }

    /// Convert to a decimal value.
    pub fn to_decimal(&self) -> f64 {
        let divisor = 10_i64.pow(CANONICAL_DECIMALS) as f64;
        self.amount_cents as f64 / divisor
    }

    /// Add, returning `None` on overflow.
    pub fn checked_add(&self, other: Money) -> Option<Money> {
        self.amount_cents.checked_add(other.amount_cents).map(Money::from_cents)
    }

    /// Subtract, returning `None` on overflow.
    pub fn checked_sub(&self, other: Money) -> Option<Money> {
        self.amount_cents.checked_sub(other.amount_cents).map(Money::from_cents)
    }

    /// Multiply by a quantity, returning `None` on overflow.
    pub fn checked_mul(&self, factor: i64) -> Option<Money> {
        self.amount_cents.checked_mul(factor).map(Money::from_cents)
    }

    /// Multiply by a fraction (e.g. 0.1 for ten percent), rounding to the
    /// nearest cent, half away from zero.
    pub fn scale(&self, fraction: f64) -> Money {
        Money::from_cents((self.amount_cents as f64 * fraction).round() as i64)
    }

    /// Clamp into `[min, max]`.
    pub fn clamp_to(&self, min: Money, max: Money) -> Money {
        if *self < min {
            min
        } else if *self > max {
            max
        } else {
            *self
        }
    }

    /// Sum an iterator of Money values, returning `None` on overflow.
    pub fn try_sum(iter: impl IntoIterator<Item = Money>) -> Option<Money> {
        iter.into_iter()
            .try_fold(Money::zero(), |acc, m| acc.checked_add(m))
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, other: Money) -> Money {
        Money::from_cents(self.amount_cents.saturating_add(other.amount_cents))
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, other: Money) -> Money {
        Money::from_cents(self.amount_cents.saturating_sub(other.amount_cents))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

/// Renders in the canonical currency, e.g. `$1,999.50`.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.amount_cents < 0 { "-" } else { "" };
        let abs = self.amount_cents.unsigned_abs();
        let divisor = 10_u64.pow(CANONICAL_DECIMALS);
        write!(
            f,
            "{}${}.{:02}",
            sign,
            crate::currency::group_thousands(abs / divisor),
            abs % divisor
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_from_decimal() {
        assert_eq!(Money::from_decimal(49.99).cents(), 4999);
        assert_eq!(Money::from_decimal(1999.5).cents(), 199950);
        assert_eq!(Money::from_decimal(0.005).cents(), 1);
    }

    #[test]
    fn test_money_to_decimal() {
        let m = Money::from_cents(4999);
        assert!((m.to_decimal() - 49.99).abs() < 0.001);
    }

    #[test]
    fn test_money_display() {
        assert_eq!(Money::from_cents(4999).to_string(), "$49.99");
        assert_eq!(Money::from_cents(199950).to_string(), "$1,999.50");
        assert_eq!(Money::from_cents(-250).to_string(), "-$2.50");
    }

    #[test]
    fn test_money_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(300);
        assert_eq!((a + b).cents(), 1300);
        assert_eq!((a - b).cents(), 700);
        assert_eq!(a.checked_mul(3), Some(Money::from_cents(3000)));
    }

    #[test]
    fn test_money_overflow_is_detected() {
        let big = Money::from_cents(i64::MAX);
        assert_eq!(big.checked_add(Money::from_cents(1)), None);
        assert_eq!(big.checked_mul(2), None);
        assert_eq!(Money::try_sum([big, Money::from_cents(1)]), None);
    }

    #[test]
    fn test_money_scale_rounds() {
        let m = Money::from_cents(30000);
        assert_eq!(m.scale(0.1).cents(), 3000);
        assert_eq!(Money::from_cents(5).scale(0.5).cents(), 3);
    }

    #[test]
    fn test_money_clamp() {
        let lo = Money::zero();
        let hi = Money::from_cents(100);
        assert_eq!(Money::from_cents(150).clamp_to(lo, hi), hi);
        assert_eq!(Money::from_cents(-5).clamp_to(lo, hi), lo);
    }

    #[test]
    fn test_currency_from_code() {
        assert_eq!(Currency::from_code("USD"), Some(Currency::USD));
        assert_eq!(Currency::from_code(" jpy "), Some(Currency::JPY));
        assert_eq!(Currency::from_code("INVALID"), None);
    }
}
