//! Display-currency conversion and formatting.
//!
//! Prices never leave the canonical currency inside the core. The formatter
//! converts at render time using a static rate table, so the same amount and
//! code always produce the same string.

use std::collections::HashMap;

use crate::money::{Currency, Money, CANONICAL_DECIMALS};
use serde::{Deserialize, Serialize};

/// Where the currency symbol sits relative to the number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolPosition {
    Prefix,
    Suffix,
}

/// Display parameters for one currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrencyInfo {
    /// Symbol rendered next to the amount.
    pub symbol: String,
    /// Units of this currency per one canonical unit.
    pub rate: f64,
    /// Digits after the decimal point (0 for JPY).
    pub fraction_digits: u32,
    pub position: SymbolPosition,
}

impl CurrencyInfo {
    fn prefix(symbol: &str, rate: f64, fraction_digits: u32) -> Self {
        Self {
            symbol: symbol.to_string(),
            rate,
            fraction_digits,
            position: SymbolPosition::Prefix,
        }
    }

    fn suffix(symbol: &str, rate: f64, fraction_digits: u32) -> Self {
        Self {
            symbol: symbol.to_string(),
            rate,
            fraction_digits,
            position: SymbolPosition::Suffix,
        }
    }
}

/// Static rate/symbol table.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrencyTable {
    entries: HashMap<Currency, CurrencyInfo>,
}

impl Default for CurrencyTable {
    fn default() -> Self {
        let entries = HashMap::from([
            (Currency::USD, CurrencyInfo::prefix("$", 1.0, 2)),
            (Currency::EUR, CurrencyInfo::prefix("\u{20ac}", 0.92, 2)),
            (Currency::GBP, CurrencyInfo::prefix("\u{00a3}", 0.79, 2)),
            (Currency::JPY, CurrencyInfo::prefix("\u{00a5}", 150.0, 0)),
            (Currency::CAD, CurrencyInfo::prefix("CA$", 1.36, 2)),
            (Currency::AUD, CurrencyInfo::prefix("A$", 1.52, 2)),
            (Currency::CHF, CurrencyInfo::suffix(" CHF", 0.88, 2)),
            (Currency::CNY, CurrencyInfo::prefix("CN\u{00a5}", 7.2, 2)),
            (Currency::INR, CurrencyInfo::prefix("\u{20b9}", 83.0, 2)),
            (Currency::MXN, CurrencyInfo::prefix("MX$", 17.0, 2)),
        ]);
        Self { entries }
    }
}

impl CurrencyTable {
    /// Override the conversion rate for one currency.
    ///
    /// Non-finite or non-positive rates are ignored.
    pub fn with_rate(mut self, currency: Currency, rate: f64) -> Self {
        if rate.is_finite() && rate > 0.0 {
            if let Some(info) = self.entries.get_mut(&currency) {
                info.rate = rate;
            }
        } else {
            tracing::warn!(currency = %currency, rate, "ignoring invalid conversion rate");
        }
        self
    }

    /// Look up a currency's display parameters.
    pub fn get(&self, currency: Currency) -> Option<&CurrencyInfo> {
        self.entries.get(&currency)
    }

    /// Parameters for `code`, falling back to the canonical currency for
    /// unknown codes.
    fn resolve(&self, code: &str) -> CurrencyInfo {
        Currency::from_code(code)
            .and_then(|c| self.entries.get(&c))
            .or_else(|| self.entries.get(&Currency::CANONICAL))
            .cloned()
            .unwrap_or_else(|| CurrencyInfo::prefix("$", 1.0, CANONICAL_DECIMALS))
    }
}

/// Converts canonical amounts into display strings.
#[derive(Debug, Clone, Default)]
pub struct CurrencyFormatter {
    table: CurrencyTable,
}

impl CurrencyFormatter {
    /// Create a formatter over a custom table.
    pub fn new(table: CurrencyTable) -> Self {
        Self { table }
    }

    /// The table this formatter reads.
    pub fn table(&self) -> &CurrencyTable {
        &self.table
    }

    /// Format a canonical amount in the currency named by `code`.
    ///
    /// Unknown codes render at rate 1 with the canonical symbol. Rounding is
    /// half away from zero at the target currency's precision.
    ///
    /// ```
    /// use storefront_commerce::currency::CurrencyFormatter;
    /// use storefront_commerce::money::Money;
    ///
    /// let fmt = CurrencyFormatter::default();
    /// assert_eq!(fmt.format(Money::from_decimal(1999.5), "USD"), "$1,999.50");
    /// assert_eq!(fmt.format(Money::from_decimal(1999.5), "JPY"), "\u{a5}299,925");
    /// ```
    pub fn format(&self, amount: Money, code: &str) -> String {
        let info = self.table.resolve(code);
        let minor = converted_minor_units(amount, &info);
        render(minor, &info)
    }

    /// Format in a known currency.
    pub fn format_in(&self, amount: Money, currency: Currency) -> String {
        self.format(amount, currency.code())
    }

    /// The converted, rounded numeric value of `amount` in `code`.
    pub fn convert(&self, amount: Money, code: &str) -> f64 {
        let info = self.table.resolve(code);
        let minor = converted_minor_units(amount, &info);
        minor as f64 / 10_i64.pow(info.fraction_digits) as f64
    }
}

/// Convert canonical cents into rounded minor units of the target currency.
fn converted_minor_units(amount: Money, info: &CurrencyInfo) -> i64 {
    let target_scale = 10_f64.powi(info.fraction_digits as i32);
    let canonical_scale = 10_f64.powi(CANONICAL_DECIMALS as i32);
    (amount.cents() as f64 * info.rate * target_scale / canonical_scale).round() as i64
}

fn render(minor: i64, info: &CurrencyInfo) -> String {
    let sign = if minor < 0 { "-" } else { "" };
    let abs = minor.unsigned_abs();
    let scale = 10_u64.pow(info.fraction_digits);
    let whole = group_thousands(abs / scale);
    let number = if info.fraction_digits == 0 {
        whole
    } else {
        format!(
            "{}.{:0width$}",
            whole,
            abs % scale,
            width = info.fraction_digits as usize
        )
    };

    match info.position {
        SymbolPosition::Prefix => format!("{}{}{}", sign, info.symbol, number),
        SymbolPosition::Suffix => format!("{}{}{}", sign, number, info.symbol),
    }
}

/// Insert `,` between groups of three digits.
pub(crate) fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usd_reproduces_amount() {
        let fmt = CurrencyFormatter::default();
        let amount = Money::from_decimal(49.99);
        assert_eq!(fmt.format(amount, "USD"), "$49.99");
        assert!((fmt.convert(amount, "USD") - 49.99).abs() < 1e-9);
        // The canonical value is untouched.
        assert_eq!(amount.cents(), 4999);
    }

    #[test]
    fn test_zero_decimal_currency() {
        let fmt = CurrencyFormatter::default();
        assert_eq!(fmt.format(Money::from_decimal(1999.5), "JPY"), "\u{a5}299,925");
        // 0.01 * 150 = 1.5 rounds away from zero.
        assert_eq!(fmt.format(Money::from_cents(1), "JPY"), "\u{a5}2");
    }

    #[test]
    fn test_unknown_code_falls_back_to_canonical() {
        let fmt = CurrencyFormatter::default();
        assert_eq!(fmt.format(Money::from_cents(1050), "XYZ"), "$10.50");
    }

    #[test]
    fn test_converted_currency() {
        let fmt = CurrencyFormatter::default();
        assert_eq!(fmt.format(Money::from_cents(10000), "EUR"), "\u{20ac}92.00");
        assert_eq!(fmt.format(Money::from_cents(10000), "inr"), "\u{20b9}8,300.00");
    }

    #[test]
    fn test_suffix_symbol() {
        let fmt = CurrencyFormatter::default();
        assert_eq!(fmt.format(Money::from_cents(10000), "CHF"), "88.00 CHF");
    }

    #[test]
    fn test_negative_amount() {
        let fmt = CurrencyFormatter::default();
        assert_eq!(fmt.format(Money::from_cents(-1250), "USD"), "-$12.50");
    }

    #[test]
    fn test_rate_override() {
        let table = CurrencyTable::default()
            .with_rate(Currency::EUR, 0.5)
            .with_rate(Currency::GBP, -1.0);
        let fmt = CurrencyFormatter::new(table);
        assert_eq!(fmt.format(Money::from_cents(1000), "EUR"), "\u{20ac}5.00");
        assert_eq!(fmt.table().get(Currency::GBP).map(|i| i.rate), Some(0.79));
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1000), "1,000");
        assert_eq!(group_thousands(1234567), "1,234,567");
    }
}
