//! Type-safe price representation using decimal arithmetic.
//!
//! Amounts are kept as [`Decimal`] in the currency's standard unit (reais,
//! dollars) and only rounded when formatted for display.

use core::fmt;
use core::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// A price with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (e.g., reais, not centavos).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// A zero amount in the given currency.
    #[must_use]
    pub const fn zero(currency_code: CurrencyCode) -> Self {
        Self::new(Decimal::ZERO, currency_code)
    }

    /// Format for display using the currency's locale conventions.
    ///
    /// ```
    /// use rust_decimal::Decimal;
    /// use scoder_core::{CurrencyCode, Price};
    ///
    /// let price = Price::new(Decimal::new(123_456, 2), CurrencyCode::BRL);
    /// assert_eq!(price.display(), "R$ 1.234,56");
    ///
    /// let price = Price::new(Decimal::new(123_456, 2), CurrencyCode::USD);
    /// assert_eq!(price.display(), "$1,234.56");
    /// ```
    #[must_use]
    pub fn display(&self) -> String {
        let style = self.currency_code.style();
        let rounded = self
            .amount
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
            "-"
        } else {
            ""
        };
        let fixed = format!("{:.2}", rounded.abs());
        let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

        format!(
            "{sign}{}{}{}{cents}{}",
            style.prefix,
            group_thousands(whole, style.thousands),
            style.decimal,
            style.suffix
        )
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

/// Insert a separator every three digits from the right.
fn group_thousands(digits: &str, separator: char) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(separator);
        }
        out.push(c);
    }
    out
}

/// ISO 4217 currency codes supported for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    BRL,
    USD,
    EUR,
    GBP,
}

struct CurrencyStyle {
    prefix: &'static str,
    suffix: &'static str,
    thousands: char,
    decimal: char,
}

impl CurrencyCode {
    /// The ISO 4217 code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::BRL => "BRL",
            Self::USD => "USD",
            Self::EUR => "EUR",
            Self::GBP => "GBP",
        }
    }

    const fn style(self) -> CurrencyStyle {
        match self {
            Self::BRL => CurrencyStyle {
                prefix: "R$ ",
                suffix: "",
                thousands: '.',
                decimal: ',',
            },
            Self::USD => CurrencyStyle {
                prefix: "$",
                suffix: "",
                thousands: ',',
                decimal: '.',
            },
            Self::EUR => CurrencyStyle {
                prefix: "",
                suffix: " €",
                thousands: '.',
                decimal: ',',
            },
            Self::GBP => CurrencyStyle {
                prefix: "£",
                suffix: "",
                thousands: ',',
                decimal: '.',
            },
        }
    }
}

/// Error returned when parsing an unsupported currency code.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unsupported currency code: {0}")]
pub struct UnknownCurrency(pub String);

impl FromStr for CurrencyCode {
    type Err = UnknownCurrency;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BRL" => Ok(Self::BRL),
            "USD" => Ok(Self::USD),
            "EUR" => Ok(Self::EUR),
            "GBP" => Ok(Self::GBP),
            _ => Err(UnknownCurrency(s.to_string())),
        }
    }
}
