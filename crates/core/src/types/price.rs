//! Type-safe price representation using decimal arithmetic.
//!
//! The remote API speaks JSON floats for prices. Inside the process every
//! amount is a [`Decimal`] so cart totals never accumulate binary rounding
//! error; conversion happens once, at the boundary.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::quantity::Quantity;

/// Errors that can occur when constructing a [`Price`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PriceError {
    /// The amount is below zero.
    #[error("price cannot be negative (got {0})")]
    Negative(Decimal),
    /// The amount is above [`Price::MAX`].
    #[error("price {0} exceeds the maximum of {max}", max = Price::MAX.0)]
    TooLarge(Decimal),
    /// The input is not a decimal number.
    #[error("invalid price: {0}")]
    Invalid(String),
}

/// A non-negative unit price in euros.
///
/// Serializes as a decimal string (`"12.50"`) so persisted carts round-trip
/// exactly; deserializes from either a string or a JSON number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Price(Decimal);

impl Price {
    /// A price of zero.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// The largest accepted amount. Order totals use this type too.
    /// `MAX * u32::MAX` stays inside `Decimal`'s range.
    pub const MAX: Self = Self(Decimal::from_parts(1_000_000_000, 0, 0, false, 0));

    /// Create a price from a decimal amount.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Negative`] if `amount` is below zero and
    /// [`PriceError::TooLarge`] if it is above [`Price::MAX`].
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative(amount));
        }
        if amount > Self::MAX.0 {
            return Err(PriceError::TooLarge(amount));
        }
        Ok(Self(amount))
    }

    /// Create a price from an amount in cents.
    ///
    /// # Errors
    ///
    /// See [`Price::new`].
    pub fn from_cents(cents: i64) -> Result<Self, PriceError> {
        Self::new(Decimal::new(cents, 2))
    }

    /// Parse a price from user input such as `12.50` or `12,50`.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Invalid`] if the input is not a number, or the
    /// range errors of [`Price::new`].
    pub fn parse(s: &str) -> Result<Self, PriceError> {
        let normalized = s.trim().trim_start_matches('€').trim().replace(',', ".");
        let amount: Decimal = normalized
            .parse()
            .map_err(|_| PriceError::Invalid(s.to_owned()))?;
        Self::new(amount)
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// The line amount for `quantity` units at this price.
    #[must_use]
    pub fn times(&self, quantity: Quantity) -> Decimal {
        self.0.saturating_mul(Decimal::from(quantity.get()))
    }

    /// Format an arbitrary amount the way prices are displayed (`€12.50`).
    #[must_use]
    pub fn format_amount(amount: Decimal) -> String {
        format!("€{:.2}", amount.round_dp(2))
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&Self::format_amount(self.0))
    }
}

impl TryFrom<Decimal> for Price {
    type Error = PriceError;

    fn try_from(amount: Decimal) -> Result<Self, Self::Error> {
        Self::new(amount)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}

impl std::str::FromStr for Price {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_negative() {
        assert!(matches!(
            Price::from_cents(-1),
            Err(PriceError::Negative(_))
        ));
        assert!(Price::from_cents(0).is_ok());
    }

    #[test]
    fn test_parse_user_input() {
        assert_eq!(Price::parse("12.50").unwrap(), Price::from_cents(1250).unwrap());
        assert_eq!(Price::parse("€ 7,50").unwrap(), Price::from_cents(750).unwrap());
        assert!(matches!(Price::parse("twelve"), Err(PriceError::Invalid(_))));
    }

    #[test]
    fn test_times() {
        let price = Price::from_cents(1250).unwrap();
        let qty = Quantity::new(3).unwrap();
        assert_eq!(price.times(qty), Decimal::new(3750, 2));
    }

    #[test]
    fn test_rejects_above_max() {
        assert_eq!(Price::parse("1000000000").unwrap(), Price::MAX);
        assert!(matches!(
            Price::parse("1000000000.01"),
            Err(PriceError::TooLarge(_))
        ));
        assert!(serde_json::from_str::<Price>("1e28").is_err());
        assert!(serde_json::from_str::<Price>("\"79228162514264337593543950335\"").is_err());
    }

    #[test]
    fn test_times_at_bounds() {
        let qty = Quantity::new(i64::from(u32::MAX)).unwrap();
        assert_eq!(
            Price::MAX.times(qty),
            Decimal::from(1_000_000_000_u64) * Decimal::from(u32::MAX)
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(Price::from_cents(1250).unwrap().to_string(), "€12.50");
        assert_eq!(Price::parse("3").unwrap().to_string(), "€3.00");
    }

    #[test]
    fn test_deserialize_number_and_string() {
        let from_number: Price = serde_json::from_str("12.5").unwrap();
        let from_string: Price = serde_json::from_str("\"12.50\"").unwrap();
        assert_eq!(from_number, from_string);
        assert!(serde_json::from_str::<Price>("-1.0").is_err());
    }
}
