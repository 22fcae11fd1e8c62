//! Cart line quantity.

use core::fmt;
use core::num::NonZeroU32;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when constructing a [`Quantity`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum QuantityError {
    /// Zero or a negative number was requested.
    #[error("quantity must be at least 1 (got {0})")]
    NotPositive(i64),
    /// The requested quantity does not fit the storage type.
    #[error("quantity {0} is too large")]
    TooLarge(i64),
}

/// A strictly positive number of units on a cart line.
///
/// A line with quantity zero cannot exist; callers that want to go to zero
/// remove the line instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u32")]
pub struct Quantity(NonZeroU32);

impl Quantity {
    /// A single unit.
    pub const ONE: Self = Self(NonZeroU32::MIN);

    /// Create a quantity from a signed request.
    ///
    /// # Errors
    ///
    /// Returns [`QuantityError::NotPositive`] for `n <= 0` and
    /// [`QuantityError::TooLarge`] above `u32::MAX`.
    pub fn new(n: i64) -> Result<Self, QuantityError> {
        if n <= 0 {
            return Err(QuantityError::NotPositive(n));
        }
        let n = u32::try_from(n).map_err(|_| QuantityError::TooLarge(n))?;
        NonZeroU32::new(n)
            .map(Self)
            .ok_or(QuantityError::NotPositive(0))
    }

    /// The number of units.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0.get()
    }

    /// One more unit, saturating at `u32::MAX`.
    #[must_use]
    pub const fn incremented(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl Default for Quantity {
    fn default() -> Self {
        Self::ONE
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<i64> for Quantity {
    type Error = QuantityError;

    fn try_from(n: i64) -> Result<Self, Self::Error> {
        Self::new(n)
    }
}

impl From<Quantity> for u32 {
    fn from(quantity: Quantity) -> Self {
        quantity.get()
    }
}
