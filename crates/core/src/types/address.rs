//! Shipping address captured at checkout.
//!
//! Addresses are transient: they live for one checkout attempt and are
//! never persisted locally.

use core::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Country used when the form leaves it blank.
pub const DEFAULT_COUNTRY: &str = "Nederland";

/// A required address field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressField {
    Street,
    HouseNumber,
    PostalCode,
    City,
}

impl AddressField {
    /// The field's wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Street => "street",
            Self::HouseNumber => "house_number",
            Self::PostalCode => "postal_code",
            Self::City => "city",
        }
    }
}

impl fmt::Display for AddressField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors from validating an [`AddressForm`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AddressError {
    /// A required field is empty or whitespace.
    #[error("address field `{0}` is required")]
    Missing(AddressField),
}

/// Raw checkout form input. Any field may be blank.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressForm {
    pub street: String,
    pub house_number: String,
    pub postal_code: String,
    pub city: String,
    pub country: String,
}

impl AddressForm {
    /// Validate into an [`Address`], trimming every field.
    ///
    /// # Errors
    ///
    /// Returns [`AddressError::Missing`] for the first blank required field,
    /// checked in form order.
    pub fn validate(&self) -> Result<Address, AddressError> {
        let required = |value: &str, field| {
            let value = value.trim();
            if value.is_empty() {
                Err(AddressError::Missing(field))
            } else {
                Ok(value.to_owned())
            }
        };

        let street = required(&self.street, AddressField::Street)?;
        let house_number = required(&self.house_number, AddressField::HouseNumber)?;
        let postal_code = required(&self.postal_code, AddressField::PostalCode)?;
        let city = required(&self.city, AddressField::City)?;
        let country = match self.country.trim() {
            "" => DEFAULT_COUNTRY.to_owned(),
            other => other.to_owned(),
        };

        Ok(Address {
            street,
            house_number,
            postal_code,
            city,
            country,
        })
    }
}

/// A validated shipping address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub street: String,
    pub house_number: String,
    pub postal_code: String,
    pub city: String,
    pub country: String,
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}, {} {}, {}",
            self.street, self.house_number, self.postal_code, self.city, self.country
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form() -> AddressForm {
        AddressForm {
            street: " Damrak ".to_owned(),
            house_number: "1".to_owned(),
            postal_code: "1012 LG".to_owned(),
            city: "Amsterdam".to_owned(),
            country: String::new(),
        }
    }

    #[test]
    fn test_validate_trims_and_defaults_country() {
        let address = form().validate().unwrap();
        assert_eq!(address.street, "Damrak");
        assert_eq!(address.country, DEFAULT_COUNTRY);
    }

    #[test]
    fn test_validate_missing_city() {
        let mut form = form();
        form.city = "  ".to_owned();
        assert_eq!(
            form.validate(),
            Err(AddressError::Missing(AddressField::City))
        );
    }

    #[test]
    fn test_validate_reports_first_missing_field() {
        let form = AddressForm::default();
        assert_eq!(
            form.validate(),
            Err(AddressError::Missing(AddressField::Street))
        );
    }

    #[test]
    fn test_display() {
        let address = form().validate().unwrap();
        assert_eq!(address.to_string(), "Damrak 1, 1012 LG Amsterdam, Nederland");
    }
}
