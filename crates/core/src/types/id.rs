//! Newtype IDs for type-safe entity references.
//!
//! The remote API hands out opaque string identifiers (UUIDs in practice, but
//! nothing here relies on that). Use the `define_id!` macro to create wrappers
//! that prevent accidentally mixing IDs from different entity types.

use thiserror::Error;

/// Error returned when an identifier is blank.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("identifier cannot be empty")]
pub struct IdError;

/// Macro to define a type-safe ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` as a plain string, rejecting blank values
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`
/// - Conversion methods: `parse()`, `as_str()`, `into_inner()`
/// - `Display`, `FromStr` and `TryFrom<String>`
///
/// # Example
///
/// ```rust
/// # use winkel_core::define_id;
/// define_id!(ItemId);
/// define_id!(OrderId);
///
/// let item_id = ItemId::parse("pikachu-plush").unwrap();
/// let order_id = OrderId::parse("pikachu-plush").unwrap();
///
/// // These are different types, so this won't compile:
/// // let _: ItemId = order_id;
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Parse an ID, rejecting blank input.
            ///
            /// Surrounding whitespace is trimmed.
            ///
            /// # Errors
            ///
            /// Returns [`IdError`]($crate::types::id::IdError) if the input is
            /// empty or whitespace.
            pub fn parse(id: &str) -> ::core::result::Result<Self, $crate::types::id::IdError> {
                let trimmed = id.trim();
                if trimmed.is_empty() {
                    return Err($crate::types::id::IdError);
                }
                Ok(Self(trimmed.to_owned()))
            }

            /// Get the underlying string value.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the ID and return its inner string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = $crate::types::id::IdError;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl TryFrom<String> for $name {
            type Error = $crate::types::id::IdError;

            fn try_from(id: String) -> ::core::result::Result<Self, Self::Error> {
                Self::parse(&id)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

// Define standard entity IDs
define_id!(UserId);
define_id!(ItemId);
define_id!(OrderId);
define_id!(OrderLineId);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trims() {
        let id = ItemId::parse("  pikachu-plush ").unwrap();
        assert_eq!(id.as_str(), "pikachu-plush");
    }

    #[test]
    fn test_parse_blank() {
        assert_eq!(ItemId::parse(""), Err(IdError));
        assert_eq!(ItemId::parse("   "), Err(IdError));
    }

    #[test]
    fn test_serde_is_plain_string() {
        let id = UserId::parse("0f8c").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"0f8c\"");
        let back: UserId = serde_json::from_str("\"0f8c\"").unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_deserialize_rejects_blank() {
        assert!(serde_json::from_str::<OrderId>("\"\"").is_err());
    }
}
