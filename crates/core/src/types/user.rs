//! User identity issued by the remote API.

use serde::{Deserialize, Serialize};

use super::email::Email;
use super::id::UserId;

/// An authenticated user, as returned by the login endpoint.
///
/// Immutable from the client's point of view: replaced wholesale on login
/// and dropped wholesale on logout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: Email,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
    /// Older API versions omit this field; absent means not an admin.
    #[serde(default)]
    pub is_admin: bool,
}

impl User {
    /// Name to greet the user with: first name when known, else the email.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.first_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| self.email.as_str())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_without_admin_flag() {
        let user: User = serde_json::from_str(
            r#"{"id":"u-1","email":"ash@pallet.town","first_name":null,"last_name":null,"is_active":true}"#,
        )
        .unwrap();
        assert!(!user.is_admin);
        assert_eq!(user.is_active, Some(true));
    }

    #[test]
    fn test_deserialize_rejects_missing_email() {
        assert!(serde_json::from_str::<User>(r#"{"id":"u-1"}"#).is_err());
        assert!(serde_json::from_str::<User>(r#"{"id":"","email":"a@b.c"}"#).is_err());
    }

    #[test]
    fn test_display_name() {
        let mut user: User =
            serde_json::from_str(r#"{"id":"u-1","email":"ash@pallet.town"}"#).unwrap();
        assert_eq!(user.display_name(), "ash@pallet.town");
        user.first_name = Some("Ash".to_owned());
        assert_eq!(user.display_name(), "Ash");
    }
}
