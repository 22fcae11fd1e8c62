//! Request and response bodies for the shop API.
//!
//! Money goes over the wire as JSON numbers. Outgoing prices are written with
//! `rust_decimal::serde::float`; incoming ones are accepted by [`Price`]'s own
//! deserializer.

use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize, Serializer};

use winkel_core::{Address, CartLine, Email, ItemId, Price, User};

use crate::session::BearerToken;

/// A successful login: the user and the token issued for them.
#[derive(Debug)]
pub struct Authenticated {
    pub user: User,
    pub token: BearerToken,
}

/// Body of `POST /api/users/login`.
#[derive(Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Response of `POST /api/users/login`.
#[derive(Deserialize)]
pub(crate) struct LoginResponse {
    pub access_token: String,
    pub user: User,
}

/// Fields for creating an account.
#[derive(Debug)]
pub struct Registration {
    pub email: Email,
    pub password: SecretString,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Body of `POST /api/users/register`.
#[derive(Serialize)]
pub(crate) struct RegisterRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<&'a str>,
}

/// Fields for a new catalog item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewItem {
    pub name: String,
    pub description: Option<String>,
    #[serde(serialize_with = "price_as_float")]
    pub price: Price,
    pub image_url: Option<String>,
    pub category: Option<String>,
    pub stock: i64,
}

/// A partial update of a catalog item. Unset fields are left alone by the
/// server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ItemUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "option_price_as_float"
    )]
    pub price: Option<Price>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl ItemUpdate {
    /// Whether no field is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// A partial update of a user account, applied by an administrator.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<Email>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "expose_password"
    )]
    pub password: Option<SecretString>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl UserUpdate {
    /// Whether no field is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.email.is_none()
            && self.password.is_none()
            && self.first_name.is_none()
            && self.last_name.is_none()
            && self.is_active.is_none()
    }
}

/// Body of `POST /api/orders/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderRequest {
    pub items: Vec<OrderLineRequest>,
    pub address: Address,
}

/// One line of an order request, built from a cart line snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderLineRequest {
    pub item_id: ItemId,
    pub product_name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub product_price: Decimal,
    pub quantity: u32,
}

impl From<&CartLine> for OrderLineRequest {
    fn from(line: &CartLine) -> Self {
        Self {
            item_id: line.id.clone(),
            product_name: line.name.clone(),
            product_price: line.price.amount(),
            quantity: line.quantity.get(),
        }
    }
}

fn price_as_float<S: Serializer>(price: &Price, serializer: S) -> Result<S::Ok, S::Error> {
    rust_decimal::serde::float::serialize(&price.amount(), serializer)
}

#[allow(clippy::ref_option)]
fn option_price_as_float<S: Serializer>(
    price: &Option<Price>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    rust_decimal::serde::float_option::serialize(&price.map(|p| p.amount()), serializer)
}

#[allow(clippy::ref_option)]
fn expose_password<S: Serializer>(
    password: &Option<SecretString>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match password {
        Some(password) => serializer.serialize_some(password.expose_secret()),
        None => serializer.serialize_none(),
    }
}

/// FastAPI error body: `detail` is a message or a list of validation errors.
#[derive(Deserialize)]
struct ErrorBody {
    detail: Option<Detail>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Detail {
    Message(String),
    Violations(Vec<Violation>),
}

#[derive(Deserialize)]
struct Violation {
    msg: String,
}

/// The human-readable `detail` of an error response body, if there is one.
pub(crate) fn error_detail(body: &str) -> Option<String> {
    let detail = serde_json::from_str::<ErrorBody>(body).ok()?.detail?;
    let message = match detail {
        Detail::Message(message) => message,
        Detail::Violations(violations) => violations
            .into_iter()
            .map(|v| v.msg)
            .collect::<Vec<_>>()
            .join("; "),
    };
    let message = message.trim();
    (!message.is_empty()).then(|| message.to_owned())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use winkel_core::Quantity;

    use super::*;

    #[test]
    fn test_error_detail_string() {
        assert_eq!(
            error_detail(r#"{"detail":"Ongeldige email of wachtwoord"}"#).as_deref(),
            Some("Ongeldige email of wachtwoord")
        );
    }

    #[test]
    fn test_error_detail_validation_list() {
        let body = r#"{"detail":[
            {"loc":["body","email"],"msg":"value is not a valid email address","type":"value_error"},
            {"loc":["body","password"],"msg":"field required","type":"missing"}
        ]}"#;
        assert_eq!(
            error_detail(body).as_deref(),
            Some("value is not a valid email address; field required")
        );
    }

    #[test]
    fn test_error_detail_absent() {
        assert_eq!(error_detail(""), None);
        assert_eq!(error_detail("Internal Server Error"), None);
        assert_eq!(error_detail(r#"{"error":"x"}"#), None);
        assert_eq!(error_detail(r#"{"detail":""}"#), None);
        assert_eq!(error_detail(r#"{"detail":[]}"#), None);
    }

    #[test]
    fn test_order_line_from_cart_line() {
        let line = CartLine {
            id: ItemId::parse("a1").unwrap(),
            name: "Pikachu plush".to_owned(),
            price: Price::from_cents(1250).unwrap(),
            quantity: Quantity::new(2).unwrap(),
            image_url: None,
        };
        let value = serde_json::to_value(OrderLineRequest::from(&line)).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "item_id": "a1",
                "product_name": "Pikachu plush",
                "product_price": 12.5,
                "quantity": 2
            })
        );
    }

    #[test]
    fn test_item_update_skips_unset() {
        let update = ItemUpdate {
            price: Some(Price::from_cents(999).unwrap()),
            stock: Some(3),
            ..ItemUpdate::default()
        };
        assert!(!update.is_empty());
        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            serde_json::json!({"price": 9.99, "stock": 3})
        );
        assert!(ItemUpdate::default().is_empty());
    }

    #[test]
    fn test_new_item_price_is_number() {
        let item = NewItem {
            name: "Eevee".to_owned(),
            description: None,
            price: Price::from_cents(750).unwrap(),
            image_url: None,
            category: Some("plush".to_owned()),
            stock: 5,
        };
        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["price"], serde_json::json!(7.5));
        assert_eq!(value["description"], serde_json::Value::Null);
    }

    #[test]
    fn test_user_update_skips_unset_and_sends_password() {
        let update = UserUpdate {
            password: Some(SecretString::from("starmie".to_owned())),
            is_active: Some(false),
            ..UserUpdate::default()
        };
        assert!(!update.is_empty());
        assert!(UserUpdate::default().is_empty());
        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            serde_json::json!({"password": "starmie", "is_active": false})
        );
        assert!(!format!("{update:?}").contains("starmie"));
    }
}
