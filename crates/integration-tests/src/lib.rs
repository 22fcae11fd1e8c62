//! Integration tests for Winkel.
//!
//! [`MockShop`] serves an in-process imitation of the shop API on an
//! ephemeral port. It speaks the real wire format (float prices, naive UTC
//! timestamps, `{"detail": ...}` errors, JWT-shaped bearer tokens) so the
//! storefront's `reqwest` client can be exercised end to end.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p winkel-integration-tests
//! ```

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::extract::{Path, Query, Request, State};
use axum::http::{HeaderMap, StatusCode, header::AUTHORIZATION};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

use winkel_storefront::api::ApiClient;
use winkel_storefront::config::ApiConfig;

/// Naive UTC, the way the shop's ORM serializes `datetime`.
const TIMESTAMP: &str = "2025-03-14T09:26:53.589793";
const TOKEN_LIFETIME_SECS: u64 = 24 * 60 * 60;
const DEFAULT_LIMIT: usize = 100;

#[derive(Clone)]
struct Account {
    id: String,
    email: String,
    password: String,
    first_name: Option<String>,
    last_name: Option<String>,
    is_active: bool,
    is_admin: bool,
}

impl Account {
    fn to_json(&self) -> Value {
        json!({
            "id": self.id,
            "email": self.email,
            "first_name": self.first_name,
            "last_name": self.last_name,
            "is_active": self.is_active,
            "is_admin": self.is_admin,
        })
    }
}

#[derive(Default)]
struct Shop {
    accounts: Vec<Account>,
    /// token -> account id
    tokens: Vec<(String, String)>,
    items: Vec<Value>,
    /// owner account id, order
    orders: Vec<(String, Value)>,
    requests: Vec<String>,
    outage: Option<StatusCode>,
}

type Shared = Arc<Mutex<Shop>>;

/// A running mock shop API.
pub struct MockShop {
    shop: Shared,
    addr: SocketAddr,
}

impl MockShop {
    /// Bind to an ephemeral port and start serving.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound.
    pub async fn start() -> Self {
        let shop: Shared = Arc::new(Mutex::new(Shop::default()));
        let app = router(shop.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock shop");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move { axum::serve(listener, app).await.expect("serve mock shop") });

        Self { shop, addr }
    }

    #[must_use]
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// # Panics
    ///
    /// Never in practice; the mock's URL is always valid.
    #[must_use]
    pub fn api_config(&self) -> ApiConfig {
        ApiConfig::new(&self.url()).expect("mock shop url")
    }

    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built.
    #[must_use]
    pub fn client(&self) -> ApiClient {
        ApiClient::new(&self.api_config()).expect("api client")
    }

    /// Register an account directly and return its id.
    pub fn add_user(&self, email: &str, password: &str, is_admin: bool) -> String {
        let id = Uuid::new_v4().to_string();
        self.shop.lock().accounts.push(Account {
            id: id.clone(),
            email: email.to_owned(),
            password: password.to_owned(),
            first_name: None,
            last_name: None,
            is_active: true,
            is_admin,
        });
        id
    }

    /// The stored account for `id`, as the API would return it.
    #[must_use]
    pub fn user(&self, id: &str) -> Option<Value> {
        self.shop
            .lock()
            .accounts
            .iter()
            .find(|account| account.id == id)
            .map(Account::to_json)
    }

    /// Add an active catalog item and return its id.
    pub fn add_item(&self, name: &str, price: f64, stock: i64) -> String {
        let id = Uuid::new_v4().to_string();
        self.shop.lock().items.push(json!({
            "id": id,
            "name": name,
            "description": null,
            "price": price,
            "image_url": format!("https://img.example/{}.png", name.to_lowercase().replace(' ', "-")),
            "category": "plush",
            "stock": stock,
            "is_active": true,
            "created_at": TIMESTAMP,
            "updated_at": null,
        }));
        id
    }

    /// Change an item's catalog price.
    pub fn set_price(&self, id: &str, price: f64) {
        self.update_item_field(id, "price", json!(price));
    }

    /// List or unlist an item.
    pub fn set_active(&self, id: &str, active: bool) {
        self.update_item_field(id, "is_active", json!(active));
    }

    #[must_use]
    pub fn item(&self, id: &str) -> Option<Value> {
        self.shop
            .lock()
            .items
            .iter()
            .find(|item| item["id"] == id)
            .cloned()
    }

    /// Every order received, oldest first.
    #[must_use]
    pub fn orders(&self) -> Vec<Value> {
        self.shop
            .lock()
            .orders
            .iter()
            .map(|(_, order)| order.clone())
            .collect()
    }

    /// Requests received so far, as `"METHOD /path"`.
    #[must_use]
    pub fn requests(&self) -> Vec<String> {
        self.shop.lock().requests.clone()
    }

    #[must_use]
    pub fn request_count(&self) -> usize {
        self.shop.lock().requests.len()
    }

    /// Answer every request with `status` and an empty body, or resume
    /// normal service with `None`.
    pub fn set_outage(&self, status: Option<u16>) {
        self.shop.lock().outage = status.and_then(|s| StatusCode::from_u16(s).ok());
    }

    /// Invalidate every issued token.
    pub fn revoke_tokens(&self) {
        self.shop.lock().tokens.clear();
    }

    fn update_item_field(&self, id: &str, field: &str, value: Value) {
        let mut shop = self.shop.lock();
        if let Some(item) = shop.items.iter_mut().find(|item| item["id"] == id) {
            item[field] = value;
        }
    }
}

fn router(shop: Shared) -> Router {
    Router::new()
        .route("/api/users/login", post(login))
        .route("/api/users/register", post(register))
        .route("/api/users/", get(list_users))
        .route(
            "/api/users/{id}",
            get(get_user).put(update_user).delete(delete_user),
        )
        .route("/api/items/", get(list_items).post(create_item))
        .route(
            "/api/items/{id}",
            get(get_item).put(update_item).delete(delete_item),
        )
        .route("/api/orders/", get(list_orders).post(create_order))
        .route("/api/orders/{id}", get(get_order))
        .layer(middleware::from_fn_with_state(shop.clone(), record))
        .with_state(shop)
}

// =============================================================================
// Helpers
// =============================================================================

async fn record(State(shop): State<Shared>, request: Request, next: Next) -> Response {
    let outage = {
        let mut shop = shop.lock();
        shop.requests
            .push(format!("{} {}", request.method(), request.uri().path()));
        shop.outage
    };
    if let Some(status) = outage {
        return status.into_response();
    }
    next.run(request).await
}

fn detail(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "detail": message }))).into_response()
}

/// A pydantic-style validation failure.
fn missing_field(location: &[&str]) -> Response {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(json!({
            "detail": [{
                "loc": location,
                "msg": "Field required",
                "type": "missing",
            }]
        })),
    )
        .into_response()
}

fn issue_token(account_id: &str) -> String {
    let exp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_secs())
        + TOKEN_LIFETIME_SECS;
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(json!({ "sub": account_id, "exp": exp }).to_string());
    format!("{header}.{payload}.mock-signature")
}

fn authenticate(shop: &Shop, headers: &HeaderMap) -> Result<Account, Response> {
    let value = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| detail(StatusCode::FORBIDDEN, "Not authenticated"))?;
    let token = value
        .strip_prefix("Bearer ")
        .ok_or_else(|| detail(StatusCode::FORBIDDEN, "Invalid authentication credentials"))?;
    let account_id = shop
        .tokens
        .iter()
        .find(|(t, _)| t == token)
        .map(|(_, id)| id)
        .ok_or_else(|| detail(StatusCode::UNAUTHORIZED, "Ongeldige token"))?;
    shop.accounts
        .iter()
        .find(|account| &account.id == account_id)
        .cloned()
        .ok_or_else(|| detail(StatusCode::UNAUTHORIZED, "User niet gevonden"))
}

fn authenticate_admin(shop: &Shop, headers: &HeaderMap) -> Result<Account, Response> {
    let account = authenticate(shop, headers)?;
    if account.is_admin {
        Ok(account)
    } else {
        Err(detail(StatusCode::FORBIDDEN, "Admin rechten vereist"))
    }
}

fn user_not_found() -> Response {
    detail(StatusCode::NOT_FOUND, "User niet gevonden")
}

fn item_not_found() -> Response {
    detail(StatusCode::NOT_FOUND, "Item niet gevonden")
}

// =============================================================================
// Users
// =============================================================================

#[derive(Deserialize)]
struct LoginBody {
    email: String,
    password: String,
}

async fn login(State(shop): State<Shared>, Json(body): Json<LoginBody>) -> Response {
    let mut shop = shop.lock();
    let Some(account) = shop
        .accounts
        .iter()
        .find(|a| a.email == body.email && a.password == body.password)
        .cloned()
    else {
        return detail(StatusCode::UNAUTHORIZED, "Ongeldige email of wachtwoord");
    };
    if !account.is_active {
        return detail(StatusCode::FORBIDDEN, "Account is gedeactiveerd");
    }

    let token = issue_token(&account.id);
    shop.tokens.push((token.clone(), account.id.clone()));
    Json(json!({
        "access_token": token,
        "token_type": "bearer",
        "user": account.to_json(),
    }))
    .into_response()
}

#[derive(Deserialize)]
struct RegisterBody {
    email: String,
    #[serde(default)]
    password: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
}

async fn register(State(shop): State<Shared>, Json(body): Json<RegisterBody>) -> Response {
    let Some(password) = body.password else {
        return missing_field(&["body", "password"]);
    };

    let mut shop = shop.lock();
    if shop.accounts.iter().any(|a| a.email == body.email) {
        return detail(StatusCode::BAD_REQUEST, "Email is al geregistreerd");
    }

    let account = Account {
        id: Uuid::new_v4().to_string(),
        email: body.email,
        password,
        first_name: body.first_name,
        last_name: body.last_name,
        is_active: true,
        is_admin: false,
    };
    let mut response = account.to_json();
    // The registration response predates the admin flag.
    if let Some(fields) = response.as_object_mut() {
        fields.remove("is_admin");
    }
    shop.accounts.push(account);

    (StatusCode::CREATED, Json(response)).into_response()
}

// The shop serves its account routes without authentication.

async fn list_users(State(shop): State<Shared>, Query(page): Query<Page>) -> Json<Vec<Value>> {
    let shop = shop.lock();
    let users = shop
        .accounts
        .iter()
        .skip(page.skip.unwrap_or(0))
        .take(page.limit.unwrap_or(DEFAULT_LIMIT))
        .map(Account::to_json)
        .collect();
    Json(users)
}

async fn get_user(State(shop): State<Shared>, Path(id): Path<String>) -> Response {
    let shop = shop.lock();
    shop.accounts
        .iter()
        .find(|account| account.id == id)
        .map_or_else(user_not_found, |account| Json(account.to_json()).into_response())
}

#[derive(Deserialize)]
struct UserUpdateBody {
    email: Option<String>,
    password: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    is_active: Option<bool>,
}

async fn update_user(
    State(shop): State<Shared>,
    Path(id): Path<String>,
    Json(body): Json<UserUpdateBody>,
) -> Response {
    let mut shop = shop.lock();
    let Some(account) = shop.accounts.iter_mut().find(|account| account.id == id) else {
        return user_not_found();
    };

    if let Some(email) = body.email {
        account.email = email;
    }
    if let Some(password) = body.password {
        account.password = password;
    }
    if let Some(first_name) = body.first_name {
        account.first_name = Some(first_name);
    }
    if let Some(last_name) = body.last_name {
        account.last_name = Some(last_name);
    }
    if let Some(is_active) = body.is_active {
        account.is_active = is_active;
    }
    Json(account.to_json()).into_response()
}

async fn delete_user(State(shop): State<Shared>, Path(id): Path<String>) -> Response {
    let mut shop = shop.lock();
    let before = shop.accounts.len();
    shop.accounts.retain(|account| account.id != id);
    if shop.accounts.len() == before {
        return user_not_found();
    }
    shop.tokens.retain(|(_, owner)| owner != &id);
    StatusCode::NO_CONTENT.into_response()
}

// =============================================================================
// Items
// =============================================================================

#[derive(Deserialize)]
struct Page {
    skip: Option<usize>,
    limit: Option<usize>,
}

async fn list_items(State(shop): State<Shared>, Query(page): Query<Page>) -> Json<Vec<Value>> {
    let shop = shop.lock();
    let items = shop
        .items
        .iter()
        .filter(|item| item["is_active"] == true)
        .skip(page.skip.unwrap_or(0))
        .take(page.limit.unwrap_or(DEFAULT_LIMIT))
        .cloned()
        .collect();
    Json(items)
}

async fn get_item(State(shop): State<Shared>, Path(id): Path<String>) -> Response {
    let shop = shop.lock();
    shop.items
        .iter()
        .find(|item| item["id"] == id)
        .map_or_else(item_not_found, |item| Json(item.clone()).into_response())
}

async fn create_item(
    State(shop): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let mut shop = shop.lock();
    if let Err(response) = authenticate_admin(&shop, &headers) {
        return response;
    }
    for field in ["name", "price"] {
        if body.get(field).is_none_or(Value::is_null) {
            return missing_field(&["body", field]);
        }
    }

    let item = json!({
        "id": Uuid::new_v4().to_string(),
        "name": body["name"],
        "description": body.get("description").cloned().unwrap_or(Value::Null),
        "price": body["price"],
        "image_url": body.get("image_url").cloned().unwrap_or(Value::Null),
        "category": body.get("category").cloned().unwrap_or(Value::Null),
        "stock": body.get("stock").cloned().unwrap_or(json!(0)),
        "is_active": true,
        "created_at": TIMESTAMP,
        "updated_at": null,
    });
    shop.items.push(item.clone());
    (StatusCode::CREATED, Json(item)).into_response()
}

async fn update_item(
    State(shop): State<Shared>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let mut shop = shop.lock();
    if let Err(response) = authenticate_admin(&shop, &headers) {
        return response;
    }
    let Some(item) = shop.items.iter_mut().find(|item| item["id"] == id) else {
        return item_not_found();
    };

    if let Some(fields) = body.as_object() {
        for (key, value) in fields {
            item[key] = value.clone();
        }
    }
    item["updated_at"] = json!(TIMESTAMP);
    Json(item.clone()).into_response()
}

async fn delete_item(
    State(shop): State<Shared>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let mut shop = shop.lock();
    if let Err(response) = authenticate_admin(&shop, &headers) {
        return response;
    }
    let before = shop.items.len();
    shop.items.retain(|item| item["id"] != id);
    if shop.items.len() == before {
        return item_not_found();
    }
    StatusCode::NO_CONTENT.into_response()
}

// =============================================================================
// Orders
// =============================================================================

async fn create_order(
    State(shop): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let mut shop = shop.lock();
    let account = match authenticate(&shop, &headers) {
        Ok(account) => account,
        Err(response) => return response,
    };

    let address = &body["address"];
    for field in ["street", "house_number", "postal_code", "city"] {
        if !address[field].is_string() {
            return missing_field(&["body", "address", field]);
        }
    }
    let Some(lines) = body["items"].as_array() else {
        return missing_field(&["body", "items"]);
    };

    let mut total = 0.0;
    let mut items = Vec::with_capacity(lines.len());
    for line in lines {
        let price = line["product_price"].as_f64().unwrap_or_default();
        let quantity = line["quantity"].as_u64().unwrap_or_default();
        #[allow(clippy::cast_precision_loss)]
        let line_total = price * quantity as f64;
        total += line_total;
        items.push(json!({
            "id": Uuid::new_v4().to_string(),
            "product_name": line["product_name"],
            "product_price": price,
            "quantity": quantity,
        }));
    }

    let order = json!({
        "id": Uuid::new_v4().to_string(),
        "status": "pending",
        "total_amount": total,
        "street": address["street"],
        "house_number": address["house_number"],
        "postal_code": address["postal_code"],
        "city": address["city"],
        "country": address["country"].as_str().unwrap_or("Nederland"),
        "created_at": TIMESTAMP,
        "items": items,
        "request": body,
    });
    shop.orders.push((account.id, order.clone()));
    Json(order).into_response()
}

async fn list_orders(State(shop): State<Shared>, headers: HeaderMap) -> Response {
    let shop = shop.lock();
    let account = match authenticate(&shop, &headers) {
        Ok(account) => account,
        Err(response) => return response,
    };
    let orders: Vec<Value> = shop
        .orders
        .iter()
        .rev()
        .filter(|(owner, _)| *owner == account.id)
        .map(|(_, order)| order.clone())
        .collect();
    Json(orders).into_response()
}

async fn get_order(
    State(shop): State<Shared>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let shop = shop.lock();
    let account = match authenticate(&shop, &headers) {
        Ok(account) => account,
        Err(response) => return response,
    };
    let Some((owner, order)) = shop.orders.iter().find(|(_, order)| order["id"] == id) else {
        return detail(StatusCode::NOT_FOUND, "Bestelling niet gevonden");
    };
    if *owner != account.id && !account.is_admin {
        return detail(StatusCode::FORBIDDEN, "Geen toegang tot deze bestelling");
    }
    Json(order.clone()).into_response()
}
