//! HTTP client for the shop API.
//!
//! Every call is a single request with no retries. Non-2xx responses are
//! classified by status code into [`ApiError`] variants carrying the server's
//! `detail` message, or a per-operation fallback when there is none.

mod types;

pub use types::{
    Authenticated, ItemUpdate, NewItem, OrderLineRequest, OrderRequest, Registration, UserUpdate,
};

use reqwest::{RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::instrument;
use url::Url;

use winkel_core::{CatalogItem, Email, ItemId, Order, OrderId, User, UserId};

use crate::config::ApiConfig;
use crate::session::BearerToken;
use types::{LoginRequest, LoginResponse, RegisterRequest, error_detail};

const USER_AGENT: &str = concat!("winkel/", env!("CARGO_PKG_VERSION"));

const LOGIN_PATH: &str = "api/users/login";
const REGISTER_PATH: &str = "api/users/register";
const USERS_PATH: &str = "api/users/";
const ITEMS_PATH: &str = "api/items/";
const ORDERS_PATH: &str = "api/orders/";

/// Errors that can occur when talking to the shop API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response (connect, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// 401 or 403.
    #[error("authentication failed ({status}): {message}")]
    Auth { status: u16, message: String },

    /// 400, 409 or 422.
    #[error("request rejected ({status}): {message}")]
    Validation { status: u16, message: String },

    /// 404.
    #[error("not found: {0}")]
    NotFound(String),

    /// Any other non-success status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// A success response whose body did not decode.
    #[error("parse error: {0}")]
    Parse(String),

    /// An endpoint URL could not be built.
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl ApiError {
    fn from_status(status: StatusCode, message: String) -> Self {
        match status.as_u16() {
            status @ (401 | 403) => Self::Auth { status, message },
            status @ (400 | 409 | 422) => Self::Validation { status, message },
            404 => Self::NotFound(message),
            status => Self::Api { status, message },
        }
    }

    /// Whether the server rejected the bearer token itself.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Auth { status: 401, .. })
    }

    /// The server-provided (or fallback) message, for status errors.
    #[must_use]
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Auth { message, .. }
            | Self::Validation { message, .. }
            | Self::NotFound(message)
            | Self::Api { message, .. } => Some(message),
            Self::Http(_) | Self::Parse(_) | Self::Url(_) => None,
        }
    }
}

/// Which call failed; selects the message used when the server sends none.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    Login,
    Register,
    ListUsers,
    GetUser,
    UpdateUser,
    DeleteUser,
    ListItems,
    GetItem,
    CreateItem,
    UpdateItem,
    DeleteItem,
    SubmitOrder,
    ListOrders,
    GetOrder,
}

impl Operation {
    const fn fallback_message(self) -> &'static str {
        match self {
            Self::Login => "Login failed",
            Self::Register => "Registration failed",
            Self::ListUsers => "Could not load users",
            Self::GetUser => "Could not load user",
            Self::UpdateUser => "Could not update user",
            Self::DeleteUser => "Could not delete user",
            Self::ListItems => "Could not load items",
            Self::GetItem => "Could not load item",
            Self::CreateItem => "Could not create item",
            Self::UpdateItem => "Could not update item",
            Self::DeleteItem => "Could not delete item",
            Self::SubmitOrder => "Could not place order",
            Self::ListOrders => "Could not load orders",
            Self::GetOrder => "Could not load order",
        }
    }
}

/// Shop API client.
#[derive(Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }

    /// The base URL requests are resolved against.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Exchange credentials for a user and bearer token.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Auth` for bad credentials or a deactivated account.
    #[instrument(skip(self, password))]
    pub async fn login(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<Authenticated, ApiError> {
        let body = LoginRequest {
            email: email.as_str(),
            password: password.expose_secret(),
        };
        let request = self.client.post(self.endpoint(LOGIN_PATH)?).json(&body);
        let response: LoginResponse = self.fetch(request, Operation::Login).await?;

        let token = BearerToken::parse(&response.access_token)
            .map_err(|_| ApiError::Parse("login response carried an empty access token".into()))?;
        tracing::debug!(user_id = %response.user.id, "login accepted");

        Ok(Authenticated {
            user: response.user,
            token,
        })
    }

    /// Create an account. Does not log in.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Validation` if the server rejects the fields, e.g.
    /// an email that is already registered.
    #[instrument(skip(self, registration), fields(email = %registration.email))]
    pub async fn register(&self, registration: &Registration) -> Result<User, ApiError> {
        let body = RegisterRequest {
            email: registration.email.as_str(),
            password: registration.password.expose_secret(),
            first_name: registration.first_name.as_deref(),
            last_name: registration.last_name.as_deref(),
        };
        let request = self.client.post(self.endpoint(REGISTER_PATH)?).json(&body);
        self.fetch(request, Operation::Register).await
    }

    /// List user accounts, using the server's default page.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self, token))]
    pub async fn list_users(&self, token: &BearerToken) -> Result<Vec<User>, ApiError> {
        let request = self
            .client
            .get(self.endpoint(USERS_PATH)?)
            .bearer_auth(token.expose());
        self.fetch(request, Operation::ListUsers).await
    }

    /// Fetch one user account.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` for an unknown id.
    #[instrument(skip(self, token), fields(id = %id))]
    pub async fn get_user(&self, id: &UserId, token: &BearerToken) -> Result<User, ApiError> {
        let request = self
            .client
            .get(self.resource(USERS_PATH, id.as_str())?)
            .bearer_auth(token.expose());
        self.fetch(request, Operation::GetUser).await
    }

    /// Apply a partial update to a user account.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` for an unknown id and
    /// `ApiError::Validation` for rejected fields.
    #[instrument(skip(self, update, token), fields(id = %id))]
    pub async fn update_user(
        &self,
        id: &UserId,
        update: &UserUpdate,
        token: &BearerToken,
    ) -> Result<User, ApiError> {
        let request = self
            .client
            .put(self.resource(USERS_PATH, id.as_str())?)
            .bearer_auth(token.expose())
            .json(update);
        self.fetch(request, Operation::UpdateUser).await
    }

    /// Delete a user account.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` for an unknown id.
    #[instrument(skip(self, token), fields(id = %id))]
    pub async fn delete_user(&self, id: &UserId, token: &BearerToken) -> Result<(), ApiError> {
        let request = self
            .client
            .delete(self.resource(USERS_PATH, id.as_str())?)
            .bearer_auth(token.expose());
        self.execute(request, Operation::DeleteUser).await?;
        Ok(())
    }

    /// List the active catalog items, using the server's default page.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self))]
    pub async fn list_items(&self) -> Result<Vec<CatalogItem>, ApiError> {
        let request = self.client.get(self.endpoint(ITEMS_PATH)?);
        self.fetch(request, Operation::ListItems).await
    }

    /// List one page of active catalog items.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self))]
    pub async fn list_items_page(
        &self,
        skip: u32,
        limit: u32,
    ) -> Result<Vec<CatalogItem>, ApiError> {
        let mut url = self.endpoint(ITEMS_PATH)?;
        url.query_pairs_mut()
            .append_pair("skip", &skip.to_string())
            .append_pair("limit", &limit.to_string());
        self.fetch(self.client.get(url), Operation::ListItems).await
    }

    /// Fetch a single item, active or not.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` for an unknown id.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn get_item(&self, id: &ItemId) -> Result<CatalogItem, ApiError> {
        let request = self.client.get(self.resource(ITEMS_PATH, id.as_str())?);
        self.fetch(request, Operation::GetItem).await
    }

    /// Create a catalog item. Requires an administrator token.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Auth` if the token is not an administrator's.
    #[instrument(skip(self, item, token), fields(name = %item.name))]
    pub async fn create_item(
        &self,
        item: &NewItem,
        token: &BearerToken,
    ) -> Result<CatalogItem, ApiError> {
        let request = self
            .client
            .post(self.endpoint(ITEMS_PATH)?)
            .bearer_auth(token.expose())
            .json(item);
        self.fetch(request, Operation::CreateItem).await
    }

    /// Apply a partial update to a catalog item. Requires an administrator
    /// token.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` for an unknown id.
    #[instrument(skip(self, update, token), fields(id = %id))]
    pub async fn update_item(
        &self,
        id: &ItemId,
        update: &ItemUpdate,
        token: &BearerToken,
    ) -> Result<CatalogItem, ApiError> {
        let request = self
            .client
            .put(self.resource(ITEMS_PATH, id.as_str())?)
            .bearer_auth(token.expose())
            .json(update);
        self.fetch(request, Operation::UpdateItem).await
    }

    /// Delete a catalog item. Requires an administrator token.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` for an unknown id.
    #[instrument(skip(self, token), fields(id = %id))]
    pub async fn delete_item(&self, id: &ItemId, token: &BearerToken) -> Result<(), ApiError> {
        let request = self
            .client
            .delete(self.resource(ITEMS_PATH, id.as_str())?)
            .bearer_auth(token.expose());
        self.execute(request, Operation::DeleteItem).await?;
        Ok(())
    }

    /// Place an order for the authenticated user.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Auth` for a rejected token and
    /// `ApiError::Validation` for a rejected body.
    #[instrument(skip(self, order, token), fields(lines = order.items.len()))]
    pub async fn submit_order(
        &self,
        order: &OrderRequest,
        token: &BearerToken,
    ) -> Result<Order, ApiError> {
        let request = self
            .client
            .post(self.endpoint(ORDERS_PATH)?)
            .bearer_auth(token.expose())
            .json(order);
        let order: Order = self.fetch(request, Operation::SubmitOrder).await?;
        tracing::info!(order_id = %order.id, total = %order.total_amount, "order placed");
        Ok(order)
    }

    /// List the authenticated user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Auth` for a rejected token.
    #[instrument(skip(self, token))]
    pub async fn list_orders(&self, token: &BearerToken) -> Result<Vec<Order>, ApiError> {
        let request = self
            .client
            .get(self.endpoint(ORDERS_PATH)?)
            .bearer_auth(token.expose());
        self.fetch(request, Operation::ListOrders).await
    }

    /// Fetch one order. The server only returns orders the token's user owns,
    /// unless that user is an administrator.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` for an unknown id and `ApiError::Auth`
    /// for someone else's order.
    #[instrument(skip(self, token), fields(id = %id))]
    pub async fn get_order(&self, id: &OrderId, token: &BearerToken) -> Result<Order, ApiError> {
        let request = self
            .client
            .get(self.resource(ORDERS_PATH, id.as_str())?)
            .bearer_auth(token.expose());
        self.fetch(request, Operation::GetOrder).await
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.base_url.join(path)?)
    }

    /// `collection` with `id` appended as one escaped path segment.
    fn resource(&self, collection: &str, id: &str) -> Result<Url, ApiError> {
        let mut url = self.endpoint(collection)?;
        url.path_segments_mut()
            .map_err(|()| ApiError::Url(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .push(id);
        Ok(url)
    }

    /// Send the request and turn a non-success status into an error.
    async fn execute(
        &self,
        request: RequestBuilder,
        operation: Operation,
    ) -> Result<Response, ApiError> {
        let response = request.send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message =
            error_detail(&body).unwrap_or_else(|| operation.fallback_message().to_string());
        tracing::debug!(status = status.as_u16(), ?operation, %message, "API request failed");
        Err(ApiError::from_status(status, message))
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        operation: Operation,
    ) -> Result<T, ApiError> {
        self.execute(request, operation)
            .await?
            .json()
            .await
            .map_err(|e| ApiError::Parse(e.to_string()))
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}
