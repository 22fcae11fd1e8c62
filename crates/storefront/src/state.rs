//! Application state owned by the views.
//!
//! [`AppState`] holds the session, the cart and the API client, and offers
//! the composite operations a view needs: each one checks local
//! preconditions, talks to the API, then updates the managers.

use secrecy::SecretString;

use winkel_core::{
    AddressForm, CatalogItem, Email, ItemId, ItemRef, Order, OrderId, Quantity, User, UserId,
};

use crate::api::{ApiClient, ApiError, ItemUpdate, NewItem, Registration, UserUpdate};
use crate::cart::CartManager;
use crate::checkout::{self, CheckoutError, PriceDrift};
use crate::config::StorefrontConfig;
use crate::error::{AppError, Result, add_breadcrumb, clear_sentry_user, set_sentry_user};
use crate::persistence::{FileStore, Persistence};
use crate::session::SessionManager;

/// The storefront's session, cart and API client.
#[derive(Debug)]
pub struct AppState {
    api: ApiClient,
    session: SessionManager,
    cart: CartManager,
}

impl AppState {
    /// Create the state for `config`, restoring the persisted session and
    /// cart from its profile directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &StorefrontConfig) -> Result<Self> {
        let api = ApiClient::new(&config.api)?;
        let persistence = Persistence::new(FileStore::new(&config.profile_dir));
        Ok(Self::with_persistence(api, persistence))
    }

    /// Create the state over an explicit persistence backend.
    #[must_use]
    pub fn with_persistence(api: ApiClient, persistence: Persistence) -> Self {
        let session = SessionManager::restored(persistence.clone());
        let cart = CartManager::restored(persistence);

        if let Some(user) = session.current_user() {
            set_sentry_user(user);
        }

        Self { api, session, cart }
    }

    /// Get a reference to the API client.
    #[must_use]
    pub const fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Get a reference to the session manager.
    #[must_use]
    pub const fn session(&self) -> &SessionManager {
        &self.session
    }

    /// Get a reference to the cart manager.
    #[must_use]
    pub const fn cart(&self) -> &CartManager {
        &self.cart
    }

    // =========================================================================
    // Account
    // =========================================================================

    /// Log in and persist the session.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` for a malformed email and an auth
    /// error for rejected credentials.
    pub async fn sign_in(&mut self, email: &str, password: &SecretString) -> Result<&User> {
        let email = Email::parse(email).map_err(|e| AppError::BadRequest(e.to_string()))?;
        let authenticated = self.api.login(&email, password).await?;

        let user = self
            .session
            .login(authenticated.user, authenticated.token.expose())?;
        set_sentry_user(user);
        Ok(user)
    }

    /// Log out. The cart is kept.
    pub fn sign_out(&mut self) {
        self.session.logout();
        clear_sentry_user();
    }

    /// Create an account. The caller still has to log in.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the server rejects the registration.
    pub async fn register(&self, registration: &Registration) -> Result<User> {
        Ok(self.api.register(registration).await?)
    }

    // =========================================================================
    // Catalog and cart
    // =========================================================================

    /// The active catalog items.
    ///
    /// # Errors
    ///
    /// Returns a service error if the API is unavailable.
    pub async fn catalog(&self) -> Result<Vec<CatalogItem>> {
        Ok(self.api.list_items().await?)
    }

    /// One catalog item.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown id.
    pub async fn item(&self, id: &ItemId) -> Result<CatalogItem> {
        Ok(self.api.get_item(id).await?)
    }

    /// Look up `id` in the catalog and add one unit of it to the cart.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown id and `BadRequest` for an item that
    /// is no longer sold.
    pub async fn add_catalog_item_to_cart(&mut self, id: &ItemId) -> Result<Quantity> {
        let item = self.api.get_item(id).await?;
        if !item.is_active {
            return Err(AppError::BadRequest(format!(
                "{} is no longer available",
                item.name
            )));
        }

        let quantity = self.cart.add_item(ItemRef::from(&item));
        add_breadcrumb("cart", "Added item", Some(&[("item_id", id.as_str())]));
        Ok(quantity)
    }

    /// Set a cart line's quantity; zero or less removes it.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the item is not in the cart and `BadRequest`
    /// for a quantity a cart line cannot hold.
    pub fn set_cart_quantity(&mut self, id: &ItemId, quantity: i64) -> Result<()> {
        if self.cart.line(id).is_none() {
            return Err(AppError::NotFound(format!("item {id} is not in your cart")));
        }
        self.cart
            .update_quantity(id, quantity)
            .map_err(|err| AppError::BadRequest(err.to_string()))?;
        add_breadcrumb(
            "cart",
            "Changed quantity",
            Some(&[("item_id", id.as_str()), ("quantity", &quantity.to_string())]),
        );
        Ok(())
    }

    /// Remove a line from the cart.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the item is not in the cart.
    pub fn remove_from_cart(&mut self, id: &ItemId) -> Result<()> {
        self.cart
            .remove_item(id)
            .ok_or_else(|| AppError::NotFound(format!("item {id} is not in your cart")))?;
        add_breadcrumb("cart", "Removed item", Some(&[("item_id", id.as_str())]));
        Ok(())
    }

    /// Empty the cart.
    pub fn clear_cart(&mut self) {
        self.cart.clear();
        add_breadcrumb("cart", "Cleared cart", None);
    }

    // =========================================================================
    // Checkout and orders
    // =========================================================================

    /// Cart lines whose price changed in the catalog since they were added.
    ///
    /// # Errors
    ///
    /// Returns a service error if the catalog cannot be loaded.
    pub async fn price_drift(&self) -> Result<Vec<PriceDrift>> {
        if self.cart.is_empty() {
            return Ok(Vec::new());
        }
        let catalog = self.api.list_items().await?;
        Ok(checkout::price_drift(self.cart.cart(), &catalog))
    }

    /// Place an order for the cart, shipped to `form`, and empty the cart.
    ///
    /// Nothing is sent unless the user is logged in, the cart has lines and
    /// the address is complete. The cart is left untouched on failure.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError` for a refused checkout, or the API's error.
    pub async fn checkout(&mut self, form: &AddressForm) -> Result<Order> {
        let token = self
            .session
            .token()
            .ok_or(CheckoutError::NotAuthenticated)?;
        let request = checkout::prepare_order(self.cart.cart(), form)?;

        let result = self.api.submit_order(&request, token).await;
        let order = self.check_session(result)?;

        self.cart.clear();
        add_breadcrumb("checkout", "Placed order", Some(&[("order_id", order.id.as_str())]));
        Ok(order)
    }

    /// The logged-in user's orders.
    ///
    /// # Errors
    ///
    /// Returns an auth error without a session.
    pub async fn orders(&mut self) -> Result<Vec<Order>> {
        let token = self.session.require()?.token();
        let result = self.api.list_orders(token).await;
        self.check_session(result)
    }

    /// One of the logged-in user's orders.
    ///
    /// # Errors
    ///
    /// Returns an auth error without a session and `NotFound` for an unknown
    /// id.
    pub async fn order(&mut self, id: &OrderId) -> Result<Order> {
        let token = self.session.require()?.token();
        let result = self.api.get_order(id, token).await;
        self.check_session(result)
    }

    // =========================================================================
    // Catalog administration
    // =========================================================================

    /// Create a catalog item.
    ///
    /// # Errors
    ///
    /// Returns an auth error unless an administrator is logged in.
    pub async fn create_item(&mut self, item: &NewItem) -> Result<CatalogItem> {
        let token = self.session.require_admin()?.token();
        let result = self.api.create_item(item, token).await;
        self.check_session(result)
    }

    /// Update a catalog item.
    ///
    /// # Errors
    ///
    /// Returns an auth error unless an administrator is logged in, and
    /// `BadRequest` for an update that sets nothing.
    pub async fn update_item(&mut self, id: &ItemId, update: &ItemUpdate) -> Result<CatalogItem> {
        let token = self.session.require_admin()?.token();
        if update.is_empty() {
            return Err(AppError::BadRequest("nothing to update".to_string()));
        }
        let result = self.api.update_item(id, update, token).await;
        self.check_session(result)
    }

    /// Delete a catalog item.
    ///
    /// # Errors
    ///
    /// Returns an auth error unless an administrator is logged in.
    pub async fn delete_item(&mut self, id: &ItemId) -> Result<()> {
        let token = self.session.require_admin()?.token();
        let result = self.api.delete_item(id, token).await;
        self.check_session(result)
    }

    // =========================================================================
    // User administration
    // =========================================================================

    /// Every user account.
    ///
    /// # Errors
    ///
    /// Returns an auth error unless an administrator is logged in.
    pub async fn users(&mut self) -> Result<Vec<User>> {
        let token = self.session.require_admin()?.token();
        let result = self.api.list_users(token).await;
        self.check_session(result)
    }

    /// One user account.
    ///
    /// # Errors
    ///
    /// Returns an auth error unless an administrator is logged in.
    pub async fn user(&mut self, id: &UserId) -> Result<User> {
        let token = self.session.require_admin()?.token();
        let result = self.api.get_user(id, token).await;
        self.check_session(result)
    }

    /// Update a user account.
    ///
    /// # Errors
    ///
    /// Returns an auth error unless an administrator is logged in, and
    /// `BadRequest` for an update that sets nothing.
    pub async fn update_user(&mut self, id: &UserId, update: &UserUpdate) -> Result<User> {
        let token = self.session.require_admin()?.token();
        if update.is_empty() {
            return Err(AppError::BadRequest("nothing to update".to_string()));
        }
        let result = self.api.update_user(id, update, token).await;
        self.check_session(result)
    }

    /// Delete a user account. Deleting the logged-in account also signs out.
    ///
    /// # Errors
    ///
    /// Returns an auth error unless an administrator is logged in.
    pub async fn delete_user(&mut self, id: &UserId) -> Result<()> {
        let session = self.session.require_admin()?;
        let own_account = &session.user().id == id;
        let result = self.api.delete_user(id, session.token()).await;
        self.check_session(result)?;
        if own_account {
            self.sign_out();
        }
        Ok(())
    }

    /// Drop the session if the server rejected its token.
    fn check_session<T>(&mut self, result: std::result::Result<T, ApiError>) -> Result<T> {
        if let Err(err) = &result
            && err.is_unauthorized()
        {
            tracing::warn!("bearer token rejected, logging out");
            self.sign_out();
        }
        result.map_err(AppError::from)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use winkel_core::{AddressError, AddressField, CartLine, Email, Price, UserId};

    use super::*;
    use crate::config::ApiConfig;
    use crate::error::ErrorKind;
    use crate::persistence::StorageKey;
    use crate::session::SessionError;

    // Nothing listens here; these tests must fail before any request.
    const UNREACHABLE: &str = "http://127.0.0.1:9";

    fn user(admin: bool) -> User {
        User {
            id: UserId::parse("u-1").unwrap(),
            email: Email::parse("misty@cerulean.gym").unwrap(),
            first_name: None,
            last_name: None,
            is_active: Some(true),
            is_admin: admin,
        }
    }

    fn state_with(persistence: Persistence) -> AppState {
        let api = ApiClient::new(&ApiConfig::new(UNREACHABLE).unwrap()).unwrap();
        AppState::with_persistence(api, persistence)
    }

    fn seeded(admin: Option<bool>) -> AppState {
        let persistence = Persistence::in_memory();
        if let Some(admin) = admin {
            SessionManager::new(persistence.clone())
                .login(user(admin), "tok")
                .unwrap();
        }
        let mut cart = CartManager::new(persistence.clone());
        cart.add_item(ItemRef {
            id: ItemId::parse("pikachu").unwrap(),
            name: "Pikachu plush".to_owned(),
            price: Price::from_cents(1250).unwrap(),
            image_url: None,
        });
        state_with(persistence)
    }

    fn full_address() -> AddressForm {
        AddressForm {
            street: "Damrak".to_owned(),
            house_number: "1".to_owned(),
            postal_code: "1012 LG".to_owned(),
            city: "Amsterdam".to_owned(),
            country: String::new(),
        }
    }

    #[test]
    fn test_restores_persisted_state() {
        let state = seeded(Some(false));
        assert!(state.session().is_authenticated());
        assert_eq!(state.cart().item_count(), 1);
    }

    #[tokio::test]
    async fn test_checkout_requires_session() {
        let mut state = seeded(None);
        let err = state.checkout(&full_address()).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Checkout(CheckoutError::NotAuthenticated)
        ));
        assert_eq!(state.cart().item_count(), 1);
    }

    #[tokio::test]
    async fn test_checkout_missing_city_keeps_cart() {
        let mut state = seeded(Some(false));
        let form = AddressForm {
            city: String::new(),
            ..full_address()
        };
        let err = state.checkout(&form).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Checkout(CheckoutError::Address(AddressError::Missing(
                AddressField::City
            )))
        ));
        assert_eq!(state.cart().item_count(), 1);
    }

    #[tokio::test]
    async fn test_checkout_empty_cart() {
        let mut state = seeded(Some(false));
        state.clear_cart();
        let err = state.checkout(&full_address()).await.unwrap_err();
        assert!(matches!(err, AppError::Checkout(CheckoutError::EmptyCart)));
    }

    #[tokio::test]
    async fn test_admin_operations_rejected_locally() {
        let mut state = seeded(Some(false));
        let id = ItemId::parse("pikachu").unwrap();

        let err = state.delete_item(&id).await.unwrap_err();
        assert!(matches!(err, AppError::Session(SessionError::NotAdmin)));

        let err = state
            .update_item(&id, &ItemUpdate::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Session(SessionError::NotAdmin)));
    }

    #[tokio::test]
    async fn test_user_administration_rejected_locally() {
        let mut state = seeded(Some(false));
        let id = UserId::parse("u-2").unwrap();

        let err = state.users().await.unwrap_err();
        assert!(matches!(err, AppError::Session(SessionError::NotAdmin)));
        let err = state.delete_user(&id).await.unwrap_err();
        assert!(matches!(err, AppError::Session(SessionError::NotAdmin)));

        let mut admin = seeded(Some(true));
        let err = admin
            .update_user(&id, &UserUpdate::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_empty_update_rejected_for_admin() {
        let mut state = seeded(Some(true));
        let id = ItemId::parse("pikachu").unwrap();
        let err = state
            .update_item(&id, &ItemUpdate::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_orders_require_session() {
        let mut state = seeded(None);
        let err = state.orders().await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Session(SessionError::NotAuthenticated)
        ));
    }

    #[test]
    fn test_cart_edits() {
        let mut state = seeded(None);
        let id = ItemId::parse("pikachu").unwrap();

        state.set_cart_quantity(&id, 3).unwrap();
        assert_eq!(state.cart().item_count(), 3);

        let missing = ItemId::parse("mew").unwrap();
        assert!(matches!(
            state.set_cart_quantity(&missing, 1),
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            state.remove_from_cart(&missing),
            Err(AppError::NotFound(_))
        ));

        state.remove_from_cart(&id).unwrap();
        assert!(state.cart().is_empty());
    }

    #[test]
    fn test_oversized_quantity_is_bad_request() {
        let mut state = seeded(None);
        let id = ItemId::parse("pikachu").unwrap();

        let err = state.set_cart_quantity(&id, 5_000_000_000).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.user_message(), "quantity 5000000000 is too large");
        assert_eq!(state.cart().item_count(), 1);
    }

    #[test]
    fn test_sign_out_keeps_cart() {
        let persistence = Persistence::in_memory();
        SessionManager::new(persistence.clone())
            .login(user(false), "tok")
            .unwrap();
        let mut state = state_with(persistence.clone());
        state.clear_cart();
        state.sign_out();

        assert!(!state.session().is_authenticated());
        assert!(persistence.load::<User>(StorageKey::User).is_none());
        assert_eq!(
            persistence.load::<Vec<CartLine>>(StorageKey::Cart),
            Some(Vec::new())
        );
    }
}
