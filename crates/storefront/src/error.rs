//! Unified error handling with Sentry integration.
//!
//! Every fallible storefront operation returns [`AppError`]. Views show
//! [`AppError::user_message`] as the single banner text and call
//! [`AppError::report`], which captures service failures to Sentry.

use thiserror::Error;

use winkel_core::User;

use crate::api::ApiError;
use crate::checkout::CheckoutError;
use crate::config::ConfigError;
use crate::session::SessionError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Remote API call failed.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Session precondition failed.
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Checkout was refused locally.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad input from the user.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

/// The user-facing class of an [`AppError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Not logged in, bad credentials, or not permitted.
    Auth,
    /// Input rejected locally or by the server.
    Validation,
    /// The requested resource does not exist.
    NotFound,
    /// The shop could not be reached or misbehaved.
    Service,
}

impl AppError {
    /// Classify the error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Api(err) => match err {
                ApiError::Auth { .. } => ErrorKind::Auth,
                ApiError::Validation { .. } => ErrorKind::Validation,
                ApiError::NotFound(_) => ErrorKind::NotFound,
                ApiError::Http(_) | ApiError::Api { .. } | ApiError::Parse(_) | ApiError::Url(_) => {
                    ErrorKind::Service
                }
            },
            Self::Session(SessionError::EmptyToken)
            | Self::Checkout(CheckoutError::EmptyCart | CheckoutError::Address(_))
            | Self::Config(_)
            | Self::BadRequest(_) => ErrorKind::Validation,
            Self::Session(SessionError::NotAuthenticated | SessionError::NotAdmin)
            | Self::Checkout(CheckoutError::NotAuthenticated) => ErrorKind::Auth,
            Self::NotFound(_) => ErrorKind::NotFound,
        }
    }

    /// The single message to show the user.
    ///
    /// Transport and decoding failures get a generic text; their details only
    /// go to the log and Sentry.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Api(ApiError::Http(err)) if err.is_timeout() => {
                "The shop took too long to respond. Please try again.".to_string()
            }
            Self::Api(ApiError::Http(_)) => {
                "The shop is unreachable right now. Please try again later.".to_string()
            }
            Self::Api(ApiError::Parse(_) | ApiError::Url(_)) => {
                "Something went wrong. Please try again.".to_string()
            }
            Self::Api(err) => err.detail().unwrap_or_default().to_string(),
            Self::Config(err) => err.to_string(),
            Self::Session(err) => err.to_string(),
            Self::Checkout(err) => err.to_string(),
            Self::NotFound(message) | Self::BadRequest(message) => message.clone(),
        }
    }

    /// Log the error, capturing service failures to Sentry.
    pub fn report(&self) {
        if self.kind() == ErrorKind::Service {
            let event_id = sentry::capture_error(self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Storefront error"
            );
        } else {
            tracing::debug!(error = %self, kind = ?self.kind(), "Storefront error");
        }
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context.
///
/// Call this after login to associate errors with the user.
pub fn set_sentry_user(user: &User) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user.id.to_string()),
            email: Some(user.email.to_string()),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added item", Some(&[("item_id", "123")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
