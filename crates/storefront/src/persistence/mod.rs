//! Durable key/value mirror of the session and cart.
//!
//! [`Persistence`] is the adapter the managers talk to. It encodes values as
//! JSON and hides every storage failure from its callers: writes are best
//! effort, and a value that cannot be read back is treated as never saved.
//! The raw bytes live in a [`KeyValueStore`] backend.

mod file;
mod memory;

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Errors raised by a [`KeyValueStore`] backend.
///
/// These never escape [`Persistence`]; they are logged and dropped there.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Encoding a value failed.
    #[error("encode error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// A raw textual key/value backend.
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`, or `None` if there is none.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the backend fails for a reason other than the
    /// key being absent.
    fn read(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the value could not be stored.
    fn write(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Remove `key`. Removing an absent key succeeds.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the key exists but could not be removed.
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// The keys the storefront persists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
    /// The logged-in user.
    User,
    /// The bearer token paired with the user.
    Token,
    /// The cart lines.
    Cart,
}

impl StorageKey {
    /// The key's name in the backend.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Token => "token",
            Self::Cart => "cart",
        }
    }
}

impl std::fmt::Display for StorageKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// JSON persistence adapter over a shared [`KeyValueStore`].
///
/// Cheaply cloneable; the session and cart managers each hold a handle to
/// the same backend.
#[derive(Clone)]
pub struct Persistence {
    store: Arc<dyn KeyValueStore>,
}

impl Persistence {
    /// Wrap a backend.
    pub fn new(store: impl KeyValueStore + 'static) -> Self {
        Self {
            store: Arc::new(store),
        }
    }

    /// Share an existing backend handle.
    #[must_use]
    pub fn from_shared(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// An in-memory adapter, for tests and throwaway sessions.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(MemoryStore::default())
    }

    /// Serialize `value` and store it under `key`, overwriting any previous
    /// value. Failures are logged and otherwise ignored.
    pub fn save<T>(&self, key: StorageKey, value: &T)
    where
        T: Serialize + ?Sized,
    {
        let result = serde_json::to_string(value)
            .map_err(StoreError::from)
            .and_then(|encoded| self.store.write(key.as_str(), &encoded));

        match result {
            Ok(()) => tracing::trace!(%key, "persisted"),
            Err(e) => tracing::warn!(%key, error = %e, "failed to persist value"),
        }
    }

    /// Load and decode the value under `key`.
    ///
    /// Returns `None` if the key was never saved, the backend fails, or the
    /// stored text does not decode to `T`.
    #[must_use]
    pub fn load<T>(&self, key: StorageKey) -> Option<T>
    where
        T: DeserializeOwned,
    {
        let raw = match self.store.read(key.as_str()) {
            Ok(raw) => raw?,
            Err(e) => {
                tracing::warn!(%key, error = %e, "failed to read persisted value");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(%key, error = %e, "discarding undecodable persisted value");
                None
            }
        }
    }

    /// Remove the value under `key`. Failures are logged and ignored.
    pub fn delete(&self, key: StorageKey) {
        if let Err(e) = self.store.remove(key.as_str()) {
            tracing::warn!(%key, error = %e, "failed to delete persisted value");
        }
    }

    /// Whether a raw value exists under `key`, decodable or not.
    #[must_use]
    pub fn contains(&self, key: StorageKey) -> bool {
        matches!(self.store.read(key.as_str()), Ok(Some(_)))
    }
}

impl std::fmt::Debug for Persistence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Persistence").finish_non_exhaustive()
    }
}
