//! Typed key-value store with automatic serialization.

use std::fmt;
use std::sync::Arc;

use crate::{CacheError, FileBackend, KvBackend, MemoryBackend};
use serde::{de::DeserializeOwned, Serialize};

/// Type-safe store over a [`KvBackend`].
///
/// Provides automatic JSON serialization for any type that implements
/// `Serialize` and `DeserializeOwned`. Cloning is cheap and clones share the
/// same backend.
#[derive(Clone)]
pub struct Store {
    backend: Arc<dyn KvBackend>,
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store").finish_non_exhaustive()
    }
}

impl Store {
    /// Wrap an existing backend.
    pub fn new(backend: Arc<dyn KvBackend>) -> Self {
        Self { backend }
    }

    /// Open a fresh in-memory store.
    ///
    /// # Example
    ///
    /// ```
    /// let store = storefront_kv::Store::in_memory();
    /// store.set("greeting", &"hello").unwrap();
    /// let value: Option<String> = store.get("greeting").unwrap();
    /// assert_eq!(value.as_deref(), Some("hello"));
    /// ```
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryBackend::new()))
    }

    /// Open a file-backed store rooted at `dir`.
    ///
    /// ```rust,ignore
    /// let store = Store::open_dir(".shop")?;
    /// ```
    pub fn open_dir(dir: impl AsRef<std::path::Path>) -> Result<Self, CacheError> {
        Ok(Self::new(Arc::new(FileBackend::open(dir)?)))
    }

    /// Get a value from the store.
    ///
    /// Returns `None` if the key doesn't exist and a
    /// [`CacheError::SerializeError`] if the stored bytes don't decode as `T`.
    ///
    /// ```rust,ignore
    /// let cart: Option<Vec<LineItem>> = store.get("shop:cart")?;
    /// ```
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CacheError> {
        match self.backend.get(key)? {
            Some(bytes) => {
                let value: T = serde_json::from_slice(&bytes)?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    /// Set a value in the store.
    ///
    /// ```rust,ignore
    /// store.set("shop:cart", &items)?;
    /// ```
    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), CacheError> {
        let bytes = serde_json::to_vec(value)?;
        self.backend.set(key, &bytes)
    }

    /// Store raw bytes without serialization.
    pub fn set_raw(&self, key: &str, bytes: &[u8]) -> Result<(), CacheError> {
        self.backend.set(key, bytes)
    }

    /// Delete a value from the store.
    pub fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.backend.delete(key)
    }

    /// Check if a key exists in the store.
    pub fn exists(&self, key: &str) -> Result<bool, CacheError> {
        self.backend.exists(key)
    }

    /// Get all keys in the store.
    pub fn keys(&self) -> Result<Vec<String>, CacheError> {
        self.backend.keys()
    }
}

/// Helper to build store keys with namespacing.
///
/// # Example
///
/// ```
/// let key = storefront_kv::cache_key!("shop", "cart");
/// assert_eq!(key, "shop:cart");
/// ```
#[macro_export]
macro_rules! cache_key {
    ($prefix:expr, $($part:expr),+) => {{
        let mut key = String::from($prefix);
        $(
            key.push(':');
            key.push_str(&$part.to_string());
        )+
        key
    }};
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Record {
        name: String,
        count: u32,
    }

    #[test]
    fn test_typed_roundtrip() {
        let store = Store::in_memory();
        let record = Record {
            name: "widget".to_string(),
            count: 3,
        };
        store.set("rec", &record).unwrap();

        let loaded: Option<Record> = store.get("rec").unwrap();
        assert_eq!(loaded, Some(record));
    }

    #[test]
    fn test_missing_key_is_none() {
        let store = Store::in_memory();
        let loaded: Option<Record> = store.get("absent").unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_corrupt_value_is_serialize_error() {
        let store = Store::in_memory();
        store.set_raw("rec", b"{not json").unwrap();

        let err = store.get::<Record>("rec").unwrap_err();
        assert!(err.is_corruption());
    }

    #[test]
    fn test_clones_share_backend() {
        let store = Store::in_memory();
        let other = store.clone();
        store.set("k", &1u8).unwrap();
        assert!(other.exists("k").unwrap());
    }

    #[test]
    fn test_cache_key_macro() {
        let ns = "store";
        assert_eq!(cache_key!(ns, "orders"), "store:orders");
        assert_eq!(cache_key!("a", 1, "b"), "a:1:b");
    }
}
