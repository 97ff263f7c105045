//! Type-safe key-value persistence for the storefront core.
//!
//! Provides a simple, ergonomic API for keeping records in a key-value store
//! with automatic JSON serialization. The backend is pluggable: tests use
//! [`MemoryBackend`], the command-line front end uses [`FileBackend`].
//!
//! # Example
//!
//! ```rust,ignore
//! use storefront_kv::{cache_key, Store};
//!
//! let store = Store::open_dir(".shop")?;
//! let key = cache_key!("shop", "cart");
//!
//! // Store a value
//! store.set(&key, &items)?;
//!
//! // Retrieve a value
//! let items: Option<Vec<LineItem>> = store.get(&key)?;
//!
//! // Delete a value
//! store.delete(&key)?;
//! ```

mod backend;
mod error;
mod kv;

pub use backend::{FileBackend, KvBackend, MemoryBackend};
pub use error::CacheError;
pub use kv::Store;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{cache_key, CacheError, FileBackend, KvBackend, MemoryBackend, Store};
}
