//! Loading and saving the durable records.
//!
//! Loads never fail: a missing record yields the default, an unreadable one
//! yields the default plus a `PersistenceCorruption` notification. Saves
//! that fail are logged and reported, and the in-memory state stays
//! authoritative until the next successful write.

use serde::{de::DeserializeOwned, Serialize};
use storefront_kv::{cache_key, Store};

use crate::notify::{Notification, NotificationEvent, NotificationSink};

/// The four records the storefront keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Record {
    Cart,
    Preferences,
    CheckoutDetails,
    Orders,
}

impl Record {
    pub fn as_str(&self) -> &'static str {
        match self {
            Record::Cart => "cart",
            Record::Preferences => "preferences",
            Record::CheckoutDetails => "checkout_details",
            Record::Orders => "orders",
        }
    }

    /// Store key for this record under `namespace`.
    pub fn key(&self, namespace: &str) -> String {
        cache_key!(namespace, self.as_str())
    }
}

/// Read `record`, substituting `T::default()` when it is absent or unreadable.
pub(crate) fn load_or_default<T>(
    store: &Store,
    key: &str,
    record: Record,
    notifier: &dyn NotificationSink,
) -> T
where
    T: DeserializeOwned + Default,
{
    match store.get::<T>(key) {
        Ok(Some(value)) => value,
        Ok(None) => T::default(),
        Err(e) if e.is_corruption() => {
            tracing::warn!(record = record.as_str(), error = %e, "discarding unreadable record");
            notifier.notify(Notification::error(
                NotificationEvent::PersistenceCorruption,
                format!("Saved {} could not be read and was reset", record.as_str()),
            ));
            T::default()
        }
        Err(e) => {
            tracing::warn!(record = record.as_str(), error = %e, "failed to read record");
            notifier.notify(Notification::error(
                NotificationEvent::PersistenceFailed,
                format!("Could not load saved {}", record.as_str()),
            ));
            T::default()
        }
    }
}

/// Write `value` to `record`. Returns whether the write succeeded.
pub(crate) fn save<T>(
    store: &Store,
    key: &str,
    record: Record,
    value: &T,
    notifier: &dyn NotificationSink,
) -> bool
where
    T: Serialize + ?Sized,
{
    match store.set(key, value) {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(record = record.as_str(), error = %e, "failed to persist record");
            notifier.notify(Notification::error(
                NotificationEvent::PersistenceFailed,
                format!("Could not save {}", record.as_str()),
            ));
            false
        }
    }
}

/// Remove `record`.
pub(crate) fn remove(store: &Store, key: &str, record: Record, notifier: &dyn NotificationSink) {
    if let Err(e) = store.delete(key) {
        tracing::warn!(record = record.as_str(), error = %e, "failed to remove record");
        notifier.notify(Notification::error(
            NotificationEvent::PersistenceFailed,
            format!("Could not clear {}", record.as_str()),
        ));
    }
}
