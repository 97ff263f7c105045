//! Shipping details remembered between checkouts.

use std::sync::Arc;

use storefront_kv::Store;

use crate::checkout::ShippingDetails;
use crate::notify::NotificationSink;
use crate::persist::{self, Record};

/// The `checkout_details` record.
pub struct SavedDetailsStore {
    store: Store,
    key: String,
    notifier: Arc<dyn NotificationSink>,
}

impl SavedDetailsStore {
    pub fn new(store: Store, namespace: &str, notifier: Arc<dyn NotificationSink>) -> Self {
        Self {
            store,
            key: Record::CheckoutDetails.key(namespace),
            notifier,
        }
    }

    /// Saved details, if any were kept and are readable.
    pub fn load(&self) -> Option<ShippingDetails> {
        persist::load_or_default::<Option<ShippingDetails>>(
            &self.store,
            &self.key,
            Record::CheckoutDetails,
            self.notifier.as_ref(),
        )
    }

    pub fn save(&self, details: &ShippingDetails) -> bool {
        persist::save(
            &self.store,
            &self.key,
            Record::CheckoutDetails,
            details,
            self.notifier.as_ref(),
        )
    }

    pub fn clear(&self) {
        persist::remove(
            &self.store,
            &self.key,
            Record::CheckoutDetails,
            self.notifier.as_ref(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::{MemorySink, NotificationEvent};

    #[test]
    fn test_save_load_clear() {
        let sink = Arc::new(MemorySink::new());
        let saved = SavedDetailsStore::new(Store::in_memory(), "shop", sink.clone());
        assert!(saved.load().is_none());

        let details = ShippingDetails::new("Ada", "12 Way").with_city("London");
        assert!(saved.save(&details));
        assert_eq!(saved.load(), Some(details));

        saved.clear();
        assert!(saved.load().is_none());
        assert!(sink.events().is_empty());
    }

    #[test]
    fn test_corrupt_details_are_forgotten() {
        let store = Store::in_memory();
        store.set_raw("shop:checkout_details", b"\"not an object\"").unwrap();
        let sink = Arc::new(MemorySink::new());

        let saved = SavedDetailsStore::new(store, "shop", sink.clone());
        assert!(saved.load().is_none());
        assert_eq!(sink.events(), vec![NotificationEvent::PersistenceCorruption]);
    }
}
