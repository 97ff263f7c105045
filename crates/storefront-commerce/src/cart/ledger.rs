//! The cart ledger: line-item aggregation with variant identity.

use std::sync::Arc;

use storefront_kv::Store;
use tokio::sync::watch;

use crate::cart::{CartSummary, LineItem, LineKey};
use crate::catalog::Product;
use crate::error::CommerceError;
use crate::ids::ProductId;
use crate::money::Money;
use crate::notify::{Notification, NotificationEvent, NotificationSink, TracingSink};
use crate::persist::{self, Record};

/// Maximum quantity allowed per line item.
pub const MAX_QUANTITY_PER_ITEM: i64 = 9999;

/// Owns the shopper's line items and persists them after every change.
pub struct CartLedger {
    items: Vec<LineItem>,
    store: Store,
    key: String,
    notifier: Arc<dyn NotificationSink>,
    summary_tx: watch::Sender<CartSummary>,
}

impl CartLedger {
    /// Load the cart persisted under `namespace`.
    ///
    /// A missing record is an empty cart. An unreadable record is also an
    /// empty cart; the sink hears about it.
    pub fn load(store: Store, namespace: &str, notifier: Arc<dyn NotificationSink>) -> Self {
        let key = Record::Cart.key(namespace);
        let stored: Vec<LineItem> =
            persist::load_or_default(&store, &key, Record::Cart, notifier.as_ref());
        let items = normalize(stored);

        let (summary_tx, _) = watch::channel(summarize(&items));
        tracing::debug!(items = items.len(), "cart loaded");

        Self {
            items,
            store,
            key,
            notifier,
            summary_tx,
        }
    }

    /// An empty cart backed by a throwaway in-memory store.
    pub fn ephemeral() -> Self {
        Self::load(Store::in_memory(), "ephemeral", Arc::new(TracingSink))
    }

    /// Add `quantity` of `product` with the chosen variant.
    ///
    /// Merges into an existing line with the same identity key. Returns the
    /// key of the affected line.
    ///
    /// Returns an error if:
    /// - Quantity is not positive
    /// - The resulting quantity would exceed MAX_QUANTITY_PER_ITEM
    /// - The line total would overflow
    pub fn add(
        &mut self,
        product: &Product,
        quantity: i64,
        color: Option<&str>,
        size: Option<&str>,
    ) -> Result<LineKey, CommerceError> {
        if quantity <= 0 {
            return Err(CommerceError::InvalidQuantity(quantity));
        }

        let key = match self.position(&product.id, color, size) {
            Some(idx) => {
                let existing = &mut self.items[idx];
                let new_quantity = existing
                    .quantity
                    .checked_add(quantity)
                    .ok_or(CommerceError::Overflow)?;
                check_quantity(new_quantity)?;
                existing
                    .unit_price
                    .checked_mul(new_quantity)
                    .ok_or(CommerceError::Overflow)?;
                existing.quantity = new_quantity;
                existing.key()
            }
            None => {
                check_quantity(quantity)?;
                let item = LineItem::new(product, quantity, color, size);
                item.line_total().ok_or(CommerceError::Overflow)?;
                let key = item.key();
                self.items.push(item);
                key
            }
        };

        tracing::debug!(product_id = %product.id, quantity, "added to cart");
        self.commit();
        self.announce(format!("Added {} to cart", product.name));
        Ok(key)
    }

    /// Remove the line with the given identity.
    ///
    /// Removing a line that isn't there is a no-op and returns `false`.
    pub fn remove(&mut self, product_id: &ProductId, color: Option<&str>, size: Option<&str>) -> bool {
        let Some(idx) = self.position(product_id, color, size) else {
            return false;
        };
        let item = self.items.remove(idx);
        tracing::debug!(product_id = %product_id, "removed from cart");
        self.commit();
        self.announce(format!("Removed {} from cart", item.name));
        true
    }

    /// Replace the quantity of a line.
    ///
    /// A quantity of zero or less removes the line. Returns whether a line
    /// matched; a missing line is a no-op whatever the quantity.
    pub fn update_quantity(
        &mut self,
        product_id: &ProductId,
        quantity: i64,
        color: Option<&str>,
        size: Option<&str>,
    ) -> Result<bool, CommerceError> {
        let Some(idx) = self.position(product_id, color, size) else {
            return Ok(false);
        };
        if quantity <= 0 {
            return Ok(self.remove(product_id, color, size));
        }
        check_quantity(quantity)?;

        let item = &mut self.items[idx];
        item.unit_price
            .checked_mul(quantity)
            .ok_or(CommerceError::Overflow)?;
        item.quantity = quantity;
        let message = format!("{} quantity set to {}", item.name, quantity);

        tracing::debug!(product_id = %product_id, quantity, "cart quantity updated");
        self.commit();
        self.announce(message);
        Ok(true)
    }

    /// Remove every line. Clearing an empty cart changes nothing.
    pub fn clear(&mut self) {
        if self.items.is_empty() {
            return;
        }
        self.empty();
        self.announce("Cart cleared".to_string());
    }

    /// Empty the cart after an order was placed from it.
    ///
    /// Silent: the order's own notification covers the change.
    pub(crate) fn settle(&mut self) {
        self.empty();
    }

    fn empty(&mut self) {
        self.items.clear();
        tracing::debug!("cart cleared");
        self.commit();
    }

    /// `sum(unit_price * quantity)` over all lines, computed fresh.
    pub fn subtotal(&self) -> Money {
        subtotal_of(&self.items)
    }

    /// Current lines, in insertion order.
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// Look up a line by identity key.
    pub fn get(&self, key: &LineKey) -> Option<&LineItem> {
        self.position(&key.product_id, key.color.as_deref(), key.size.as_deref())
            .map(|idx| &self.items[idx])
    }

    /// Get total item count (sum of quantities).
    pub fn item_count(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// Get number of unique lines.
    pub fn unique_item_count(&self) -> usize {
        self.items.len()
    }

    /// Check if cart is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Current summary.
    pub fn summary(&self) -> CartSummary {
        summarize(&self.items)
    }

    /// Watch the cart summary. The receiver always holds the latest value.
    pub fn subscribe(&self) -> watch::Receiver<CartSummary> {
        self.summary_tx.subscribe()
    }

    fn position(&self, product_id: &ProductId, color: Option<&str>, size: Option<&str>) -> Option<usize> {
        self.items
            .iter()
            .position(|i| i.matches(product_id, color, size))
    }

    fn announce(&self, message: String) {
        self.notifier
            .notify(Notification::success(NotificationEvent::CartUpdated, message));
    }

    /// Persist and publish the current state.
    fn commit(&self) {
        persist::save(
            &self.store,
            &self.key,
            Record::Cart,
            &self.items,
            self.notifier.as_ref(),
        );
        self.summary_tx.send_replace(self.summary());
    }
}

fn check_quantity(quantity: i64) -> Result<(), CommerceError> {
    if quantity > MAX_QUANTITY_PER_ITEM {
        return Err(CommerceError::QuantityExceedsLimit(
            quantity,
            MAX_QUANTITY_PER_ITEM,
        ));
    }
    Ok(())
}

fn subtotal_of(items: &[LineItem]) -> Money {
    items
        .iter()
        .map(|i| Money::from_cents(i.unit_price.cents().saturating_mul(i.quantity)))
        .sum()
}

fn summarize(items: &[LineItem]) -> CartSummary {
    CartSummary {
        item_count: items.iter().map(|i| i.quantity).sum(),
        unique_items: items.len(),
        subtotal: subtotal_of(items),
    }
}

/// Repair a persisted collection: drop non-positive quantities and merge
/// lines that share an identity key.
fn normalize(stored: Vec<LineItem>) -> Vec<LineItem> {
    let mut items: Vec<LineItem> = Vec::with_capacity(stored.len());
    for item in stored {
        if item.quantity <= 0 {
            tracing::warn!(product_id = %item.product_id, "dropping stored line with no quantity");
            continue;
        }
        let key = item.key();
        match items.iter_mut().find(|i| i.key() == key) {
            Some(existing) => {
                existing.quantity = existing
                    .quantity
                    .saturating_add(item.quantity)
                    .min(MAX_QUANTITY_PER_ITEM);
            }
            None => {
                let mut item = item;
                item.quantity = item.quantity.min(MAX_QUANTITY_PER_ITEM);
                items.push(item);
            }
        }
    }
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::MemorySink;

    fn shoe() -> Product {
        Product::new("P1", "Runner", Money::from_cents(10000), "shoes")
            .with_colors(["Black", "White"])
    }

    fn mug() -> Product {
        Product::new("P2", "Mug", Money::from_cents(1250), "kitchen")
    }

    #[test]
    fn test_add_same_key_merges() {
        let mut cart = CartLedger::ephemeral();
        cart.add(&shoe(), 1, Some("Black"), None).unwrap();
        cart.add(&shoe(), 2, Some("Black"), None).unwrap();

        assert_eq!(cart.unique_item_count(), 1);
        assert_eq!(cart.items()[0].quantity, 3);
        assert_eq!(cart.subtotal(), Money::from_cents(30000));
    }

    #[test]
    fn test_merge_invariant_over_many_adds() {
        let mut cart = CartLedger::ephemeral();
        let quantities = [1, 4, 2, 7, 1];
        for q in quantities {
            cart.add(&shoe(), q, Some("White"), Some("10")).unwrap();
        }

        assert_eq!(cart.unique_item_count(), 1);
        assert_eq!(cart.item_count(), quantities.iter().sum::<i64>());
    }

    #[test]
    fn test_different_variants_are_separate_lines() {
        let mut cart = CartLedger::ephemeral();
        cart.add(&shoe(), 1, Some("Black"), None).unwrap();
        cart.add(&shoe(), 1, Some("White"), None).unwrap();
        cart.add(&shoe(), 1, None, None).unwrap();

        assert_eq!(cart.unique_item_count(), 3);
    }

    #[test]
    fn test_add_rejects_non_positive_quantity() {
        let mut cart = CartLedger::ephemeral();
        assert_eq!(
            cart.add(&mug(), 0, None, None),
            Err(CommerceError::InvalidQuantity(0))
        );
        assert!(cart.add(&mug(), -3, None, None).is_err());
        assert!(cart.is_empty());
    }

    #[test]
    fn test_add_over_limit_leaves_ledger_unchanged() {
        let mut cart = CartLedger::ephemeral();
        cart.add(&mug(), MAX_QUANTITY_PER_ITEM, None, None).unwrap();

        let result = cart.add(&mug(), 1, None, None);
        assert!(matches!(result, Err(CommerceError::QuantityExceedsLimit(..))));
        assert_eq!(cart.item_count(), MAX_QUANTITY_PER_ITEM);
    }

    #[test]
    fn test_remove_missing_is_noop() {
        let mut cart = CartLedger::ephemeral();
        cart.add(&mug(), 1, None, None).unwrap();

        assert!(!cart.remove(&ProductId::new("nope"), None, None));
        assert!(!cart.remove(&ProductId::new("P2"), Some("Red"), None));
        assert_eq!(cart.unique_item_count(), 1);
    }

    #[test]
    fn test_update_quantity_zero_equals_remove() {
        let mut a = CartLedger::ephemeral();
        let mut b = CartLedger::ephemeral();
        for cart in [&mut a, &mut b] {
            cart.add(&shoe(), 2, Some("Black"), None).unwrap();
            cart.add(&mug(), 1, None, None).unwrap();
        }

        assert!(a.update_quantity(&ProductId::new("P1"), 0, Some("Black"), None).unwrap());
        assert!(b.remove(&ProductId::new("P1"), Some("Black"), None));

        assert_eq!(a.items(), b.items());
        assert_eq!(a.subtotal(), Money::from_cents(1250));
    }

    #[test]
    fn test_update_quantity_replaces() {
        let mut cart = CartLedger::ephemeral();
        cart.add(&mug(), 1, None, None).unwrap();

        assert!(cart.update_quantity(&ProductId::new("P2"), 5, None, None).unwrap());
        assert_eq!(cart.subtotal(), Money::from_cents(6250));
        assert!(!cart.update_quantity(&ProductId::new("P9"), 5, None, None).unwrap());
    }

    #[test]
    fn test_subtotal_tracks_every_change() {
        let mut cart = CartLedger::ephemeral();
        assert_eq!(cart.subtotal(), Money::zero());

        cart.add(&shoe(), 2, Some("Black"), None).unwrap();
        cart.add(&mug(), 3, None, None).unwrap();
        assert_eq!(cart.subtotal(), Money::from_cents(2 * 10000 + 3 * 1250));

        cart.remove(&ProductId::new("P1"), Some("Black"), None);
        assert_eq!(cart.subtotal(), Money::from_cents(3 * 1250));

        cart.clear();
        assert_eq!(cart.subtotal(), Money::zero());
        assert!(cart.is_empty());
    }

    #[test]
    fn test_cart_persists_and_reloads() {
        let store = Store::in_memory();
        let sink = Arc::new(MemorySink::new());
        {
            let mut cart = CartLedger::load(store.clone(), "shop", sink.clone());
            cart.add(&shoe(), 2, Some("Black"), Some("10")).unwrap();
        }

        let reloaded = CartLedger::load(store, "shop", sink);
        assert_eq!(reloaded.item_count(), 2);
        assert_eq!(
            reloaded.get(&LineKey::new("P1", Some("Black"), Some("10"))).map(|i| i.quantity),
            Some(2)
        );
    }

    #[test]
    fn test_corrupt_cart_loads_empty() {
        let store = Store::in_memory();
        store.set_raw("shop:cart", b"{\"oops\":").unwrap();
        let sink = Arc::new(MemorySink::new());

        let cart = CartLedger::load(store, "shop", sink.clone());
        assert!(cart.is_empty());
        assert_eq!(sink.events(), vec![NotificationEvent::PersistenceCorruption]);
    }

    #[test]
    fn test_stored_duplicates_are_merged_on_load() {
        let store = Store::in_memory();
        let line = LineItem::new(&mug(), 2, None, None);
        let mut zero = line.clone();
        zero.quantity = 0;
        store.set("shop:cart", &vec![line.clone(), line, zero]).unwrap();

        let cart = CartLedger::load(store, "shop", Arc::new(TracingSink));
        assert_eq!(cart.unique_item_count(), 1);
        assert_eq!(cart.item_count(), 4);
    }

    #[test]
    fn test_subscribers_see_latest_summary() {
        let mut cart = CartLedger::ephemeral();
        let rx = cart.subscribe();
        cart.add(&mug(), 2, None, None).unwrap();

        let summary = *rx.borrow();
        assert_eq!(summary.item_count, 2);
        assert_eq!(summary.subtotal, Money::from_cents(2500));
    }

    #[test]
    fn test_every_mutation_persists() {
        let store = Store::in_memory();
        let reload = || CartLedger::load(store.clone(), "shop", Arc::new(TracingSink));

        let mut cart = reload();
        cart.add(&shoe(), 2, Some("Black"), None).unwrap();
        cart.add(&mug(), 1, None, None).unwrap();

        assert!(cart.update_quantity(&ProductId::new("P2"), 4, None, None).unwrap());
        let saved = reload();
        assert_eq!(saved.items(), cart.items());
        assert_eq!(saved.subtotal(), Money::from_cents(2 * 10000 + 4 * 1250));

        assert!(cart.remove(&ProductId::new("P1"), Some("Black"), None));
        let saved = reload();
        assert_eq!(saved.unique_item_count(), 1);
        assert_eq!(saved.item_count(), 4);

        cart.clear();
        assert!(reload().is_empty());
    }

    #[test]
    fn test_update_missing_line_is_noop_at_any_quantity() {
        let mut cart = CartLedger::ephemeral();
        cart.add(&mug(), 1, None, None).unwrap();

        let ghost = ProductId::new("ghost");
        assert_eq!(cart.update_quantity(&ghost, MAX_QUANTITY_PER_ITEM + 1, None, None), Ok(false));
        assert_eq!(cart.update_quantity(&ghost, 0, None, None), Ok(false));
        assert_eq!(cart.item_count(), 1);
    }

    #[test]
    fn test_update_existing_line_over_limit_fails() {
        let mut cart = CartLedger::ephemeral();
        cart.add(&mug(), 1, None, None).unwrap();

        let result = cart.update_quantity(&ProductId::new("P2"), MAX_QUANTITY_PER_ITEM + 1, None, None);
        assert!(matches!(result, Err(CommerceError::QuantityExceedsLimit(..))));
        assert_eq!(cart.item_count(), 1);
    }

    #[test]
    fn test_every_change_notifies() {
        let sink = Arc::new(MemorySink::new());
        let mut cart = CartLedger::load(Store::in_memory(), "shop", sink.clone());

        cart.add(&mug(), 1, None, None).unwrap();
        cart.update_quantity(&ProductId::new("P2"), 3, None, None).unwrap();
        cart.remove(&ProductId::new("P2"), None, None);
        cart.add(&mug(), 1, None, None).unwrap();
        cart.clear();
        assert_eq!(sink.events(), vec![NotificationEvent::CartUpdated; 5]);

        // No-ops stay quiet.
        cart.clear();
        cart.remove(&ProductId::new("P2"), None, None);
        cart.update_quantity(&ProductId::new("P2"), 2, None, None).unwrap();
        assert_eq!(sink.events().len(), 5);
    }

    #[test]
    fn test_settle_is_silent() {
        let sink = Arc::new(MemorySink::new());
        let store = Store::in_memory();
        let mut cart = CartLedger::load(store.clone(), "shop", sink.clone());
        cart.add(&mug(), 2, None, None).unwrap();

        cart.settle();
        assert!(cart.is_empty());
        assert!(CartLedger::load(store, "shop", Arc::new(TracingSink)).is_empty());
        assert_eq!(sink.events(), vec![NotificationEvent::CartUpdated]);
    }
}
