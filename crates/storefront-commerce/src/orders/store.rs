//! Durable, append-only order history.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use storefront_kv::Store;
use tokio::sync::watch;

use crate::error::CommerceError;
use crate::ids::OrderId;
use crate::money::Money;
use crate::notify::{Notification, NotificationEvent, NotificationSink, TracingSink};
use crate::orders::{Order, OrderStatus};
use crate::persist::{self, Record};

/// Which orders count towards [`OrderStore::total_spent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SpendPolicy {
    /// Only active orders count.
    #[default]
    ExcludeVoided,
    /// Every order counts, voided or not.
    IncludeVoided,
}

impl SpendPolicy {
    /// Whether `order` counts towards the total under this policy.
    pub fn counts(&self, order: &Order) -> bool {
        match self {
            SpendPolicy::ExcludeVoided => order.status == OrderStatus::Active,
            SpendPolicy::IncludeVoided => true,
        }
    }
}

/// What observers of the order history see after each change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderHistorySummary {
    pub count: usize,
    pub active: usize,
    pub total_spent: Money,
}

/// Owns the placed orders, oldest first.
pub struct OrderStore {
    orders: Vec<Order>,
    policy: SpendPolicy,
    store: Store,
    key: String,
    notifier: Arc<dyn NotificationSink>,
    summary_tx: watch::Sender<OrderHistorySummary>,
}

impl OrderStore {
    /// Load the order history persisted under `namespace`.
    ///
    /// A missing or unreadable record is an empty history.
    pub fn load(
        store: Store,
        namespace: &str,
        policy: SpendPolicy,
        notifier: Arc<dyn NotificationSink>,
    ) -> Self {
        let key = Record::Orders.key(namespace);
        let orders: Vec<Order> =
            persist::load_or_default(&store, &key, Record::Orders, notifier.as_ref());
        let (summary_tx, _) = watch::channel(summarize(&orders, policy));
        tracing::debug!(orders = orders.len(), policy = ?policy, "order history loaded");

        Self {
            orders,
            policy,
            store,
            key,
            notifier,
            summary_tx,
        }
    }

    /// An empty history backed by a throwaway in-memory store.
    pub fn ephemeral() -> Self {
        Self::load(
            Store::in_memory(),
            "ephemeral",
            SpendPolicy::default(),
            Arc::new(TracingSink),
        )
    }

    /// Record a newly placed order.
    pub fn append(&mut self, order: Order) {
        tracing::info!(order_id = %order.id, total = order.total.cents(), "order recorded");
        self.orders.push(order);
        self.commit();
    }

    /// Void the order with `id`.
    ///
    /// Returns `Ok(false)` if it was already voided. There is no way back to
    /// active.
    pub fn void(&mut self, id: &OrderId) -> Result<bool, CommerceError> {
        let order = self
            .orders
            .iter_mut()
            .find(|o| &o.id == id)
            .ok_or_else(|| CommerceError::OrderNotFound(id.to_string()))?;

        if !order.void() {
            tracing::debug!(order_id = %id, "order already voided");
            return Ok(false);
        }

        tracing::info!(order_id = %id, "order voided");
        self.commit();
        self.notifier.notify(Notification::info(
            NotificationEvent::OrderVoided,
            format!("Order {} voided", id),
        ));
        Ok(true)
    }

    /// All orders, oldest first.
    pub fn list(&self) -> &[Order] {
        &self.orders
    }

    pub fn get(&self, id: &OrderId) -> Option<&Order> {
        self.orders.iter().find(|o| &o.id == id)
    }

    /// Orders that have not been voided.
    pub fn active(&self) -> impl Iterator<Item = &Order> + '_ {
        self.orders.iter().filter(|o| o.is_active())
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn policy(&self) -> SpendPolicy {
        self.policy
    }

    /// Sum of order totals under the store's [`SpendPolicy`].
    pub fn total_spent(&self) -> Money {
        total_spent(&self.orders, self.policy)
    }

    /// Sum of order totals under an explicit policy.
    pub fn total_spent_with(&self, policy: SpendPolicy) -> Money {
        total_spent(&self.orders, policy)
    }

    pub fn summary(&self) -> OrderHistorySummary {
        summarize(&self.orders, self.policy)
    }

    /// Watch the history summary. The receiver always holds the latest value.
    pub fn subscribe(&self) -> watch::Receiver<OrderHistorySummary> {
        self.summary_tx.subscribe()
    }

    fn commit(&self) {
        persist::save(
            &self.store,
            &self.key,
            Record::Orders,
            &self.orders,
            self.notifier.as_ref(),
        );
        self.summary_tx.send_replace(self.summary());
    }
}

fn total_spent(orders: &[Order], policy: SpendPolicy) -> Money {
    orders
        .iter()
        .filter(|o| policy.counts(o))
        .map(|o| o.total)
        .sum()
}

fn summarize(orders: &[Order], policy: SpendPolicy) -> OrderHistorySummary {
    OrderHistorySummary {
        count: orders.len(),
        active: orders.iter().filter(|o| o.is_active()).count(),
        total_spent: total_spent(orders, policy),
    }
}
