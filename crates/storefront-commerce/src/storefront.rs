//! Wires the stores and the checkout together.

use std::sync::Arc;

use storefront_kv::Store;
use tokio::sync::Mutex;

use crate::cart::CartLedger;
use crate::checkout::{CheckoutService, PaymentGateway, SavedDetailsStore, SimulatedGateway};
use crate::config::StorefrontConfig;
use crate::currency::CurrencyFormatter;
use crate::error::CommerceError;
use crate::money::Money;
use crate::notify::NotificationSink;
use crate::orders::OrderStore;
use crate::preferences::PreferencesStore;

/// Every store, created once and shared by the front end.
pub struct Storefront {
    config: StorefrontConfig,
    formatter: CurrencyFormatter,
    preferences: PreferencesStore,
    checkout: CheckoutService,
}

impl Storefront {
    /// Open the file-backed store named by `config.storage`.
    pub fn open(
        config: StorefrontConfig,
        notifier: Arc<dyn NotificationSink>,
    ) -> Result<Self, CommerceError> {
        let store = Store::open_dir(&config.storage.dir)?;
        tracing::debug!(dir = %config.storage.dir.display(), "storefront opened");
        Ok(Self::with_store(
            store,
            config,
            notifier,
            Arc::new(SimulatedGateway::new()),
        ))
    }

    /// Build on an existing store and payment collaborator.
    pub fn with_store(
        store: Store,
        config: StorefrontConfig,
        notifier: Arc<dyn NotificationSink>,
        gateway: Arc<dyn PaymentGateway>,
    ) -> Self {
        let namespace = config.storage.namespace.as_str();

        let preferences = PreferencesStore::load(store.clone(), namespace, notifier.clone());
        let cart = CartLedger::load(store.clone(), namespace, notifier.clone());
        let orders = OrderStore::load(
            store.clone(),
            namespace,
            config.orders.spend_policy,
            notifier.clone(),
        );
        let saved = SavedDetailsStore::new(store, namespace, notifier.clone());

        let checkout = CheckoutService::new(
            Arc::new(Mutex::new(cart)),
            Arc::new(Mutex::new(orders)),
            saved,
            gateway,
            config.promotion_engine(),
            notifier,
        )
        .with_processing_delay(config.processing_delay());

        Self {
            formatter: config.currency_formatter(),
            config,
            preferences,
            checkout,
        }
    }

    pub fn config(&self) -> &StorefrontConfig {
        &self.config
    }

    pub fn formatter(&self) -> &CurrencyFormatter {
        &self.formatter
    }

    pub fn preferences(&self) -> &PreferencesStore {
        &self.preferences
    }

    pub fn preferences_mut(&mut self) -> &mut PreferencesStore {
        &mut self.preferences
    }

    pub fn checkout(&self) -> &CheckoutService {
        &self.checkout
    }

    pub fn cart(&self) -> Arc<Mutex<CartLedger>> {
        self.checkout.cart()
    }

    pub fn orders(&self) -> Arc<Mutex<OrderStore>> {
        self.checkout.orders()
    }

    /// Render `amount` in the shopper's preferred currency.
    pub fn display_price(&self, amount: Money) -> String {
        self.formatter
            .format_in(amount, self.preferences.get().currency)
    }
}
