//! Async checkout driver.
//!
//! Locks are always taken in the order flow, cart, orders, and none is held
//! across the gateway call or the processing delay.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;

use crate::cart::{AppliedPromotion, CartLedger, CartPricing, PromotionEngine};
use crate::checkout::{
    CheckoutFlow, CheckoutStep, ConfirmTicket, PaymentGateway, PaymentMethod, PaymentSelection,
    SavedDetailsStore, ShippingDetails,
};
use crate::error::CommerceError;
use crate::notify::{Notification, NotificationEvent, NotificationSink};
use crate::orders::{Order, OrderStore};

/// Runs a checkout against the shared cart and order history.
pub struct CheckoutService {
    flow: Mutex<CheckoutFlow>,
    cart: Arc<Mutex<CartLedger>>,
    orders: Arc<Mutex<OrderStore>>,
    saved: SavedDetailsStore,
    gateway: Arc<dyn PaymentGateway>,
    promotions: PromotionEngine,
    notifier: Arc<dyn NotificationSink>,
    processing_delay: Duration,
}

impl CheckoutService {
    /// Create a service. The flow is prefilled from saved details when present.
    pub fn new(
        cart: Arc<Mutex<CartLedger>>,
        orders: Arc<Mutex<OrderStore>>,
        saved: SavedDetailsStore,
        gateway: Arc<dyn PaymentGateway>,
        promotions: PromotionEngine,
        notifier: Arc<dyn NotificationSink>,
    ) -> Self {
        let mut flow = CheckoutFlow::new();
        if let Some(details) = saved.load() {
            flow.prefill(details);
        }

        Self {
            flow: Mutex::new(flow),
            cart,
            orders,
            saved,
            gateway,
            promotions,
            notifier,
            processing_delay: Duration::ZERO,
        }
    }

    /// Wait this long after tokenization before committing.
    pub fn with_processing_delay(mut self, delay: Duration) -> Self {
        self.processing_delay = delay;
        self
    }

    pub fn cart(&self) -> Arc<Mutex<CartLedger>> {
        Arc::clone(&self.cart)
    }

    pub fn orders(&self) -> Arc<Mutex<OrderStore>> {
        Arc::clone(&self.orders)
    }

    pub fn promotions(&self) -> &PromotionEngine {
        &self.promotions
    }

    pub async fn step(&self) -> CheckoutStep {
        self.flow.lock().await.step()
    }

    /// Snapshot of the flow.
    pub async fn flow(&self) -> CheckoutFlow {
        self.flow.lock().await.clone()
    }

    /// Current subtotal, discount and total.
    pub async fn pricing(&self) -> CartPricing {
        let flow = self.flow.lock().await;
        let subtotal = self.cart.lock().await.subtotal();
        CartPricing::new(subtotal, flow.promotion().discount())
    }

    pub async fn submit_shipping(&self, details: ShippingDetails) -> Result<(), CommerceError> {
        let result = self.flow.lock().await.submit_shipping(details);
        if let Err(e) = &result {
            self.report_failure(e);
        }
        result
    }

    pub async fn back_to_shipping(&self) -> Result<(), CommerceError> {
        self.flow.lock().await.back_to_shipping()
    }

    /// Apply `code` against the current cart subtotal.
    pub async fn apply_promotion(&self, code: &str) -> Result<AppliedPromotion, CommerceError> {
        let mut flow = self.flow.lock().await;
        let subtotal = self.cart.lock().await.subtotal();

        match flow.apply_promotion(&self.promotions, code, subtotal) {
            Ok(applied) => {
                self.notifier.notify(Notification::success(
                    NotificationEvent::PromoApplied,
                    format!("Promo code {} applied", applied.code),
                ));
                Ok(applied.clone())
            }
            Err(e) => {
                self.report_failure(&e);
                Err(e)
            }
        }
    }

    pub async fn remove_promotion(&self) -> Option<AppliedPromotion> {
        let removed = self.flow.lock().await.remove_promotion();
        if let Some(promotion) = &removed {
            self.notifier.notify(Notification::info(
                NotificationEvent::PromoRemoved,
                format!("Promo code {} removed", promotion.code),
            ));
        }
        removed
    }

    /// Re-evaluate the active promotion after the cart changed.
    pub async fn refresh_promotion(&self) {
        let mut flow = self.flow.lock().await;
        let subtotal = self.cart.lock().await.subtotal();
        flow.refresh_promotion(&self.promotions, subtotal);
    }

    /// Leave the checkout. A confirmation in flight will not place an order.
    pub async fn abandon(&self) {
        let mut flow = self.flow.lock().await;
        tracing::info!(step = flow.step().as_str(), "checkout abandoned");
        flow.abandon();
    }

    /// Start a fresh flow, prefilled from saved details.
    pub async fn reset(&self) {
        let mut flow = self.flow.lock().await;
        flow.reset();
        if let Some(details) = self.saved.load() {
            flow.prefill(details);
        }
    }

    /// Place the order.
    ///
    /// Emits exactly one notification: `OrderPlaced` on success, otherwise
    /// the event matching the failure.
    pub async fn confirm(
        &self,
        selection: Option<PaymentSelection>,
        save_details: bool,
    ) -> Result<Order, CommerceError> {
        let result = self.place_order(selection, save_details).await;
        match &result {
            Ok(order) => {
                self.notifier.notify(Notification::success(
                    NotificationEvent::OrderPlaced,
                    format!("Order {} placed", order.id),
                ));
            }
            Err(e) => self.report_failure(e),
        }
        result
    }

    async fn place_order(
        &self,
        selection: Option<PaymentSelection>,
        save_details: bool,
    ) -> Result<Order, CommerceError> {
        let (ticket, selection) = self.begin(selection).await?;

        let payment = match selection {
            PaymentSelection::Card(card) => {
                let billing = ticket.shipping.billing();
                match self.gateway.tokenize(&billing, &card).await {
                    Ok(token) => PaymentMethod::card(token, &card),
                    Err(failure) => {
                        let mut flow = self.flow.lock().await;
                        if !flow.is_current(&ticket) {
                            return Err(CommerceError::CheckoutAbandoned);
                        }
                        tracing::warn!(reason = failure.reason(), "card tokenization failed");
                        flow.fail_confirmation(&ticket);
                        return Err(failure.into());
                    }
                }
            }
            PaymentSelection::Upi { upi_id } => PaymentMethod::Upi {
                upi_id: upi_id.trim().to_string(),
            },
        };

        if !self.processing_delay.is_zero() {
            tokio::time::sleep(self.processing_delay).await;
        }

        self.commit(ticket, payment, save_details).await
    }

    /// Guard checks, then enter `Processing`.
    async fn begin(
        &self,
        selection: Option<PaymentSelection>,
    ) -> Result<(ConfirmTicket, PaymentSelection), CommerceError> {
        let mut flow = self.flow.lock().await;
        flow.ensure_can_confirm()?;

        let selection = selection.ok_or_else(|| {
            CommerceError::validation("payment_method", "select a payment method")
        })?;
        selection.validate()?;

        if self.cart.lock().await.is_empty() {
            return Err(CommerceError::validation("cart", "cart is empty"));
        }

        let ticket = flow.begin_confirmation()?;
        Ok((ticket, selection))
    }

    async fn commit(
        &self,
        ticket: ConfirmTicket,
        payment: PaymentMethod,
        save_details: bool,
    ) -> Result<Order, CommerceError> {
        let mut flow = self.flow.lock().await;
        if !flow.is_current(&ticket) {
            tracing::info!("discarding confirmation for abandoned checkout");
            return Err(CommerceError::CheckoutAbandoned);
        }

        let mut cart = self.cart.lock().await;
        if cart.is_empty() {
            flow.fail_confirmation(&ticket);
            return Err(CommerceError::validation("cart", "cart is empty"));
        }

        let subtotal = cart.subtotal();
        let promotion = ticket
            .promo_code
            .as_deref()
            .and_then(|code| self.promotions.evaluate(code, subtotal).ok());
        let discount = promotion.as_ref().map(|p| p.discount).unwrap_or_default();
        let pricing = CartPricing::new(subtotal, discount);

        let order = Order::new(
            cart.items().to_vec(),
            ticket.shipping.clone(),
            payment,
            pricing,
            promotion.map(|p| p.code),
        );
        self.orders.lock().await.append(order.clone());
        cart.settle();
        flow.finish_confirmation(&ticket, order.id.clone())?;

        if save_details {
            self.saved.save(&ticket.shipping);
        } else {
            self.saved.clear();
        }

        Ok(order)
    }

    fn report_failure(&self, error: &CommerceError) {
        let event = match error {
            CommerceError::InvalidPromoCode(_) => NotificationEvent::InvalidPromoCode,
            CommerceError::PaymentTokenization(_) => NotificationEvent::PaymentFailed,
            CommerceError::DuplicateSubmission => NotificationEvent::DuplicateSubmission,
            CommerceError::CheckoutAbandoned => NotificationEvent::CheckoutAbandoned,
            CommerceError::Storage(_) | CommerceError::Serialization(_) => {
                NotificationEvent::PersistenceFailed
            }
            _ => NotificationEvent::ValidationFailed,
        };
        let message = match error {
            CommerceError::PaymentTokenization(failure) => failure.reason().to_string(),
            other => other.to_string(),
        };
        self.notifier.notify(Notification::error(event, message));
    }
}
