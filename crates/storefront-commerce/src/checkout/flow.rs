//! Checkout flow state machine.
//!
//! The flow is synchronous. [`CheckoutService`](crate::checkout::CheckoutService)
//! drives it across the one suspension point (tokenization plus the
//! processing delay) using a [`ConfirmTicket`] to tell whether the flow it
//! started is still the current one when the result comes back.

use crate::cart::{AppliedPromotion, PromotionEngine, PromotionState};
use crate::checkout::ShippingDetails;
use crate::error::CommerceError;
use crate::ids::OrderId;
use crate::money::Money;
use serde::{Deserialize, Serialize};

/// Steps in the checkout flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CheckoutStep {
    /// Capturing where the order ships.
    #[default]
    ShippingDetails,
    /// Choosing how to pay.
    Payment,
    /// Confirmation in flight.
    Processing,
    /// Order placed.
    Confirmed,
}

impl CheckoutStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckoutStep::ShippingDetails => "shipping_details",
            CheckoutStep::Payment => "payment",
            CheckoutStep::Processing => "processing",
            CheckoutStep::Confirmed => "confirmed",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            CheckoutStep::ShippingDetails => "Shipping",
            CheckoutStep::Payment => "Payment",
            CheckoutStep::Processing => "Processing",
            CheckoutStep::Confirmed => "Confirmed",
        }
    }

    /// Get the step number (1-indexed).
    pub fn number(&self) -> u8 {
        match self {
            CheckoutStep::ShippingDetails => 1,
            CheckoutStep::Payment => 2,
            CheckoutStep::Processing => 3,
            CheckoutStep::Confirmed => 4,
        }
    }
}

/// Issued when a confirmation starts; presented again when it finishes.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfirmTicket {
    generation: u64,
    /// Shipping details as submitted.
    pub shipping: ShippingDetails,
    /// Promo code active when confirmation started.
    pub promo_code: Option<String>,
}

/// Checkout flow state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CheckoutFlow {
    step: CheckoutStep,
    shipping: Option<ShippingDetails>,
    promotion: PromotionState,
    generation: u64,
    last_order: Option<OrderId>,
}

impl CheckoutFlow {
    /// Create a new checkout flow.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(&self) -> CheckoutStep {
        self.step
    }

    /// Shipping details, submitted or prefilled.
    pub fn shipping(&self) -> Option<&ShippingDetails> {
        self.shipping.as_ref()
    }

    pub fn promotion(&self) -> &PromotionState {
        &self.promotion
    }

    /// Id of the order placed by the last successful confirmation.
    pub fn last_order(&self) -> Option<&OrderId> {
        self.last_order.as_ref()
    }

    /// Seed the shipping step with previously saved details.
    ///
    /// Ignored once details have been entered or the flow has moved on.
    pub fn prefill(&mut self, details: ShippingDetails) {
        if self.step == CheckoutStep::ShippingDetails && self.shipping.is_none() {
            self.shipping = Some(details);
        }
    }

    /// Validate and record shipping details, moving on to payment.
    ///
    /// On a validation failure the step is unchanged.
    pub fn submit_shipping(&mut self, details: ShippingDetails) -> Result<(), CommerceError> {
        self.expect_step(CheckoutStep::ShippingDetails, CheckoutStep::Payment)?;
        details.validate()?;

        self.shipping = Some(details.trimmed());
        self.transition(CheckoutStep::Payment);
        Ok(())
    }

    /// Return from payment to the shipping step.
    pub fn back_to_shipping(&mut self) -> Result<(), CommerceError> {
        self.expect_step(CheckoutStep::Payment, CheckoutStep::ShippingDetails)?;
        self.transition(CheckoutStep::ShippingDetails);
        Ok(())
    }

    /// Evaluate `code` against `subtotal` and make it the active promotion.
    ///
    /// A rejected code also clears whatever was active before.
    pub fn apply_promotion(
        &mut self,
        engine: &PromotionEngine,
        code: &str,
        subtotal: Money,
    ) -> Result<&AppliedPromotion, CommerceError> {
        match engine.evaluate(code, subtotal) {
            Ok(applied) => {
                tracing::debug!(code = %applied.code, discount = applied.discount.cents(), "promotion applied");
                Ok(self.promotion.apply(applied))
            }
            Err(e) => {
                self.promotion.clear();
                Err(e)
            }
        }
    }

    pub fn remove_promotion(&mut self) -> Option<AppliedPromotion> {
        self.promotion.clear()
    }

    /// Re-evaluate the active code against a new subtotal.
    pub fn refresh_promotion(&mut self, engine: &PromotionEngine, subtotal: Money) {
        let Some(code) = self.promotion.code().map(str::to_string) else {
            return;
        };
        match engine.evaluate(&code, subtotal) {
            Ok(applied) => {
                self.promotion.apply(applied);
            }
            Err(_) => {
                tracing::warn!(code = %code, "active promotion no longer valid");
                self.promotion.clear();
            }
        }
    }

    /// Check that a confirmation may start from the current step.
    pub fn ensure_can_confirm(&self) -> Result<(), CommerceError> {
        match self.step {
            CheckoutStep::Processing => Err(CommerceError::DuplicateSubmission),
            CheckoutStep::Payment => Ok(()),
            other => Err(invalid(other, CheckoutStep::Processing)),
        }
    }

    /// Enter `Processing` and hand out the ticket for this attempt.
    pub fn begin_confirmation(&mut self) -> Result<ConfirmTicket, CommerceError> {
        self.ensure_can_confirm()?;
        let shipping = self
            .shipping
            .clone()
            .ok_or_else(|| CommerceError::validation("full_name", "full name is required"))?;

        self.transition(CheckoutStep::Processing);
        Ok(ConfirmTicket {
            generation: self.generation,
            shipping,
            promo_code: self.promotion.code().map(str::to_string),
        })
    }

    /// Whether `ticket` belongs to the confirmation currently in flight.
    pub fn is_current(&self, ticket: &ConfirmTicket) -> bool {
        self.generation == ticket.generation && self.step == CheckoutStep::Processing
    }

    /// Return to `Payment` after a failed attempt. Stale tickets are ignored.
    pub fn fail_confirmation(&mut self, ticket: &ConfirmTicket) {
        if self.is_current(ticket) {
            self.transition(CheckoutStep::Payment);
        }
    }

    /// Mark the attempt for `ticket` as placed.
    pub fn finish_confirmation(
        &mut self,
        ticket: &ConfirmTicket,
        order_id: OrderId,
    ) -> Result<(), CommerceError> {
        if !self.is_current(ticket) {
            return Err(CommerceError::CheckoutAbandoned);
        }
        self.promotion.clear();
        self.last_order = Some(order_id);
        self.transition(CheckoutStep::Confirmed);
        Ok(())
    }

    /// Leave the flow. Any confirmation in flight will be discarded.
    pub fn abandon(&mut self) {
        self.generation += 1;
        self.transition(CheckoutStep::ShippingDetails);
    }

    /// Start over with a fresh flow.
    pub fn reset(&mut self) {
        *self = Self {
            generation: self.generation + 1,
            last_order: self.last_order.take(),
            ..Self::default()
        };
        tracing::debug!(step = self.step.as_str(), "checkout reset");
    }

    fn expect_step(&self, from: CheckoutStep, to: CheckoutStep) -> Result<(), CommerceError> {
        if self.step == from {
            Ok(())
        } else {
            Err(invalid(self.step, to))
        }
    }

    fn transition(&mut self, to: CheckoutStep) {
        tracing::debug!(from = self.step.as_str(), step = to.as_str(), "checkout step");
        self.step = to;
    }
}

fn invalid(from: CheckoutStep, to: CheckoutStep) -> CommerceError {
    CommerceError::InvalidCheckoutTransition {
        from: from.as_str().to_string(),
        to: to.as_str().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn details() -> ShippingDetails {
        ShippingDetails::new("Ada Lovelace", "12 Analytical Way")
    }

    fn at_payment() -> CheckoutFlow {
        let mut flow = CheckoutFlow::new();
        flow.submit_shipping(details()).unwrap();
        flow
    }

    #[test]
    fn test_checkout_creation() {
        let flow = CheckoutFlow::new();
        assert_eq!(flow.step(), CheckoutStep::ShippingDetails);
        assert!(flow.shipping().is_none());
    }

    #[test]
    fn test_submit_shipping_advances() {
        let flow = at_payment();
        assert_eq!(flow.step(), CheckoutStep::Payment);
        assert_eq!(flow.shipping().unwrap().full_name, "Ada Lovelace");
    }

    #[test]
    fn test_invalid_shipping_keeps_step() {
        let mut flow = CheckoutFlow::new();
        let err = flow
            .submit_shipping(ShippingDetails::new("", "12 Way"))
            .unwrap_err();
        assert_eq!(err.field(), Some("full_name"));
        assert_eq!(flow.step(), CheckoutStep::ShippingDetails);
    }

    #[test]
    fn test_back_to_shipping_only_from_payment() {
        let mut flow = CheckoutFlow::new();
        assert!(flow.back_to_shipping().is_err());

        let mut flow = at_payment();
        flow.back_to_shipping().unwrap();
        assert_eq!(flow.step(), CheckoutStep::ShippingDetails);
    }

    #[test]
    fn test_confirm_requires_payment_step() {
        let mut flow = CheckoutFlow::new();
        assert!(matches!(
            flow.begin_confirmation(),
            Err(CommerceError::InvalidCheckoutTransition { .. })
        ));
    }

    #[test]
    fn test_second_confirmation_is_duplicate() {
        let mut flow = at_payment();
        flow.begin_confirmation().unwrap();
        assert_eq!(flow.step(), CheckoutStep::Processing);
        assert_eq!(
            flow.begin_confirmation(),
            Err(CommerceError::DuplicateSubmission)
        );
    }

    #[test]
    fn test_failed_confirmation_returns_to_payment() {
        let mut flow = at_payment();
        let ticket = flow.begin_confirmation().unwrap();
        flow.fail_confirmation(&ticket);
        assert_eq!(flow.step(), CheckoutStep::Payment);
    }

    #[test]
    fn test_abandon_invalidates_ticket() {
        let mut flow = at_payment();
        let ticket = flow.begin_confirmation().unwrap();
        flow.abandon();

        assert_eq!(flow.step(), CheckoutStep::ShippingDetails);
        assert!(!flow.is_current(&ticket));
        assert_eq!(
            flow.finish_confirmation(&ticket, OrderId::new("ORD-1")),
            Err(CommerceError::CheckoutAbandoned)
        );
        assert!(flow.last_order().is_none());
    }

    #[test]
    fn test_finish_confirmation_clears_promotion() {
        let engine = PromotionEngine::default();
        let mut flow = at_payment();
        flow.apply_promotion(&engine, "SAVE10", Money::from_cents(1000))
            .unwrap();

        let ticket = flow.begin_confirmation().unwrap();
        assert_eq!(ticket.promo_code.as_deref(), Some("SAVE10"));
        flow.finish_confirmation(&ticket, OrderId::new("ORD-1")).unwrap();

        assert_eq!(flow.step(), CheckoutStep::Confirmed);
        assert!(flow.promotion().active().is_none());
        assert_eq!(flow.last_order(), Some(&OrderId::new("ORD-1")));
    }

    #[test]
    fn test_reset_after_confirmed() {
        let mut flow = at_payment();
        let ticket = flow.begin_confirmation().unwrap();
        flow.finish_confirmation(&ticket, OrderId::new("ORD-1")).unwrap();

        flow.reset();
        assert_eq!(flow.step(), CheckoutStep::ShippingDetails);
        assert!(flow.shipping().is_none());
        assert!(!flow.is_current(&ticket));
    }

    #[test]
    fn test_rejected_code_clears_prior_promotion() {
        let engine = PromotionEngine::default();
        let mut flow = at_payment();
        flow.apply_promotion(&engine, "SAVE20", Money::from_cents(1000))
            .unwrap();

        assert!(flow
            .apply_promotion(&engine, "BADCODE", Money::from_cents(1000))
            .is_err());
        assert!(flow.promotion().active().is_none());
    }

    #[test]
    fn test_refresh_promotion_tracks_subtotal() {
        let engine = PromotionEngine::default();
        let mut flow = at_payment();
        flow.apply_promotion(&engine, "SAVE10", Money::from_cents(1000))
            .unwrap();

        flow.refresh_promotion(&engine, Money::from_cents(5000));
        assert_eq!(flow.promotion().discount(), Money::from_cents(500));
    }

    #[test]
    fn test_prefill_only_on_fresh_shipping_step() {
        let mut flow = CheckoutFlow::new();
        flow.prefill(details());
        assert_eq!(flow.shipping(), Some(&details()));

        let mut flow = at_payment();
        flow.prefill(ShippingDetails::new("Other", "Elsewhere"));
        assert_eq!(flow.shipping().unwrap().full_name, "Ada Lovelace");
    }
}
