//! Cart pricing snapshots.

use crate::money::Money;
use serde::{Deserialize, Serialize};

/// What observers of the cart see after each change.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CartSummary {
    /// Sum of quantities.
    pub item_count: i64,
    /// Number of distinct line items.
    pub unique_items: usize,
    /// Subtotal before discounts.
    pub subtotal: Money,
}

/// Totals for a cart with an optional discount applied.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct CartPricing {
    /// Subtotal before discounts.
    pub subtotal: Money,
    /// Discount, always within `[0, subtotal]`.
    pub discount: Money,
    /// `subtotal - discount`.
    pub total: Money,
}

impl CartPricing {
    /// Build totals, clamping the discount into `[0, subtotal]`.
    pub fn new(subtotal: Money, discount: Money) -> Self {
        let discount = discount.clamp_to(Money::zero(), subtotal.max(Money::zero()));
        Self {
            subtotal,
            discount,
            total: subtotal - discount,
        }
    }

    /// Check if any discount is applied.
    pub fn has_discount(&self) -> bool {
        !self.discount.is_zero()
    }

    /// Get discount percentage of subtotal.
    pub fn discount_percentage(&self) -> f64 {
        if self.subtotal.is_zero() {
            return 0.0;
        }
        (self.discount.cents() as f64 / self.subtotal.cents() as f64) * 100.0
    }
}
