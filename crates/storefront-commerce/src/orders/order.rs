//! Order types.

use crate::cart::{CartPricing, LineItem};
use crate::checkout::{PaymentMethod, ShippingDetails};
use crate::ids::OrderId;
use crate::money::Money;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Order status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Placed and counted.
    #[default]
    Active,
    /// Voided by the shopper. Terminal.
    Voided,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Active => "active",
            OrderStatus::Voided => "voided",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            OrderStatus::Active => "Active",
            OrderStatus::Voided => "Voided",
        }
    }
}

/// A placed order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    /// Unique order identifier.
    pub id: OrderId,
    /// Line items as they were at confirmation.
    pub items: Vec<LineItem>,
    /// Where the order ships.
    pub shipping: ShippingDetails,
    /// How it was paid.
    pub payment: PaymentMethod,
    /// Subtotal before discounts.
    pub subtotal: Money,
    /// Promotion discount.
    pub discount: Money,
    /// Amount charged.
    pub total: Money,
    /// Promo code used, if any.
    #[serde(default)]
    pub promo_code: Option<String>,
    /// Order status.
    #[serde(default)]
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub voided_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Build an active order from a cart snapshot.
    pub fn new(
        items: Vec<LineItem>,
        shipping: ShippingDetails,
        payment: PaymentMethod,
        pricing: CartPricing,
        promo_code: Option<String>,
    ) -> Self {
        Self {
            id: OrderId::generate(),
            items,
            shipping,
            payment,
            subtotal: pricing.subtotal,
            discount: pricing.discount,
            total: pricing.total,
            promo_code,
            status: OrderStatus::Active,
            created_at: Utc::now(),
            voided_at: None,
        }
    }

    /// Get total item count.
    pub fn item_count(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    pub fn is_active(&self) -> bool {
        self.status == OrderStatus::Active
    }

    /// Void the order.
    ///
    /// Returns `false`, changing nothing, if it was already voided.
    pub fn void(&mut self) -> bool {
        if self.status == OrderStatus::Voided {
            return false;
        }
        self.status = OrderStatus::Voided;
        self.voided_at = Some(Utc::now());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Product;

    fn sample_order() -> Order {
        let product = Product::new("P1", "Runner", Money::from_cents(10000), "shoes");
        Order::new(
            vec![LineItem::new(&product, 3, None, None)],
            ShippingDetails::new("Ada", "12 Way"),
            PaymentMethod::Upi {
                upi_id: "ada@upi".to_string(),
            },
            CartPricing::new(Money::from_cents(30000), Money::from_cents(3000)),
            Some("SAVE10".to_string()),
        )
    }

    #[test]
    fn test_new_order_is_active() {
        let order = sample_order();
        assert!(order.is_active());
        assert!(order.id.as_str().starts_with("ORD-"));
        assert_eq!(order.total, Money::from_cents(27000));
        assert_eq!(order.item_count(), 3);
        assert!(order.voided_at.is_none());
    }

    #[test]
    fn test_void_is_one_way() {
        let mut order = sample_order();
        assert!(order.void());
        let stamped = order.voided_at;
        assert!(stamped.is_some());

        assert!(!order.void());
        assert_eq!(order.status, OrderStatus::Voided);
        assert_eq!(order.voided_at, stamped);
    }

    #[test]
    fn test_order_json_shape() {
        let order = sample_order();
        let json = serde_json::to_value(&order).unwrap();
        assert_eq!(json["status"], "active");
        assert_eq!(json["total"], 27000);
        assert_eq!(json["payment"]["type"], "upi");

        let back: Order = serde_json::from_value(json).unwrap();
        assert_eq!(back, order);
    }
}
